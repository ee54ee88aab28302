//! Build constraints: `//go:build` lines, legacy `// +build` lines and
//! `_GOOS_GOARCH` file name suffixes.

use std::collections::HashSet;

/// A parsed build-constraint expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    Tag(String),
    Not(Box<Constraint>),
    And(Box<Constraint>, Box<Constraint>),
    Or(Box<Constraint>, Box<Constraint>),
}

impl Constraint {
    pub fn eval(&self, ctx: &BuildContext) -> bool {
        match self {
            Self::Tag(tag) => ctx.satisfies(tag),
            Self::Not(inner) => !inner.eval(ctx),
            Self::And(a, b) => a.eval(ctx) && b.eval(ctx),
            Self::Or(a, b) => a.eval(ctx) || b.eval(ctx),
        }
    }

    fn and(a: Self, b: Self) -> Self {
        Self::And(Box::new(a), Box::new(b))
    }

    fn or(a: Self, b: Self) -> Self {
        Self::Or(Box::new(a), Box::new(b))
    }
}

const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js", "linux",
    "nacl", "netbsd", "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "arm", "arm64", "loong64", "mips", "mipsle", "mips64", "mips64le", "ppc64",
    "ppc64le", "riscv64", "s390x", "wasm",
];

const UNIX_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "linux",
    "netbsd", "openbsd", "solaris",
];

/// Newest Go release whose `go1.N` tag is considered satisfied.
const GO_MINOR: u32 = 23;

/// Target platform plus user-supplied tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    pub goos: String,
    pub goarch: String,
    pub tags: HashSet<String>,
}

impl BuildContext {
    pub fn new(goos: impl Into<String>, goarch: impl Into<String>, tags: &[String]) -> Self {
        Self {
            goos: goos.into(),
            goarch: goarch.into(),
            tags: tags.iter().cloned().collect(),
        }
    }

    /// Platform from `GOOS`/`GOARCH`, falling back to the host.
    pub fn from_env(tags: &[String]) -> Self {
        let goos = std::env::var("GOOS").unwrap_or_else(|_| host_os().to_string());
        let goarch = std::env::var("GOARCH").unwrap_or_else(|_| host_arch().to_string());
        Self::new(goos, goarch, tags)
    }

    pub fn satisfies(&self, tag: &str) -> bool {
        if tag == self.goos || tag == self.goarch || tag == "gc" || self.tags.contains(tag) {
            return true;
        }
        if tag == "unix" {
            return UNIX_OS.contains(&self.goos.as_str());
        }
        // Go's own implied tags: android implies linux, ios implies darwin
        if (tag == "linux" && self.goos == "android") || (tag == "darwin" && self.goos == "ios") {
            return true;
        }
        tag.strip_prefix("go1.")
            .and_then(|minor| minor.parse::<u32>().ok())
            .is_some_and(|minor| minor <= GO_MINOR)
    }

    /// Applies `name_GOOS.go`, `name_GOARCH.go` and `name_GOOS_GOARCH.go`.
    pub fn matches_file_name(&self, file_name: &str) -> bool {
        let stem = file_name.strip_suffix(".go").unwrap_or(file_name);
        let parts: Vec<&str> = stem.split('_').collect();
        let n = parts.len();
        if n >= 3 && KNOWN_OS.contains(&parts[n - 2]) && KNOWN_ARCH.contains(&parts[n - 1]) {
            return self.satisfies(parts[n - 2]) && self.satisfies(parts[n - 1]);
        }
        if n >= 2 {
            let last = parts[n - 1];
            if KNOWN_OS.contains(&last) || KNOWN_ARCH.contains(&last) {
                return self.satisfies(last);
            }
        }
        true
    }
}

fn host_os() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

fn host_arch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        "powerpc64" => "ppc64",
        "loongarch64" => "loong64",
        other => other,
    }
}

/// Extracts the build constraint of a file from its header, i.e. the
/// comments before the package clause. `//go:build` wins over `// +build`.
pub fn file_constraint(source: &str) -> Result<Option<Constraint>, String> {
    let mut go_build = None;
    let mut plus_build = Vec::new();
    let mut in_block = false;

    for line in source.lines() {
        let line = line.trim();
        if in_block {
            if line.contains("*/") {
                in_block = false;
            }
            continue;
        }
        if line.is_empty() {
            continue;
        }
        if line.starts_with("/*") {
            in_block = !line.contains("*/");
            continue;
        }
        let Some(comment) = line.strip_prefix("//") else {
            // First non-comment line ends the header
            break;
        };
        if let Some(expr) = comment.strip_prefix("go:build") {
            if go_build.is_some() {
                return Err("multiple //go:build lines".to_string());
            }
            go_build = Some(parse_go_build(expr)?);
        } else if let Some(rest) = comment.trim_start().strip_prefix("+build") {
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                plus_build.push(parse_plus_build(rest)?);
            }
        }
    }

    if go_build.is_some() {
        return Ok(go_build);
    }
    Ok(plus_build.into_iter().reduce(Constraint::and))
}

/// One legacy line: space-separated options are ORed, comma-separated
/// terms within an option are ANDed, `!` negates.
fn parse_plus_build(line: &str) -> Result<Constraint, String> {
    line.split_whitespace()
        .map(|option| {
            option
                .split(',')
                .map(|term| match term.strip_prefix('!') {
                    Some(tag) if is_tag(tag) => Ok(Constraint::Not(Box::new(Constraint::Tag(tag.to_string())))),
                    None if is_tag(term) => Ok(Constraint::Tag(term.to_string())),
                    _ => Err(format!("invalid +build term {:?}", term)),
                })
                .try_fold(None, |acc: Option<Constraint>, term| {
                    let term = term?;
                    Ok::<_, String>(Some(match acc {
                        Some(acc) => Constraint::and(acc, term),
                        None => term,
                    }))
                })?
                .ok_or_else(|| "empty +build option".to_string())
        })
        .try_fold(None, |acc: Option<Constraint>, option| {
            let option = option?;
            Ok::<_, String>(Some(match acc {
                Some(acc) => Constraint::or(acc, option),
                None => option,
            }))
        })?
        .ok_or_else(|| "empty +build line".to_string())
}

fn is_tag(word: &str) -> bool {
    !word.is_empty() && word.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.')
}

/// Parses a `//go:build` expression: `||`, `&&`, `!`, parentheses, tags.
pub fn parse_go_build(expr: &str) -> Result<Constraint, String> {
    let tokens = tokenize(expr)?;
    let mut parser = ExprParser { tokens, pos: 0 };
    let constraint = parser.or()?;
    if parser.pos != parser.tokens.len() {
        return Err(format!("unexpected {:?} in //go:build line", parser.tokens[parser.pos]));
    }
    Ok(constraint)
}

fn tokenize(expr: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut chars = expr.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' | ')' | '!' => {
                tokens.push(c.to_string());
                chars.next();
            }
            '&' | '|' => {
                chars.next();
                if chars.next() != Some(c) {
                    return Err(format!("expected {}{} in //go:build line", c, c));
                }
                tokens.push(format!("{}{}", c, c));
            }
            _ => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' || c == '.' {
                        word.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if word.is_empty() {
                    return Err(format!("invalid character {:?} in //go:build line", c));
                }
                tokens.push(word);
            }
        }
    }
    Ok(tokens)
}

struct ExprParser {
    tokens: Vec<String>,
    pos: usize,
}

impl ExprParser {
    fn peek(&self) -> Option<&str> {
        self.tokens.get(self.pos).map(String::as_str)
    }

    fn or(&mut self) -> Result<Constraint, String> {
        let mut lhs = self.and()?;
        while self.peek() == Some("||") {
            self.pos += 1;
            lhs = Constraint::or(lhs, self.and()?);
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Constraint, String> {
        let mut lhs = self.not()?;
        while self.peek() == Some("&&") {
            self.pos += 1;
            lhs = Constraint::and(lhs, self.not()?);
        }
        Ok(lhs)
    }

    fn not(&mut self) -> Result<Constraint, String> {
        match self.peek() {
            Some("!") => {
                self.pos += 1;
                Ok(Constraint::Not(Box::new(self.not()?)))
            }
            Some("(") => {
                self.pos += 1;
                let inner = self.or()?;
                if self.peek() != Some(")") {
                    return Err("missing ) in //go:build line".to_string());
                }
                self.pos += 1;
                Ok(inner)
            }
            Some(word) if is_tag(word) => {
                let tag = word.to_string();
                self.pos += 1;
                Ok(Constraint::Tag(tag))
            }
            Some(other) => Err(format!("unexpected {:?} in //go:build line", other)),
            None => Err("unexpected end of //go:build line".to_string()),
        }
    }
}
