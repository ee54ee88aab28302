//! Post-processing of assembled Go source.
//!
//! - [`GoFormatter`]: in-process import resolution plus whitespace
//!   canonicalization and a delimiter balance check
//! - [`CommandFormatter`]: import resolution, then an external formatter
//!   such as `gofmt` fed on stdin
//!
//! Import resolution scans only code (comments and literals are blanked out)
//! so a doc comment mentioning `fmt.Stringer` never adds an import.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::error::{EnumgenError, EnumgenResult};

/// Packages the resolver knows how to import, by selector name.
const KNOWN_PACKAGES: &[(&str, &str)] = &[
    ("errors", "errors"),
    ("fmt", "fmt"),
    ("strconv", "strconv"),
    ("strings", "strings"),
];

/// Canonicalizes a generated file.
pub trait Formatter {
    /// Formats `source`; `file_name` is only used in diagnostics.
    fn format(&self, file_name: &str, source: &[u8]) -> EnumgenResult<Vec<u8>>;
}

/// In-process formatter for generated Go files.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoFormatter;

impl Formatter for GoFormatter {
    fn format(&self, file_name: &str, source: &[u8]) -> EnumgenResult<Vec<u8>> {
        let text = as_utf8(file_name, source)?;
        let resolved = resolve_imports(text)?;
        let tidy = tidy_whitespace(&resolved);
        check_balanced(file_name, &tidy)?;
        Ok(tidy.into_bytes())
    }
}

/// Runs an external formatter after resolving imports.
#[cfg(feature = "command-format")]
#[derive(Debug, Clone)]
pub struct CommandFormatter {
    program: String,
    args: Vec<String>,
}

#[cfg(feature = "command-format")]
impl CommandFormatter {
    /// Builds a formatter from an argv list, e.g. `["gofmt"]`.
    pub fn from_argv(argv: &[String]) -> EnumgenResult<Self> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| EnumgenError::format("formatter command is empty"))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

#[cfg(feature = "command-format")]
impl Formatter for CommandFormatter {
    fn format(&self, file_name: &str, source: &[u8]) -> EnumgenResult<Vec<u8>> {
        use std::io::Write;
        use std::process::{Command, Stdio};

        let text = as_utf8(file_name, source)?;
        let resolved = resolve_imports(text)?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| EnumgenError::format(format!("failed to run {}: {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(resolved.as_bytes())
                .map_err(|e| EnumgenError::format(format!("failed to feed {}: {}", self.program, e)))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| EnumgenError::format(format!("{} did not finish: {}", self.program, e)))?;

        if !output.status.success() {
            return Err(EnumgenError::format(format!(
                "{} failed on {}: {}",
                self.program,
                file_name,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        debug!(program = %self.program, bytes = output.stdout.len(), "External formatter finished");
        Ok(output.stdout)
    }
}

fn as_utf8<'a>(file_name: &str, source: &'a [u8]) -> EnumgenResult<&'a str> {
    std::str::from_utf8(source)
        .map_err(|e| EnumgenError::format(format!("{} is not valid UTF-8: {}", file_name, e)))
}

fn selector_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b([a-z][a-z0-9]*)\.[A-Za-z_]").expect("Hardcoded regex pattern is valid"))
}

fn import_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""([^"\n]+)""#).expect("Hardcoded regex pattern is valid"))
}

/// Replaces comments and string/rune literals with spaces, keeping newlines
/// and byte offsets intact.
pub fn blank_non_code(src: &str) -> String {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Code,
        LineComment,
        BlockComment,
        Interpreted(char),
        Raw,
    }

    let mut out = String::with_capacity(src.len());
    let mut state = State::Code;
    let mut chars = src.chars().peekable();

    let blank = |c: char, out: &mut String| {
        if c == '\n' {
            out.push('\n');
        } else {
            out.extend(std::iter::repeat(' ').take(c.len_utf8()));
        }
    };

    while let Some(c) = chars.next() {
        match state {
            State::Code => match c {
                '/' if chars.peek() == Some(&'/') => {
                    state = State::LineComment;
                    blank(c, &mut out);
                }
                '/' if chars.peek() == Some(&'*') => {
                    state = State::BlockComment;
                    blank(c, &mut out);
                    if let Some(star) = chars.next() {
                        blank(star, &mut out);
                    }
                }
                '"' | '\'' => {
                    state = State::Interpreted(c);
                    out.push(c);
                }
                '`' => {
                    state = State::Raw;
                    out.push(c);
                }
                _ => out.push(c),
            },
            State::LineComment => {
                if c == '\n' {
                    state = State::Code;
                }
                blank(c, &mut out);
            }
            State::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    blank(c, &mut out);
                    if let Some(slash) = chars.next() {
                        blank(slash, &mut out);
                    }
                    state = State::Code;
                } else {
                    blank(c, &mut out);
                }
            }
            State::Interpreted(quote) => {
                if c == '\\' {
                    blank(c, &mut out);
                    if let Some(escaped) = chars.next() {
                        blank(escaped, &mut out);
                    }
                } else if c == quote {
                    out.push(c);
                    state = State::Code;
                } else {
                    blank(c, &mut out);
                }
            }
            State::Raw => {
                if c == '`' {
                    out.push(c);
                    state = State::Code;
                } else {
                    blank(c, &mut out);
                }
            }
        }
    }
    out
}

/// Adds imports for known packages referenced by the code.
pub fn resolve_imports(src: &str) -> EnumgenResult<String> {
    let code = blank_non_code(src);

    let used: BTreeSet<&str> = selector_re()
        .captures_iter(&code)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| {
            KNOWN_PACKAGES
                .iter()
                .find(|(selector, _)| *selector == m.as_str())
                .map(|(_, path)| *path)
        })
        .collect();

    let existing = existing_imports(src, &code);
    let missing: Vec<&str> = used
        .into_iter()
        .filter(|path| !existing.contains(*path))
        .collect();
    if missing.is_empty() {
        return Ok(src.to_string());
    }

    let package_end = package_clause_end(src, &code)
        .ok_or_else(|| EnumgenError::format("missing package clause"))?;

    let block = if missing.len() == 1 {
        format!("\nimport \"{}\"\n", missing[0])
    } else {
        let lines: String = missing.iter().map(|p| format!("\t\"{}\"\n", p)).collect();
        format!("\nimport (\n{})\n", lines)
    };
    debug!(imports = ?missing, "Resolved imports");

    let mut out = String::with_capacity(src.len() + block.len());
    out.push_str(&src[..package_end]);
    out.push_str(&block);
    out.push_str(&src[package_end..]);
    Ok(out)
}

/// Byte offset just past the package clause line.
fn package_clause_end(src: &str, code: &str) -> Option<usize> {
    let mut offset = 0;
    for line in code.split_inclusive('\n') {
        if line.trim_start().starts_with("package ") {
            let end = offset + line.len();
            return Some(if src[..end].ends_with('\n') { end } else { src.len() });
        }
        offset += line.len();
    }
    None
}

/// Import paths already declared in the file.
fn existing_imports(src: &str, code: &str) -> BTreeSet<String> {
    let mut paths = BTreeSet::new();
    let mut offset = 0;
    let mut in_block = false;
    for line in code.split_inclusive('\n') {
        let trimmed = line.trim();
        let original = &src[offset..offset + line.len()];
        if in_block {
            if trimmed.starts_with(')') {
                in_block = false;
            } else if let Some(caps) = import_re().captures(original) {
                paths.insert(caps[1].to_string());
            }
        } else if trimmed.starts_with("import") {
            if trimmed.contains('(') && !trimmed.contains(')') {
                in_block = true;
            }
            if let Some(caps) = import_re().captures(original) {
                paths.insert(caps[1].to_string());
            }
        }
        offset += line.len();
    }
    paths
}

/// Trims trailing whitespace, keeps at most one blank line in a row and ends
/// the file with exactly one newline.
pub fn tidy_whitespace(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut blank_run = 0usize;
    for line in src.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 || out.is_empty() {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    while out.ends_with("\n\n") {
        out.pop();
    }
    out
}

/// Verifies that brackets, braces and parentheses nest correctly.
pub fn check_balanced(file_name: &str, src: &str) -> EnumgenResult<()> {
    let code = blank_non_code(src);
    let mut stack: Vec<(char, usize)> = Vec::new();
    for (idx, line) in code.lines().enumerate() {
        for c in line.chars() {
            match c {
                '(' | '[' | '{' => stack.push((c, idx + 1)),
                ')' | ']' | '}' => {
                    let open = match c {
                        ')' => '(',
                        ']' => '[',
                        _ => '{',
                    };
                    match stack.pop() {
                        Some((o, _)) if o == open => {}
                        _ => {
                            return Err(EnumgenError::format(format!(
                                "{}:{}: unexpected {:?}",
                                file_name,
                                idx + 1,
                                c
                            )))
                        }
                    }
                }
                _ => {}
            }
        }
    }
    if let Some((c, line)) = stack.pop() {
        return Err(EnumgenError::format(format!(
            "{}:{}: unclosed {:?}",
            file_name, line, c
        )));
    }
    Ok(())
}
