//! Go tokenizer covering what top-level declarations need.
//!
//! Produces identifiers, literals (integer values decoded, strings unquoted),
//! operators and semicolons, including the ones Go inserts at line ends.
//! Comments are dropped; a block comment spanning lines counts as a newline.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Tok {
    Ident(String),
    Int(i128),
    Float(String),
    Imag(String),
    Str(String),
    Char(i128),
    Op(&'static str),
    Semi,
}

impl fmt::Display for Tok {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(s) => write!(f, "{}", s),
            Self::Int(n) => write!(f, "{}", n),
            Self::Float(s) | Self::Imag(s) => write!(f, "{}", s),
            Self::Str(s) => write!(f, "{:?}", s),
            Self::Char(c) => write!(f, "rune {}", c),
            Self::Op(op) => write!(f, "{}", op),
            Self::Semi => write!(f, "newline or ;"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub tok: Tok,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub line: usize,
    pub message: String,
}

impl LexError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Operators, longest first so the first prefix match wins.
const OPERATORS: &[&str] = &[
    "<<=", ">>=", "&^=", "...", "&&", "||", "<-", "++", "--", "==", "!=", "<=", ">=", ":=", "<<",
    ">>", "&^", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "+", "-", "*", "/", "%", "&", "|",
    "^", "<", ">", "=", "!", "(", ")", "[", "]", "{", "}", ",", ".", ":", "~",
];

const KEYWORDS: &[&str] = &[
    "break",
    "case",
    "chan",
    "const",
    "continue",
    "default",
    "defer",
    "else",
    "fallthrough",
    "for",
    "func",
    "go",
    "goto",
    "if",
    "import",
    "interface",
    "map",
    "package",
    "range",
    "return",
    "select",
    "struct",
    "switch",
    "type",
    "var",
];

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

/// Whether a line ending after `tok` gets an implicit semicolon.
fn ends_statement(tok: &Tok) -> bool {
    match tok {
        Tok::Ident(word) => {
            !is_keyword(word) || matches!(word.as_str(), "break" | "continue" | "fallthrough" | "return")
        }
        Tok::Int(_) | Tok::Float(_) | Tok::Imag(_) | Tok::Str(_) | Tok::Char(_) => true,
        Tok::Op(op) => matches!(*op, "++" | "--" | ")" | "]" | "}"),
        Tok::Semi => false,
    }
}

struct Lexer<'a> {
    src: &'a [u8],
    text: &'a str,
    pos: usize,
    line: usize,
    tokens: Vec<Token>,
}

pub fn tokenize(text: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer {
        src: text.as_bytes(),
        text,
        pos: 0,
        line: 1,
        tokens: Vec::with_capacity(text.len() / 4),
    };
    lexer.run()?;
    Ok(lexer.tokens)
}

impl<'a> Lexer<'a> {
    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    fn push(&mut self, tok: Tok, line: usize) {
        self.tokens.push(Token { tok, line });
    }

    fn newline(&mut self) {
        if let Some(last) = self.tokens.last() {
            if ends_statement(&last.tok) {
                let line = self.line;
                self.push(Tok::Semi, line);
            }
        }
        self.line += 1;
    }

    fn run(&mut self) -> Result<(), LexError> {
        while let Some(c) = self.peek() {
            match c {
                b'\n' => {
                    self.pos += 1;
                    self.newline();
                }
                b' ' | b'\t' | b'\r' => self.pos += 1,
                b'/' if self.peek_at(1) == Some(b'/') => {
                    while self.peek().is_some_and(|c| c != b'\n') {
                        self.pos += 1;
                    }
                }
                b'/' if self.peek_at(1) == Some(b'*') => self.block_comment()?,
                b'"' => self.interpreted_string()?,
                b'`' => self.raw_string()?,
                b'\'' => self.rune()?,
                b'0'..=b'9' => self.number()?,
                b'.' if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => self.number()?,
                c if c == b'_' || c.is_ascii_alphabetic() || c >= 0x80 => self.identifier(),
                _ => self.operator()?,
            }
        }
        if let Some(last) = self.tokens.last() {
            if ends_statement(&last.tok) {
                let line = self.line;
                self.push(Tok::Semi, line);
            }
        }
        Ok(())
    }

    fn block_comment(&mut self) -> Result<(), LexError> {
        let start = self.line;
        self.pos += 2;
        let mut saw_newline = false;
        loop {
            match self.peek() {
                None => return Err(LexError::new(start, "comment not terminated")),
                Some(b'*') if self.peek_at(1) == Some(b'/') => {
                    self.pos += 2;
                    break;
                }
                Some(b'\n') => {
                    saw_newline = true;
                    self.pos += 1;
                    self.line += 1;
                }
                Some(_) => self.pos += 1,
            }
        }
        if saw_newline {
            if let Some(last) = self.tokens.last() {
                if ends_statement(&last.tok) {
                    let line = self.line;
                    self.push(Tok::Semi, line);
                }
            }
        }
        Ok(())
    }

    fn identifier(&mut self) {
        let start = self.pos;
        let rest = &self.text[start..];
        let len = rest
            .char_indices()
            .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        // A lone non-identifier char (e.g. a stray non-ASCII symbol) still advances
        let len = len.max(rest.chars().next().map(char::len_utf8).unwrap_or(1));
        self.pos += len;
        let line = self.line;
        self.push(Tok::Ident(rest[..len].to_string()), line);
    }

    fn operator(&mut self) -> Result<(), LexError> {
        let rest = &self.text[self.pos..];
        let line = self.line;
        if rest.starts_with(';') {
            self.pos += 1;
            self.push(Tok::Semi, line);
            return Ok(());
        }
        match OPERATORS.iter().find(|op| rest.starts_with(**op)) {
            Some(op) => {
                self.pos += op.len();
                self.push(Tok::Op(op), line);
                Ok(())
            }
            None => {
                let c = rest.chars().next().unwrap_or('?');
                Err(LexError::new(line, format!("invalid character {:?}", c)))
            }
        }
    }

    fn number(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        let line = self.line;
        let lower = |c: Option<u8>| c.map(|c| c.to_ascii_lowercase());

        let radix = if self.peek() == Some(b'0') {
            match lower(self.peek_at(1)) {
                Some(b'x') => 16,
                Some(b'b') => 2,
                Some(b'o') => 8,
                _ => 10,
            }
        } else {
            10
        };
        if radix != 10 {
            self.pos += 2;
        }

        let mut is_float = false;
        while let Some(c) = self.peek() {
            let lc = c.to_ascii_lowercase();
            let is_exp = (radix == 10 && lc == b'e') || (radix == 16 && lc == b'p');
            if c == b'_' || c.is_ascii_digit() || (radix == 16 && lc.is_ascii_hexdigit() && lc != b'p')
            {
                self.pos += 1;
            } else if c == b'.' && (radix == 10 || radix == 16) && self.peek_at(1) != Some(b'.') {
                is_float = true;
                self.pos += 1;
            } else if is_exp {
                is_float = true;
                self.pos += 1;
                if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                    self.pos += 1;
                }
            } else {
                break;
            }
        }

        let imaginary = self.peek() == Some(b'i');
        if imaginary {
            self.pos += 1;
        }

        let text = &self.text[start..self.pos];
        if imaginary {
            self.push(Tok::Imag(text.to_string()), line);
        } else if is_float {
            self.push(Tok::Float(text.to_string()), line);
        } else {
            let value = parse_int(text, radix)
                .ok_or_else(|| LexError::new(line, format!("invalid integer literal {}", text)))?;
            self.push(Tok::Int(value), line);
        }
        Ok(())
    }

    fn interpreted_string(&mut self) -> Result<(), LexError> {
        let line = self.line;
        self.pos += 1;
        let mut bytes = Vec::new();
        loop {
            match self.peek() {
                None | Some(b'\n') => return Err(LexError::new(line, "string literal not terminated")),
                Some(b'"') => {
                    self.pos += 1;
                    break;
                }
                Some(b'\\') => {
                    self.escape(b'"', &mut bytes)?;
                }
                Some(c) => {
                    bytes.push(c);
                    self.pos += 1;
                }
            }
        }
        let text = String::from_utf8(bytes)
            .map_err(|_| LexError::new(line, "string constants that are not valid UTF-8 are not supported"))?;
        self.push(Tok::Str(text), line);
        Ok(())
    }

    fn raw_string(&mut self) -> Result<(), LexError> {
        let line = self.line;
        self.pos += 1;
        let start = self.pos;
        loop {
            match self.peek() {
                None => return Err(LexError::new(line, "raw string literal not terminated")),
                Some(b'`') => break,
                Some(b'\n') => {
                    self.line += 1;
                    self.pos += 1;
                }
                Some(_) => self.pos += 1,
            }
        }
        let text = self.text[start..self.pos].replace('\r', "");
        self.pos += 1;
        self.push(Tok::Str(text), line);
        Ok(())
    }

    fn rune(&mut self) -> Result<(), LexError> {
        let line = self.line;
        self.pos += 1;
        let value = match self.peek() {
            Some(b'\\') => {
                let mut bytes = Vec::new();
                let code = self.escape(b'\'', &mut bytes)?;
                match code {
                    Some(code) => code,
                    None => bytes.first().copied().map(i128::from).unwrap_or(0),
                }
            }
            Some(b'\'') | Some(b'\n') | None => return Err(LexError::new(line, "empty rune literal")),
            Some(_) => {
                let c = self.text[self.pos..]
                    .chars()
                    .next()
                    .ok_or_else(|| LexError::new(line, "invalid rune literal"))?;
                self.pos += c.len_utf8();
                i128::from(u32::from(c))
            }
        };
        if self.peek() != Some(b'\'') {
            return Err(LexError::new(line, "rune literal not terminated"));
        }
        self.pos += 1;
        self.push(Tok::Char(value), line);
        Ok(())
    }

    /// Decodes one escape, appending its UTF-8 (or raw byte) encoding to
    /// `bytes`. Returns the code point for `\u`/`\U` and simple escapes,
    /// `None` for byte escapes (`\x`, octal).
    fn escape(&mut self, quote: u8, bytes: &mut Vec<u8>) -> Result<Option<i128>, LexError> {
        let line = self.line;
        self.pos += 1;
        let c = self
            .peek()
            .ok_or_else(|| LexError::new(line, "escape sequence not terminated"))?;
        self.pos += 1;

        let simple = match c {
            b'a' => Some(0x07),
            b'b' => Some(0x08),
            b'f' => Some(0x0C),
            b'n' => Some(b'\n'),
            b'r' => Some(b'\r'),
            b't' => Some(b'\t'),
            b'v' => Some(0x0B),
            b'\\' => Some(b'\\'),
            c if c == quote => Some(c),
            _ => None,
        };
        if let Some(b) = simple {
            bytes.push(b);
            return Ok(Some(i128::from(b)));
        }

        let (digits, radix, is_byte) = match c {
            b'x' => (2, 16, true),
            b'u' => (4, 16, false),
            b'U' => (8, 16, false),
            b'0'..=b'7' => {
                self.pos -= 1;
                (3, 8, true)
            }
            _ => return Err(LexError::new(line, format!("unknown escape sequence \\{}", c as char))),
        };

        let end = self.pos + digits;
        let text = self
            .text
            .get(self.pos..end)
            .ok_or_else(|| LexError::new(line, "escape sequence not terminated"))?;
        let value = u32::from_str_radix(text, radix)
            .map_err(|_| LexError::new(line, format!("invalid escape sequence {}", text)))?;
        self.pos = end;

        if is_byte {
            let byte = u8::try_from(value)
                .map_err(|_| LexError::new(line, "octal escape value > 255"))?;
            bytes.push(byte);
            Ok(None)
        } else {
            let ch = char::from_u32(value)
                .ok_or_else(|| LexError::new(line, "escape sequence is invalid Unicode code point"))?;
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            Ok(Some(i128::from(value)))
        }
    }
}

/// Parses an integer literal body (prefix included) in the given radix.
fn parse_int(text: &str, radix: u32) -> Option<i128> {
    let digits: String = text.chars().filter(|c| *c != '_').collect();
    let body = match radix {
        16 | 2 => &digits[2..],
        8 if digits.len() > 1 && matches!(digits.as_bytes()[1], b'o' | b'O') => &digits[2..],
        _ => digits.as_str(),
    };
    // Legacy octal: leading zero
    let (body, radix) = if radix == 10 && body.len() > 1 && body.starts_with('0') {
        (&body[1..], 8)
    } else {
        (body, radix)
    };
    if body.is_empty() {
        return None;
    }
    i128::from_str_radix(body, radix).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(src: &str) -> Vec<Tok> {
        tokenize(src).unwrap().into_iter().map(|t| t.tok).collect()
    }

    #[test]
    fn test_semicolon_insertion() {
        assert_eq!(
            toks("const A = 1\nconst B = \"x\"\n"),
            vec![
                Tok::Ident("const".into()),
                Tok::Ident("A".into()),
                Tok::Op("="),
                Tok::Int(1),
                Tok::Semi,
                Tok::Ident("const".into()),
                Tok::Ident("B".into()),
                Tok::Op("="),
                Tok::Str("x".into()),
                Tok::Semi,
            ]
        );
    }

    #[test]
    fn test_no_semicolon_after_open_paren() {
        assert_eq!(
            toks("const (\n)\n"),
            vec![
                Tok::Ident("const".into()),
                Tok::Op("("),
                Tok::Op(")"),
                Tok::Semi
            ]
        );
    }

    #[test]
    fn test_integer_literals() {
        assert_eq!(
            toks("0x1F 0b101 0o17 017 1_000 0"),
            vec![
                Tok::Int(31),
                Tok::Int(5),
                Tok::Int(15),
                Tok::Int(15),
                Tok::Int(1000),
                Tok::Int(0),
                Tok::Semi
            ]
        );
    }

    #[test]
    fn test_float_and_imaginary() {
        assert_eq!(
            toks("1.5 1e3 .5 2i"),
            vec![
                Tok::Float("1.5".into()),
                Tok::Float("1e3".into()),
                Tok::Float(".5".into()),
                Tok::Imag("2i".into()),
                Tok::Semi
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            toks(r#""a\tb\"c\x41\u00e9\101""#),
            vec![Tok::Str("a\tb\"cAéA".into()), Tok::Semi]
        );
        assert_eq!(toks("`raw\\n`"), vec![Tok::Str("raw\\n".into()), Tok::Semi]);
    }

    #[test]
    fn test_runes() {
        assert_eq!(
            toks(r"'a' '\n' 'é' '\x00'"),
            vec![
                Tok::Char(97),
                Tok::Char(10),
                Tok::Char(233),
                Tok::Char(0),
                Tok::Semi
            ]
        );
    }

    #[test]
    fn test_comments_skipped() {
        assert_eq!(
            toks("A // trailing\n/* block\n */ B"),
            vec![
                Tok::Ident("A".into()),
                Tok::Semi,
                Tok::Ident("B".into()),
                Tok::Semi
            ]
        );
    }

    #[test]
    fn test_line_numbers() {
        let tokens = tokenize("a\n\nb").unwrap();
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[2].line, 3);
    }

    #[test]
    fn test_operators_longest_match() {
        assert_eq!(
            toks("a &^ b << 2"),
            vec![
                Tok::Ident("a".into()),
                Tok::Op("&^"),
                Tok::Ident("b".into()),
                Tok::Op("<<"),
                Tok::Int(2),
                Tok::Semi
            ]
        );
    }

    #[test]
    fn test_errors() {
        assert!(tokenize("\"open").is_err());
        assert!(tokenize("/* open").is_err());
        assert!(tokenize("''").is_err());
        assert!(tokenize("\"\\q\"").is_err());
    }
}
