//! Top-level declaration parser.
//!
//! Reads the package clause, `type` and `const` declarations. Everything
//! else at package scope (imports, vars, funcs) is skipped by balancing
//! brackets up to the next top-level semicolon.

use super::lexer::{is_keyword, Tok, Token};

/// A type written in a declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// Identifier in this package or predeclared
    Name(String),
    /// `pkg.Name`
    Qualified(String, String),
    /// Anything structural, described textually
    Composite(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeSpec {
    pub name: String,
    /// `type A = B`
    pub alias: bool,
    pub expr: TypeExpr,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int(i128),
    Float(String),
    Str(String),
    Rune(i128),
    Ident(String),
    Qualified(String, String),
    Unary(&'static str, Box<Expr>),
    Binary(&'static str, Box<Expr>, Box<Expr>),
    Call(Box<Expr>, Vec<Expr>),
}

/// One constant identifier with the expression it takes (after implicit
/// repetition) and the `iota` of its spec.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstSpec {
    pub name: String,
    pub ty: Option<TypeExpr>,
    pub expr: Expr,
    pub iota: i128,
    pub line: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceFile {
    pub package: String,
    pub types: Vec<TypeSpec>,
    pub consts: Vec<ConstSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

type ParseResult<T> = Result<T, ParseError>;

pub fn parse_file(tokens: &[Token]) -> ParseResult<SourceFile> {
    let mut parser = Parser { tokens, pos: 0 };
    parser.file()
}

/// Reads only the package clause.
pub fn package_name(tokens: &[Token]) -> Option<&str> {
    match tokens {
        [Token {
            tok: Tok::Ident(kw), ..
        }, Token {
            tok: Tok::Ident(name),
            ..
        }, ..]
            if kw == "package" =>
        {
            Some(name.as_str())
        }
        _ => None,
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

/// Binary operator precedence, higher binds tighter.
fn precedence(op: &str) -> Option<u8> {
    match op {
        "*" | "/" | "%" | "<<" | ">>" | "&" | "&^" => Some(5),
        "+" | "-" | "|" | "^" => Some(4),
        "==" | "!=" | "<" | "<=" | ">" | ">=" => Some(3),
        "&&" => Some(2),
        "||" => Some(1),
        _ => None,
    }
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Tok> {
        self.tokens.get(self.pos).map(|t| &t.tok)
    }

    fn peek_at(&self, offset: usize) -> Option<&'a Tok> {
        self.tokens.get(self.pos + offset).map(|t| &t.tok)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| t.line)
            .unwrap_or(1)
    }

    fn error<T>(&self, message: impl Into<String>) -> ParseResult<T> {
        Err(ParseError {
            line: self.line(),
            message: message.into(),
        })
    }

    fn unexpected<T>(&self, wanted: &str) -> ParseResult<T> {
        match self.peek() {
            Some(tok) => self.error(format!("expected {}, found {}", wanted, tok)),
            None => self.error(format!("expected {}, found EOF", wanted)),
        }
    }

    fn next(&mut self) -> Option<&'a Tok> {
        let tok = self.peek();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn at_op(&self, op: &str) -> bool {
        matches!(self.peek(), Some(Tok::Op(o)) if *o == op)
    }

    fn at_keyword(&self, kw: &str) -> bool {
        matches!(self.peek(), Some(Tok::Ident(w)) if w == kw)
    }

    fn at_semi(&self) -> bool {
        matches!(self.peek(), Some(Tok::Semi))
    }

    fn expect_op(&mut self, op: &str) -> ParseResult<()> {
        if self.at_op(op) {
            self.pos += 1;
            Ok(())
        } else {
            self.unexpected(&format!("'{}'", op))
        }
    }

    fn ident(&mut self) -> ParseResult<String> {
        match self.peek() {
            Some(Tok::Ident(name)) if !is_keyword(name) => {
                self.pos += 1;
                Ok(name.clone())
            }
            _ => self.unexpected("identifier"),
        }
    }

    /// Ends a spec: consumes a semicolon, or stops before the `)` closing a group.
    fn end_spec(&mut self) -> ParseResult<()> {
        match self.peek() {
            Some(Tok::Semi) => {
                self.pos += 1;
                Ok(())
            }
            Some(Tok::Op(")")) | None => Ok(()),
            _ => self.unexpected("';' or newline"),
        }
    }

    /// Skips to the end of the current spec, balancing brackets.
    fn skip_spec(&mut self) {
        let mut depth = 0usize;
        while let Some(tok) = self.peek() {
            match tok {
                Tok::Op("(") | Tok::Op("[") | Tok::Op("{") => depth += 1,
                Tok::Op(")") | Tok::Op("]") | Tok::Op("}") => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                }
                Tok::Semi if depth == 0 => {
                    self.pos += 1;
                    return;
                }
                _ => {}
            }
            self.pos += 1;
        }
    }

    fn file(&mut self) -> ParseResult<SourceFile> {
        if !self.at_keyword("package") {
            return self.unexpected("package clause");
        }
        self.pos += 1;
        let package = self.ident()?;
        self.end_spec()?;

        let mut file = SourceFile {
            package,
            ..SourceFile::default()
        };

        while let Some(tok) = self.peek() {
            match tok {
                Tok::Semi => self.pos += 1,
                Tok::Ident(kw) if kw == "type" => {
                    self.pos += 1;
                    self.group(|p| p.type_spec(&mut file.types))?;
                }
                Tok::Ident(kw) if kw == "const" => {
                    self.pos += 1;
                    self.const_decl(&mut file.consts)?;
                }
                // import, var, func and anything we do not model
                _ => {
                    self.pos += 1;
                    self.skip_spec();
                    if let Some(closer @ (Tok::Op(")") | Tok::Op("]") | Tok::Op("}"))) = self.peek() {
                        return self.error(format!("unexpected {}", closer));
                    }
                }
            }
        }
        Ok(file)
    }

    /// Parses `( spec; spec; )` or a single spec.
    fn group<F>(&mut self, mut spec: F) -> ParseResult<()>
    where
        F: FnMut(&mut Self) -> ParseResult<()>,
    {
        if self.at_op("(") {
            self.pos += 1;
            loop {
                match self.peek() {
                    Some(Tok::Op(")")) => {
                        self.pos += 1;
                        break;
                    }
                    Some(Tok::Semi) => self.pos += 1,
                    None => return self.unexpected("')'"),
                    _ => spec(self)?,
                }
            }
            self.end_spec()
        } else {
            spec(self)
        }
    }

    fn type_spec(&mut self, out: &mut Vec<TypeSpec>) -> ParseResult<()> {
        let line = self.line();
        let name = self.ident()?;

        // Type parameter lists start like array lengths; the token after the
        // first identifier tells them apart.
        let generic = self.at_op("[")
            && matches!(
                (self.peek_at(1), self.peek_at(2)),
                (
                    Some(Tok::Ident(_)),
                    Some(Tok::Ident(_) | Tok::Op(",") | Tok::Op("~") | Tok::Op("*"))
                )
            );
        if generic {
            self.skip_spec();
            out.push(TypeSpec {
                name,
                alias: false,
                expr: TypeExpr::Composite("generic type".to_string()),
                line,
            });
            return Ok(());
        }

        let alias = self.at_op("=");
        if alias {
            self.pos += 1;
        }
        let expr = self.type_expr()?;
        out.push(TypeSpec {
            name,
            alias,
            expr,
            line,
        });
        Ok(())
    }

    /// Reads a type and everything up to the end of its spec.
    fn type_expr(&mut self) -> ParseResult<TypeExpr> {
        let expr = match (self.peek(), self.peek_at(1), self.peek_at(2)) {
            (Some(Tok::Ident(pkg)), Some(Tok::Op(".")), Some(Tok::Ident(name))) if !is_keyword(pkg) => {
                self.pos += 3;
                TypeExpr::Qualified(pkg.clone(), name.clone())
            }
            (Some(Tok::Ident(name)), _, _) if !is_keyword(name) => {
                self.pos += 1;
                TypeExpr::Name(name.clone())
            }
            (Some(Tok::Ident(kw)), _, _) => TypeExpr::Composite(kw.clone()),
            (Some(Tok::Op("*")), _, _) => TypeExpr::Composite("pointer".to_string()),
            (Some(Tok::Op("[")), Some(Tok::Op("]")), _) => TypeExpr::Composite("slice".to_string()),
            (Some(Tok::Op("[")), _, _) => TypeExpr::Composite("array".to_string()),
            (Some(Tok::Op("<-")), _, _) => TypeExpr::Composite("chan".to_string()),
            (Some(Tok::Op("(")), _, _) => {
                self.pos += 1;
                let inner = self.type_expr_inner()?;
                self.expect_op(")")?;
                inner
            }
            _ => return self.unexpected("type"),
        };

        if self.at_semi() || self.at_op(")") || self.peek().is_none() {
            self.end_spec()?;
            Ok(expr)
        } else {
            // Instantiations (List[int]) and composite bodies
            self.skip_spec();
            Ok(match expr {
                TypeExpr::Composite(desc) => TypeExpr::Composite(desc),
                _ => TypeExpr::Composite("instantiated generic type".to_string()),
            })
        }
    }

    /// A type between parentheses: only plain names are modelled.
    fn type_expr_inner(&mut self) -> ParseResult<TypeExpr> {
        match (self.peek(), self.peek_at(1), self.peek_at(2)) {
            (Some(Tok::Ident(pkg)), Some(Tok::Op(".")), Some(Tok::Ident(name))) => {
                self.pos += 3;
                Ok(TypeExpr::Qualified(pkg.clone(), name.clone()))
            }
            (Some(Tok::Ident(name)), _, _) if !is_keyword(name) => {
                self.pos += 1;
                Ok(TypeExpr::Name(name.clone()))
            }
            _ => self.unexpected("type name"),
        }
    }

    /// Optional type in a const spec; consts only take named types.
    fn const_type(&mut self) -> ParseResult<Option<TypeExpr>> {
        if self.at_op("=") || self.at_semi() || self.at_op(")") || self.peek().is_none() {
            return Ok(None);
        }
        let ty = if self.at_op("(") {
            self.pos += 1;
            let inner = self.type_expr_inner()?;
            self.expect_op(")")?;
            inner
        } else {
            self.type_expr_inner()?
        };
        Ok(Some(ty))
    }

    fn const_decl(&mut self, out: &mut Vec<ConstSpec>) -> ParseResult<()> {
        // Implicit repetition state: last explicit (type, expressions)
        let mut previous: Option<(Option<TypeExpr>, Vec<Expr>)> = None;
        let mut iota: i128 = 0;
        self.group(|p| {
            p.const_spec(&mut previous, iota, out)?;
            iota += 1;
            Ok(())
        })
    }

    fn const_spec(
        &mut self,
        previous: &mut Option<(Option<TypeExpr>, Vec<Expr>)>,
        iota: i128,
        out: &mut Vec<ConstSpec>,
    ) -> ParseResult<()> {
        let line = self.line();
        let mut names = vec![self.ident()?];
        while self.at_op(",") {
            self.pos += 1;
            names.push(self.ident()?);
        }

        let ty = self.const_type()?;
        let (ty, exprs) = if self.at_op("=") {
            self.pos += 1;
            let mut exprs = vec![self.expr()?];
            while self.at_op(",") {
                self.pos += 1;
                exprs.push(self.expr()?);
            }
            *previous = Some((ty.clone(), exprs.clone()));
            (ty, exprs)
        } else if ty.is_some() {
            return self.error("const declaration with a type must have a value");
        } else {
            match previous {
                Some((ty, exprs)) => (ty.clone(), exprs.clone()),
                None => return self.error("missing init expr for const declaration"),
            }
        };

        if exprs.len() != names.len() {
            return self.error(format!(
                "assignment mismatch: {} names but {} values",
                names.len(),
                exprs.len()
            ));
        }

        for (name, expr) in names.into_iter().zip(exprs) {
            if name == "_" {
                continue;
            }
            out.push(ConstSpec {
                name,
                ty: ty.clone(),
                expr,
                iota,
                line,
            });
        }
        self.end_spec()
    }

    fn expr(&mut self) -> ParseResult<Expr> {
        self.binary(1)
    }

    fn binary(&mut self, min_prec: u8) -> ParseResult<Expr> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Op(op)) => *op,
                _ => break,
            };
            let prec = match precedence(op) {
                Some(p) if p >= min_prec => p,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.binary(prec + 1)?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        match self.peek() {
            Some(Tok::Op(op @ ("+" | "-" | "!" | "^"))) => {
                self.pos += 1;
                let operand = self.unary()?;
                Ok(Expr::Unary(*op, Box::new(operand)))
            }
            _ => self.postfix(),
        }
    }

    fn postfix(&mut self) -> ParseResult<Expr> {
        let mut expr = self.primary()?;
        while self.at_op("(") {
            self.pos += 1;
            let mut args = Vec::new();
            while !self.at_op(")") {
                args.push(self.expr()?);
                if self.at_op(",") {
                    self.pos += 1;
                } else {
                    break;
                }
            }
            self.expect_op(")")?;
            expr = Expr::Call(Box::new(expr), args);
        }
        Ok(expr)
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        let expr = match self.peek() {
            Some(Tok::Int(n)) => Expr::Int(*n),
            Some(Tok::Float(text)) | Some(Tok::Imag(text)) => Expr::Float(text.clone()),
            Some(Tok::Str(s)) => Expr::Str(s.clone()),
            Some(Tok::Char(c)) => Expr::Rune(*c),
            Some(Tok::Ident(name)) if !is_keyword(name) => {
                if let (Some(Tok::Op(".")), Some(Tok::Ident(member))) = (self.peek_at(1), self.peek_at(2)) {
                    self.pos += 3;
                    return Ok(Expr::Qualified(name.clone(), member.clone()));
                }
                Expr::Ident(name.clone())
            }
            Some(Tok::Op("(")) => {
                self.pos += 1;
                let inner = self.expr()?;
                self.expect_op(")")?;
                return Ok(inner);
            }
            _ => return self.unexpected("constant expression"),
        };
        self.next();
        Ok(expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::golang::lexer::tokenize;

    fn parse(src: &str) -> SourceFile {
        parse_file(&tokenize(src).unwrap()).unwrap()
    }

    fn names(file: &SourceFile) -> Vec<&str> {
        file.consts.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_package_and_types() {
        let file = parse(
            "package paint\n\ntype Color int\ntype (\n\tName string\n\tAlias = Color\n\tExt time.Duration\n)\n",
        );
        assert_eq!(file.package, "paint");
        assert_eq!(file.types.len(), 4);
        assert_eq!(file.types[0].expr, TypeExpr::Name("int".into()));
        assert!(file.types[2].alias);
        assert_eq!(
            file.types[3].expr,
            TypeExpr::Qualified("time".into(), "Duration".into())
        );
    }

    #[test]
    fn test_composite_types() {
        let file = parse(
            "package p\ntype S struct {\n\tA int\n}\ntype L []int\ntype G[T any] struct{ v T }\ntype M map[string]int\ntype F func() error\n",
        );
        let exprs: Vec<_> = file.types.iter().map(|t| t.expr.clone()).collect();
        assert_eq!(
            exprs,
            vec![
                TypeExpr::Composite("struct".into()),
                TypeExpr::Composite("slice".into()),
                TypeExpr::Composite("generic type".into()),
                TypeExpr::Composite("map".into()),
                TypeExpr::Composite("func".into()),
            ]
        );
    }

    #[test]
    fn test_iota_and_implicit_repetition() {
        let file = parse("package p\nconst (\n\tA Color = iota\n\tB\n\t_\n\tD\n)\n");
        assert_eq!(names(&file), vec!["A", "B", "D"]);
        assert_eq!(file.consts[1].iota, 1);
        assert_eq!(file.consts[2].iota, 3);
        assert_eq!(file.consts[2].ty, Some(TypeExpr::Name("Color".into())));
        assert_eq!(file.consts[2].expr, Expr::Ident("iota".into()));
    }

    #[test]
    fn test_multiple_names_per_spec() {
        let file = parse("package p\nconst (\n\tA, B = 1, 2\n\tC, D\n)\n");
        assert_eq!(names(&file), vec!["A", "B", "C", "D"]);
        assert_eq!(file.consts[3].expr, Expr::Int(2));
        assert_eq!(file.consts[3].iota, 1);
    }

    #[test]
    fn test_expression_precedence() {
        let file = parse("package p\nconst X = 1 + 2*3 << 1\n");
        assert_eq!(
            file.consts[0].expr,
            Expr::Binary(
                "+",
                Box::new(Expr::Int(1)),
                Box::new(Expr::Binary(
                    "<<",
                    Box::new(Expr::Binary("*", Box::new(Expr::Int(2)), Box::new(Expr::Int(3)))),
                    Box::new(Expr::Int(1))
                ))
            )
        );
    }

    #[test]
    fn test_conversion_call() {
        let file = parse("package p\nconst X = Color(1 << iota)\n");
        assert!(matches!(file.consts[0].expr, Expr::Call(_, ref args) if args.len() == 1));
    }

    #[test]
    fn test_skips_funcs_vars_imports() {
        let file = parse(
            "package p\n\nimport (\n\t\"fmt\"\n)\n\nvar x = map[string]int{\"a\": 1}\n\nfunc (c Color) M() string {\n\tif true {\n\t\treturn fmt.Sprint(c)\n\t}\n\treturn \"\"\n}\n\nconst Y = \"y\"\n",
        );
        assert_eq!(names(&file), vec!["Y"]);
    }

    #[test]
    fn test_package_name_only() {
        let tokens = tokenize("// doc\npackage foo\n").unwrap();
        assert_eq!(package_name(&tokens), Some("foo"));
    }

    #[test]
    fn test_errors() {
        let err = parse_file(&tokenize("package p\nconst (\n\tA\n)\n").unwrap()).unwrap_err();
        assert!(err.message.contains("missing init expr"));
        let err = parse_file(&tokenize("package p\nconst A, B = 1\n").unwrap()).unwrap_err();
        assert!(err.message.contains("assignment mismatch"));
        assert!(parse_file(&tokenize("const A = 1\n").unwrap()).is_err());
    }
}
