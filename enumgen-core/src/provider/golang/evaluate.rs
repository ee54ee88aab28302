//! Constant evaluation and type resolution for parsed Go declarations.
//!
//! Constants are evaluated lazily by name with memoization, so references
//! may point forward or across files. Values are exact integers (i128),
//! strings and booleans; floating-point arithmetic and references into
//! other packages are not evaluated. Such constants are still recorded,
//! with their value kept as an explanatory [`ConstLiteral::Other`].

use std::collections::HashMap;

use tracing::debug;

use crate::model::{BasicFamily, BasicType, ConstLiteral, PackageInfo, Symbol, TypeRef, Underlying};

use super::parser::{ConstSpec, Expr, SourceFile, TypeExpr, TypeSpec};

/// Type nesting beyond this is treated as a cycle.
const MAX_TYPE_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Int(i128),
    Str(String),
    Bool(bool),
    Float(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Untyped {
    Bool,
    Str,
    // Numeric kinds, ordered by rank
    Int,
    Rune,
    Float,
}

impl Untyped {
    fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Str => "string",
            Self::Int => "int",
            Self::Rune => "rune",
            Self::Float => "float",
        }
    }

    fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Rune | Self::Float)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum ConstType {
    Untyped(Untyped),
    /// `id` is the type identity; `basic` its scalar underlying type, when known
    Typed { id: String, basic: Option<BasicType> },
}

impl ConstType {
    fn describe(&self) -> String {
        match self {
            Self::Untyped(k) => format!("untyped {}", k.name()),
            Self::Typed { id, .. } => id.clone(),
        }
    }
}

type Evaluated = Result<(Value, ConstType), String>;

/// Builds the package symbol table from parsed files.
pub fn build_package(path: &str, files: &[SourceFile]) -> PackageInfo {
    let name = files.first().map(|f| f.package.clone()).unwrap_or_default();
    let mut resolver = Resolver::new(path, files);
    let mut pkg = PackageInfo::new(path, name);

    for spec in files.iter().flat_map(|f| &f.types) {
        let underlying = resolver.underlying_of(&spec.name, 0);
        pkg.insert(Symbol::named_type(&spec.name, underlying));
    }

    for spec in files.iter().flat_map(|f| &f.consts) {
        let symbol = match resolver.constant(&spec.name) {
            Ok((value, ty)) => Symbol::constant(&spec.name, type_ref(&ty), literal(value)),
            Err(reason) => {
                debug!(constant = %spec.name, line = spec.line, reason = %reason, "Constant not evaluated");
                let ty = spec
                    .ty
                    .as_ref()
                    .and_then(|t| resolver.resolve_type(t, 0).ok())
                    .map(|t| type_ref(&t))
                    .unwrap_or_else(|| TypeRef::new("invalid type"));
                Symbol::constant(&spec.name, ty, ConstLiteral::Other(format!("unevaluated: {}", reason)))
            }
        };
        pkg.insert(symbol);
    }
    pkg
}

fn type_ref(ty: &ConstType) -> TypeRef {
    TypeRef::new(ty.describe())
}

fn literal(value: Value) -> ConstLiteral {
    match value {
        Value::Int(n) => ConstLiteral::Int(n),
        Value::Str(s) => ConstLiteral::Str(s),
        Value::Bool(b) => ConstLiteral::Bool(b),
        Value::Float(text) => ConstLiteral::Other(text),
    }
}

struct Resolver<'a> {
    path: &'a str,
    types: HashMap<&'a str, &'a TypeSpec>,
    consts: HashMap<&'a str, &'a ConstSpec>,
    memo: HashMap<&'a str, Evaluated>,
    active: Vec<&'a str>,
}

impl<'a> Resolver<'a> {
    fn new(path: &'a str, files: &'a [SourceFile]) -> Self {
        Self {
            path,
            types: files
                .iter()
                .flat_map(|f| &f.types)
                .map(|t| (t.name.as_str(), t))
                .collect(),
            consts: files
                .iter()
                .flat_map(|f| &f.consts)
                .map(|c| (c.name.as_str(), c))
                .collect(),
            memo: HashMap::new(),
            active: Vec::new(),
        }
    }

    /// Underlying representation of a type declared in this package.
    fn underlying_of(&self, name: &str, depth: usize) -> Underlying {
        if depth > MAX_TYPE_DEPTH {
            return Underlying::Composite("invalid recursive type".to_string());
        }
        match self.types.get(name) {
            Some(spec) => self.underlying_expr(&spec.expr, depth + 1),
            None => Underlying::Unresolved(name.to_string()),
        }
    }

    fn underlying_expr(&self, expr: &TypeExpr, depth: usize) -> Underlying {
        match expr {
            TypeExpr::Name(name) if self.types.contains_key(name.as_str()) => {
                self.underlying_of(name, depth)
            }
            TypeExpr::Name(name) => match BasicType::from_name(name) {
                Some(basic) => Underlying::Basic(basic),
                None if name == "error" || name == "any" => Underlying::Composite("interface".to_string()),
                None => Underlying::Unresolved(name.clone()),
            },
            TypeExpr::Qualified(pkg, name) => Underlying::Unresolved(format!("{}.{}", pkg, name)),
            TypeExpr::Composite(desc) => Underlying::Composite(desc.clone()),
        }
    }

    /// Resolves a type used in a constant declaration or conversion.
    fn resolve_type(&self, expr: &TypeExpr, depth: usize) -> Result<ConstType, String> {
        if depth > MAX_TYPE_DEPTH {
            return Err("invalid recursive type".to_string());
        }
        match expr {
            TypeExpr::Name(name) => match self.types.get(name.as_str()) {
                Some(spec) if spec.alias => self.resolve_type(&spec.expr, depth + 1),
                Some(_) => {
                    let basic = match self.underlying_of(name, 0) {
                        Underlying::Basic(b) => Some(b),
                        _ => None,
                    };
                    Ok(ConstType::Typed {
                        id: format!("{}.{}", self.path, name),
                        basic,
                    })
                }
                None => match BasicType::from_name(name) {
                    Some(b) => Ok(ConstType::Typed {
                        id: b.name().to_string(),
                        basic: Some(b),
                    }),
                    None => Err(format!("undefined type {}", name)),
                },
            },
            TypeExpr::Qualified(pkg, name) => Ok(ConstType::Typed {
                id: format!("{}.{}", pkg, name),
                basic: None,
            }),
            TypeExpr::Composite(desc) => Err(format!("invalid constant type {}", desc)),
        }
    }

    fn is_type_name(&self, name: &str) -> bool {
        self.types.contains_key(name) || BasicType::from_name(name).is_some()
    }

    /// Evaluates a package-level constant by name.
    fn constant(&mut self, name: &str) -> Evaluated {
        if let Some(done) = self.memo.get(name) {
            return done.clone();
        }
        let Some((&key, &spec)) = self.consts.get_key_value(name) else {
            return Err(format!("undefined: {}", name));
        };
        if self.active.contains(&key) {
            return Err(format!("initialization cycle involving {}", name));
        }

        self.active.push(key);
        let result = self.eval(&spec.expr, spec.iota).and_then(|(value, from)| match &spec.ty {
            Some(ty) => {
                let to = self.resolve_type(ty, 0)?;
                assign(value, &from, to)
            }
            None => Ok((value, from)),
        });
        self.active.pop();

        self.memo.insert(key, result.clone());
        result
    }

    fn eval(&mut self, expr: &Expr, iota: i128) -> Evaluated {
        match expr {
            Expr::Int(n) => Ok((Value::Int(*n), ConstType::Untyped(Untyped::Int))),
            Expr::Rune(c) => Ok((Value::Int(*c), ConstType::Untyped(Untyped::Rune))),
            Expr::Str(s) => Ok((Value::Str(s.clone()), ConstType::Untyped(Untyped::Str))),
            Expr::Float(text) => Ok((Value::Float(text.clone()), ConstType::Untyped(Untyped::Float))),
            Expr::Ident(name) => match name.as_str() {
                "iota" => Ok((Value::Int(iota), ConstType::Untyped(Untyped::Int))),
                "true" => Ok((Value::Bool(true), ConstType::Untyped(Untyped::Bool))),
                "false" => Ok((Value::Bool(false), ConstType::Untyped(Untyped::Bool))),
                _ => self.constant(name),
            },
            Expr::Qualified(pkg, name) => Err(format!("cannot evaluate {}.{} from another package", pkg, name)),
            Expr::Unary(op, operand) => {
                let (value, ty) = self.eval(operand, iota)?;
                let value = unary(op, value, &ty)?;
                fit(value, ty)
            }
            Expr::Binary(op, lhs, rhs) => {
                let lhs = self.eval(lhs, iota)?;
                let rhs = self.eval(rhs, iota)?;
                binary(op, lhs, rhs)
            }
            Expr::Call(fun, args) => self.call(fun, args, iota),
        }
    }

    fn call(&mut self, fun: &Expr, args: &[Expr], iota: i128) -> Evaluated {
        let Expr::Ident(name) = fun else {
            return Err("only conversions and len are evaluated in constant calls".to_string());
        };
        if args.len() != 1 {
            return Err(format!("{} expects one argument, got {}", name, args.len()));
        }
        let (value, from) = self.eval(&args[0], iota)?;

        if self.is_type_name(name) {
            let to = self.resolve_type(&TypeExpr::Name(name.clone()), 0)?;
            return convert(value, &from, to);
        }
        match (name.as_str(), value) {
            ("len", Value::Str(s)) => Ok((
                Value::Int(s.len() as i128),
                ConstType::Typed {
                    id: "int".to_string(),
                    basic: Some(BasicType::Int),
                },
            )),
            _ => Err(format!("cannot evaluate call to {}", name)),
        }
    }
}

/// Inclusive value range of an integer type (int/uint are 64-bit).
fn int_range(basic: BasicType) -> (i128, i128) {
    match basic {
        BasicType::Int8 => (i8::MIN.into(), i8::MAX.into()),
        BasicType::Int16 => (i16::MIN.into(), i16::MAX.into()),
        BasicType::Int32 => (i32::MIN.into(), i32::MAX.into()),
        BasicType::Uint8 => (0, u8::MAX.into()),
        BasicType::Uint16 => (0, u16::MAX.into()),
        BasicType::Uint32 => (0, u32::MAX.into()),
        BasicType::Uint | BasicType::Uint64 | BasicType::Uintptr => (0, u64::MAX.into()),
        _ => (i64::MIN.into(), i64::MAX.into()),
    }
}

/// Checks that a value is representable by its (typed) type.
fn fit(value: Value, ty: ConstType) -> Evaluated {
    let ConstType::Typed {
        id,
        basic: Some(basic),
    } = &ty
    else {
        return Ok((value, ty));
    };
    match (basic.family(), &value) {
        (BasicFamily::Integer, Value::Int(n)) => {
            let (min, max) = int_range(*basic);
            if *n < min || *n > max {
                return Err(format!("constant {} overflows {}", n, id));
            }
        }
        (BasicFamily::String, Value::Str(_)) | (BasicFamily::Bool, Value::Bool(_)) => {}
        (BasicFamily::Float | BasicFamily::Complex, Value::Int(_) | Value::Float(_)) => {}
        (_, Value::Float(_)) => {
            return Err(format!("floating-point constant cannot be represented as {}", id))
        }
        _ => return Err(format!("constant cannot be represented as {}", id)),
    }
    Ok((value, ty))
}

/// Implicit conversion when a constant is declared with a type.
fn assign(value: Value, from: &ConstType, to: ConstType) -> Evaluated {
    match from {
        ConstType::Typed { id, .. } => {
            if matches!(&to, ConstType::Typed { id: target, .. } if target == id) {
                Ok((value, to))
            } else {
                Err(format!("cannot use constant of type {} as {} value", id, to.describe()))
            }
        }
        ConstType::Untyped(kind) => {
            if let ConstType::Typed {
                id,
                basic: Some(basic),
            } = &to
            {
                let compatible = match basic.family() {
                    BasicFamily::Integer | BasicFamily::Float | BasicFamily::Complex => kind.is_numeric(),
                    BasicFamily::String => *kind == Untyped::Str,
                    BasicFamily::Bool => *kind == Untyped::Bool,
                };
                if !compatible {
                    return Err(format!("cannot use untyped {} constant as {} value", kind.name(), id));
                }
            }
            fit(value, to)
        }
    }
}

/// Explicit conversion `T(x)`.
fn convert(value: Value, from: &ConstType, to: ConstType) -> Evaluated {
    let target_family = match &to {
        ConstType::Typed {
            basic: Some(basic), ..
        } => Some(basic.family()),
        _ => None,
    };
    let Some(target_family) = target_family else {
        return Ok((value, to));
    };
    let value = match (target_family, value) {
        // string(rune) yields the UTF-8 encoding, or U+FFFD when invalid
        (BasicFamily::String, Value::Int(n)) if !matches!(from, ConstType::Untyped(Untyped::Str)) => {
            let ch = u32::try_from(n)
                .ok()
                .and_then(char::from_u32)
                .unwrap_or(char::REPLACEMENT_CHARACTER);
            Value::Str(ch.to_string())
        }
        (_, value) => value,
    };
    fit(value, to)
}

fn unary(op: &str, value: Value, ty: &ConstType) -> Result<Value, String> {
    match (op, value) {
        ("+", v @ (Value::Int(_) | Value::Float(_))) => Ok(v),
        ("-", Value::Int(n)) => n
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| "constant overflow".to_string()),
        ("^", Value::Int(n)) => match ty {
            ConstType::Typed {
                basic: Some(basic), ..
            } if int_range(*basic).0 == 0 => Ok(Value::Int(!n & int_range(*basic).1)),
            _ => Ok(Value::Int(!n)),
        },
        ("!", Value::Bool(b)) => Ok(Value::Bool(!b)),
        (_, Value::Float(_)) => Err("floating-point constant arithmetic is not evaluated".to_string()),
        (op, _) => Err(format!("invalid operation: operator {} not defined on {}", op, ty.describe())),
    }
}

/// Result type of a binary operation on two operands.
fn unify(lhs: &ConstType, rhs: &ConstType) -> Result<ConstType, String> {
    match (lhs, rhs) {
        (ConstType::Typed { id: a, .. }, ConstType::Typed { id: b, .. }) if a != b => {
            Err(format!("invalid operation: mismatched types {} and {}", a, b))
        }
        (ConstType::Typed { .. }, _) => Ok(lhs.clone()),
        (_, ConstType::Typed { .. }) => Ok(rhs.clone()),
        (ConstType::Untyped(a), ConstType::Untyped(b)) => {
            if a == b || (a.is_numeric() && b.is_numeric()) {
                Ok(ConstType::Untyped(*a.max(b)))
            } else {
                Err(format!(
                    "invalid operation: mismatched types untyped {} and untyped {}",
                    a.name(),
                    b.name()
                ))
            }
        }
    }
}

fn binary(op: &str, (lv, lt): (Value, ConstType), (rv, rt): (Value, ConstType)) -> Evaluated {
    if op == "<<" || op == ">>" {
        let (Value::Int(n), Value::Int(count)) = (&lv, &rv) else {
            return Err(format!("invalid shift {} {} {}", lt.describe(), op, rt.describe()));
        };
        if *count < 0 {
            return Err(format!("invalid negative shift count {}", count));
        }
        let value = if op == "<<" {
            u32::try_from(*count)
                .ok()
                .filter(|c| *c < 127)
                .and_then(|c| n.checked_mul(1i128 << c))
                .ok_or_else(|| "shifted constant overflows".to_string())?
        } else {
            n >> (*count).min(127)
        };
        return fit(Value::Int(value), lt);
    }

    let ty = unify(&lt, &rt)?;
    let overflow = || "constant overflow".to_string();

    let value = match (op, lv, rv) {
        ("==", a, b) => return Ok((Value::Bool(a == b), ConstType::Untyped(Untyped::Bool))),
        ("!=", a, b) => return Ok((Value::Bool(a != b), ConstType::Untyped(Untyped::Bool))),
        (cmp @ ("<" | "<=" | ">" | ">="), a, b) => {
            let ordering = match (a, b) {
                (Value::Int(a), Value::Int(b)) => a.cmp(&b),
                (Value::Str(a), Value::Str(b)) => a.cmp(&b),
                _ => return Err(format!("invalid operation: operator {} not defined on {}", cmp, ty.describe())),
            };
            let result = match cmp {
                "<" => ordering.is_lt(),
                "<=" => ordering.is_le(),
                ">" => ordering.is_gt(),
                _ => ordering.is_ge(),
            };
            return Ok((Value::Bool(result), ConstType::Untyped(Untyped::Bool)));
        }
        ("&&", Value::Bool(a), Value::Bool(b)) => Value::Bool(a && b),
        ("||", Value::Bool(a), Value::Bool(b)) => Value::Bool(a || b),
        ("+", Value::Str(a), Value::Str(b)) => Value::Str(a + &b),
        (_, Value::Float(_), _) | (_, _, Value::Float(_)) => {
            return Err("floating-point constant arithmetic is not evaluated".to_string())
        }
        (op, Value::Int(a), Value::Int(b)) => Value::Int(match op {
            "+" => a.checked_add(b).ok_or_else(overflow)?,
            "-" => a.checked_sub(b).ok_or_else(overflow)?,
            "*" => a.checked_mul(b).ok_or_else(overflow)?,
            "/" | "%" if b == 0 => return Err("invalid operation: division by zero".to_string()),
            "/" => a.checked_div(b).ok_or_else(overflow)?,
            "%" => a.checked_rem(b).ok_or_else(overflow)?,
            "&" => a & b,
            "|" => a | b,
            "^" => a ^ b,
            "&^" => a & !b,
            _ => return Err(format!("invalid operation: operator {} not defined on {}", op, ty.describe())),
        }),
        (op, _, _) => {
            return Err(format!("invalid operation: operator {} not defined on {}", op, ty.describe()))
        }
    };
    fit(value, ty)
}
