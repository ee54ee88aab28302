//! Data model shared by providers, the extractor and the renderer.
//!
//! A [`PackageInfo`] is the read-only symbol table produced once per run by a
//! [`SymbolProvider`](crate::provider::SymbolProvider). The extractor turns one
//! named type from it into a [`ConstantGroup`], which the renderer consumes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Symbol table for a single package.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageInfo {
    /// Full import path, e.g. `example.com/shapes/color`
    pub path: String,
    /// Short package name used in the `package` clause
    pub name: String,
    /// Package-scope declarations keyed by identifier
    pub symbols: HashMap<String, Symbol>,
}

impl PackageInfo {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            symbols: HashMap::new(),
        }
    }

    /// Adds (or replaces) a symbol.
    pub fn insert(&mut self, symbol: Symbol) {
        self.symbols.insert(symbol.name.clone(), symbol);
    }

    /// Fully-qualified name of a type declared in this package.
    pub fn qualify(&self, type_name: &str) -> String {
        format!("{}.{}", self.path, type_name)
    }

    /// Declares a named type with the given underlying representation.
    pub fn with_type(mut self, name: &str, underlying: Underlying) -> Self {
        self.insert(Symbol::named_type(name, underlying));
        self
    }

    /// Declares a constant typed against a type declared in this package.
    pub fn with_const(mut self, name: &str, type_name: &str, value: ConstLiteral) -> Self {
        let ty = TypeRef::new(self.qualify(type_name));
        self.insert(Symbol::constant(name, ty, value));
        self
    }
}

/// One package-scope declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
}

impl Symbol {
    pub fn named_type(name: impl Into<String>, underlying: Underlying) -> Self {
        Self {
            name: name.into(),
            kind: SymbolKind::Type { underlying },
        }
    }

    pub fn constant(name: impl Into<String>, ty: TypeRef, value: ConstLiteral) -> Self {
        Self {
            name: name.into(),
            kind: SymbolKind::Const { ty, value },
        }
    }

    pub fn is_const(&self) -> bool {
        matches!(self.kind, SymbolKind::Const { .. })
    }
}

/// What a symbol declares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SymbolKind {
    /// A defined (named) type
    Type { underlying: Underlying },
    /// A constant with its declared type and exact value
    Const { ty: TypeRef, value: ConstLiteral },
    /// Variables, functions and anything else the extractor ignores
    Other,
}

/// Identity of a type as a string: `<path>.<Name>` for declared types,
/// the predeclared name (`int`, `string`) for basic types, or
/// `untyped <kind>` for untyped constants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeRef(pub String);

impl TypeRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn untyped(basic: BasicType) -> Self {
        Self(format!("untyped {}", basic.family()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Underlying representation of a named type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Underlying {
    /// A predeclared scalar type
    Basic(BasicType),
    /// Struct, slice, map, pointer, func, interface, ... (described textually)
    Composite(String),
    /// A type from another package whose representation was not loaded
    Unresolved(String),
}

impl fmt::Display for Underlying {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic(b) => write!(f, "{}", b),
            Self::Composite(desc) | Self::Unresolved(desc) => f.write_str(desc),
        }
    }
}

/// Predeclared scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BasicType {
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
    Bool,
}

/// Coarse family of a basic type, the part classification cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasicFamily {
    Integer,
    Float,
    Complex,
    String,
    Bool,
}

impl fmt::Display for BasicFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Integer => "int",
            Self::Float => "float",
            Self::Complex => "complex",
            Self::String => "string",
            Self::Bool => "bool",
        };
        f.write_str(s)
    }
}

impl BasicType {
    /// Resolves a predeclared type name, including the `byte` and `rune` aliases.
    pub fn from_name(name: &str) -> Option<Self> {
        let basic = match name {
            "int" => Self::Int,
            "int8" => Self::Int8,
            "int16" => Self::Int16,
            "int32" | "rune" => Self::Int32,
            "int64" => Self::Int64,
            "uint" => Self::Uint,
            "uint8" | "byte" => Self::Uint8,
            "uint16" => Self::Uint16,
            "uint32" => Self::Uint32,
            "uint64" => Self::Uint64,
            "uintptr" => Self::Uintptr,
            "float32" => Self::Float32,
            "float64" => Self::Float64,
            "complex64" => Self::Complex64,
            "complex128" => Self::Complex128,
            "string" => Self::String,
            "bool" => Self::Bool,
            _ => return None,
        };
        Some(basic)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint => "uint",
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Uintptr => "uintptr",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Complex64 => "complex64",
            Self::Complex128 => "complex128",
            Self::String => "string",
            Self::Bool => "bool",
        }
    }

    pub fn family(self) -> BasicFamily {
        match self {
            Self::Int
            | Self::Int8
            | Self::Int16
            | Self::Int32
            | Self::Int64
            | Self::Uint
            | Self::Uint8
            | Self::Uint16
            | Self::Uint32
            | Self::Uint64
            | Self::Uintptr => BasicFamily::Integer,
            Self::Float32 | Self::Float64 => BasicFamily::Float,
            Self::Complex64 | Self::Complex128 => BasicFamily::Complex,
            Self::String => BasicFamily::String,
            Self::Bool => BasicFamily::Bool,
        }
    }
}

impl fmt::Display for BasicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Exact value of a constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ConstLiteral {
    Int(#[serde(with = "int_value")] i128),
    Str(String),
    Bool(bool),
    /// Float, complex or anything else kept only as source text
    Other(String),
}

impl ConstLiteral {
    /// The exact value as text: decimal digits for integers, raw content for strings.
    pub fn exact_string(&self) -> String {
        match self {
            Self::Int(n) => n.to_string(),
            Self::Str(s) => s.clone(),
            Self::Bool(b) => b.to_string(),
            Self::Other(text) => text.clone(),
        }
    }

    pub fn family(&self) -> Option<BasicFamily> {
        match self {
            Self::Int(_) => Some(BasicFamily::Integer),
            Self::Str(_) => Some(BasicFamily::String),
            Self::Bool(_) => Some(BasicFamily::Bool),
            Self::Other(_) => None,
        }
    }
}

/// Integer constants as JSON numbers when they fit in 64 bits, decimal text
/// otherwise. Adjacently tagged content is buffered by serde, and the buffer
/// has no 128-bit slot.
mod int_value {
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(value: &i128, serializer: S) -> Result<S::Ok, S::Error> {
        if let Ok(n) = i64::try_from(*value) {
            serializer.serialize_i64(n)
        } else if let Ok(n) = u64::try_from(*value) {
            serializer.serialize_u64(n)
        } else {
            serializer.serialize_str(&value.to_string())
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i128, D::Error> {
        deserializer.deserialize_any(IntVisitor)
    }

    struct IntVisitor;

    impl Visitor<'_> for IntVisitor {
        type Value = i128;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an integer or a decimal integer string")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<i128, E> {
            Ok(v.into())
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<i128, E> {
            Ok(v.into())
        }

        fn visit_i128<E: de::Error>(self, v: i128) -> Result<i128, E> {
            Ok(v)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<i128, E> {
            v.trim()
                .parse()
                .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
        }
    }
}

/// Representation family selecting the emission rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnderlyingKind {
    IntegerLike,
    StringLike,
}

impl UnderlyingKind {
    /// Zero value of the representation as written in generated code.
    pub fn empty_literal(self) -> &'static str {
        match self {
            Self::IntegerLike => "0",
            Self::StringLike => "",
        }
    }
}

impl fmt::Display for UnderlyingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IntegerLike => write!(f, "integer"),
            Self::StringLike => write!(f, "string"),
        }
    }
}

/// A declared constant inside a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstantValue {
    /// Declared identifier (the label)
    pub name: String,
    /// Exact underlying literal: decimal text or unquoted string content
    pub value: String,
}

impl ConstantValue {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Classified set of constants declared against one named scalar type.
///
/// Only the extractor builds these, so a group always has a fixed kind and
/// values sorted by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstantGroup {
    pub full_name: String,
    pub name: String,
    pub kind: UnderlyingKind,
    pub empty_literal: String,
    pub values: Vec<ConstantValue>,
}

impl ConstantGroup {
    /// Builds a group, imposing name order on the values.
    pub fn new(
        full_name: impl Into<String>,
        name: impl Into<String>,
        kind: UnderlyingKind,
        mut values: Vec<ConstantValue>,
    ) -> Self {
        values.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            full_name: full_name.into(),
            name: name.into(),
            kind,
            empty_literal: kind.empty_literal().to_string(),
            values,
        }
    }

    /// Values with distinct underlying literals, first by name wins.
    ///
    /// Value-keyed switches are built from this so aliases never produce
    /// duplicate cases.
    pub fn distinct_values(&self) -> Vec<&ConstantValue> {
        let mut seen = std::collections::HashSet::new();
        self.values
            .iter()
            .filter(|v| seen.insert(v.value.as_str()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_type_aliases() {
        assert_eq!(BasicType::from_name("byte"), Some(BasicType::Uint8));
        assert_eq!(BasicType::from_name("rune"), Some(BasicType::Int32));
        assert_eq!(BasicType::from_name("Color"), None);
    }

    #[test]
    fn test_basic_family() {
        assert_eq!(BasicType::Uintptr.family(), BasicFamily::Integer);
        assert_eq!(BasicType::String.family(), BasicFamily::String);
        assert_eq!(BasicType::Float64.family(), BasicFamily::Float);
        assert_eq!(BasicType::Bool.family(), BasicFamily::Bool);
    }

    #[test]
    fn test_group_sorts_by_name() {
        let group = ConstantGroup::new(
            "p.Color",
            "Color",
            UnderlyingKind::IntegerLike,
            vec![
                ConstantValue::new("Red", "1"),
                ConstantValue::new("Blue", "3"),
                ConstantValue::new("Green", "2"),
            ],
        );
        let names: Vec<_> = group.values.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["Blue", "Green", "Red"]);
        assert_eq!(group.empty_literal, "0");
    }

    #[test]
    fn test_distinct_values_keeps_first_alias() {
        let group = ConstantGroup::new(
            "p.Level",
            "Level",
            UnderlyingKind::IntegerLike,
            vec![
                ConstantValue::new("Warning", "2"),
                ConstantValue::new("Warn", "2"),
                ConstantValue::new("Info", "1"),
            ],
        );
        let distinct: Vec<_> = group.distinct_values().iter().map(|v| v.name.as_str()).collect();
        assert_eq!(distinct, vec!["Info", "Warn"]);
    }

    #[test]
    fn test_exact_string() {
        assert_eq!(ConstLiteral::Int(-4).exact_string(), "-4");
        assert_eq!(ConstLiteral::Str("a\"b".into()).exact_string(), "a\"b");
    }

    #[test]
    fn test_wide_integers_survive_json() {
        let pkg = PackageInfo::new("p", "p")
            .with_type("Mask", Underlying::Basic(BasicType::Uint64))
            .with_const("Low", "Mask", ConstLiteral::Int(-3))
            .with_const("All", "Mask", ConstLiteral::Int(u64::MAX as i128))
            .with_const("Huge", "Mask", ConstLiteral::Int(1 << 80));
        let json = serde_json::to_string(&pkg).unwrap();
        assert!(json.contains("\"value\":18446744073709551615"));
        assert!(json.contains("\"value\":\"1208925819614629174706176\""));
        let back: PackageInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pkg);
    }

    #[test]
    fn test_package_info_json_shape() {
        let pkg = PackageInfo::new("example.com/p", "p")
            .with_type("Color", Underlying::Basic(BasicType::Int))
            .with_const("Red", "Color", ConstLiteral::Int(1));
        let json = serde_json::to_string(&pkg).unwrap();
        let back: PackageInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pkg);
        assert_eq!(
            back.symbols["Red"].kind,
            SymbolKind::Const {
                ty: TypeRef::new("example.com/p.Color"),
                value: ConstLiteral::Int(1)
            }
        );
    }
}
