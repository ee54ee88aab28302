//! Target-neutral description of generated methods.
//!
//! Strategies describe each routine as a [`Method`] made of switches, returns
//! and receiver assignments. A [`TargetSyntax`](super::TargetSyntax) prints
//! them; tests execute them directly.

use std::fmt;

use crate::model::UnderlyingKind;

/// The routines a constant group can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Routine {
    /// Declared identifier for a value
    Label,
    /// Value for a declared identifier
    LookupByLabel,
    /// Membership predicate
    IsValid,
    /// Human-readable representation
    Display,
    /// Value to text
    MarshalText,
    /// Text to value
    UnmarshalText,
    /// Settable-value capability
    Set,
}

impl Routine {
    /// Method name in generated code.
    pub fn method_name(self) -> &'static str {
        match self {
            Self::Label => "Name",
            Self::LookupByLabel => "Lookup",
            Self::IsValid => "IsValid",
            Self::Display => "String",
            Self::MarshalText => "MarshalText",
            Self::UnmarshalText => "UnmarshalText",
            Self::Set => "Set",
        }
    }
}

impl fmt::Display for Routine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method_name())
    }
}

/// How the method receives its subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverMode {
    Value,
    Pointer,
}

/// Types appearing in signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// The enum type itself
    SelfType,
    Text,
    Bool,
    Bytes,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: &'static str,
    pub ty: ValueType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSlot {
    pub name: Option<&'static str>,
    pub ty: ValueType,
}

impl ResultSlot {
    pub fn unnamed(ty: ValueType) -> Self {
        Self { name: None, ty }
    }

    pub fn named(name: &'static str, ty: ValueType) -> Self {
        Self {
            name: Some(name),
            ty,
        }
    }
}

/// One generated method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub routine: Routine,
    pub doc: String,
    pub receiver: ReceiverMode,
    pub params: Vec<Param>,
    pub results: Vec<ResultSlot>,
    pub body: Vec<Stmt>,
}

/// What a switch dispatches on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    Receiver,
    Param(&'static str),
    /// A byte-slice parameter viewed as text
    ParamText(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arm {
    pub cases: Vec<Operand>,
    pub body: Vec<Stmt>,
}

/// Operation a generated error message refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAction {
    Marshal,
    Unmarshal,
    Set,
}

/// Offending value reported by a generated error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailValue {
    /// The receiver, printed in its underlying representation
    Receiver(UnderlyingKind),
    Param(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub action: FailAction,
    pub value: FailValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Switch {
        subject: Subject,
        arms: Vec<Arm>,
        default: Vec<Stmt>,
    },
    Return(Vec<Operand>),
    /// Return the given zero values followed by an error
    Fail {
        zero: Vec<Operand>,
        failure: Failure,
    },
    /// Store into the receiver
    Assign(Operand),
    /// Parse a base-10 64-bit integer parameter into the receiver, returning
    /// the parse error on failure
    ParseIntInto { param: &'static str },
    /// Convert a text parameter into the receiver
    ConvertInto { param: &'static str },
    /// Fail unless the receiver is a declared value
    RequireValid { failure: Failure },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// A declared constant by identifier
    Constant(String),
    /// Text literal, quoted by the target syntax
    Text(String),
    /// Numeric literal written verbatim
    Literal(String),
    Bool(bool),
    Nil,
    /// Conversion of an operand to bytes
    Bytes(Box<Operand>),
}

impl Operand {
    pub fn constant(name: impl Into<String>) -> Self {
        Self::Constant(name.into())
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn bytes(inner: Operand) -> Self {
        Self::Bytes(Box::new(inner))
    }
}
