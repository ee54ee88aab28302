//! Routine construction per underlying kind.
//!
//! Shared routines (`Name`, `Lookup`, `IsValid`) are identical for every kind
//! apart from the empty literal. Everything else differs between integer and
//! string groups and lives behind [`KindStrategy`].
//!
//! Value-keyed switches use [`ConstantGroup::distinct_values`] so aliased
//! constants never produce duplicate cases; label-keyed switches list every
//! constant.

use crate::model::{ConstantGroup, UnderlyingKind};

use super::ir::{
    Arm, FailAction, FailValue, Failure, Method, Operand, Param, ReceiverMode, ResultSlot, Routine,
    Stmt, Subject, ValueType,
};

/// Kind-specific routine builder.
pub trait KindStrategy {
    /// The kind this strategy emits for.
    fn kind(&self) -> UnderlyingKind;

    /// `String()`: representation of a value, `unknown` for undeclared ones.
    fn display(&self, group: &ConstantGroup, unknown: &str) -> Method;

    /// `MarshalText()`.
    fn marshal_text(&self, group: &ConstantGroup) -> Method;

    /// `UnmarshalText(text)`.
    fn unmarshal_text(&self, group: &ConstantGroup) -> Method;

    /// `Set(s)` settable-value capability.
    fn set(&self, group: &ConstantGroup) -> Method;
}

/// Zero value of the group's representation as an operand.
pub fn empty_operand(group: &ConstantGroup) -> Operand {
    match group.kind {
        UnderlyingKind::IntegerLike => Operand::Literal(group.empty_literal.clone()),
        UnderlyingKind::StringLike => Operand::text(group.empty_literal.clone()),
    }
}

/// `Name()`: the declared identifier, or empty text.
pub fn label(group: &ConstantGroup) -> Method {
    let arms = group
        .distinct_values()
        .into_iter()
        .map(|v| Arm {
            cases: vec![Operand::constant(&v.name)],
            body: vec![Stmt::Return(vec![Operand::text(&v.name)])],
        })
        .collect();

    Method {
        routine: Routine::Label,
        doc: "Name returns the identifier the value was declared with, or \"\" if it is not a declared value."
            .to_string(),
        receiver: ReceiverMode::Value,
        params: Vec::new(),
        results: vec![ResultSlot::unnamed(ValueType::Text)],
        body: vec![Stmt::Switch {
            subject: Subject::Receiver,
            arms,
            default: vec![Stmt::Return(vec![Operand::text("")])],
        }],
    }
}

/// `Lookup(name)`: the constant declared as `name`, and whether it exists.
pub fn lookup_by_label(group: &ConstantGroup) -> Method {
    let arms = group
        .values
        .iter()
        .map(|v| Arm {
            cases: vec![Operand::text(&v.name)],
            body: vec![Stmt::Return(vec![
                Operand::constant(&v.name),
                Operand::Bool(true),
            ])],
        })
        .collect();

    Method {
        routine: Routine::LookupByLabel,
        doc: format!(
            "Lookup returns the {} declared with the given identifier, and whether one was found.",
            group.name
        ),
        receiver: ReceiverMode::Value,
        params: vec![Param {
            name: "name",
            ty: ValueType::Text,
        }],
        results: vec![
            ResultSlot::named("value", ValueType::SelfType),
            ResultSlot::named("ok", ValueType::Bool),
        ],
        body: vec![Stmt::Switch {
            subject: Subject::Param("name"),
            arms,
            default: vec![Stmt::Return(vec![empty_operand(group), Operand::Bool(false)])],
        }],
    }
}

/// `IsValid()`: membership predicate.
pub fn is_valid(group: &ConstantGroup) -> Method {
    let cases: Vec<Operand> = group
        .distinct_values()
        .into_iter()
        .map(|v| Operand::constant(&v.name))
        .collect();

    let arms = if cases.is_empty() {
        Vec::new()
    } else {
        vec![Arm {
            cases,
            body: vec![Stmt::Return(vec![Operand::Bool(true)])],
        }]
    };

    Method {
        routine: Routine::IsValid,
        doc: format!("IsValid reports whether the value is one of the declared {} values.", group.name),
        receiver: ReceiverMode::Value,
        params: Vec::new(),
        results: vec![ResultSlot::unnamed(ValueType::Bool)],
        body: vec![Stmt::Switch {
            subject: Subject::Receiver,
            arms,
            default: vec![Stmt::Return(vec![Operand::Bool(false)])],
        }],
    }
}

fn string_method(doc: &str, body: Vec<Stmt>) -> Method {
    Method {
        routine: Routine::Display,
        doc: doc.to_string(),
        receiver: ReceiverMode::Value,
        params: Vec::new(),
        results: vec![ResultSlot::unnamed(ValueType::Text)],
        body,
    }
}

fn marshal_method(body: Vec<Stmt>) -> Method {
    Method {
        routine: Routine::MarshalText,
        doc: "MarshalText implements encoding.TextMarshaler.".to_string(),
        receiver: ReceiverMode::Value,
        params: Vec::new(),
        results: vec![
            ResultSlot::named("text", ValueType::Bytes),
            ResultSlot::named("err", ValueType::Error),
        ],
        body,
    }
}

fn unmarshal_method(arms: Vec<Arm>) -> Method {
    Method {
        routine: Routine::UnmarshalText,
        doc: "UnmarshalText implements encoding.TextUnmarshaler.".to_string(),
        receiver: ReceiverMode::Pointer,
        params: vec![Param {
            name: "text",
            ty: ValueType::Bytes,
        }],
        results: vec![ResultSlot::named("err", ValueType::Error)],
        body: vec![
            Stmt::Switch {
                subject: Subject::ParamText("text"),
                arms,
                default: vec![Stmt::Fail {
                    zero: Vec::new(),
                    failure: Failure {
                        action: FailAction::Unmarshal,
                        value: FailValue::Param("text"),
                    },
                }],
            },
            Stmt::Return(vec![Operand::Nil]),
        ],
    }
}

fn set_method(doc: &str, body: Vec<Stmt>) -> Method {
    Method {
        routine: Routine::Set,
        doc: doc.to_string(),
        receiver: ReceiverMode::Pointer,
        params: vec![Param {
            name: "s",
            ty: ValueType::Text,
        }],
        results: vec![ResultSlot::unnamed(ValueType::Error)],
        body,
    }
}

fn marshal_failure(kind: UnderlyingKind) -> Stmt {
    Stmt::Fail {
        zero: vec![Operand::Nil],
        failure: Failure {
            action: FailAction::Marshal,
            value: FailValue::Receiver(kind),
        },
    }
}

/// Integer-backed groups.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerStrategy;

impl KindStrategy for IntegerStrategy {
    fn kind(&self) -> UnderlyingKind {
        UnderlyingKind::IntegerLike
    }

    fn display(&self, group: &ConstantGroup, unknown: &str) -> Method {
        let arms = group
            .distinct_values()
            .into_iter()
            .map(|v| Arm {
                cases: vec![Operand::constant(&v.name)],
                body: vec![Stmt::Return(vec![Operand::text(format!(
                    "{}({})",
                    v.name, v.value
                ))])],
            })
            .collect();

        string_method(
            "String implements fmt.Stringer, formatting declared values as Name(value).",
            vec![Stmt::Switch {
                subject: Subject::Receiver,
                arms,
                default: vec![Stmt::Return(vec![Operand::text(unknown)])],
            }],
        )
    }

    fn marshal_text(&self, group: &ConstantGroup) -> Method {
        let arms = group
            .distinct_values()
            .into_iter()
            .map(|v| Arm {
                cases: vec![Operand::constant(&v.name)],
                body: vec![Stmt::Return(vec![
                    Operand::bytes(Operand::text(&v.value)),
                    Operand::Nil,
                ])],
            })
            .collect();

        marshal_method(vec![Stmt::Switch {
            subject: Subject::Receiver,
            arms,
            default: vec![marshal_failure(self.kind())],
        }])
    }

    /// Accepts any declared label or the literal value text.
    fn unmarshal_text(&self, group: &ConstantGroup) -> Method {
        let arms = group
            .distinct_values()
            .into_iter()
            .map(|first| {
                let mut cases: Vec<Operand> = group
                    .values
                    .iter()
                    .filter(|v| v.value == first.value)
                    .map(|v| Operand::text(&v.name))
                    .collect();
                cases.push(Operand::text(&first.value));
                Arm {
                    cases,
                    body: vec![Stmt::Assign(Operand::constant(&first.name))],
                }
            })
            .collect();

        unmarshal_method(arms)
    }

    /// Parses base-10 and assigns without a membership check.
    fn set(&self, _group: &ConstantGroup) -> Method {
        set_method(
            "Set implements flag.Value. Any base-10 integer is accepted; use IsValid to check membership.",
            vec![
                Stmt::ParseIntInto { param: "s" },
                Stmt::Return(vec![Operand::Nil]),
            ],
        )
    }
}

/// String-backed groups.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringStrategy;

impl KindStrategy for StringStrategy {
    fn kind(&self) -> UnderlyingKind {
        UnderlyingKind::StringLike
    }

    fn display(&self, group: &ConstantGroup, unknown: &str) -> Method {
        let arms = group
            .distinct_values()
            .into_iter()
            .map(|v| Arm {
                cases: vec![Operand::constant(&v.name)],
                body: vec![Stmt::Return(vec![Operand::text(&v.name)])],
            })
            .collect();

        string_method(
            "String implements fmt.Stringer, formatting declared values by identifier.",
            vec![Stmt::Switch {
                subject: Subject::Receiver,
                arms,
                default: vec![Stmt::Return(vec![Operand::text(unknown)])],
            }],
        )
    }

    fn marshal_text(&self, group: &ConstantGroup) -> Method {
        let arms = group
            .distinct_values()
            .into_iter()
            .map(|v| Arm {
                cases: vec![Operand::constant(&v.name)],
                body: vec![Stmt::Return(vec![
                    Operand::bytes(Operand::constant(&v.name)),
                    Operand::Nil,
                ])],
            })
            .collect();

        marshal_method(vec![Stmt::Switch {
            subject: Subject::Receiver,
            arms,
            default: vec![marshal_failure(self.kind())],
        }])
    }

    /// Accepts the literal value text only.
    fn unmarshal_text(&self, group: &ConstantGroup) -> Method {
        let arms = group
            .distinct_values()
            .into_iter()
            .map(|v| Arm {
                cases: vec![Operand::text(&v.value)],
                body: vec![Stmt::Assign(Operand::constant(&v.name))],
            })
            .collect();

        unmarshal_method(arms)
    }

    /// Assigns the raw input, then validates. The receiver keeps the invalid
    /// input when validation fails.
    fn set(&self, _group: &ConstantGroup) -> Method {
        set_method(
            "Set implements flag.Value, rejecting undeclared values.",
            vec![
                Stmt::ConvertInto { param: "s" },
                Stmt::RequireValid {
                    failure: Failure {
                        action: FailAction::Set,
                        value: FailValue::Param("s"),
                    },
                },
                Stmt::Return(vec![Operand::Nil]),
            ],
        )
    }
}
