//! Interpreter for generated methods, used by tests to check behaviour
//! (round trips, membership, `Set` semantics) without a Go toolchain.

use std::collections::HashMap;

use crate::model::{ConstantGroup, UnderlyingKind};

use super::ir::{Method, Operand, Routine, Stmt, Subject};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i128),
    Str(String),
    Bool(bool),
    Bytes(Vec<u8>),
    Nil,
    Error(String),
}

impl Value {
    pub fn text(s: &str) -> Self {
        Self::Str(s.to_string())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

enum Flow {
    Next,
    Return(Vec<Value>),
}

/// An enum value with the generated methods attached.
pub struct Machine<'a> {
    group: &'a ConstantGroup,
    methods: HashMap<Routine, &'a Method>,
    pub receiver: Value,
}

impl<'a> Machine<'a> {
    pub fn new(group: &'a ConstantGroup, methods: &'a [Method], receiver: Value) -> Self {
        Self {
            group,
            methods: methods.iter().map(|m| (m.routine, m)).collect(),
            receiver,
        }
    }

    /// Value of a declared constant.
    pub fn constant(&self, name: &str) -> Value {
        let decl = self
            .group
            .values
            .iter()
            .find(|v| v.name == name)
            .unwrap_or_else(|| panic!("constant {} is not declared", name));
        self.literal(&decl.value)
    }

    fn literal(&self, text: &str) -> Value {
        match self.group.kind {
            UnderlyingKind::IntegerLike => Value::Int(text.parse().expect("integer literal")),
            UnderlyingKind::StringLike => Value::text(text),
        }
    }

    pub fn has(&self, routine: Routine) -> bool {
        self.methods.contains_key(&routine)
    }

    /// Calls a generated method on the current receiver.
    pub fn call(&mut self, routine: Routine, args: &[Value]) -> Vec<Value> {
        let method = *self
            .methods
            .get(&routine)
            .unwrap_or_else(|| panic!("{} was not generated", routine));
        assert_eq!(method.params.len(), args.len(), "arity of {}", routine);

        let env: HashMap<&str, Value> = method
            .params
            .iter()
            .map(|p| p.name)
            .zip(args.iter().cloned())
            .collect();

        match self.exec(&method.body, &env) {
            Flow::Return(values) => values,
            Flow::Next => panic!("{} fell off the end", routine),
        }
    }

    fn exec(&mut self, stmts: &[Stmt], env: &HashMap<&str, Value>) -> Flow {
        for stmt in stmts {
            if let Flow::Return(values) = self.step(stmt, env) {
                return Flow::Return(values);
            }
        }
        Flow::Next
    }

    fn step(&mut self, stmt: &Stmt, env: &HashMap<&str, Value>) -> Flow {
        match stmt {
            Stmt::Switch {
                subject,
                arms,
                default,
            } => {
                let subject = match subject {
                    Subject::Receiver => self.receiver.clone(),
                    Subject::Param(name) => env[name].clone(),
                    Subject::ParamText(name) => match &env[name] {
                        Value::Bytes(b) => Value::Str(String::from_utf8_lossy(b).into_owned()),
                        other => other.clone(),
                    },
                };
                let arm = arms
                    .iter()
                    .find(|arm| arm.cases.iter().any(|c| self.operand(c) == subject));
                match arm {
                    Some(arm) => self.exec(&arm.body, env),
                    None => self.exec(default, env),
                }
            }
            Stmt::Return(ops) => Flow::Return(ops.iter().map(|o| self.operand(o)).collect()),
            Stmt::Fail { zero, failure } => {
                let mut values: Vec<Value> = zero.iter().map(|o| self.operand(o)).collect();
                values.push(Value::Error(format!("{:?}", failure.action)));
                Flow::Return(values)
            }
            Stmt::Assign(op) => {
                self.receiver = self.operand(op);
                Flow::Next
            }
            Stmt::ParseIntInto { param } => {
                let Value::Str(s) = &env[param] else {
                    panic!("{} is not text", param);
                };
                match s.parse::<i64>() {
                    Ok(n) => {
                        self.receiver = Value::Int(n as i128);
                        Flow::Next
                    }
                    Err(e) => Flow::Return(vec![Value::Error(e.to_string())]),
                }
            }
            Stmt::ConvertInto { param } => {
                self.receiver = env[param].clone();
                Flow::Next
            }
            Stmt::RequireValid { failure } => {
                if self.call(Routine::IsValid, &[]) == vec![Value::Bool(true)] {
                    Flow::Next
                } else {
                    Flow::Return(vec![Value::Error(format!("{:?}", failure.action))])
                }
            }
        }
    }

    fn operand(&self, op: &Operand) -> Value {
        match op {
            Operand::Constant(name) => self.constant(name),
            Operand::Text(text) => Value::text(text),
            Operand::Literal(text) => self.literal(text),
            Operand::Bool(b) => Value::Bool(*b),
            Operand::Nil => Value::Nil,
            Operand::Bytes(inner) => match self.operand(inner) {
                Value::Str(s) => Value::Bytes(s.into_bytes()),
                other => panic!("cannot convert {:?} to bytes", other),
            },
        }
    }
}
