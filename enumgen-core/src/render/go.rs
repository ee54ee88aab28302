//! Go syntax for generated methods.
//!
//! Output is already in gofmt layout (tab indentation, `case` aligned with
//! `switch`), so the built-in formatter only has to add imports.

use std::fmt::{self, Write};

use crate::model::UnderlyingKind;

use super::ir::{
    FailAction, FailValue, Failure, Method, Operand, ReceiverMode, ResultSlot, Stmt, Subject,
    ValueType,
};
use super::TargetSyntax;

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

/// Predeclared names and packages the printed code refers to.
const REFERENCED: &[&str] = &[
    "bool", "byte", "error", "false", "fmt", "nil", "strconv", "string", "true",
];

/// Locals declared when printing [`Stmt::ParseIntInto`].
const LOCALS: &[&str] = &["err", "parsed"];

/// Go emission rules.
#[derive(Debug, Clone)]
pub struct GoSyntax {
    receiver: String,
}

impl Default for GoSyntax {
    fn default() -> Self {
        Self {
            receiver: "v".to_string(),
        }
    }
}

impl GoSyntax {
    /// Uses a custom receiver identifier instead of `v`.
    pub fn with_receiver(receiver: impl Into<String>) -> Self {
        Self {
            receiver: receiver.into(),
        }
    }

    fn type_name(&self, ty: ValueType, self_type: &str) -> String {
        match ty {
            ValueType::SelfType => self_type.to_string(),
            ValueType::Text => "string".to_string(),
            ValueType::Bool => "bool".to_string(),
            ValueType::Bytes => "[]byte".to_string(),
            ValueType::Error => "error".to_string(),
        }
    }

    fn results(&self, results: &[ResultSlot], self_type: &str) -> String {
        match results {
            [] => String::new(),
            [ResultSlot { name: None, ty }] => format!(" {}", self.type_name(*ty, self_type)),
            slots => {
                let parts: Vec<String> = slots
                    .iter()
                    .map(|slot| match slot.name {
                        Some(name) => format!("{} {}", name, self.type_name(slot.ty, self_type)),
                        None => self.type_name(slot.ty, self_type),
                    })
                    .collect();
                format!(" ({})", parts.join(", "))
            }
        }
    }

    fn operand(&self, op: &Operand) -> String {
        match op {
            Operand::Constant(name) => name.clone(),
            Operand::Text(text) => self.quote(text),
            Operand::Literal(lit) => lit.clone(),
            Operand::Bool(b) => b.to_string(),
            Operand::Nil => "nil".to_string(),
            Operand::Bytes(inner) => format!("[]byte({})", self.operand(inner)),
        }
    }

    fn subject(&self, subject: &Subject) -> String {
        match subject {
            Subject::Receiver => self.receiver.clone(),
            Subject::Param(name) => name.to_string(),
            Subject::ParamText(name) => format!("string({})", name),
        }
    }

    /// `fmt.Errorf(...)` call describing a failure.
    fn errorf(&self, failure: &Failure) -> String {
        let recv = &self.receiver;
        let (verb, arg) = match failure.value {
            FailValue::Receiver(UnderlyingKind::IntegerLike) => ("%d", recv.clone()),
            FailValue::Receiver(UnderlyingKind::StringLike) => ("%q", format!("string({})", recv)),
            FailValue::Param(name) => ("%q", name.to_string()),
        };
        let message = match failure.action {
            FailAction::Marshal => format!("could not marshal enum %T containing invalid value {}", verb),
            FailAction::Unmarshal => format!("could not unmarshal enum %T from invalid value {}", verb),
            FailAction::Set => format!("enum %T received invalid value {}", verb),
        };
        format!("fmt.Errorf({}, {}, {})", self.quote(&message), recv, arg)
    }

    fn write_stmts(
        &self,
        out: &mut String,
        stmts: &[Stmt],
        depth: usize,
        self_type: &str,
    ) -> fmt::Result {
        for stmt in stmts {
            self.write_stmt(out, stmt, depth, self_type)?;
        }
        Ok(())
    }

    fn write_stmt(&self, out: &mut String, stmt: &Stmt, depth: usize, self_type: &str) -> fmt::Result {
        let ind = "\t".repeat(depth);
        let recv = &self.receiver;
        match stmt {
            Stmt::Switch {
                subject,
                arms,
                default,
            } => {
                writeln!(out, "{}switch {} {{", ind, self.subject(subject))?;
                for arm in arms {
                    let cases: Vec<String> = arm.cases.iter().map(|c| self.operand(c)).collect();
                    writeln!(out, "{}case {}:", ind, cases.join(", "))?;
                    self.write_stmts(out, &arm.body, depth + 1, self_type)?;
                }
                writeln!(out, "{}default:", ind)?;
                self.write_stmts(out, default, depth + 1, self_type)?;
                writeln!(out, "{}}}", ind)?;
            }
            Stmt::Return(ops) if ops.is_empty() => writeln!(out, "{}return", ind)?,
            Stmt::Return(ops) => {
                let ops: Vec<String> = ops.iter().map(|o| self.operand(o)).collect();
                writeln!(out, "{}return {}", ind, ops.join(", "))?;
            }
            Stmt::Fail { zero, failure } => {
                let mut ops: Vec<String> = zero.iter().map(|o| self.operand(o)).collect();
                ops.push(self.errorf(failure));
                writeln!(out, "{}return {}", ind, ops.join(", "))?;
            }
            Stmt::Assign(op) => writeln!(out, "{}*{} = {}", ind, recv, self.operand(op))?,
            Stmt::ParseIntInto { param } => {
                writeln!(out, "{}parsed, err := strconv.ParseInt({}, 10, 64)", ind, param)?;
                writeln!(out, "{}if err != nil {{", ind)?;
                writeln!(out, "{}\treturn err", ind)?;
                writeln!(out, "{}}}", ind)?;
                writeln!(out, "{}*{} = {}(parsed)", ind, recv, self_type)?;
            }
            Stmt::ConvertInto { param } => {
                writeln!(out, "{}*{} = {}({})", ind, recv, self_type, param)?;
            }
            Stmt::RequireValid { failure } => {
                writeln!(out, "{}if !{}.IsValid() {{", ind, recv)?;
                writeln!(out, "{}\treturn {}", ind, self.errorf(failure))?;
                writeln!(out, "{}}}", ind)?;
            }
        }
        Ok(())
    }
}

impl TargetSyntax for GoSyntax {
    fn name(&self) -> &'static str {
        "go"
    }

    fn bound_names(&self, method: &Method) -> Vec<String> {
        let mut names = vec![self.receiver.clone()];
        names.extend(method.params.iter().map(|p| p.name.to_string()));
        names.extend(method.results.iter().filter_map(|r| r.name).map(str::to_string));
        names.extend(REFERENCED.iter().map(|n| n.to_string()));
        if method.body.iter().any(|s| matches!(s, Stmt::ParseIntInto { .. })) {
            names.extend(LOCALS.iter().map(|n| n.to_string()));
        }
        names
    }

    fn is_identifier(&self, name: &str) -> bool {
        let mut chars = name.chars();
        let Some(first) = chars.next() else {
            return false;
        };
        (first == '_' || first.is_alphabetic())
            && chars.all(|c| c == '_' || c.is_alphanumeric())
            && name != "_"
            && !KEYWORDS.contains(&name)
    }

    /// Double-quoted Go string literal with the escapes `strconv.Quote` uses.
    fn quote(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len() + 2);
        out.push('"');
        for c in text.chars() {
            match c {
                '"' => out.push_str("\\\""),
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                '\u{07}' => out.push_str("\\a"),
                '\u{08}' => out.push_str("\\b"),
                '\u{0C}' => out.push_str("\\f"),
                '\u{0B}' => out.push_str("\\v"),
                c if (c as u32) < 0x80 && c.is_control() => {
                    let _ = write!(out, "\\x{:02x}", c as u32);
                }
                c if c.is_control() && (c as u32) <= 0xFFFF => {
                    let _ = write!(out, "\\u{:04x}", c as u32);
                }
                c if c.is_control() => {
                    let _ = write!(out, "\\U{:08x}", c as u32);
                }
                c => out.push(c),
            }
        }
        out.push('"');
        out
    }

    fn comment(&self, text: &str) -> String {
        text.lines()
            .map(|line| format!("// {}", line).trim_end().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn write_method(&self, out: &mut String, type_name: &str, method: &Method) -> fmt::Result {
        let recv = match method.receiver {
            ReceiverMode::Value => format!("{} {}", self.receiver, type_name),
            ReceiverMode::Pointer => format!("{} *{}", self.receiver, type_name),
        };
        let params: Vec<String> = method
            .params
            .iter()
            .map(|p| format!("{} {}", p.name, self.type_name(p.ty, type_name)))
            .collect();

        writeln!(out)?;
        writeln!(out, "{}", self.comment(&method.doc))?;
        writeln!(
            out,
            "func ({}) {}({}){} {{",
            recv,
            method.routine.method_name(),
            params.join(", "),
            self.results(&method.results, type_name)
        )?;
        self.write_stmts(out, &method.body, 1, type_name)?;
        writeln!(out, "}}")
    }
}
