//! Code emission for constant groups.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐     ┌──────────────────┐
//! │   strategy.rs    │     │      ir.rs       │     │      go.rs       │
//! │ ──────────────── │ ──▶ │ ──────────────── │ ──▶ │ ──────────────── │
//! │ KindStrategy per │     │ Method / Stmt /  │     │ TargetSyntax for │
//! │ UnderlyingKind   │     │ Operand          │     │ Go source        │
//! └──────────────────┘     └──────────────────┘     └──────────────────┘
//! ```
//!
//! A [`Renderer`] owns its syntax and strategies; nothing is shared between
//! runs. Per group it emits, in order: `Name`, `Lookup`, `IsValid`, `String`,
//! then `MarshalText`/`UnmarshalText` when marshaling is requested and `Set`
//! when the settable-value capability is requested.

pub mod go;
pub mod ir;
pub mod strategy;

#[cfg(test)]
pub(crate) mod eval;

use std::fmt;

use tracing::debug;

use crate::error::{EnumgenError, EnumgenResult};
use crate::model::ConstantGroup;

pub use go::GoSyntax;
pub use ir::{Method, Routine};
pub use strategy::{IntegerStrategy, KindStrategy, StringStrategy};

/// Marker returned by `String()` for undeclared values.
pub const UNKNOWN_MARKER: &str = "<unknown>";

/// Target-language rules used to print routines.
pub trait TargetSyntax {
    /// Short name of the target, for diagnostics.
    fn name(&self) -> &'static str;

    /// Whether `name` can be used verbatim as an identifier.
    fn is_identifier(&self, name: &str) -> bool;

    /// Quotes text as a string literal.
    fn quote(&self, text: &str) -> String;

    /// Turns text into a line comment.
    fn comment(&self, text: &str) -> String;

    /// Prints one method declaration for `type_name`.
    fn write_method(&self, out: &mut String, type_name: &str, method: &Method) -> fmt::Result;

    /// Identifiers the printed method binds or refers to besides the group's
    /// constants. A constant with one of these names would be shadowed.
    fn bound_names(&self, method: &Method) -> Vec<String>;
}

/// Generation options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Emit `MarshalText`/`UnmarshalText`
    pub emit_marshal: bool,
    /// Emit `Set`
    pub emit_settable: bool,
    /// Text `String()` returns for undeclared values
    pub unknown: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            emit_marshal: false,
            emit_settable: true,
            unknown: UNKNOWN_MARKER.to_string(),
        }
    }
}

/// Emits routines for constant groups.
pub struct Renderer {
    syntax: Box<dyn TargetSyntax>,
    strategies: Vec<Box<dyn KindStrategy>>,
    options: RenderOptions,
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("syntax", &self.syntax.name())
            .field(
                "kinds",
                &self.strategies.iter().map(|s| s.kind()).collect::<Vec<_>>(),
            )
            .field("options", &self.options)
            .finish()
    }
}

impl Renderer {
    /// Creates a renderer with no strategies registered.
    pub fn new(syntax: Box<dyn TargetSyntax>, options: RenderOptions) -> Self {
        Self {
            syntax,
            strategies: Vec::new(),
            options,
        }
    }

    /// Creates a Go renderer with the integer and string strategies.
    pub fn go(options: RenderOptions) -> Self {
        Self::new(Box::new(GoSyntax::default()), options)
            .with_strategy(IntegerStrategy)
            .with_strategy(StringStrategy)
    }

    /// Registers a strategy; a later registration for the same kind wins.
    pub fn with_strategy(mut self, strategy: impl KindStrategy + 'static) -> Self {
        self.strategies.retain(|s| s.kind() != strategy.kind());
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Builds the ordered method list for a group.
    pub fn plan(&self, group: &ConstantGroup) -> EnumgenResult<Vec<Method>> {
        let emitter = self
            .strategies
            .iter()
            .find(|s| s.kind() == group.kind)
            .ok_or_else(|| {
                EnumgenError::internal(format!(
                    "no {} strategy registered for {} kind of {}",
                    self.syntax.name(),
                    group.kind,
                    group.name
                ))
            })?;

        let mut methods = vec![
            strategy::label(group),
            strategy::lookup_by_label(group),
            strategy::is_valid(group),
            emitter.display(group, &self.options.unknown),
        ];
        if self.options.emit_marshal {
            methods.push(emitter.marshal_text(group));
            methods.push(emitter.unmarshal_text(group));
        }
        if self.options.emit_settable {
            methods.push(emitter.set(group));
        }
        Ok(methods)
    }

    /// Renders a group and appends it to `buf`.
    ///
    /// On error nothing is appended.
    pub fn render(&self, group: &ConstantGroup, buf: &mut String) -> EnumgenResult<()> {
        self.check_identifiers(group)?;
        let methods = self.plan(group)?;
        self.check_shadowing(group, &methods)?;

        let mut block = String::new();
        for method in &methods {
            self.syntax
                .write_method(&mut block, &group.name, method)
                .map_err(|e| {
                    EnumgenError::render(
                        &group.name,
                        format!("failed to write {}: {}", method.routine, e),
                    )
                })?;
        }

        debug!(
            type_name = %group.name,
            methods = methods.len(),
            bytes = block.len(),
            "Rendered constant group"
        );
        buf.push_str(&block);
        Ok(())
    }

    fn check_identifiers(&self, group: &ConstantGroup) -> EnumgenResult<()> {
        if !self.syntax.is_identifier(&group.name) {
            return Err(EnumgenError::render(
                &group.name,
                format!("{:?} is not a valid {} identifier", group.name, self.syntax.name()),
            ));
        }
        if let Some(bad) = group
            .values
            .iter()
            .find(|v| !self.syntax.is_identifier(&v.name))
        {
            return Err(EnumgenError::render(
                &group.name,
                format!(
                    "constant {:?} is not a valid {} identifier",
                    bad.name,
                    self.syntax.name()
                ),
            ));
        }
        Ok(())
    }

    fn check_shadowing(&self, group: &ConstantGroup, methods: &[Method]) -> EnumgenResult<()> {
        for method in methods {
            let bound = self.syntax.bound_names(method);
            if let Some(clash) = group.values.iter().find(|v| bound.contains(&v.name)) {
                return Err(EnumgenError::render(
                    &group.name,
                    format!(
                        "constant {} is shadowed by an identifier of the same name in generated {}",
                        clash.name, method.routine
                    ),
                ));
            }
        }
        Ok(())
    }
}
