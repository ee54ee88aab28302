//! enumgen-core: enum-ish helper generation for Go constant groups
//!
//! Go has no enum types; a set of typed constants stands in for one:
//!
//! ```go
//! type Color int
//!
//! const (
//!     Red Color = iota + 1
//!     Green
//!     Blue
//! )
//! ```
//!
//! This library reads such a group and generates the methods that make it
//! behave like an enum: `Name`, `Lookup`, `IsValid`, `String`, and optionally
//! `Set` (flag.Value) and `MarshalText`/`UnmarshalText`.
//!
//! # Quick Start
//!
//! Use the [`prelude`] module for convenient imports:
//!
//! ```rust,ignore
//! use enumgen_core::prelude::*;
//!
//! let generated = Enumgen::new("./paint").generate(&["Color"])?;
//! write_output("paint/enum_gen.go", &generated.source)?;
//! ```
//!
//! # Module Organization
//!
//! - [`provider`]: Symbol providers (Go sources, JSON, fabricated tables)
//! - [`model`]: Symbol table and constant group types
//! - [`extract`]: Finds a named type and its constants, classifies the kind
//! - [`render`]: Method planning and Go code emission
//! - [`assemble`]: Banner, package clause and formatting of the output
//! - [`format`]: Output formatters (built-in and external command)
//! - [`persist`]: Change-detecting output writes
//! - [`builder`]: Fluent builder API for a whole run
//! - [`config`]: enumgen.toml loading
//! - [`error`]: Typed error handling
//!
//! # Cargo Features
//!
//! - `go-source` (default): Read Go package sources directly
//! - `command-format` (default): Run an external formatter such as gofmt
//! - `full`: Enable all optional features

pub mod assemble;
pub mod builder;
pub mod config;
pub mod error;
pub mod extract;
pub mod format;
pub mod logging;
pub mod model;
pub mod persist;
pub mod prelude;
pub mod provider;
pub mod render;
pub mod report;

// ============================================================================
// Explicit Re-exports (avoiding glob imports for clear API surface)
// ============================================================================

// Error types
pub use error::{EnumgenError, EnumgenResult, IoResultExt};

// Builder API
pub use builder::{Enumgen, Generated, GroupSummary, DEFAULT_OUTPUT};

// Data model
pub use model::{
    BasicFamily, BasicType, ConstLiteral, ConstantGroup, ConstantValue, PackageInfo, Symbol,
    SymbolKind, TypeRef, Underlying, UnderlyingKind,
};

// Pipeline stages
pub use assemble::{assemble, BANNER};
pub use extract::{classify, extract};
pub use render::{
    GoSyntax, KindStrategy, Method, RenderOptions, Renderer, Routine, TargetSyntax,
    UNKNOWN_MARKER,
};

// Providers
pub use provider::{parse_tags, JsonSymbolProvider, SymbolProvider};
#[cfg(feature = "go-source")]
pub use provider::GoSourceProvider;

// Formatting
pub use format::{Formatter, GoFormatter};
#[cfg(feature = "command-format")]
pub use format::CommandFormatter;

// Configuration
pub use config::{load_config, load_config_file, EnumgenConfig, FormatConfig, GenerateConfig};

// Output
pub use persist::{file_hash, hash_bytes, write_if_changed, write_output, WriteOutcome, STDOUT};

// Logging
pub use logging::{init_structured_logging, log_error, log_info, log_output, log_warn};

// Reporting
pub use report::{print_json, print_plain, render_json, render_plain, RunReport};

#[cfg(test)]
mod tests;
