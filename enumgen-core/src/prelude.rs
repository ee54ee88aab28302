//! Prelude module for convenient imports.
//!
//! Import commonly used types with a single line:
//!
//! ```rust,ignore
//! use enumgen_core::prelude::*;
//! ```

// Core types
pub use crate::error::{EnumgenError, EnumgenResult};
pub use crate::model::{ConstantGroup, ConstantValue, PackageInfo, UnderlyingKind};

// Builder API
pub use crate::builder::{Enumgen, Generated};

// Providers
pub use crate::provider::{JsonSymbolProvider, SymbolProvider};
#[cfg(feature = "go-source")]
pub use crate::provider::GoSourceProvider;

// Formatting
pub use crate::format::{Formatter, GoFormatter};

// Configuration
pub use crate::config::{load_config, EnumgenConfig};

// Output
pub use crate::persist::{write_output, WriteOutcome};
