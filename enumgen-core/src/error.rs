//! Typed error handling for enumgen.
//!
//! Every stage of a run reports failures through [`EnumgenError`] so callers
//! can tell a bad invocation apart from a failure while loading, extracting,
//! rendering, formatting or writing.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for enumgen operations.
#[derive(Error, Debug)]
pub enum EnumgenError {
    /// Missing or invalid invocation configuration; callers should show usage text
    #[error("{message}")]
    Usage { message: String },

    /// The symbol provider could not resolve the requested package
    #[error("Package not found: {package}")]
    PackageNotFound { package: String },

    /// The symbol provider resolved the package but failed to load it
    #[error("Load error in {package}: {message}")]
    Load {
        package: String,
        message: String,
        /// File the failure was found in, if known
        file: Option<PathBuf>,
        /// Line number (1-indexed) if available
        line: Option<usize>,
    },

    /// The requested type is not declared in the package
    #[error("Could not find def for {type_name}")]
    TypeNotFound { type_name: String },

    /// The type's underlying representation is neither integer nor string
    #[error("Type {type_name:?} is not a string or integer type (underlying: {underlying})")]
    UnsupportedKind {
        type_name: String,
        underlying: String,
    },

    /// Code emission failed for a constant group
    #[error("Render error for {type_name}: {message}")]
    Render { type_name: String, message: String },

    /// The formatter rejected or failed to process the assembled output
    #[error("Format error: {message}")]
    Format { message: String },

    /// Persisting the output failed
    #[error("Write error at {path}: {message}")]
    Write {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Configuration file errors
    #[error("Config error at {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// Broken internal invariant
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl EnumgenError {
    /// Create a usage error.
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    /// Create a package-not-found error.
    pub fn package_not_found(package: impl Into<String>) -> Self {
        Self::PackageNotFound {
            package: package.into(),
        }
    }

    /// Create a load error without location.
    pub fn load(package: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Load {
            package: package.into(),
            message: message.into(),
            file: None,
            line: None,
        }
    }

    /// Create a load error pointing at a source line.
    pub fn load_at(
        package: impl Into<String>,
        message: impl Into<String>,
        file: impl Into<PathBuf>,
        line: usize,
    ) -> Self {
        Self::Load {
            package: package.into(),
            message: message.into(),
            file: Some(file.into()),
            line: Some(line),
        }
    }

    /// Create a type-not-found error.
    pub fn type_not_found(type_name: impl Into<String>) -> Self {
        Self::TypeNotFound {
            type_name: type_name.into(),
        }
    }

    /// Create an unsupported-kind error.
    pub fn unsupported_kind(type_name: impl Into<String>, underlying: impl Into<String>) -> Self {
        Self::UnsupportedKind {
            type_name: type_name.into(),
            underlying: underlying.into(),
        }
    }

    /// Create a render error.
    pub fn render(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Render {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    /// Create a format error.
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    /// Create a write error from an I/O failure.
    pub fn write(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create a config error.
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if this error came from a bad invocation (usage text should be shown).
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Usage { .. })
    }

    /// Get the path associated with this error, if any.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Load { file, .. } => file.as_ref(),
            Self::Write { path, .. } => Some(path),
            Self::Config { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Convenience type alias for enumgen results.
pub type EnumgenResult<T> = Result<T, EnumgenError>;

/// Extension trait for converting std::io::Error with path context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    fn with_path(self, path: impl Into<PathBuf>) -> EnumgenResult<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> EnumgenResult<T> {
        self.map_err(|e| EnumgenError::write(path, e))
    }
}
