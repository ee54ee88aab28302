//! Builder pattern API for generation runs.
//!
//! Provides a fluent interface for configuring and running one generation:
//!
//! ```rust,ignore
//! use enumgen_core::prelude::*;
//!
//! let generated = Enumgen::new("example.com/paint")
//!     .tags(["integration"])
//!     .marshal(true)
//!     .generate(&["Color", "Finish"])?;
//!
//! write_output("enum_gen.go", &generated.source)?;
//! ```

use std::collections::HashSet;

use serde::Serialize;
use tracing::{info, info_span};

use crate::assemble::assemble;
use crate::error::{EnumgenError, EnumgenResult};
use crate::extract::extract;
use crate::format::{Formatter, GoFormatter};
use crate::model::UnderlyingKind;
use crate::provider::SymbolProvider;
use crate::render::{RenderOptions, Renderer};

/// Conventional output file name.
pub const DEFAULT_OUTPUT: &str = "enum_gen.go";

/// Builder for configuring a generation run.
///
/// The provider and formatter are injected; when none is set the Go source
/// provider (rooted at the working directory) and [`GoFormatter`] are used.
pub struct Enumgen {
    /// Package pattern handed to the provider
    package: String,

    /// Build tags for the provider
    tags: Vec<String>,

    /// Emit `Set` (flag.Value)
    flag: bool,

    /// Emit `MarshalText`/`UnmarshalText`
    marshal: bool,

    /// Run the formatter over the assembled output
    format: bool,

    /// Output file name, used in formatter diagnostics
    output_name: String,

    provider: Option<Box<dyn SymbolProvider>>,
    formatter: Option<Box<dyn Formatter>>,
}

impl std::fmt::Debug for Enumgen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Enumgen")
            .field("package", &self.package)
            .field("tags", &self.tags)
            .field("flag", &self.flag)
            .field("marshal", &self.marshal)
            .field("format", &self.format)
            .field("output_name", &self.output_name)
            .field("custom_provider", &self.provider.is_some())
            .field("custom_formatter", &self.formatter.is_some())
            .finish()
    }
}

impl Enumgen {
    /// Create a new run for the given package.
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            tags: Vec::new(),
            flag: true,
            marshal: false,
            format: true,
            output_name: DEFAULT_OUTPUT.to_string(),
            provider: None,
            formatter: None,
        }
    }

    /// Set the build tags.
    pub fn tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Enable or disable the `Set` method.
    pub fn flag(mut self, enabled: bool) -> Self {
        self.flag = enabled;
        self
    }

    /// Enable or disable `MarshalText`/`UnmarshalText` (experimental).
    pub fn marshal(mut self, enabled: bool) -> Self {
        self.marshal = enabled;
        self
    }

    /// Enable or disable formatting of the output.
    pub fn format(mut self, enabled: bool) -> Self {
        self.format = enabled;
        self
    }

    /// Name of the file being generated.
    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = name.into();
        self
    }

    /// Use a specific symbol provider.
    pub fn with_provider(mut self, provider: impl SymbolProvider + 'static) -> Self {
        self.provider = Some(Box::new(provider));
        self
    }

    /// Use a specific formatter when formatting is enabled.
    pub fn with_formatter(mut self, formatter: impl Formatter + 'static) -> Self {
        self.formatter = Some(Box::new(formatter));
        self
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            emit_marshal: self.marshal,
            emit_settable: self.flag,
            ..RenderOptions::default()
        }
    }

    /// Run the pipeline for `types`, in order. Nothing is returned unless
    /// every type succeeds.
    pub fn generate<S: AsRef<str>>(&self, types: &[S]) -> EnumgenResult<Generated> {
        let span = info_span!("generate", package = %self.package);
        let _guard = span.enter();

        // 1. Validate the invocation
        self.validate(types)?;

        // 2. Load the package once
        let pkg = match &self.provider {
            Some(provider) => provider.load(&self.package, &self.tags)?,
            None => default_provider()?.load(&self.package, &self.tags)?,
        };

        // 3. Extract and render each group into the shared buffer
        let renderer = Renderer::go(self.render_options());
        let mut buffer = String::new();
        let mut groups = Vec::with_capacity(types.len());
        for type_name in types {
            let group = extract(&pkg, type_name.as_ref())?;
            renderer.render(&group, &mut buffer)?;
            groups.push(GroupSummary {
                name: group.name.clone(),
                kind: group.kind,
                constants: group.values.len(),
            });
        }

        // 4. Assemble (and format)
        let formatter: Option<&dyn Formatter> = match (&self.formatter, self.format) {
            (_, false) => None,
            (Some(custom), true) => Some(custom.as_ref()),
            (None, true) => Some(&GoFormatter),
        };
        let source = assemble(&buffer, &pkg, &self.output_name, formatter)?;

        info!(
            package = %pkg.path,
            types = groups.len(),
            bytes = source.len(),
            "Generation complete"
        );
        Ok(Generated {
            package_path: pkg.path,
            package_name: pkg.name,
            groups,
            source,
        })
    }

    fn validate<S: AsRef<str>>(&self, types: &[S]) -> EnumgenResult<()> {
        if self.package.trim().is_empty() {
            return Err(EnumgenError::usage(
                "package must be specified (--pkg or $GOPACKAGE)",
            ));
        }
        if types.is_empty() {
            return Err(EnumgenError::usage("at least one type name is required"));
        }
        let mut seen = HashSet::new();
        for name in types {
            let name = name.as_ref();
            if name.trim().is_empty() {
                return Err(EnumgenError::usage("type names must not be empty"));
            }
            if !seen.insert(name) {
                return Err(EnumgenError::usage(format!(
                    "type {} requested more than once",
                    name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(feature = "go-source")]
fn default_provider() -> EnumgenResult<Box<dyn SymbolProvider>> {
    let cwd = std::env::current_dir()
        .map_err(|e| EnumgenError::internal(format!("cannot determine working directory: {}", e)))?;
    Ok(Box::new(crate::provider::GoSourceProvider::new(cwd)))
}

#[cfg(not(feature = "go-source"))]
fn default_provider() -> EnumgenResult<Box<dyn SymbolProvider>> {
    Err(EnumgenError::usage(
        "no symbol provider configured (enable the go-source feature or pass a symbol file)",
    ))
}

/// Result of a generation run.
#[derive(Debug, Clone, Serialize)]
pub struct Generated {
    /// Import path of the loaded package
    pub package_path: String,

    /// Package clause name written to the output
    pub package_name: String,

    /// One entry per requested type, in invocation order
    pub groups: Vec<GroupSummary>,

    /// Complete output file
    #[serde(skip)]
    pub source: Vec<u8>,
}

/// What was generated for one type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupSummary {
    pub name: String,
    pub kind: UnderlyingKind,
    pub constants: usize,
}

impl Generated {
    /// Output as text (always UTF-8 for Go output).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.source).into_owned()
    }
}
