//! Configuration loading from enumgen.toml.
//!
//! ```toml
//! [generate]
//! out = "enum_gen.go"
//! tags = ["integration"]
//! flag = true
//! marshal = false
//! format = true
//!
//! [format]
//! command = ["gofmt"]
//! ```
//!
//! Every key is optional; command-line options override the file and the
//! file overrides built-in defaults.

use serde::Deserialize;
use std::{fs, path::Path};

use crate::error::{EnumgenError, EnumgenResult};

/// File name looked up in the working directory.
pub const CONFIG_FILE: &str = "enumgen.toml";

/// Main configuration structure for enumgen.toml.
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct EnumgenConfig {
    /// Generation defaults.
    pub generate: Option<GenerateConfig>,
    /// Formatter settings.
    pub format: Option<FormatConfig>,
}

/// `[generate]` table.
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct GenerateConfig {
    pub out: Option<String>,
    pub tags: Option<Vec<String>>,
    pub flag: Option<bool>,
    pub marshal: Option<bool>,
    pub format: Option<bool>,
}

/// `[format]` table.
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct FormatConfig {
    /// External formatter argv, run with the source on stdin
    pub command: Option<Vec<String>>,
}

impl EnumgenConfig {
    pub fn generate(&self) -> GenerateConfig {
        self.generate.clone().unwrap_or_default()
    }

    /// Formatter command, if one is configured and non-empty.
    pub fn format_command(&self) -> Option<&[String]> {
        self.format
            .as_ref()
            .and_then(|f| f.command.as_deref())
            .filter(|argv| !argv.is_empty())
    }
}

/// Loads configuration from enumgen.toml in `root` if it exists.
pub fn load_config(root: &Path) -> EnumgenResult<Option<EnumgenConfig>> {
    let path = root.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(None);
    }
    load_config_file(&path).map(Some)
}

/// Loads a specific configuration file; a missing file is an error.
pub fn load_config_file(path: &Path) -> EnumgenResult<EnumgenConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| EnumgenError::config(path, format!("cannot read: {}", e)))?;
    toml::from_str(&content)
        .map_err(|e| EnumgenError::config(path, format!("Invalid {}: {}", CONFIG_FILE, e)))
}
