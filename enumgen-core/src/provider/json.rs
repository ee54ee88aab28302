//! Symbol tables read from JSON.
//!
//! The file holds a serialized [`PackageInfo`], e.g. one exported by another
//! toolchain or checked into a fixture directory:
//!
//! ```json
//! {
//!   "path": "example.com/paint",
//!   "name": "paint",
//!   "symbols": {
//!     "Color": { "name": "Color", "kind": { "kind": "type", "underlying": { "basic": "int" } } },
//!     "Red": { "name": "Red", "kind": { "kind": "const", "ty": "example.com/paint.Color",
//!              "value": { "type": "int", "value": 1 } } }
//!   }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{EnumgenError, EnumgenResult};
use crate::model::PackageInfo;

use super::{matches_package, SymbolProvider};

/// Loads a [`PackageInfo`] from a JSON file. Build tags do not apply.
#[derive(Debug, Clone)]
pub struct JsonSymbolProvider {
    path: PathBuf,
}

impl JsonSymbolProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SymbolProvider for JsonSymbolProvider {
    fn load(&self, package: &str, _tags: &[String]) -> EnumgenResult<PackageInfo> {
        let text = fs::read_to_string(&self.path).map_err(|e| EnumgenError::Load {
            package: package.to_string(),
            message: format!("cannot read symbol file: {}", e),
            file: Some(self.path.clone()),
            line: None,
        })?;

        let pkg: PackageInfo = serde_json::from_str(&text).map_err(|e| {
            EnumgenError::load_at(package, format!("invalid symbol file: {}", e), &self.path, e.line())
        })?;

        if !matches_package(&pkg, package) {
            return Err(EnumgenError::package_not_found(package));
        }

        info!(
            package = %pkg.path,
            symbols = pkg.symbols.len(),
            file = %self.path.display(),
            "Loaded symbol table"
        );
        Ok(pkg)
    }
}
