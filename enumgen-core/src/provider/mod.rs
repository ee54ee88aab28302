//! Symbol providers: where a run's [`PackageInfo`] comes from.
//!
//! The core never inspects sources itself. A provider is handed the package
//! pattern and build tags once per run and returns a read-only symbol table.
//!
//! - [`GoSourceProvider`](golang::GoSourceProvider) reads `.go` files
//!   (feature `go-source`)
//! - [`JsonSymbolProvider`](json::JsonSymbolProvider) reads a serialized table
//! - A fabricated [`PackageInfo`] is itself a provider, which is what tests use

#[cfg(feature = "go-source")]
pub mod golang;
pub mod json;

use crate::error::{EnumgenError, EnumgenResult};
use crate::model::PackageInfo;

#[cfg(feature = "go-source")]
pub use golang::GoSourceProvider;
pub use json::JsonSymbolProvider;

/// Produces the symbol table for one package.
pub trait SymbolProvider {
    /// Resolves `package` under the given build tags and loads its declarations.
    fn load(&self, package: &str, tags: &[String]) -> EnumgenResult<PackageInfo>;
}

impl SymbolProvider for PackageInfo {
    fn load(&self, package: &str, _tags: &[String]) -> EnumgenResult<PackageInfo> {
        if matches_package(self, package) {
            Ok(self.clone())
        } else {
            Err(EnumgenError::package_not_found(package))
        }
    }
}

/// Whether a pattern names this package, by import path or short name.
pub(crate) fn matches_package(pkg: &PackageInfo, package: &str) -> bool {
    package == "." || package == pkg.path || package == pkg.name
}

/// Splits a comma-separated tag list, dropping blanks.
pub fn parse_tags(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags() {
        assert_eq!(parse_tags(""), Vec::<String>::new());
        assert_eq!(parse_tags("a, b,,c "), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_fabricated_table_is_a_provider() {
        let pkg = PackageInfo::new("example.com/paint", "paint");
        assert_eq!(pkg.load("example.com/paint", &[]).unwrap(), pkg);
        assert_eq!(pkg.load("paint", &[]).unwrap(), pkg);
        let err = pkg.load("example.com/other", &[]).unwrap_err();
        assert!(matches!(err, EnumgenError::PackageNotFound { .. }));
    }
}
