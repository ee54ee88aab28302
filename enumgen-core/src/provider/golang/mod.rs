//! Symbol provider reading Go package sources directly.
//!
//! # Pipeline
//!
//! 1. Resolve the package pattern to a directory and import path ([`module`])
//! 2. Gather `.go` files in that directory, skipping `_test.go` ([`gather_go_files`])
//! 3. Drop files excluded by name suffix or build constraint ([`constraint`])
//! 4. Lex and parse the remaining files in parallel ([`lexer`], [`parser`])
//! 5. Evaluate constants and build the symbol table ([`evaluate`])
//!
//! Only package-scope `type` and `const` declarations are modelled; function
//! bodies, variables and imports are skipped.

pub mod constraint;
pub mod evaluate;
pub mod lexer;
pub mod module;
pub mod parser;

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{EnumgenError, EnumgenResult};
use crate::model::PackageInfo;

use self::constraint::{file_constraint, BuildContext};
use self::parser::SourceFile;
use super::SymbolProvider;

/// Loads packages from `.go` files on disk.
#[derive(Debug, Clone)]
pub struct GoSourceProvider {
    cwd: PathBuf,
    platform: Option<(String, String)>,
}

impl GoSourceProvider {
    /// Resolves package patterns relative to `cwd`.
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            platform: None,
        }
    }

    /// Fixes the target platform instead of reading `GOOS`/`GOARCH`.
    pub fn with_platform(mut self, goos: impl Into<String>, goarch: impl Into<String>) -> Self {
        self.platform = Some((goos.into(), goarch.into()));
        self
    }

    fn build_context(&self, tags: &[String]) -> BuildContext {
        match &self.platform {
            Some((goos, goarch)) => BuildContext::new(goos.clone(), goarch.clone(), tags),
            None => BuildContext::from_env(tags),
        }
    }
}

impl SymbolProvider for GoSourceProvider {
    fn load(&self, package: &str, tags: &[String]) -> EnumgenResult<PackageInfo> {
        let resolved = module::resolve_package(package, &self.cwd)?;
        let ctx = self.build_context(tags);
        let files = gather_go_files(&resolved.dir)
            .map_err(|e| EnumgenError::load(package, e.to_string()))?;

        let parsed: Vec<(PathBuf, SourceFile)> = files
            .par_iter()
            .map(|path| parse_if_included(package, path, &ctx))
            .collect::<EnumgenResult<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect();

        let Some((first_path, first)) = parsed.first() else {
            return Err(EnumgenError::load(
                package,
                format!("no buildable Go source files in {}", resolved.dir.display()),
            ));
        };
        if let Some((path, other)) = parsed.iter().find(|(_, f)| f.package != first.package) {
            return Err(EnumgenError::load(
                package,
                format!(
                    "found packages {} ({}) and {} ({}) in {}",
                    first.package,
                    file_name(first_path),
                    other.package,
                    file_name(path),
                    resolved.dir.display()
                ),
            ));
        }

        let sources: Vec<SourceFile> = parsed.into_iter().map(|(_, f)| f).collect();
        let pkg = evaluate::build_package(&resolved.import_path, &sources);
        info!(
            package = %pkg.path,
            dir = %resolved.dir.display(),
            files = sources.len(),
            symbols = pkg.symbols.len(),
            "Loaded Go package"
        );
        Ok(pkg)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Reads and parses one file, or returns `None` when the build excludes it.
fn parse_if_included(
    package: &str,
    path: &Path,
    ctx: &BuildContext,
) -> EnumgenResult<Option<(PathBuf, SourceFile)>> {
    if !ctx.matches_file_name(&file_name(path)) {
        debug!(file = %path.display(), "Excluded by file name");
        return Ok(None);
    }

    let text = fs::read_to_string(path).map_err(|e| EnumgenError::Load {
        package: package.to_string(),
        message: format!("cannot read file: {}", e),
        file: Some(path.to_path_buf()),
        line: None,
    })?;

    let constraint = file_constraint(&text).map_err(|message| EnumgenError::Load {
        package: package.to_string(),
        message,
        file: Some(path.to_path_buf()),
        line: None,
    })?;
    if constraint.is_some_and(|c| !c.eval(ctx)) {
        debug!(file = %path.display(), "Excluded by build constraint");
        return Ok(None);
    }

    let tokens = lexer::tokenize(&text)
        .map_err(|e| EnumgenError::load_at(package, e.message, path, e.line))?;
    let file = parser::parse_file(&tokens)
        .map_err(|e| EnumgenError::load_at(package, e.message, path, e.line))?;
    Ok(Some((path.to_path_buf(), file)))
}

/// Lists the package's `.go` files (not recursing, no `_test.go`, no
/// files starting with `.` or `_`), sorted by path.
pub fn gather_go_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    use anyhow::Context;

    let mut files = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .par_bridge()
        .filter_map(|entry| match entry {
            Ok(e) => {
                let path = e.path();
                let name = e.file_name().to_string_lossy();
                let wanted = e.file_type().is_file()
                    && name.ends_with(".go")
                    && !name.ends_with("_test.go")
                    && !name.starts_with('.')
                    && !name.starts_with('_');
                wanted.then(|| Ok(path.to_path_buf()))
            }
            Err(e) => Some(Err(e.into())),
        })
        .collect::<anyhow::Result<Vec<_>>>()
        .context(format!("Failed to gather .go files from {}", dir.display()))?;

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConstLiteral, SymbolKind};
    use std::sync::atomic::{AtomicU64, Ordering};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    fn create_temp_dir() -> PathBuf {
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!(
            "enumgen_go_test_{}_{}",
            std::process::id(),
            id
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn provider(dir: &Path) -> GoSourceProvider {
        GoSourceProvider::new(dir).with_platform("linux", "amd64")
    }

    fn value(pkg: &PackageInfo, name: &str) -> ConstLiteral {
        match &pkg.symbols[name].kind {
            SymbolKind::Const { value, .. } => value.clone(),
            other => panic!("{} is not a constant: {:?}", name, other),
        }
    }

    #[test]
    fn test_gather_skips_tests_and_subdirs() {
        let dir = create_temp_dir();
        fs::write(dir.join("b.go"), "package p\n").unwrap();
        fs::write(dir.join("a.go"), "package p\n").unwrap();
        fs::write(dir.join("a_test.go"), "package p\n").unwrap();
        fs::write(dir.join("_ignored.go"), "package p\n").unwrap();
        fs::write(dir.join("notes.txt"), "").unwrap();
        fs::create_dir_all(dir.join("sub")).unwrap();
        fs::write(dir.join("sub/c.go"), "package sub\n").unwrap();

        let files = gather_go_files(&dir).unwrap();
        let names: Vec<String> = files.iter().map(|p| file_name(p)).collect();
        assert_eq!(names, vec!["a.go", "b.go"]);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_package_across_files() {
        let dir = create_temp_dir();
        fs::write(dir.join("go.mod"), "module example.com/paint\n").unwrap();
        fs::write(
            dir.join("color.go"),
            "package paint\n\n// Color is a paint color.\ntype Color int\n\nconst (\n\tRed Color = iota + 1\n\tGreen\n\tBlue\n)\n",
        )
        .unwrap();
        fs::write(
            dir.join("extra.go"),
            "package paint\n\nimport \"fmt\"\n\nconst Purple = Blue + 1\n\nfunc (c Color) Debug() string { return fmt.Sprint(int(c)) }\n",
        )
        .unwrap();
        fs::write(dir.join("color_test.go"), "package paint\n\nconst Test Color = 99\n").unwrap();

        let pkg = provider(&dir).load(".", &[]).unwrap();
        assert_eq!(pkg.path, "example.com/paint");
        assert_eq!(pkg.name, "paint");
        assert_eq!(value(&pkg, "Blue"), ConstLiteral::Int(3));
        assert_eq!(value(&pkg, "Purple"), ConstLiteral::Int(4));
        assert!(!pkg.symbols.contains_key("Test"));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_build_tags_select_files() {
        let dir = create_temp_dir();
        fs::write(dir.join("base.go"), "package p\n\ntype Mode string\n").unwrap();
        fs::write(
            dir.join("pro.go"),
            "//go:build pro\n\npackage p\n\nconst Pro Mode = \"pro\"\n",
        )
        .unwrap();
        fs::write(
            dir.join("free.go"),
            "// +build !pro\n\npackage p\n\nconst Free Mode = \"free\"\n",
        )
        .unwrap();
        fs::write(dir.join("mode_windows.go"), "package p\n\nconst Win Mode = \"win\"\n").unwrap();

        let plain = provider(&dir).load(".", &[]).unwrap();
        assert!(plain.symbols.contains_key("Free"));
        assert!(!plain.symbols.contains_key("Pro"));
        assert!(!plain.symbols.contains_key("Win"));

        let tagged = provider(&dir).load(".", &["pro".to_string()]).unwrap();
        assert!(tagged.symbols.contains_key("Pro"));
        assert!(!tagged.symbols.contains_key("Free"));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_syntax_error_has_location() {
        let dir = create_temp_dir();
        fs::write(dir.join("bad.go"), "package p\n\ntype T int\n\nconst A T = )\n").unwrap();
        let err = provider(&dir).load(".", &[]).unwrap_err();
        match err {
            EnumgenError::Load { file, line, .. } => {
                assert!(file.unwrap().ends_with("bad.go"));
                assert_eq!(line, Some(5));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_mixed_packages_rejected() {
        let dir = create_temp_dir();
        fs::write(dir.join("a.go"), "package one\n").unwrap();
        fs::write(dir.join("b.go"), "package two\n").unwrap();
        let err = provider(&dir).load(".", &[]).unwrap_err();
        assert!(err.to_string().contains("found packages one (a.go) and two (b.go)"));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_empty_directory() {
        let dir = create_temp_dir();
        let err = provider(&dir).load(".", &[]).unwrap_err();
        assert!(err.to_string().contains("no buildable Go source files"));
        fs::remove_dir_all(&dir).ok();
    }
}
