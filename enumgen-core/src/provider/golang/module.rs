//! Maps a package pattern to a directory and an import path.
//!
//! Accepted forms, tried in order:
//! - a directory path (`.`, `./color`, `/abs/dir`)
//! - an import path under the enclosing module (`example.com/m/color`)
//! - the name of the package in the working directory (`$GOPACKAGE`)

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{EnumgenError, EnumgenResult};

use super::lexer::tokenize;
use super::parser::package_name;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPackage {
    pub dir: PathBuf,
    pub import_path: String,
}

/// Enclosing Go module: its root directory and module path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub root: PathBuf,
    pub path: String,
}

/// Finds the nearest `go.mod` at or above `dir`.
pub fn find_module(dir: &Path) -> Option<Module> {
    dir.ancestors().find_map(|candidate| {
        let text = fs::read_to_string(candidate.join("go.mod")).ok()?;
        Some(Module {
            root: candidate.to_path_buf(),
            path: module_path(&text)?,
        })
    })
}

/// Reads the `module` directive of a go.mod file.
pub fn module_path(go_mod: &str) -> Option<String> {
    go_mod.lines().find_map(|line| {
        let line = line.split("//").next()?.trim();
        let rest = line.strip_prefix("module")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let path = rest.trim().trim_matches(|c| c == '"' || c == '`');
        (!path.is_empty()).then(|| path.to_string())
    })
}

pub fn resolve_package(package: &str, cwd: &Path) -> EnumgenResult<ResolvedPackage> {
    if package.is_empty() {
        return Err(EnumgenError::usage("package must be specified"));
    }

    let candidate = cwd.join(package);
    if looks_like_dir(package) || candidate.is_dir() {
        if !candidate.is_dir() {
            return Err(EnumgenError::package_not_found(package));
        }
        let dir = candidate.canonicalize().unwrap_or(candidate);
        let import_path = import_path_for(&dir, package);
        return Ok(ResolvedPackage { dir, import_path });
    }

    if let Some(module) = find_module(cwd) {
        let rest = if package == module.path {
            Some("")
        } else {
            package
                .strip_prefix(module.path.as_str())
                .and_then(|r| r.strip_prefix('/'))
        };
        if let Some(rest) = rest {
            let dir = rest
                .split('/')
                .filter(|s| !s.is_empty())
                .fold(module.root.clone(), |dir, part| dir.join(part));
            if dir.is_dir() {
                return Ok(ResolvedPackage {
                    dir,
                    import_path: package.to_string(),
                });
            }
        }
    }

    if declares_package(cwd, package) {
        let dir = cwd.canonicalize().unwrap_or_else(|_| cwd.to_path_buf());
        let import_path = import_path_for(&dir, package);
        return Ok(ResolvedPackage { dir, import_path });
    }

    Err(EnumgenError::package_not_found(package))
}

fn looks_like_dir(package: &str) -> bool {
    package == "."
        || package == ".."
        || package.starts_with("./")
        || package.starts_with("../")
        || Path::new(package).is_absolute()
}

/// Import path of a directory: module-relative when inside a module.
fn import_path_for(dir: &Path, fallback: &str) -> String {
    if let Some(module) = find_module(dir) {
        if let Ok(rel) = dir.strip_prefix(&module.root) {
            let parts: Vec<String> = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            return if parts.is_empty() {
                module.path
            } else {
                format!("{}/{}", module.path, parts.join("/"))
            };
        }
    }
    if looks_like_dir(fallback) {
        dir.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| fallback.to_string())
    } else {
        fallback.to_string()
    }
}

/// Whether any `.go` file directly in `dir` has `package <name>`.
fn declares_package(dir: &Path, name: &str) -> bool {
    let Ok(entries) = fs::read_dir(dir) else {
        return false;
    };
    entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "go"))
        .filter_map(|p| fs::read_to_string(p).ok())
        .any(|text| {
            // Only the header matters; cut at the first declaration keyword
            let head = text
                .find("\nimport")
                .or_else(|| text.find("\nconst"))
                .or_else(|| text.find("\ntype"))
                .map_or(text.as_str(), |i| &text[..i]);
            tokenize(head)
                .ok()
                .is_some_and(|tokens| package_name(&tokens) == Some(name))
        })
}
