//! Writing generated output.
//!
//! Files are only rewritten when their SHA-256 changes, so repeated runs keep
//! modification times (and build caches keyed on them) stable.

use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::error::{EnumgenResult, IoResultExt};
use crate::logging::log_output;

/// Output destination that means standard output.
pub const STDOUT: &str = "-";

/// What happened to the output destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The file was created or its content changed
    Generated,
    /// The file already held identical content
    Unmodified,
    /// Written to standard output
    Stdout,
}

impl WriteOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Generated => "generated",
            Self::Unmodified => "unmodified",
            Self::Stdout => "stdout",
        }
    }
}

impl fmt::Display for WriteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hex SHA-256 of a byte slice.
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut sha = Sha256::new();
    sha.update(bytes);
    format!("{:x}", sha.finalize())
}

/// Hex SHA-256 of a file's content, or `None` if it cannot be read.
pub fn file_hash(path: &Path) -> Option<String> {
    fs::read(path).ok().map(|bytes| hash_bytes(&bytes))
}

/// Writes `contents` to `path` unless the file already holds the same bytes.
pub fn write_if_changed(path: &Path, contents: &[u8]) -> EnumgenResult<WriteOutcome> {
    let display = path.display().to_string();

    if file_hash(path).is_some_and(|existing| existing == hash_bytes(contents)) {
        log_output(WriteOutcome::Unmodified.as_str(), &display);
        return Ok(WriteOutcome::Unmodified);
    }

    if let Err(e) = fs::write(path, contents).with_path(path) {
        log_output("failed", &display);
        return Err(e);
    }
    log_output(WriteOutcome::Generated.as_str(), &display);
    Ok(WriteOutcome::Generated)
}

/// Writes to `destination`, treating [`STDOUT`] as standard output.
pub fn write_output(destination: &str, contents: &[u8]) -> EnumgenResult<WriteOutcome> {
    if destination == STDOUT {
        let mut stdout = io::stdout().lock();
        stdout
            .write_all(contents)
            .and_then(|_| stdout.flush())
            .with_path(STDOUT)?;
        return Ok(WriteOutcome::Stdout);
    }
    write_if_changed(Path::new(destination), contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EnumgenError;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU64, Ordering};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    fn create_temp_dir() -> PathBuf {
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!(
            "enumgen_persist_test_{}_{}",
            std::process::id(),
            id
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_hash_is_hex_sha256() {
        let hash = hash_bytes(b"abc");
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_write_then_unmodified() {
        let dir = create_temp_dir();
        let path = dir.join("enum_gen.go");

        assert_eq!(write_if_changed(&path, b"package p\n").unwrap(), WriteOutcome::Generated);
        assert_eq!(write_if_changed(&path, b"package p\n").unwrap(), WriteOutcome::Unmodified);
        assert_eq!(write_if_changed(&path, b"package q\n").unwrap(), WriteOutcome::Generated);
        assert_eq!(fs::read(&path).unwrap(), b"package q\n");

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_write_failure_is_write_error() {
        let dir = create_temp_dir();
        let path = dir.join("missing_dir").join("enum_gen.go");
        let err = write_if_changed(&path, b"x").unwrap_err();
        assert!(matches!(err, EnumgenError::Write { .. }));
        assert_eq!(err.path(), Some(&path));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_file_hash_missing() {
        assert_eq!(file_hash(Path::new("/nonexistent/enumgen/file.go")), None);
    }
}
