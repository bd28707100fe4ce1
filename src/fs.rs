//! Thin filesystem layer used by the file-backed pack/unpack entry points.
//! Every failure carries the path it happened on.

use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::Path;

use crate::error::{ArchiveError, ArchiveResult};

pub fn read_file(path: &Path) -> ArchiveResult<Vec<u8>> {
    fs::read(path).map_err(|e| ArchiveError::path(path, e))
}

pub fn write_file(path: &Path, bytes: &[u8]) -> ArchiveResult<()> {
    fs::write(path, bytes).map_err(|e| ArchiveError::path(path, e))
}

pub fn create_file(path: &Path) -> ArchiveResult<File> {
    File::create(path).map_err(|e| ArchiveError::path(path, e))
}

/// Create `path` if it does not exist yet. An existing directory is success.
pub fn create_directory(path: &Path) -> ArchiveResult<()> {
    match fs::create_dir(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(e) => Err(ArchiveError::path(path, e)),
    }
}

/// True when both paths exist and resolve to the same file.
pub fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Best-effort cleanup of a partially written output.
pub fn discard_file(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "removed partial output"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "could not remove partial output"),
    }
}
