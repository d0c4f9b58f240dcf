use std::fs;
use std::path::Path;

use crate::error::IoError;

/// Reads an entire file to a string, wrapping the I/O error with its path.
pub fn read_to_string(path: &Path) -> Result<String, IoError> {
    fs::read_to_string(path).map_err(|source| IoError::Open { path: path.display().to_string(), source })
}

/// Writes `contents` to `path`, creating or truncating it.
pub fn write_string(path: &Path, contents: &str) -> Result<(), IoError> {
    fs::write(path, contents).map_err(|source| IoError::Write { path: path.display().to_string(), source })
}
