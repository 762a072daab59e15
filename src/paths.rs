use std::path::{Path, PathBuf};

/// Strips surrounding whitespace from a user-typed path.
///
/// Non UTF-8 paths are returned unchanged.
pub fn trim_path(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(text) => PathBuf::from(text.trim()),
        None => path.to_path_buf(),
    }
}
