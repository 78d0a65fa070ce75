// src/exec/paths.rs

//! Path normalization for user-supplied inputs.
//!
//! Inputs arrive from the caller as plain strings (possibly relative,
//! possibly empty for "not provided"); everything downstream works on
//! absolute paths resolved against a base directory.

use std::path::{Path, PathBuf};

/// Resolve a user-supplied path string to an absolute path.
///
/// - Empty input stays empty; callers treat empty as "not provided".
/// - Absolute input is returned unchanged.
/// - Relative input is joined onto `base` when given, otherwise onto the
///   current working directory.
pub fn to_absolute(path: &str, base: Option<&Path>) -> PathBuf {
    if path.is_empty() {
        return PathBuf::new();
    }

    let p = Path::new(path);
    if p.is_absolute() {
        return p.to_path_buf();
    }

    match base {
        Some(base) => base.join(p),
        None => std::env::current_dir()
            .map(|cwd| cwd.join(p))
            .unwrap_or_else(|_| p.to_path_buf()),
    }
}
