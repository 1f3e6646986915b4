//! Path canonicalization and snapshot keys
//!
//! A snapshot key is the entry's real component names joined with `/`, so
//! every key maps back to exactly one on-disk path. Unicode normalization is
//! only applied when comparing keys with version-control output.

use crate::types::EntryPath;
use std::path::{Component, Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

/// Canonicalize the target root directory
///
/// Uses dunce so Windows roots do not pick up the `\\?\` verbatim prefix,
/// which would leak into every absolute path handed to external commands.
pub fn canonicalize_root(path: &Path) -> Result<PathBuf, std::io::Error> {
    dunce::canonicalize(path)
}

/// Comparison form of a path: Unicode NFC with trailing slashes removed
/// (except root). Never used to reach the filesystem.
pub fn normalize_for_matching(path: &str) -> String {
    let mut result: String = path.nfc().collect();
    if result.len() > 1 {
        while result.ends_with('/') {
            result.pop();
        }
    }
    result
}

/// Snapshot key for `path` relative to `root`
///
/// Returns `None` for the root itself and for paths outside of it.
pub fn relative_key(root: &Path, path: &Path) -> Option<EntryPath> {
    let relative = path.strip_prefix(root).ok()?;
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(name) => parts.push(name.to_string_lossy()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

/// Key of the directory containing `key`; the root is the empty string.
pub fn parent_key(key: &str) -> &str {
    match key.rfind('/') {
        Some(idx) => &key[..idx],
        None => "",
    }
}

/// Absolute filesystem path for a snapshot key.
pub fn absolute(root: &Path, key: &str) -> PathBuf {
    if key.is_empty() {
        return root.to_path_buf();
    }
    key.split('/').fold(root.to_path_buf(), |acc, part| acc.join(part))
}
