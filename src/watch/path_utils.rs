// src/watch/path_utils.rs

//! Utility functions for path handling in the watcher.

use std::path::Path;

use crate::fs::FileSystem;

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// - First we try a direct `strip_prefix(root)`.
/// - If that fails (e.g. due to symlinks or different absolute prefixes),
///   we canonicalize both paths and try again.
/// - Only if both attempts fail do we give up.
///
/// Returns `None` if the path cannot be reasonably related to `root`, or if
/// it *is* the root.
pub fn relative_str(fs: &dyn FileSystem, root: &Path, path: &Path) -> Option<String> {
    if let Some(s) = strip_root(root, path) {
        return Some(s);
    }

    // Deleted files cannot be canonicalized; only their parent can.
    let (root_canon, path_canon) = match (fs.canonicalize(root), fs.canonicalize(path)) {
        (Ok(r), Ok(p)) => (r, p),
        (Ok(r), Err(_)) => {
            let parent = fs.canonicalize(path.parent()?).ok()?;
            (r, parent.join(path.file_name()?))
        }
        _ => return None,
    };

    strip_root(&root_canon, &path_canon)
}

fn strip_root(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let s = to_forward_slashes(&rel.to_string_lossy());
    if s.is_empty() { None } else { Some(s) }
}

/// Normalise Windows separators so glob matching sees one path syntax.
pub fn to_forward_slashes(s: &str) -> String {
    s.replace('\\', "/")
}
