// src/watch/path_utils.rs

//! Path helpers for classifying watch events.

use std::path::Path;

/// Whether `path` lies inside `root` (or is `root`).
///
/// Tries a plain prefix check first, then canonicalizes both sides, which
/// helps on platforms that report a different absolute prefix for the same
/// directory (macOS `/private/var/...`). A deleted path cannot be
/// canonicalized, so only its parent is.
pub fn is_within(root: &Path, path: &Path) -> bool {
    if path.starts_with(root) {
        return true;
    }

    let Ok(root_canon) = root.canonicalize() else {
        return false;
    };

    if let Ok(path_canon) = path.canonicalize() {
        return path_canon.starts_with(&root_canon);
    }

    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => parent
            .canonicalize()
            .map(|p| p.join(name).starts_with(&root_canon))
            .unwrap_or(false),
        _ => false,
    }
}
