// src/pattern/scan.rs

use std::path::Path;

use crate::errors::Result;
use crate::fs::{EntryKind, FileSystem};
use crate::pattern::glob::GlobMatcher;

/// Collect all files under `root` whose root-relative path matches `glob`.
///
/// Returns sorted, `/`-separated relative paths. A missing root yields an
/// empty list.
pub fn collect_matching_files(
    fs: &dyn FileSystem,
    root: &Path,
    glob: &GlobMatcher,
) -> Result<Vec<String>> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let Some(entries) = fs.list(&dir)? else {
            continue;
        };
        for entry in entries {
            match entry.kind {
                EntryKind::Dir => pending.push(entry.path),
                EntryKind::File => {
                    if let Some(rel) = relative_str(root, &entry.path)
                        && glob.is_match(&rel)
                    {
                        files.push(rel);
                    }
                }
            }
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

/// Convert a path into a string relative to `root`, with forward slashes.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(root)
        .ok()
        .map(|rel| rel.to_string_lossy().replace('\\', "/"))
}
