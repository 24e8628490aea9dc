// src/fs/mock.rs

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{DirEntry, EntryKind, FileSystem};
use crate::errors::Result;

/// In-memory source tree for exercising input discovery without disk I/O.
///
/// Only the shape of the tree is kept: file contents are irrelevant to
/// enumeration. Paths are used verbatim as keys, so stick to one style
/// (typically absolute, e.g. `/project/app/a.js`).
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    dirs: Arc<Mutex<BTreeMap<PathBuf, BTreeSet<(PathBuf, bool)>>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source file, creating every missing parent directory.
    /// The contents argument mirrors how fixtures are written on disk and is
    /// otherwise ignored.
    pub fn add_file(&self, path: impl AsRef<Path>, _contents: impl AsRef<[u8]>) {
        let mut dirs = self.lock();
        let mut child = (path.as_ref().to_path_buf(), false);
        while let Some(parent) = child.0.parent().filter(|p| !p.as_os_str().is_empty()) {
            let parent = parent.to_path_buf();
            let fresh = !dirs.contains_key(&parent);
            dirs.entry(parent.clone()).or_default().insert(child);
            if !fresh {
                break;
            }
            child = (parent, true);
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<PathBuf, BTreeSet<(PathBuf, bool)>>> {
        self.dirs.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl FileSystem for MockFileSystem {
    fn list(&self, dir: &Path) -> Result<Option<Vec<DirEntry>>> {
        Ok(self.lock().get(dir).map(|children| {
            children
                .iter()
                .map(|(path, is_dir)| DirEntry {
                    path: path.clone(),
                    kind: if *is_dir { EntryKind::Dir } else { EntryKind::File },
                })
                .collect()
        }))
    }
}
