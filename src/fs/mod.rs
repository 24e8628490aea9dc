// src/fs/mod.rs

use std::fmt::Debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::errors::Result;

pub mod mock;

/// Whether a listed entry is a file or a directory. Anything else
/// (sockets, dangling links) is not reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub path: PathBuf,
    pub kind: EntryKind,
}

/// Directory listing seam used when a pipeline enumerates its inputs.
///
/// Build artifacts are read and written through [`crate::file::FileHandle`];
/// only input discovery goes through here, so globbing can run against an
/// in-memory tree.
pub trait FileSystem: Send + Sync + Debug {
    /// Entries directly below `dir`, or `None` when `dir` is not a directory.
    fn list(&self, dir: &Path) -> Result<Option<Vec<DirEntry>>>;
}

/// Lists directories on disk. Symlinks to files are listed as files;
/// symlinks to directories are skipped, so a link back to an ancestor
/// cannot make a scan loop.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn list(&self, dir: &Path) -> Result<Option<Vec<DirEntry>>> {
        let reader = match fs::read_dir(dir) {
            Ok(reader) => reader,
            Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {
                return Ok(None);
            }
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("listing {}", dir.display()))
                    .into());
            }
        };

        let mut entries = Vec::new();
        for entry in reader {
            let entry = entry.with_context(|| format!("listing {}", dir.display()))?;
            let path = entry.path();
            let file_type = entry
                .file_type()
                .with_context(|| format!("reading type of {}", path.display()))?;
            let kind = if file_type.is_dir() {
                EntryKind::Dir
            } else if file_type.is_file() || (file_type.is_symlink() && path.is_file()) {
                EntryKind::File
            } else {
                // directory symlinks are not descended into
                continue;
            };
            entries.push(DirEntry { path, kind });
        }
        Ok(Some(entries))
    }
}
