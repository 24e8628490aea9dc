// src/manifest/entry.rs

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Dynamic dependency record for one output file.
///
/// - `mtime`: the output's modification time (epoch ms) right after it was
///   last built.
/// - `deps`: each dynamic dependency path mapped to its modification time
///   (epoch ms) at that build, in the order discovery returned them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    #[serde(default)]
    pub deps: IndexMap<PathBuf, u64>,
    #[serde(default)]
    pub mtime: u64,
}

impl ManifestEntry {
    pub fn new(deps: IndexMap<PathBuf, u64>, mtime: u64) -> Self {
        Self { deps, mtime }
    }

    /// Dependency paths in discovery order.
    pub fn dep_paths(&self) -> Vec<PathBuf> {
        self.deps.keys().cloned().collect()
    }
}
