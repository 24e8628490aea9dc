// src/manifest/mod.rs

//! Persisted dynamic-dependency state.
//!
//! A [`Manifest`] maps output paths to [`ManifestEntry`] records. During a
//! build two manifests are in play: the *last* manifest (read-only, from the
//! previous run) and the *current* manifest (written as tasks complete).
//! Storage is abstracted by [`ManifestStore`] so pipelines can keep state on
//! disk ([`JsonManifestStore`]) or in memory ([`MemoryManifestStore`]).

pub mod entry;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::Result;

pub use entry::ManifestEntry;

/// Default file name for a pipeline's manifest inside its temp directory.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Keyed container of [`ManifestEntry`] values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: BTreeMap<PathBuf, ManifestEntry>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a manifest from `path`. A missing file is an empty manifest.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            debug!(?path, "no manifest on disk; starting empty");
            return Ok(Self::new());
        }

        let contents = fs::read_to_string(path)?;
        let manifest: Manifest = serde_json::from_str(&contents)?;
        debug!(?path, entries = manifest.len(), "loaded manifest");
        Ok(manifest)
    }

    /// Write the manifest to `path` as JSON.
    ///
    /// Nothing is written when there are no entries, so an empty build never
    /// leaves a manifest file behind. Returns whether the file was written.
    pub fn save(&self, path: &Path) -> Result<bool> {
        if self.entries.is_empty() {
            debug!(?path, "manifest empty; not writing");
            return Ok(false);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        info!(?path, entries = self.entries.len(), "wrote manifest");
        Ok(true)
    }

    pub fn get(&self, output: &Path) -> Option<&ManifestEntry> {
        self.entries.get(output)
    }

    pub fn set(&mut self, output: impl Into<PathBuf>, entry: ManifestEntry) {
        self.entries.insert(output.into(), entry);
    }

    pub fn remove(&mut self, output: &Path) -> Option<ManifestEntry> {
        self.entries.remove(output)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Drop the entries for `outputs`, then copy in every entry of `from`.
    pub fn replace_outputs(&mut self, outputs: &[PathBuf], from: &Manifest) {
        for output in outputs {
            self.entries.remove(output);
        }
        for (output, entry) in &from.entries {
            self.entries.insert(output.clone(), entry.clone());
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> impl Iterator<Item = (&Path, &ManifestEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_path(), v))
    }

    /// Every file the manifest knows about (outputs and their dynamic
    /// dependencies) with its recorded mtime.
    pub fn files(&self) -> BTreeMap<PathBuf, u64> {
        let mut files = BTreeMap::new();
        for (output, entry) in &self.entries {
            files.insert(output.clone(), entry.mtime);
            for (dep, mtime) in &entry.deps {
                files.insert(dep.clone(), *mtime);
            }
        }
        files
    }
}

/// Where a pipeline keeps its manifest between runs.
pub trait ManifestStore: Send + Sync {
    fn load(&self) -> Result<Manifest>;
    fn save(&mut self, manifest: &Manifest) -> Result<()>;
}

/// Stores the manifest as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonManifestStore {
    path: PathBuf,
}

impl JsonManifestStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ManifestStore for JsonManifestStore {
    fn load(&self) -> Result<Manifest> {
        Manifest::load(&self.path)
    }

    fn save(&mut self, manifest: &Manifest) -> Result<()> {
        manifest.save(&self.path)?;
        Ok(())
    }
}

/// Keeps the manifest in memory only (lost when the process exits).
#[derive(Debug, Clone, Default)]
pub struct MemoryManifestStore {
    manifest: Manifest,
}

impl MemoryManifestStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ManifestStore for MemoryManifestStore {
    fn load(&self) -> Result<Manifest> {
        Ok(self.manifest.clone())
    }

    fn save(&mut self, manifest: &Manifest) -> Result<()> {
        if !manifest.is_empty() {
            self.manifest = manifest.clone();
        }
        Ok(())
    }
}
