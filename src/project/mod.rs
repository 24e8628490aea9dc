// src/project/mod.rs

//! A set of pipelines built from one config file.
//!
//! The project owns the config digest and the temp layout derived from it:
//! `<tmpdir>/assetflow-<digest>/pipeline-<n>/...`. Editing the config changes
//! the digest, so a rebuilt project never reuses temp state (or a manifest)
//! produced by a different config; [`Project::cleanup_tmpdir`] removes the
//! directories left behind by older digests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::config::{ConfigFile, build_pipelines, parse_and_validate};
use crate::errors::{AssetflowError, Result};
use crate::file::FileHandle;
use crate::pipeline::{BuildContext, Pipeline};

/// Prefix of every digest-named temp directory.
pub const TMPDIR_PREFIX: &str = "assetflow-";

struct ProjectState {
    pipelines: Vec<Pipeline>,
    digest: Option<String>,
}

/// Pipelines plus their config-derived lifecycle.
///
/// Two locks: the state lock serializes invokes (pipelines share temp
/// directories and manifest files), and the rebuild lock makes the
/// digest check and pipeline swap in [`Project::invoke_clean`] atomic.
pub struct Project {
    config_path: Option<PathBuf>,
    tmpdir: PathBuf,
    ctx: Arc<BuildContext>,
    state: Mutex<ProjectState>,
    rebuild: Mutex<()>,
}

impl Project {
    /// Load `path` and build its pipelines.
    pub fn from_config_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = std::path::absolute(path.as_ref())?;
        let source = fs::read_to_string(&path)?;
        let cfg = parse_and_validate(&source)?;
        let base_dir = base_dir_of(&path);
        let digest = digest(&source);
        let tmpdir = base_dir.join(&cfg.project.tmpdir);
        let ctx = Arc::new(BuildContext::new());

        let pipelines = build_from(&cfg, &base_dir, &tmpdir, &digest, &ctx)?;
        info!(config = %path.display(), pipelines = pipelines.len(), %digest, "loaded project");

        Ok(Self {
            config_path: Some(path),
            tmpdir,
            ctx,
            state: Mutex::new(ProjectState {
                pipelines,
                digest: Some(digest),
            }),
            rebuild: Mutex::new(()),
        })
    }

    /// Project around pipelines built in code. It has no config file, so
    /// [`Project::invoke_clean`] never rebuilds it.
    pub fn from_pipelines(pipelines: Vec<Pipeline>, tmpdir: impl Into<PathBuf>) -> Self {
        Self {
            config_path: None,
            tmpdir: tmpdir.into(),
            ctx: Arc::new(BuildContext::new()),
            state: Mutex::new(ProjectState {
                pipelines,
                digest: None,
            }),
            rebuild: Mutex::new(()),
        }
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    pub fn tmpdir(&self) -> &Path {
        &self.tmpdir
    }

    pub fn digest(&self) -> Option<String> {
        self.lock_state().digest.clone()
    }

    /// `<tmpdir>/assetflow-<digest>` (or `<tmpdir>/assetflow` without a
    /// config).
    pub fn digested_tmpdir(&self) -> PathBuf {
        digested_tmpdir(&self.tmpdir, self.lock_state().digest.as_deref())
    }

    /// Number of pipelines currently held.
    pub fn pipeline_count(&self) -> usize {
        self.lock_state().pipelines.len()
    }

    /// Run `f` with exclusive access to the pipelines.
    pub fn with_pipelines<T>(&self, f: impl FnOnce(&mut [Pipeline]) -> T) -> T {
        let mut state = self.lock_state();
        f(&mut state.pipelines)
    }

    /// Input roots of every pipeline, deduplicated.
    pub fn input_roots(&self) -> Vec<PathBuf> {
        let state = self.lock_state();
        let mut roots: Vec<PathBuf> = state
            .pipelines
            .iter()
            .flat_map(|p| p.inputs().iter().map(|(root, _)| root.clone()))
            .collect();
        roots.sort();
        roots.dedup();
        roots
    }

    /// Invoke every pipeline in order.
    pub fn invoke(&self) -> Result<()> {
        let mut state = self.lock_state();
        for pipeline in state.pipelines.iter_mut() {
            pipeline.invoke()?;
        }
        Ok(())
    }

    /// Rebuild from the config file if it changed since it was last read,
    /// then `invoke_clean` every pipeline.
    pub fn invoke_clean(&self) -> Result<()> {
        let _rebuild = self.rebuild.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(path) = &self.config_path {
            let source = fs::read_to_string(path)?;
            let digest = digest(&source);
            if self.lock_state().digest.as_deref() != Some(digest.as_str()) {
                info!(config = %path.display(), %digest, "config changed; rebuilding pipelines");
                let cfg = parse_and_validate(&source)?;
                let pipelines = build_from(&cfg, &base_dir_of(path), &self.tmpdir, &digest, &self.ctx)?;

                let mut state = self.lock_state();
                state.pipelines = pipelines;
                state.digest = Some(digest);
            }
        }

        let mut state = self.lock_state();
        for pipeline in state.pipelines.iter_mut() {
            pipeline.invoke_clean()?;
        }
        Ok(())
    }

    /// Every file the pipelines produce, after setup.
    pub fn output_files(&self) -> Result<Vec<FileHandle>> {
        let mut state = self.lock_state();
        let mut files = Vec::new();
        for pipeline in state.pipelines.iter_mut() {
            pipeline.setup()?;
            files.extend(pipeline.output_files()?);
        }
        Ok(files)
    }

    /// `assetflow-*` directories under the temp root that belong to other
    /// digests, sorted.
    pub fn obsolete_tmpdirs(&self) -> Result<Vec<PathBuf>> {
        if !self.tmpdir.is_dir() {
            return Ok(Vec::new());
        }

        let current = self.digested_tmpdir();
        let mut dirs = Vec::new();
        for entry in fs::read_dir(&self.tmpdir)? {
            let path = entry?.path();
            let is_ours = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(TMPDIR_PREFIX));
            if is_ours && path.is_dir() && path != current {
                dirs.push(path);
            }
        }
        dirs.sort();
        Ok(dirs)
    }

    /// Remove temp directories of other digests.
    pub fn cleanup_tmpdir(&self) -> Result<()> {
        for dir in self.obsolete_tmpdirs()? {
            debug!(dir = %dir.display(), "removing obsolete temp dir");
            remove_path(&dir)?;
        }
        Ok(())
    }

    /// Obsolete temp dirs, the current temp dir, and every output file.
    pub fn files_to_clean(&self) -> Result<Vec<PathBuf>> {
        let mut files = self.obsolete_tmpdirs()?;
        files.push(self.digested_tmpdir());
        files.extend(self.output_files()?.iter().map(FileHandle::fullpath));
        Ok(files)
    }

    /// Remove everything [`Project::files_to_clean`] lists.
    pub fn clean(&self) -> Result<()> {
        let files = self.files_to_clean()?;
        let count = files.len();
        for path in files {
            remove_path(&path)?;
        }
        info!(count, "cleaned project");
        Ok(())
    }

    fn lock_state(&self) -> MutexGuard<'_, ProjectState> {
        self.state.lock().unwrap_or_else(|e| {
            warn!("project state lock was poisoned; continuing");
            e.into_inner()
        })
    }
}

fn build_from(
    cfg: &ConfigFile,
    base_dir: &Path,
    tmpdir: &Path,
    digest: &str,
    ctx: &Arc<BuildContext>,
) -> Result<Vec<Pipeline>> {
    build_pipelines(cfg, base_dir, &digested_tmpdir(tmpdir, Some(digest)), ctx)
}

fn digested_tmpdir(tmpdir: &Path, digest: Option<&str>) -> PathBuf {
    match digest {
        Some(d) => tmpdir.join(format!("{TMPDIR_PREFIX}{d}")),
        None => tmpdir.join(TMPDIR_PREFIX.trim_end_matches('-')),
    }
}

/// Short hex digest of config source.
pub fn digest(source: &str) -> String {
    let hash = blake3::hash(source.as_bytes());
    hash.to_hex().as_str()[..16].to_string()
}

fn base_dir_of(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn remove_path(path: &Path) -> Result<()> {
    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(AssetflowError::IoError(e)),
    }
}
