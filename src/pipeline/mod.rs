// src/pipeline/mod.rs

//! Pipelines: inputs, a chain of stages and an output root, compiled into a
//! [`TaskGraph`] and invoked incrementally.
//!
//! - [`Stage`] is the shared capability of everything that can sit in a
//!   chain: [`FilterStage`], [`Pipeline`] itself, [`Matcher`],
//!   [`RejectMatcher`] and [`SortedStage`].
//! - [`BuildContext`] hands out unique temp directory names.
//! - [`Pipeline::invoke`] reuses the task graph and the previous manifest;
//!   [`Pipeline::invoke_clean`] re-enumerates inputs and rebuilds the graph.

pub mod context;
pub mod matcher;
pub mod sorted;

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::dag::{ManifestContext, TaskGraph};
use crate::errors::{AssetflowError, Result};
use crate::file::FileHandle;
use crate::filter::{ConcatFilter, FilterStage};
use crate::fs::{FileSystem, RealFileSystem};
use crate::manifest::{JsonManifestStore, MANIFEST_FILE_NAME, Manifest, ManifestStore};
use crate::pattern::{GlobMatcher, collect_matching_files};

pub use context::BuildContext;
pub use matcher::{Matcher, RejectMatcher};
pub use sorted::{FileComparator, SortedStage};

/// Glob used for an input root added without one.
pub const DEFAULT_INPUT_GLOB: &str = "**/*";
/// Temp root used when none is configured.
pub const DEFAULT_TMP_ROOT: &str = "tmp";
/// Temp sub-directory used when none is configured.
pub const DEFAULT_TMP_SUBDIR: &str = "assetflow";

/// Anything that consumes a list of files and produces another.
pub trait Stage: Send + Sync + fmt::Debug {
    fn input_files(&self) -> &[FileHandle];
    fn set_input_files(&mut self, files: Vec<FileHandle>);

    fn output_root(&self) -> Option<&Path>;
    fn set_output_root(&mut self, root: PathBuf);

    /// Wire nested stages. Called after inputs and output root are assigned.
    fn setup(&mut self, ctx: &BuildContext, tmp_dir: &Path) -> Result<()>;

    /// Files this stage hands to the next one.
    fn output_files(&self) -> Result<Vec<FileHandle>>;

    /// Define this stage's tasks in `graph`; returns their names.
    fn generate_tasks(&self, graph: &mut TaskGraph) -> Result<Vec<PathBuf>>;

    /// One-line summary for `plan` output.
    fn describe(&self) -> String;
}

#[derive(Debug)]
struct BuiltTasks {
    graph: TaskGraph,
    names: Vec<PathBuf>,
}

/// Inputs, stages and output root of one build.
///
/// Input mode is either explicit files ([`Pipeline::set_input_files`]) or
/// root/glob pairs ([`Pipeline::add_input`]). Setup is idempotent: a stage
/// whose output root is already assigned keeps it, so temp directories and
/// the manifest stay valid across repeated invokes.
pub struct Pipeline {
    inputs: Vec<(PathBuf, String)>,
    explicit_inputs: Option<Vec<FileHandle>>,
    stages: Vec<Box<dyn Stage>>,
    finalizer: Option<FilterStage>,
    output_root: Option<PathBuf>,
    tmp_root: PathBuf,
    tmp_subdir: String,
    ctx: Arc<BuildContext>,
    fs: Arc<dyn FileSystem>,
    manifest_store: Option<Box<dyn ManifestStore>>,
    input_cache: Option<Vec<FileHandle>>,
    tasks: Option<BuiltTasks>,
    last_manifest: Option<Manifest>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            inputs: Vec::new(),
            explicit_inputs: None,
            stages: Vec::new(),
            finalizer: None,
            output_root: None,
            tmp_root: PathBuf::from(DEFAULT_TMP_ROOT),
            tmp_subdir: DEFAULT_TMP_SUBDIR.to_string(),
            ctx: BuildContext::shared(),
            fs: Arc::new(RealFileSystem),
            manifest_store: None,
            input_cache: None,
            tasks: None,
            last_manifest: None,
        }
    }

    /// Replace the process-wide temp name counter, e.g. to get predictable
    /// `stage-N` names under a temp directory no other pipeline uses.
    pub fn with_context(mut self, ctx: Arc<BuildContext>) -> Self {
        self.ctx = ctx;
        self
    }

    pub fn with_file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn with_manifest_store(mut self, store: Box<dyn ManifestStore>) -> Self {
        self.manifest_store = Some(store);
        self
    }

    /// Add an input root with a glob (default `**/*`). Adding a root that is
    /// already present replaces its glob. Switches the pipeline to root/glob
    /// input mode, dropping any explicit file list.
    pub fn add_input(&mut self, root: impl Into<PathBuf>, glob: Option<&str>) -> &mut Self {
        self.explicit_inputs = None;
        let root = absolutize(root.into());
        let glob = glob.unwrap_or(DEFAULT_INPUT_GLOB).to_string();

        match self.inputs.iter_mut().find(|(r, _)| *r == root) {
            Some(entry) => entry.1 = glob,
            None => self.inputs.push((root, glob)),
        }
        self.input_cache = None;
        self
    }

    pub fn inputs(&self) -> &[(PathBuf, String)] {
        &self.inputs
    }

    /// Use exactly these files as input. Switches the pipeline to explicit
    /// input mode, dropping any configured input roots.
    pub fn set_input_files(&mut self, files: Vec<FileHandle>) -> &mut Self {
        self.inputs.clear();
        self.explicit_inputs = Some(files);
        self.input_cache = None;
        self
    }

    pub fn set_output_root(&mut self, root: impl Into<PathBuf>) -> &mut Self {
        self.output_root = Some(absolutize(root.into()));
        self
    }

    pub fn set_tmp_root(&mut self, root: impl Into<PathBuf>) -> &mut Self {
        self.tmp_root = root.into();
        self
    }

    pub fn set_tmp_subdir(&mut self, subdir: impl Into<String>) -> &mut Self {
        self.tmp_subdir = subdir.into();
        self
    }

    pub fn add_stage(&mut self, stage: impl Stage + 'static) -> &mut Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn add_boxed_stage(&mut self, stage: Box<dyn Stage>) -> &mut Self {
        self.stages.push(stage);
        self
    }

    pub fn stages(&self) -> &[Box<dyn Stage>] {
        &self.stages
    }

    /// Append a final copy step that moves every generated file into the
    /// output root. Files that were pipeline inputs and never processed are
    /// left out.
    pub fn finalize(&mut self) -> &mut Self {
        if self.finalizer.is_none() {
            self.finalizer = Some(FilterStage::new(ConcatFilter::new()));
        }
        self
    }

    pub fn is_finalized(&self) -> bool {
        self.finalizer.is_some()
    }

    /// `<tmp_root>/<tmp_subdir>`, absolute.
    pub fn tmp_dir(&self) -> PathBuf {
        absolutize(self.tmp_root.clone()).join(&self.tmp_subdir)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.tmp_dir().join(MANIFEST_FILE_NAME)
    }

    /// The files fed to the first stage: the explicit list in explicit mode,
    /// otherwise every file under each input root matching its glob, sorted
    /// and deduplicated. Glob results are cached until
    /// [`Pipeline::invoke_clean`].
    pub fn input_files(&mut self) -> Result<Vec<FileHandle>> {
        if let Some(files) = &self.explicit_inputs {
            return Ok(files.clone());
        }
        if self.inputs.is_empty() {
            return Err(AssetflowError::MissingInputConfiguration);
        }
        if let Some(files) = &self.input_cache {
            return Ok(files.clone());
        }

        let mut files = Vec::new();
        for (root, pattern) in &self.inputs {
            let glob = GlobMatcher::new(pattern)?;
            for rel in collect_matching_files(self.fs.as_ref(), root, &glob)? {
                files.push(FileHandle::new(root.clone(), rel));
            }
        }
        files.sort();
        files.dedup();

        debug!(count = files.len(), "enumerated pipeline inputs");
        self.input_cache = Some(files.clone());
        Ok(files)
    }

    /// Assign output roots and feed each stage's outputs into the next.
    pub fn setup(&mut self) -> Result<()> {
        let ctx = Arc::clone(&self.ctx);
        let tmp_dir = self.tmp_dir();
        self.setup_with(&ctx, &tmp_dir)
    }

    fn setup_with(&mut self, ctx: &BuildContext, tmp_dir: &Path) -> Result<()> {
        let inputs = self.input_files()?;
        let output_root = self
            .output_root
            .clone()
            .ok_or_else(|| AssetflowError::ConfigError("pipeline has no output root".to_string()))?;

        let count = self.stages.len();
        let finalized = self.finalizer.is_some();
        let mut files = inputs.clone();

        for (i, stage) in self.stages.iter_mut().enumerate() {
            stage.set_input_files(files);
            if stage.output_root().is_none() {
                let root = if i + 1 == count && !finalized {
                    output_root.clone()
                } else {
                    tmp_dir.join(ctx.next_tmp_name())
                };
                debug!(stage = %stage.describe(), root = %root.display(), "assigned output root");
                stage.set_output_root(root);
            }
            stage.setup(ctx, tmp_dir)?;
            files = stage.output_files()?;
        }

        if let Some(finalizer) = &mut self.finalizer {
            let originals: HashSet<&FileHandle> = inputs.iter().collect();
            let generated = files.into_iter().filter(|f| !originals.contains(f)).collect();
            finalizer.set_input_files(generated);
            if finalizer.output_root().is_none() {
                finalizer.set_output_root(output_root);
            }
        }

        Ok(())
    }

    /// Files this pipeline produces, as of the last setup. A pipeline with no
    /// stages passes its inputs through.
    pub fn output_files(&self) -> Result<Vec<FileHandle>> {
        if let Some(finalizer) = &self.finalizer {
            return finalizer.output_files();
        }
        match self.stages.last() {
            Some(stage) => stage.output_files(),
            None => Ok(self
                .explicit_inputs
                .as_ref()
                .or(self.input_cache.as_ref())
                .cloned()
                .unwrap_or_default()),
        }
    }

    fn generate_all_tasks(&self, graph: &mut TaskGraph) -> Result<Vec<PathBuf>> {
        let mut names = Vec::new();
        for stage in &self.stages {
            names.extend(stage.generate_tasks(graph)?);
        }
        if let Some(finalizer) = &self.finalizer {
            names.extend(finalizer.generate_tasks(graph)?);
        }
        Ok(names)
    }

    /// Names of every task in the graph, building it if needed.
    pub fn task_names(&mut self) -> Result<Vec<PathBuf>> {
        self.setup()?;
        Ok(self.built_tasks()?.names.clone())
    }

    fn built_tasks(&mut self) -> Result<&mut BuiltTasks> {
        if self.tasks.is_none() {
            let mut graph = TaskGraph::new();
            let names = self.generate_all_tasks(&mut graph)?;
            debug!(tasks = names.len(), "built task graph");
            self.tasks = Some(BuiltTasks { graph, names });
        }
        self.tasks
            .as_mut()
            .ok_or_else(|| AssetflowError::ConfigError("task graph unavailable".to_string()))
    }

    fn store(&mut self) -> &mut Box<dyn ManifestStore> {
        let path = self.manifest_path();
        self.manifest_store
            .get_or_insert_with(|| Box::new(JsonManifestStore::new(path)))
    }

    /// Build everything that is out of date.
    ///
    /// Reuses the task graph and the previous run's manifest. On success the
    /// manifest recorded by this run is saved and becomes the previous one.
    /// A failure leaves already-written outputs on disk.
    pub fn invoke(&mut self) -> Result<()> {
        let started = Instant::now();
        self.setup()?;

        let last = match self.last_manifest.take() {
            Some(manifest) => manifest,
            None => self.store().load()?,
        };
        let mut current = Manifest::new();

        let result = self.built_tasks().and_then(|built| {
            built.graph.reenable_all();
            let mut manifests = ManifestContext::new(&last, &mut current);
            for name in &built.names {
                built.graph.invoke(name, Some(&mut manifests))?;
            }
            Ok(built.names.clone())
        });

        let names = match result {
            Ok(names) => names,
            Err(err) => {
                self.last_manifest = Some(last);
                return Err(err);
            }
        };
        let tasks = names.len();

        // Other pipelines under the same temp dir keep their entries; this
        // pipeline's outputs are replaced wholesale.
        let mut stored = self.store().load()?;
        stored.replace_outputs(&names, &current);
        self.store().save(&stored)?;
        self.last_manifest = Some(current);

        info!(tasks, elapsed_ms = started.elapsed().as_millis() as u64, "pipeline invoked");
        Ok(())
    }

    /// Like [`Pipeline::invoke`], but re-enumerates input files and rebuilds
    /// the task graph first, so added and removed files are picked up.
    /// Assigned output roots are kept.
    pub fn invoke_clean(&mut self) -> Result<()> {
        self.input_cache = None;
        self.tasks = None;
        self.invoke()
    }
}

impl Stage for Pipeline {
    fn input_files(&self) -> &[FileHandle] {
        self.explicit_inputs
            .as_deref()
            .or(self.input_cache.as_deref())
            .unwrap_or(&[])
    }

    fn set_input_files(&mut self, files: Vec<FileHandle>) {
        Pipeline::set_input_files(self, files);
    }

    fn output_root(&self) -> Option<&Path> {
        self.output_root.as_deref()
    }

    fn set_output_root(&mut self, root: PathBuf) {
        self.output_root = Some(root);
    }

    fn setup(&mut self, ctx: &BuildContext, tmp_dir: &Path) -> Result<()> {
        self.setup_with(ctx, tmp_dir)
    }

    fn output_files(&self) -> Result<Vec<FileHandle>> {
        Pipeline::output_files(self)
    }

    fn generate_tasks(&self, graph: &mut TaskGraph) -> Result<Vec<PathBuf>> {
        self.generate_all_tasks(graph)
    }

    fn describe(&self) -> String {
        let steps: Vec<String> = self.stages.iter().map(|s| s.describe()).collect();
        format!("pipeline [{}]", steps.join(", "))
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("inputs", &self.inputs)
            .field("explicit_inputs", &self.explicit_inputs.as_ref().map(Vec::len))
            .field("stages", &self.stages)
            .field("finalized", &self.finalizer.is_some())
            .field("output_root", &self.output_root)
            .field("tmp_dir", &self.tmp_dir())
            .finish()
    }
}

fn absolutize(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        std::path::absolute(&path).unwrap_or(path)
    }
}
