// src/filter/mod.rs

//! Filters and the stage that maps their inputs onto outputs.
//!
//! A [`Filter`] only knows how to turn an ordered list of inputs into one
//! output. [`FilterStage`] owns the wiring around it: the input files, the
//! output root, the naming function that groups inputs into outputs, and the
//! task generation that hands the work to a [`TaskGraph`].

pub mod builtin;

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::trace;

use crate::dag::{DynamicTask, TaskGraph};
use crate::errors::{AssetflowError, Result};
use crate::file::FileHandle;
use crate::pipeline::{BuildContext, Stage};
use crate::types::Encoding;

pub use builtin::{ConcatFilter, GsubFilter, OrderingConcatFilter};

/// Content transformation plugged into a [`FilterStage`].
pub trait Filter: Send + Sync {
    /// Short name used in logs and `plan` output.
    fn name(&self) -> &str;

    /// Encoding inputs are re-tagged with before processing. Binary filters
    /// skip UTF-8 validation and tag their outputs binary.
    fn encoding(&self) -> Encoding {
        Encoding::Utf8
    }

    /// Write `output` from `inputs`. `output` is already created and is
    /// closed by the caller.
    fn generate_output(&self, inputs: &[FileHandle], output: &mut FileHandle) -> Result<()>;

    /// Whether [`Filter::additional_dependencies`] should be consulted at
    /// all. Filters that return `true` get a dynamic discovery step on every
    /// output task.
    fn has_additional_dependencies(&self) -> bool {
        false
    }

    /// Extra files `input` depends on, found by inspecting it. Relative
    /// paths are resolved against the input's root.
    fn additional_dependencies(&self, _input: &FileHandle) -> Result<Vec<PathBuf>> {
        Ok(Vec::new())
    }
}

/// Maps an input (relative path plus handle) to one or more output paths,
/// relative to the stage's output root.
pub type OutputNamer = Arc<dyn Fn(&str, &FileHandle) -> Vec<String> + Send + Sync>;

/// Every input keeps its own path.
pub fn identity_namer() -> OutputNamer {
    Arc::new(|path, _| vec![path.to_string()])
}

/// Every input lands in the same output.
pub fn fixed_namer(name: impl Into<String>) -> OutputNamer {
    let name = name.into();
    Arc::new(move |_, _| vec![name.clone()])
}

/// A [`Filter`] bound to its inputs and output root.
pub struct FilterStage {
    filter: Arc<dyn Filter>,
    namer: OutputNamer,
    input_files: Vec<FileHandle>,
    output_root: Option<PathBuf>,
}

impl FilterStage {
    pub fn new(filter: impl Filter + 'static) -> Self {
        Self::from_arc(Arc::new(filter))
    }

    pub fn from_arc(filter: Arc<dyn Filter>) -> Self {
        Self {
            filter,
            namer: identity_namer(),
            input_files: Vec::new(),
            output_root: None,
        }
    }

    pub fn with_namer(mut self, namer: OutputNamer) -> Self {
        self.namer = namer;
        self
    }

    /// Shorthand for [`FilterStage::with_namer`] with a closure.
    pub fn output_name<F>(self, f: F) -> Self
    where
        F: Fn(&str, &FileHandle) -> Vec<String> + Send + Sync + 'static,
    {
        self.with_namer(Arc::new(f))
    }

    pub fn filter(&self) -> &dyn Filter {
        self.filter.as_ref()
    }

    fn output_handle(&self, root: &Path, path: &str) -> FileHandle {
        FileHandle::with_root_path_encoding(root, path, self.filter.encoding())
    }

    /// Each distinct output with the inputs that feed it, in first-seen
    /// order. Inputs are deduplicated per output.
    pub fn outputs(&self) -> Result<Vec<(FileHandle, Vec<FileHandle>)>> {
        let root = self.require_output_root()?;
        let mut outputs: Vec<(FileHandle, Vec<FileHandle>)> = Vec::new();
        let mut index: HashMap<FileHandle, usize> = HashMap::new();

        for input in &self.input_files {
            for name in (self.namer)(input.path(), input) {
                let output = self.output_handle(root, &name);
                let slot = match index.get(&output) {
                    Some(&slot) => slot,
                    None => {
                        index.insert(output.clone(), outputs.len());
                        outputs.push((output, Vec::new()));
                        outputs.len() - 1
                    }
                };

                let inputs = &mut outputs[slot].1;
                if !inputs.contains(input) {
                    inputs.push(input.clone());
                }
            }
        }

        Ok(outputs)
    }

    fn require_output_root(&self) -> Result<&Path> {
        self.output_root.as_deref().ok_or_else(|| {
            AssetflowError::ConfigError(format!(
                "filter '{}' has no output root; run pipeline setup first",
                self.filter.name()
            ))
        })
    }
}

impl Stage for FilterStage {
    fn input_files(&self) -> &[FileHandle] {
        &self.input_files
    }

    /// Inputs are re-tagged with the filter's encoding.
    fn set_input_files(&mut self, files: Vec<FileHandle>) {
        let encoding = self.filter.encoding();
        self.input_files = files.iter().map(|f| f.with_encoding(encoding)).collect();
    }

    fn output_root(&self) -> Option<&Path> {
        self.output_root.as_deref()
    }

    fn set_output_root(&mut self, root: PathBuf) {
        self.output_root = Some(root);
    }

    fn setup(&mut self, _ctx: &BuildContext, _tmp_dir: &Path) -> Result<()> {
        Ok(())
    }

    fn output_files(&self) -> Result<Vec<FileHandle>> {
        Ok(self.outputs()?.into_iter().map(|(output, _)| output).collect())
    }

    /// One task per output. Static prerequisites are the inputs' full paths;
    /// [`Filter::additional_dependencies`] becomes the task's discovery step.
    fn generate_tasks(&self, graph: &mut TaskGraph) -> Result<Vec<PathBuf>> {
        let mut names = Vec::new();

        for (output, inputs) in self.outputs()? {
            let name = output.fullpath();
            trace!(filter = self.filter.name(), output = %name.display(), inputs = inputs.len(), "defining task");

            let task = graph.define_task(name.clone());
            task.enhance(inputs.iter().map(FileHandle::fullpath));

            let filter = Arc::clone(&self.filter);
            let action_inputs = inputs.clone();
            task.set_action(Arc::new(move |_: &DynamicTask| {
                let mut output = output.clone();
                output.with_created(|out| filter.generate_output(&action_inputs, out))
            }));

            // Not static prerequisites fixed at setup: the scan runs lazily
            // inside the task so an unchanged output can reuse the last
            // manifest's list instead of reading every input again.
            if self.filter.has_additional_dependencies() {
                let filter = Arc::clone(&self.filter);
                task.dynamic(Arc::new(move |_: &DynamicTask| -> Result<Vec<PathBuf>> {
                    let mut deps = Vec::new();
                    for input in &inputs {
                        for dep in filter.additional_dependencies(input)? {
                            deps.push(if dep.is_absolute() {
                                dep
                            } else {
                                input.root().join(dep)
                            });
                        }
                    }
                    Ok(deps)
                }));
            }

            names.push(name);
        }

        Ok(names)
    }

    fn describe(&self) -> String {
        self.filter.name().to_string()
    }
}

impl fmt::Debug for FilterStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterStage")
            .field("filter", &self.filter.name())
            .field("inputs", &self.input_files.len())
            .field("output_root", &self.output_root)
            .finish()
    }
}
