// src/pipeline/sorted.rs

use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::dag::TaskGraph;
use crate::errors::Result;
use crate::file::FileHandle;
use crate::pipeline::{BuildContext, Stage};

pub type FileComparator = Arc<dyn Fn(&FileHandle, &FileHandle) -> Ordering + Send + Sync>;

/// Passes its inputs on unchanged, in sorted order. Useful in front of a
/// concatenation whose output depends on input order.
pub struct SortedStage {
    comparator: Option<FileComparator>,
    reverse: bool,
    input_files: Vec<FileHandle>,
    output_root: Option<PathBuf>,
}

impl Default for SortedStage {
    fn default() -> Self {
        Self::new()
    }
}

impl SortedStage {
    /// Sort by `(root, path)`.
    pub fn new() -> Self {
        Self {
            comparator: None,
            reverse: false,
            input_files: Vec::new(),
            output_root: None,
        }
    }

    pub fn by<F>(f: F) -> Self
    where
        F: Fn(&FileHandle, &FileHandle) -> Ordering + Send + Sync + 'static,
    {
        Self {
            comparator: Some(Arc::new(f)),
            ..Self::new()
        }
    }

    pub fn reversed(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }
}

impl Stage for SortedStage {
    fn input_files(&self) -> &[FileHandle] {
        &self.input_files
    }

    fn set_input_files(&mut self, files: Vec<FileHandle>) {
        self.input_files = files;
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
        let mut files = self.input_files.clone();
        match &self.comparator {
            Some(cmp) => files.sort_by(|a, b| cmp(a, b)),
            None => files.sort(),
        }
        if self.reverse {
            files.reverse();
        }
        Ok(files)
    }

    fn generate_tasks(&self, _graph: &mut TaskGraph) -> Result<Vec<PathBuf>> {
        Ok(Vec::new())
    }

    fn describe(&self) -> String {
        if self.reverse { "sort (reverse)".to_string() } else { "sort".to_string() }
    }
}

impl fmt::Debug for SortedStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortedStage")
            .field("custom_comparator", &self.comparator.is_some())
            .field("reverse", &self.reverse)
            .field("inputs", &self.input_files.len())
            .finish()
    }
}
