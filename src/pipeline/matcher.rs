// src/pipeline/matcher.rs

use std::path::{Path, PathBuf};

use crate::dag::TaskGraph;
use crate::errors::Result;
use crate::file::FileHandle;
use crate::pattern::{FilePredicate, GlobMatcher};
use crate::pipeline::{BuildContext, Pipeline, Stage};

/// Runs a nested chain of stages over the files matching a predicate.
///
/// Files that do not match pass through untouched, so a later stage sees
/// the processed matches followed by the unmatched files.
#[derive(Debug)]
pub struct Matcher {
    predicate: FilePredicate,
    pipeline: Pipeline,
    input_files: Vec<FileHandle>,
}

impl Matcher {
    pub fn new(predicate: impl Into<FilePredicate>) -> Self {
        Self {
            predicate: predicate.into(),
            pipeline: Pipeline::new(),
            input_files: Vec::new(),
        }
    }

    pub fn glob(pattern: &str) -> Result<Self> {
        Ok(Self::new(GlobMatcher::new(pattern)?))
    }

    pub fn add_stage(&mut self, stage: impl Stage + 'static) -> &mut Self {
        self.pipeline.add_stage(stage);
        self
    }

    pub fn add_boxed_stage(&mut self, stage: Box<dyn Stage>) -> &mut Self {
        self.pipeline.add_boxed_stage(stage);
        self
    }

    pub fn with_stage(mut self, stage: impl Stage + 'static) -> Self {
        self.pipeline.add_stage(stage);
        self
    }

    pub fn predicate(&self) -> &FilePredicate {
        &self.predicate
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    fn partition(&self) -> (Vec<FileHandle>, Vec<FileHandle>) {
        self.input_files
            .iter()
            .cloned()
            .partition(|f| self.predicate.matches(f))
    }
}

impl Stage for Matcher {
    fn input_files(&self) -> &[FileHandle] {
        &self.input_files
    }

    fn set_input_files(&mut self, files: Vec<FileHandle>) {
        self.input_files = files;
    }

    fn output_root(&self) -> Option<&Path> {
        Stage::output_root(&self.pipeline)
    }

    fn set_output_root(&mut self, root: PathBuf) {
        Stage::set_output_root(&mut self.pipeline, root);
    }

    fn setup(&mut self, ctx: &BuildContext, tmp_dir: &Path) -> Result<()> {
        let (matched, _) = self.partition();
        self.pipeline.set_input_files(matched);
        self.pipeline.setup_with(ctx, tmp_dir)
    }

    fn output_files(&self) -> Result<Vec<FileHandle>> {
        let (_, unmatched) = self.partition();
        let mut files = self.pipeline.output_files()?;
        files.extend(unmatched);
        Ok(files)
    }

    fn generate_tasks(&self, graph: &mut TaskGraph) -> Result<Vec<PathBuf>> {
        Stage::generate_tasks(&self.pipeline, graph)
    }

    fn describe(&self) -> String {
        let steps: Vec<String> = self.pipeline.stages().iter().map(|s| s.describe()).collect();
        format!("match {:?} [{}]", self.predicate, steps.join(", "))
    }
}

/// Drops every file matching a predicate. Does no processing.
#[derive(Debug)]
pub struct RejectMatcher {
    predicate: FilePredicate,
    input_files: Vec<FileHandle>,
    output_root: Option<PathBuf>,
}

impl RejectMatcher {
    pub fn new(predicate: impl Into<FilePredicate>) -> Self {
        Self {
            predicate: predicate.into(),
            input_files: Vec::new(),
            output_root: None,
        }
    }

    pub fn glob(pattern: &str) -> Result<Self> {
        Ok(Self::new(GlobMatcher::new(pattern)?))
    }

    /// Reject files for which `f` returns `true`.
    pub fn with_fn<F>(f: F) -> Self
    where
        F: Fn(&FileHandle) -> bool + Send + Sync + 'static,
    {
        Self::new(FilePredicate::custom(f))
    }
}

impl Stage for RejectMatcher {
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
        Ok(self
            .input_files
            .iter()
            .filter(|f| !self.predicate.matches(f))
            .cloned()
            .collect())
    }

    fn generate_tasks(&self, _graph: &mut TaskGraph) -> Result<Vec<PathBuf>> {
        Ok(Vec::new())
    }

    fn describe(&self) -> String {
        format!("reject {:?}", self.predicate)
    }
}
