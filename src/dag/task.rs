// src/dag/task.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::Result;

/// The work a task performs once its prerequisites are up to date.
pub type TaskAction = Arc<dyn Fn(&DynamicTask) -> Result<()> + Send + Sync>;

/// Discovers extra prerequisites of a task just before it runs, typically by
/// reading its inputs (e.g. scanning for `#include` directives). It may
/// assume every static prerequisite is already up to date.
pub type DiscoveryFn = Arc<dyn Fn(&DynamicTask) -> Result<Vec<PathBuf>> + Send + Sync>;

/// Per-invocation state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvocationState {
    #[default]
    NotInvoked,
    Invoking,
    Invoked,
}

/// One output file and how to produce it.
///
/// Static prerequisites are known when the task is defined. Dynamic ones are
/// produced by the optional [`DiscoveryFn`] at invoke time, or reused from the
/// previous run's manifest when nothing changed. Tasks live in a
/// [`TaskGraph`](crate::dag::TaskGraph), which drives the state machine.
pub struct DynamicTask {
    name: PathBuf,
    prerequisites: Vec<PathBuf>,
    action: Option<TaskAction>,
    discovery: Option<DiscoveryFn>,
    pub(crate) state: InvocationState,
    pub(crate) dynamic_prerequisites: Option<Vec<PathBuf>>,
}

impl DynamicTask {
    pub fn new(name: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            prerequisites: Vec::new(),
            action: None,
            discovery: None,
            state: InvocationState::NotInvoked,
            dynamic_prerequisites: None,
        }
    }

    /// The output path this task produces.
    pub fn name(&self) -> &Path {
        &self.name
    }

    pub fn prerequisites(&self) -> &[PathBuf] {
        &self.prerequisites
    }

    pub fn state(&self) -> InvocationState {
        self.state
    }

    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }

    pub fn has_dynamic_block(&self) -> bool {
        self.discovery.is_some()
    }

    /// Append static prerequisites, skipping ones already present.
    pub fn enhance<I, P>(&mut self, prerequisites: I) -> &mut Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        for p in prerequisites {
            let p = p.into();
            if !self.prerequisites.contains(&p) {
                self.prerequisites.push(p);
            }
        }
        self
    }

    pub fn set_action(&mut self, action: TaskAction) -> &mut Self {
        self.action = Some(action);
        self
    }

    /// Attach the dynamic discovery function.
    pub fn dynamic(&mut self, discovery: DiscoveryFn) -> &mut Self {
        self.discovery = Some(discovery);
        self
    }

    /// Run the discovery function directly, bypassing the manifest.
    /// Returns an empty list when the task has none.
    pub fn invoke_dynamic_block(&self) -> Result<Vec<PathBuf>> {
        match &self.discovery {
            Some(discover) => discover(self),
            None => Ok(Vec::new()),
        }
    }

    pub(crate) fn execute(&self) -> Result<()> {
        match &self.action {
            Some(action) => action(self),
            None => Ok(()),
        }
    }

    /// Reset per-invocation state so the task can run again.
    pub fn reenable(&mut self) {
        self.state = InvocationState::NotInvoked;
        self.dynamic_prerequisites = None;
    }
}

impl fmt::Debug for DynamicTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicTask")
            .field("name", &self.name)
            .field("prerequisites", &self.prerequisites)
            .field("has_action", &self.action.is_some())
            .field("has_dynamic_block", &self.discovery.is_some())
            .field("state", &self.state)
            .finish()
    }
}
