// src/dag/runner.rs

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::{debug, info, trace, warn};

use crate::dag::task::{DynamicTask, InvocationState};
use crate::errors::{AssetflowError, Result};
use crate::file::{mtime_millis, mtime_or_now};
use crate::manifest::{Manifest, ManifestEntry};

/// The two manifests in play during one build: what the previous run
/// recorded (read-only) and what this run records.
#[derive(Debug)]
pub struct ManifestContext<'a> {
    pub last: &'a Manifest,
    pub current: &'a mut Manifest,
}

impl<'a> ManifestContext<'a> {
    pub fn new(last: &'a Manifest, current: &'a mut Manifest) -> Self {
        Self { last, current }
    }
}

/// Registry of [`DynamicTask`]s keyed by output path, and the runner that
/// invokes them depth-first.
///
/// The graph is built once and invoked many times: [`TaskGraph::reenable_all`]
/// (or [`TaskGraph::recursively_reenable`]) resets per-task invocation state
/// without touching the wiring.
///
/// Invocation order for a task:
/// - static prerequisites, in declaration order
/// - dynamic prerequisites (reused from the last manifest when safe,
///   otherwise discovered)
/// - the task's own action, only if it is needed
/// - a fresh manifest entry in the current manifest (dynamic tasks only)
#[derive(Debug, Default)]
pub struct TaskGraph {
    tasks: Vec<DynamicTask>,
    index: HashMap<PathBuf, usize>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Look up or create the task for `name`. Defining an existing task
    /// returns it so callers can add prerequisites to it.
    pub fn define_task(&mut self, name: impl Into<PathBuf>) -> &mut DynamicTask {
        let name = name.into();
        let idx = match self.index.get(&name) {
            Some(&idx) => idx,
            None => {
                let idx = self.tasks.len();
                self.index.insert(name.clone(), idx);
                self.tasks.push(DynamicTask::new(name));
                idx
            }
        };
        &mut self.tasks[idx]
    }

    pub fn get(&self, name: &Path) -> Option<&DynamicTask> {
        self.index.get(name).map(|&idx| &self.tasks[idx])
    }

    pub fn contains(&self, name: &Path) -> bool {
        self.index.contains_key(name)
    }

    /// Task names in definition order.
    pub fn task_names(&self) -> impl Iterator<Item = &Path> {
        self.tasks.iter().map(|t| t.name())
    }

    /// Whether the task for `name` would run its action now.
    ///
    /// A path with no task is needed only when the file is missing.
    pub fn needed(&self, name: &Path, last: Option<&Manifest>) -> bool {
        match self.index.get(name) {
            Some(&idx) => self.needed_at(idx, last, &mut HashSet::new()),
            None => mtime_millis(name).is_none(),
        }
    }

    /// Dynamic prerequisites of `name`, memoized until the task is
    /// re-enabled. Never contains the task's own path.
    pub fn dynamic_prerequisites(
        &mut self,
        name: &Path,
        last: Option<&Manifest>,
    ) -> Result<Vec<PathBuf>> {
        match self.index.get(name).copied() {
            Some(idx) => self.dynamic_prerequisites_at(idx, last),
            None => Ok(Vec::new()),
        }
    }

    /// Invoke `name` and everything it depends on.
    ///
    /// `manifests` may be `None` only if no reachable task has a dynamic
    /// discovery function; otherwise [`AssetflowError::ManifestRequired`] is
    /// returned.
    pub fn invoke(&mut self, name: &Path, manifests: Option<&mut ManifestContext<'_>>) -> Result<()> {
        let mut chain = Vec::new();
        match self.index.get(name).copied() {
            Some(idx) => self.invoke_at(idx, &mut chain, manifests),
            None if name.exists() => Ok(()),
            None => Err(AssetflowError::MissingPrerequisite {
                task: "top level".to_string(),
                prerequisite: name.display().to_string(),
            }),
        }
    }

    /// Reset `name` and its transitive prerequisites (static and
    /// memoized dynamic) to `NotInvoked`.
    pub fn recursively_reenable(&mut self, name: &Path) {
        let mut seen = HashSet::new();
        let mut stack = vec![name.to_path_buf()];

        while let Some(next) = stack.pop() {
            let Some(&idx) = self.index.get(&next) else {
                continue;
            };
            if !seen.insert(idx) {
                continue;
            }

            let task = &mut self.tasks[idx];
            stack.extend(task.prerequisites().iter().cloned());
            if let Some(dynamics) = &task.dynamic_prerequisites {
                stack.extend(dynamics.iter().cloned());
            }
            task.reenable();
        }
    }

    pub fn reenable_all(&mut self) {
        for task in &mut self.tasks {
            task.reenable();
        }
    }

    fn invoke_at(
        &mut self,
        idx: usize,
        chain: &mut Vec<PathBuf>,
        manifests: Option<&mut ManifestContext<'_>>,
    ) -> Result<()> {
        let name = self.tasks[idx].name().to_path_buf();

        if chain.contains(&name) {
            let mut names: Vec<String> = chain.iter().map(|p| p.display().to_string()).collect();
            names.push(name.display().to_string());
            return Err(AssetflowError::Cycle(names.join(" => ")));
        }

        if self.tasks[idx].state == InvocationState::Invoked {
            return Ok(());
        }

        if self.tasks[idx].has_dynamic_block() && manifests.is_none() {
            return Err(AssetflowError::ManifestRequired {
                task: name.display().to_string(),
            });
        }

        chain.push(name.clone());
        self.tasks[idx].state = InvocationState::Invoking;
        let result = self.run_task(idx, &name, chain, manifests);
        chain.pop();
        result?;

        self.tasks[idx].state = InvocationState::Invoked;
        Ok(())
    }

    fn run_task(
        &mut self,
        idx: usize,
        name: &Path,
        chain: &mut Vec<PathBuf>,
        mut manifests: Option<&mut ManifestContext<'_>>,
    ) -> Result<()> {
        let statics = self.tasks[idx].prerequisites().to_vec();
        for prereq in &statics {
            self.invoke_prerequisite(name, prereq, chain, manifests.as_deref_mut())?;
        }

        let last = manifests.as_ref().map(|m| m.last);
        let dynamics = self.dynamic_prerequisites_at(idx, last)?;
        for prereq in &dynamics {
            match self.index.get(prereq).copied() {
                Some(dep) => self.invoke_at(dep, chain, manifests.as_deref_mut())?,
                None if prereq.exists() => {}
                None => warn!(
                    task = %name.display(),
                    dependency = %prereq.display(),
                    "dynamic dependency does not exist"
                ),
            }
        }

        let entry = self.tasks[idx].has_dynamic_block().then(|| {
            let deps = dynamics
                .iter()
                .map(|dep| (dep.clone(), mtime_or_now(dep)))
                .collect();
            ManifestEntry::new(deps, 0)
        });

        if self.needed_at(idx, last, &mut HashSet::new()) {
            if self.tasks[idx].has_action() {
                info!(task = %name.display(), "building");
            }
            self.tasks[idx].execute()?;
        } else {
            debug!(task = %name.display(), "up to date; skipping");
        }

        if let (Some(mut entry), Some(manifests)) = (entry, manifests) {
            entry.mtime = mtime_or_now(name);
            manifests.current.set(name, entry);
        }

        Ok(())
    }

    fn invoke_prerequisite(
        &mut self,
        task: &Path,
        prereq: &Path,
        chain: &mut Vec<PathBuf>,
        manifests: Option<&mut ManifestContext<'_>>,
    ) -> Result<()> {
        match self.index.get(prereq).copied() {
            Some(idx) => self.invoke_at(idx, chain, manifests),
            None if prereq.exists() => Ok(()),
            None => Err(AssetflowError::MissingPrerequisite {
                task: task.display().to_string(),
                prerequisite: prereq.display().to_string(),
            }),
        }
    }

    // Tasks already visited in this check count as not needed; a visited
    // task that *was* needed has already short-circuited the whole check.
    fn needed_at(&self, idx: usize, last: Option<&Manifest>, visited: &mut HashSet<usize>) -> bool {
        if !visited.insert(idx) {
            return false;
        }

        let task = &self.tasks[idx];
        let name = task.name();

        let Some(own) = mtime_millis(name) else {
            trace!(task = %name.display(), "needed: output missing");
            return true;
        };

        for prereq in task.prerequisites() {
            if let Some(&dep) = self.index.get(prereq) {
                if self.needed_at(dep, last, visited) {
                    trace!(task = %name.display(), prerequisite = %prereq.display(), "needed: prerequisite needed");
                    return true;
                }
            }
            match mtime_millis(prereq) {
                Some(mtime) if mtime <= own => {}
                _ => {
                    trace!(task = %name.display(), prerequisite = %prereq.display(), "needed: prerequisite newer");
                    return true;
                }
            }
        }

        if !task.has_dynamic_block() {
            return false;
        }

        let Some(entry) = last.and_then(|m| m.get(name)) else {
            trace!(task = %name.display(), "needed: no manifest entry");
            return true;
        };

        for (dep, recorded) in &entry.deps {
            match mtime_millis(dep) {
                Some(mtime) if mtime <= *recorded => {}
                Some(_) => {
                    trace!(task = %name.display(), dependency = %dep.display(), "needed: dynamic dependency changed");
                    return true;
                }
                None => {
                    warn!(task = %name.display(), dependency = %dep.display(), "recorded dynamic dependency is gone");
                    return true;
                }
            }
        }

        false
    }

    fn dynamic_prerequisites_at(&mut self, idx: usize, last: Option<&Manifest>) -> Result<Vec<PathBuf>> {
        if let Some(cached) = &self.tasks[idx].dynamic_prerequisites {
            return Ok(cached.clone());
        }

        let task = &self.tasks[idx];
        let found = if !task.has_dynamic_block() {
            Vec::new()
        } else if let Some(reused) = self.prerequisites_from_manifest(idx, last) {
            debug!(task = %task.name().display(), count = reused.len(), "reusing dynamic dependencies from manifest");
            reused
        } else {
            debug!(task = %task.name().display(), "discovering dynamic dependencies");
            task.invoke_dynamic_block()?
        };

        let own = task.name().to_path_buf();
        let mut seen = HashSet::new();
        let dynamics: Vec<PathBuf> = found
            .into_iter()
            .filter(|p| *p != own && seen.insert(p.clone()))
            .collect();

        self.tasks[idx].dynamic_prerequisites = Some(dynamics.clone());
        Ok(dynamics)
    }

    // The previous run's dependency list is still valid when the task is not
    // needed and its output is exactly the file that run produced.
    fn prerequisites_from_manifest(&self, idx: usize, last: Option<&Manifest>) -> Option<Vec<PathBuf>> {
        let name = self.tasks[idx].name();
        let entry = last?.get(name)?;

        if self.needed_at(idx, last, &mut HashSet::new()) {
            return None;
        }

        let mtime = mtime_millis(name)?;
        (mtime == entry.mtime).then(|| entry.dep_paths())
    }
}
