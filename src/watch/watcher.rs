// src/watch/watcher.rs

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, error, info, warn};

use crate::errors::Result;
use crate::pipeline::Stage;
use crate::project::Project;
use crate::watch::path_utils::is_within;

/// Default quiet period collected into one rebuild.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

/// Keeps a `notify` watcher alive and exposes its events as batches.
/// Dropping the handle stops watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
    events: Receiver<notify::Result<Event>>,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

impl WatcherHandle {
    /// Block until at least one change arrives, then keep collecting until
    /// `debounce` passes without another event. Returns the changed paths,
    /// or `None` once the watcher has shut down.
    pub fn next_batch(&self, debounce: Duration) -> Option<Vec<PathBuf>> {
        let mut paths = Vec::new();
        collect(&mut paths, self.events.recv().ok()?);

        loop {
            match self.events.recv_timeout(debounce) {
                Ok(event) => collect(&mut paths, event),
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        paths.sort();
        paths.dedup();
        Some(paths)
    }
}

fn collect(paths: &mut Vec<PathBuf>, event: notify::Result<Event>) {
    match event {
        Ok(event) => {
            if matches!(event.kind, EventKind::Access(_)) {
                return;
            }
            debug!(?event, "received notify event");
            paths.extend(event.paths);
        }
        Err(err) => warn!("file watch error: {err}"),
    }
}

/// Watch `recursive` directories with all their descendants and `shallow`
/// directories without. Paths that do not exist are skipped with a warning.
pub fn spawn_watcher(recursive: &[PathBuf], shallow: &[PathBuf]) -> Result<WatcherHandle> {
    let (tx, rx) = mpsc::channel();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| {
            // The receiver is gone once the handle is dropped.
            let _ = tx.send(res);
        },
        Config::default(),
    )?;

    let targets = recursive
        .iter()
        .map(|p| (p, RecursiveMode::Recursive))
        .chain(shallow.iter().map(|p| (p, RecursiveMode::NonRecursive)));

    for (path, mode) in targets {
        if !path.exists() {
            warn!(path = %path.display(), "not watching missing path");
            continue;
        }
        watcher.watch(path, mode)?;
        info!(path = %path.display(), ?mode, "watching");
    }

    Ok(WatcherHandle {
        _inner: watcher,
        events: rx,
    })
}

/// Build once, then rebuild with [`Project::invoke_clean`] after every batch
/// of relevant changes. Build errors are logged and watching continues.
/// Returns when the watcher shuts down.
pub fn watch_project(project: &Project, debounce: Duration) -> Result<()> {
    let roots = project.input_roots();
    let config = project.config_path().map(Path::to_path_buf);

    // Editors often replace a file instead of writing it in place, so the
    // config is watched through its directory.
    let shallow: Vec<PathBuf> = config
        .as_deref()
        .and_then(Path::parent)
        .map(|dir| vec![dir.to_path_buf()])
        .unwrap_or_default();
    let handle = spawn_watcher(&roots, &shallow)?;

    rebuild(project);

    while let Some(paths) = handle.next_batch(debounce) {
        let ignored = ignored_roots(project);
        let relevant = paths
            .iter()
            .filter(|p| !ignored.iter().any(|root| is_within(root, p)))
            .filter(|p| {
                config.as_deref() == Some(p.as_path()) || roots.iter().any(|root| is_within(root, p))
            })
            .count();

        if relevant == 0 {
            debug!(events = paths.len(), "no input or config changes; skipping rebuild");
            continue;
        }

        info!(changed = relevant, "change detected; rebuilding");
        rebuild(project);
    }

    info!("watcher stopped");
    Ok(())
}

fn rebuild(project: &Project) {
    if let Err(err) = project.invoke_clean() {
        error!("build failed: {err}");
    }
}

// Build products live in the temp dir and output roots; changes there are
// our own writes.
fn ignored_roots(project: &Project) -> Vec<PathBuf> {
    let mut roots = vec![project.tmpdir().to_path_buf()];
    project.with_pipelines(|pipelines| {
        for pipeline in pipelines.iter() {
            if let Some(root) = Stage::output_root(pipeline) {
                roots.push(root.to_path_buf());
            }
        }
    });
    roots
}
