// src/pipeline/context.rs

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

static SHARED: OnceLock<Arc<BuildContext>> = OnceLock::new();

/// State shared by the pipelines of one build.
///
/// Holds the counter behind temp directory names. Pipelines that share a
/// temp root must share one context so no two stages are handed the same
/// directory. [`Pipeline::new`](crate::Pipeline::new) uses the
/// process-wide [`BuildContext::shared`] instance; a private context only
/// makes sense together with a private temp directory.
#[derive(Debug, Default)]
pub struct BuildContext {
    next_tmp_id: AtomicU64,
}

impl BuildContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// The context every pipeline starts with.
    pub fn shared() -> Arc<BuildContext> {
        Arc::clone(SHARED.get_or_init(|| Arc::new(BuildContext::new())))
    }

    /// A temp directory name never returned before by this context.
    pub fn next_tmp_name(&self) -> String {
        let id = self.next_tmp_id.fetch_add(1, Ordering::Relaxed) + 1;
        format!("stage-{id}")
    }
}
