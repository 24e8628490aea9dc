// src/dag/mod.rs

//! Task graph and dependency bookkeeping.
//!
//! - [`task`] defines [`DynamicTask`], one output file with static and
//!   dynamically discovered prerequisites.
//! - [`runner`] holds the [`TaskGraph`] registry and its invoke / needed /
//!   re-enable logic.
//! - [`graph`] is a standalone named-node [`DependencyGraph`].

pub mod graph;
pub mod runner;
pub mod task;

pub use graph::{DependencyGraph, GraphNode};
pub use runner::{ManifestContext, TaskGraph};
pub use task::{DiscoveryFn, DynamicTask, InvocationState, TaskAction};
