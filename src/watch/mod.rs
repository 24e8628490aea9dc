// src/watch/mod.rs

//! Watch mode: rebuild a [`crate::project::Project`] when its inputs or
//! config file change.
//!
//! Events from `notify` arrive on a channel and are drained into batches, so
//! a burst of saves triggers one rebuild. Changes under the temp dir or an
//! output root are ignored.

pub mod path_utils;
pub mod watcher;

pub use path_utils::is_within;
pub use watcher::{DEFAULT_DEBOUNCE, WatcherHandle, spawn_watcher, watch_project};
