// src/file/mod.rs

//! File handles and modification-time helpers.

pub mod handle;
pub mod mtime;

pub use handle::FileHandle;
pub use mtime::{mtime_millis, mtime_or_now, now_millis};
