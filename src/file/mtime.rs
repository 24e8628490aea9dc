// src/file/mtime.rs

//! Modification times as integer epoch milliseconds.
//!
//! Every timestamp that is compared or persisted (manifest entries, staleness
//! checks) goes through these helpers so precision is identical on both
//! sides of a comparison.

use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch for a `SystemTime`.
///
/// Times before the epoch clamp to 0.
pub fn system_time_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> u64 {
    system_time_millis(SystemTime::now())
}

/// Modification time of a regular file, or `None` if it does not exist or is
/// not a file.
pub fn mtime_millis(path: &Path) -> Option<u64> {
    let meta = fs::metadata(path).ok()?;
    if !meta.is_file() {
        return None;
    }
    meta.modified().ok().map(system_time_millis)
}

/// Modification time of `path`, falling back to "now" when the file is
/// missing.
pub fn mtime_or_now(path: &Path) -> u64 {
    mtime_millis(path).unwrap_or_else(now_millis)
}
