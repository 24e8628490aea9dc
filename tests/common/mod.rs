#![allow(dead_code)]

pub use assetflow_test_utils::builders::{SOURCE_AGE, SourceTree};
pub use assetflow_test_utils::fake_filters::{
    IncludeFilter, OverlapFilter, StripAssertsFilter, SwitchableFilter, UppercaseFilter,
};
pub use assetflow_test_utils::init_tracing;

use std::path::PathBuf;

use assetflow::FileHandle;

/// Relative paths of `files`, in order.
pub fn paths(files: &[FileHandle]) -> Vec<String> {
    files.iter().map(|f| f.path().to_string()).collect()
}

/// Full paths of `files`, in order.
pub fn fullpaths(files: &[FileHandle]) -> Vec<PathBuf> {
    files.iter().map(FileHandle::fullpath).collect()
}
