// src/pattern/mod.rs

//! Glob compilation and input discovery.
//!
//! - [`glob`] compiles pipeline glob syntax into a path predicate.
//! - [`predicate`] wraps globs, regexes and closures for matcher steps.
//! - [`scan`] walks an input root and returns the matching relative paths.

pub mod glob;
pub mod predicate;
pub mod scan;

pub use glob::GlobMatcher;
pub use predicate::FilePredicate;
pub use scan::{collect_matching_files, relative_str};
