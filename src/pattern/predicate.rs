// src/pattern/predicate.rs

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::file::FileHandle;
use crate::pattern::glob::GlobMatcher;

/// Decides whether a file is selected by a matcher or rejected by a reject
/// step.
#[derive(Clone)]
pub enum FilePredicate {
    /// Glob over the handle's relative path.
    Glob(GlobMatcher),
    /// Unanchored regex search over the handle's relative path.
    Regex(Regex),
    /// Arbitrary closure.
    Custom(Arc<dyn Fn(&FileHandle) -> bool + Send + Sync>),
}

impl FilePredicate {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&FileHandle) -> bool + Send + Sync + 'static,
    {
        FilePredicate::Custom(Arc::new(f))
    }

    pub fn matches(&self, file: &FileHandle) -> bool {
        match self {
            FilePredicate::Glob(glob) => glob.is_match(file.path()),
            FilePredicate::Regex(re) => re.is_match(file.path()),
            FilePredicate::Custom(f) => f(file),
        }
    }
}

impl From<GlobMatcher> for FilePredicate {
    fn from(glob: GlobMatcher) -> Self {
        FilePredicate::Glob(glob)
    }
}

impl From<Regex> for FilePredicate {
    fn from(re: Regex) -> Self {
        FilePredicate::Regex(re)
    }
}

impl fmt::Debug for FilePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilePredicate::Glob(glob) => f.debug_tuple("Glob").field(&glob.pattern()).finish(),
            FilePredicate::Regex(re) => f.debug_tuple("Regex").field(&re.as_str()).finish(),
            FilePredicate::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
