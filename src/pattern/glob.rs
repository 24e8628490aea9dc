// src/pattern/glob.rs

use std::fmt;

use globset::GlobBuilder;

use crate::errors::Result;

/// Compiled glob pattern matched against relative, `/`-separated paths.
///
/// Supported syntax:
/// - `*` matches any run of characters except `/`
/// - `**/` matches any number of leading directories, including none
/// - `{a,b,c}` alternation
/// - literal segments
///
/// Matching is case-insensitive and anchored to the whole relative path, so
/// `*.js` matches `app.js` but not `sub/app.js`.
#[derive(Clone)]
pub struct GlobMatcher {
    pattern: String,
    matcher: globset::GlobMatcher,
}

impl GlobMatcher {
    pub fn new(pattern: &str) -> Result<Self> {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .case_insensitive(true)
            .backslash_escape(true)
            .build()?;

        Ok(Self {
            pattern: pattern.to_string(),
            matcher: glob.compile_matcher(),
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_match(&self, rel_path: &str) -> bool {
        self.matcher.is_match(rel_path)
    }
}

impl fmt::Debug for GlobMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GlobMatcher").field(&self.pattern).finish()
    }
}
