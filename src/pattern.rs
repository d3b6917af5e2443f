//! Glob filters for path-scoped profile overlays.
//!
//! `profile_for(glob, ...)` applies a profile or overlay only when the input
//! being processed matches `glob`. Matching is done against the absolute
//! input path with fnmatch semantics: `*` also matches `/`, so `*.foo`
//! selects every `.foo` file regardless of its directory.
//!
//! # Pattern Syntax
//!
//! - `*` matches any sequence of characters, separators included
//! - `?` matches any single character
//! - `[abc]` matches any character in the set
//! - `[a-z]` matches any character in the range
//!
//! # Examples
//!
//! ```lua
//! -- pprb.rules
//! profile_for("*.c", "comment_embedded")
//! profile_for("*/generated/*", { inline_expression = "\\$\\{(.*?)\\}" })
//! ```

use glob::{MatchOptions, Pattern};
use std::path::Path;
use tracing::trace;

use crate::core::PreprocessError;

/// Compiled glob filter for input paths.
///
/// # Examples
///
/// ```rust,no_run
/// use pprb::pattern::PathFilter;
/// use std::path::Path;
///
/// # fn example() -> Result<(), pprb::core::PreprocessError> {
/// let filter = PathFilter::new("*.foo")?;
///
/// assert!(filter.matches(Path::new("/work/site/page.foo")));
/// assert!(!filter.matches(Path::new("/work/site/page.html")));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PathFilter {
    pattern: Pattern,
    original_pattern: String,
}

impl PathFilter {
    /// Compile a glob filter.
    ///
    /// # Errors
    ///
    /// Returns [`PreprocessError::InvalidFilter`] when the glob is malformed
    /// (for example an unterminated `[` class).
    pub fn new(pattern_str: &str) -> Result<Self, PreprocessError> {
        let pattern = Pattern::new(pattern_str).map_err(|e| PreprocessError::InvalidFilter {
            pattern: pattern_str.to_string(),
            reason: e.msg.to_string(),
        })?;

        Ok(Self {
            pattern,
            original_pattern: pattern_str.to_string(),
        })
    }

    /// Check whether `path` matches the filter.
    ///
    /// Pure string matching; the filesystem is never touched.
    pub fn matches(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        let matched = self.pattern.matches_with(&path_str, Self::options());
        trace!("Filter '{}' against {}: {}", self.original_pattern, path_str, matched);
        matched
    }

    /// Returns the glob as written.
    pub fn as_str(&self) -> &str {
        &self.original_pattern
    }

    const fn options() -> MatchOptions {
        MatchOptions {
            case_sensitive: true,
            require_literal_separator: false,
            require_literal_leading_dot: false,
        }
    }
}
