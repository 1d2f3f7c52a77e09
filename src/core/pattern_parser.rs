//! Pattern parsing utilities for path selection
//!
//! Two pattern languages are in play: glob patterns select files on disk for
//! scanning, and `%` wildcard patterns select stored paths for bulk
//! accept/unaccept. The wildcard matcher is self-contained so it behaves the
//! same whatever storage backend holds the paths.

use glob::Pattern;
use regex::Regex;
use std::path::{Component, Path};

/// Marker that turns a path argument into a wildcard pattern
pub const WILDCARD: char = '%';

/// `%` wildcard matcher: `%` matches any run of characters (including none).
/// Matching is case-sensitive and there is no escape syntax.
#[derive(Debug, Clone)]
pub struct WildcardPattern {
    source: String,
    regex: Regex,
}

impl WildcardPattern {
    pub fn new(pattern: &str) -> Result<Self, String> {
        let body = pattern
            .split(WILDCARD)
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        let regex = Regex::new(&format!("(?s)^{}$", body))
            .map_err(|e| format!("Invalid wildcard pattern '{}': {}", pattern, e))?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Target of an accept/unaccept command
#[derive(Debug, Clone)]
pub enum PathPattern {
    /// Must equal a stored path
    Exact(String),
    Wildcard(WildcardPattern),
}

impl PathPattern {
    /// Patterns containing `%` are wildcards, anything else is an exact path
    pub fn parse(pattern: &str) -> Result<Self, String> {
        if pattern.contains(WILDCARD) {
            Ok(PathPattern::Wildcard(WildcardPattern::new(pattern)?))
        } else {
            Ok(PathPattern::Exact(pattern.to_string()))
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Exact(exact) => exact == path,
            PathPattern::Wildcard(wildcard) => wildcard.matches(path),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, PathPattern::Wildcard(_))
    }
}

/// Validate glob pattern syntax
pub fn validate_glob_pattern(pattern: &str) -> Result<String, String> {
    match Pattern::new(pattern) {
        Ok(_) => Ok(pattern.to_string()),
        Err(e) => Err(format!("Invalid glob pattern '{}': {}", pattern, e)),
    }
}

/// Render `path` relative to `root` with `/` separators, the form stored paths use
pub fn relative_path_string(path: &Path, root: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
