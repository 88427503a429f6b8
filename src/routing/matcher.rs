//! Route matching logic.
//!
//! # Responsibilities
//! - Decide whether a request path belongs to a route
//!
//! # Design Decisions
//! - Matchers see only the path; the table is agnostic to how they decide
//! - Path matching is case-sensitive
//! - Regex patterns are compiled once, when the route is registered

use std::fmt;

use regex::Regex;

/// Predicate over a request path.
pub trait Matcher: Send + Sync + fmt::Debug {
    /// Returns true if the path matches this condition.
    fn matches(&self, path: &str) -> bool;
}

/// Matches paths against a regular expression.
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    pattern: Regex,
}

impl RegexMatcher {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }
}

impl From<Regex> for RegexMatcher {
    fn from(pattern: Regex) -> Self {
        Self { pattern }
    }
}

impl Matcher for RegexMatcher {
    fn matches(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }
}

/// Matches the request path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }
}

/// Matches one path exactly.
#[derive(Debug, Clone)]
pub struct ExactMatcher {
    path: String,
}

impl ExactMatcher {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl Matcher for ExactMatcher {
    fn matches(&self, path: &str) -> bool {
        path == self.path
    }
}

/// Wraps an arbitrary closure. `label` stands in for it in debug output.
pub struct PredicateMatcher<F> {
    label: &'static str,
    predicate: F,
}

impl<F> PredicateMatcher<F>
where
    F: Fn(&str) -> bool + Send + Sync,
{
    pub fn new(label: &'static str, predicate: F) -> Self {
        Self { label, predicate }
    }
}

impl<F> fmt::Debug for PredicateMatcher<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateMatcher")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl<F> Matcher for PredicateMatcher<F>
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn matches(&self, path: &str) -> bool {
        (self.predicate)(path)
    }
}
