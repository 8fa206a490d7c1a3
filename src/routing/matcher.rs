//! Gate path matching.
//!
//! # Responsibilities
//! - Decide whether the gate runs for a request path at all
//! - Static assets, images and the favicon bypass the gate
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - No regex to guarantee O(n) matching
//! - Any matcher that claims a path excludes it (OR semantics)

use crate::config::PathRulesConfig;

/// Trait for matching request paths against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the path matches this condition.
    fn matches(&self, path: &str) -> bool;
}

/// Matches the request path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
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

/// Matches paths that look like files (`/robots.txt`, `/js/app.js`).
#[derive(Debug, Clone, Default)]
pub struct DottedPathMatcher;

impl Matcher for DottedPathMatcher {
    fn matches(&self, path: &str) -> bool {
        path.contains('.')
    }
}

/// Combines multiple matchers with OR semantics.
#[derive(Debug)]
pub struct AnyMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AnyMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }
}

impl Matcher for AnyMatcher {
    fn matches(&self, path: &str) -> bool {
        self.matchers.iter().any(|m| m.matches(path))
    }
}

/// Paths the gate is not invoked for.
#[derive(Debug)]
pub struct GateScope {
    excluded: AnyMatcher,
}

impl GateScope {
    pub fn from_config(config: &PathRulesConfig) -> Self {
        let mut matchers: Vec<Box<dyn Matcher>> = config
            .excluded_prefixes
            .iter()
            .map(|prefix| Box::new(PathPrefixMatcher::new(prefix.clone())) as Box<dyn Matcher>)
            .collect();
        if config.exclude_dotted {
            matchers.push(Box::new(DottedPathMatcher));
        }
        Self {
            excluded: AnyMatcher::new(matchers),
        }
    }

    /// True when the gate should evaluate this path.
    pub fn applies_to(&self, path: &str) -> bool {
        !self.excluded.matches(path)
    }
}
