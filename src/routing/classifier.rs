//! Path classification.
//!
//! # Responsibilities
//! - Decide which policy category a request path falls into
//! - Keep the rules static: compiled once from config, shared via Arc
//!
//! # Design Decisions
//! - Prefix rules are segment-aware: `/api` matches `/api` and `/api/x`,
//!   never `/apiary`
//! - Auth pages and root are exact matches
//! - Unknown paths are protected pages; nothing is public by accident

use crate::config::PathRulesConfig;

/// Facts about one request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PathClass {
    pub is_api: bool,
    pub is_public_api: bool,
    pub is_auth_page: bool,
    pub is_root: bool,
    pub is_protected_page: bool,
}

impl PathClass {
    /// API routes that require a session and are rate limited.
    pub fn is_protected_api(&self) -> bool {
        self.is_api && !self.is_public_api
    }

    /// Paths an anonymous visitor may reach.
    pub fn is_public(&self) -> bool {
        self.is_auth_page || self.is_public_api
    }
}

/// Compiled classification rules.
#[derive(Debug, Clone)]
pub struct PathClassifier {
    api_prefix: String,
    public_api_prefixes: Vec<String>,
    auth_pages: Vec<String>,
    protected_pages: Vec<String>,
}

impl PathClassifier {
    pub fn from_config(config: &PathRulesConfig) -> Self {
        Self {
            api_prefix: normalize_prefix(&config.api_prefix),
            public_api_prefixes: config
                .public_api_prefixes
                .iter()
                .map(|p| normalize_prefix(p))
                .collect(),
            auth_pages: config.auth_pages.clone(),
            protected_pages: vec![config.landing_page.clone()],
        }
    }

    /// Classify a request path. Pure and infallible.
    pub fn classify(&self, path: &str) -> PathClass {
        let is_api = has_segment_prefix(path, &self.api_prefix);
        let is_public_api = is_api
            && self
                .public_api_prefixes
                .iter()
                .any(|prefix| has_segment_prefix(path, prefix));
        let is_auth_page = self.auth_pages.iter().any(|page| page == path);
        let is_root = path == "/";
        let is_protected_page = (!is_api && !is_auth_page && !is_root)
            || self.protected_pages.iter().any(|page| page == path);

        PathClass {
            is_api,
            is_public_api,
            is_auth_page,
            is_root,
            is_protected_page,
        }
    }
}

impl Default for PathClassifier {
    fn default() -> Self {
        Self::from_config(&PathRulesConfig::default())
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

/// True when `path` equals `prefix` or continues it with a `/`.
fn has_segment_prefix(path: &str, prefix: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
