//! Security response headers.
//!
//! # Responsibilities
//! - Hold the fixed security header set
//! - Stamp it onto every response the gate produces or forwards
//!
//! # Design Decisions
//! - Built once at startup; per-request work is a header copy
//! - Values are static so construction cannot fail
//! - Overwrites whatever the upstream set for the same names

use axum::http::{HeaderMap, HeaderName, HeaderValue};

pub const CONTENT_SECURITY_POLICY: &str =
    "frame-ancestors 'none'; block-all-mixed-content; upgrade-insecure-requests;";

const HEADERS: &[(&str, &str)] = &[
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("x-xss-protection", "1; mode=block"),
    ("referrer-policy", "strict-origin-when-cross-origin"),
    ("permissions-policy", "camera=(), microphone=(), geolocation=()"),
    ("access-control-allow-origin", "*"),
    ("access-control-allow-methods", "GET, POST, PUT, DELETE, OPTIONS"),
    ("access-control-allow-headers", "Content-Type, Authorization"),
    ("access-control-allow-credentials", "true"),
    ("content-security-policy", CONTENT_SECURITY_POLICY),
];

/// The header set attached to every gate response.
#[derive(Debug, Clone)]
pub struct SecurityHeaders {
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl SecurityHeaders {
    pub fn new() -> Self {
        let headers = HEADERS
            .iter()
            .map(|&(name, value)| {
                (
                    HeaderName::from_static(name),
                    HeaderValue::from_static(value),
                )
            })
            .collect();
        Self { headers }
    }

    /// Insert every header, replacing existing values.
    pub fn apply(&self, target: &mut HeaderMap) {
        for (name, value) in &self.headers {
            target.insert(name.clone(), value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &HeaderValue)> {
        self.headers.iter().map(|(n, v)| (n, v))
    }

    /// True when `headers` carries the full set.
    pub fn is_present_in(&self, headers: &HeaderMap) -> bool {
        self.headers
            .iter()
            .all(|(name, value)| headers.get(name) == Some(value))
    }
}

impl Default for SecurityHeaders {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_overwrites() {
        let mut headers = HeaderMap::new();
        headers.insert("x-frame-options", HeaderValue::from_static("SAMEORIGIN"));

        let set = SecurityHeaders::new();
        set.apply(&mut headers);

        assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
        assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
        assert_eq!(
            headers.get("content-security-policy").unwrap(),
            CONTENT_SECURITY_POLICY
        );
        assert!(set.is_present_in(&headers));
    }

    #[test]
    fn test_partial_set_detected() {
        let mut headers = HeaderMap::new();
        headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
        assert!(!SecurityHeaders::new().is_present_in(&headers));
    }

    #[test]
    fn test_set_size() {
        assert_eq!(SecurityHeaders::new().iter().count(), 10);
    }
}
