//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gate.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the edge gate.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GateConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Application that allowed requests are forwarded to.
    pub upstream: UpstreamConfig,

    /// Public site settings used to build redirect URLs.
    pub site: SiteConfig,

    /// Session token verification.
    pub auth: AuthConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Path classification rules.
    pub paths: PathRulesConfig,

    /// Visitor tracking sink.
    pub tracking: TrackingConfig,

    /// Client IP resolution.
    pub client_ip: ClientIpConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrent in-flight requests (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Upstream application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream address (e.g., "127.0.0.1:3000").
    pub address: String,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:3000".to_string(),
            connect_timeout_secs: 5,
        }
    }
}

/// Public site configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Domain the site is served from, with or without a scheme.
    pub domain_url: String,

    /// Scheme prepended to `domain_url` when it has none.
    pub default_protocol: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            domain_url: "localhost".to_string(),
            default_protocol: "https://".to_string(),
        }
    }
}

impl SiteConfig {
    /// Domain with a guaranteed scheme and no trailing slash.
    pub fn base_url(&self) -> String {
        let domain = self.domain_url.trim().trim_end_matches('/');
        if domain.starts_with("http://") || domain.starts_with("https://") {
            domain.to_string()
        } else {
            format!("{}{}", self.default_protocol, domain)
        }
    }
}

/// Session token configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret the session tokens are signed with.
    pub token_secret: String,

    /// Cookie names checked for a session token, in order.
    pub session_cookies: Vec<String>,

    /// Also accept `Authorization: Bearer <token>`.
    pub accept_bearer: bool,

    /// Clock skew tolerated when checking `exp`, in seconds.
    pub leeway_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: String::new(),
            session_cookies: vec![
                "next-auth.session-token".to_string(),
                "__Secure-next-auth.session-token".to_string(),
            ],
            accept_bearer: true,
            leeway_secs: 0,
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests allowed per client IP in one window.
    pub points: u32,

    /// Window length in seconds.
    pub duration_secs: u64,

    /// How often expired buckets are swept, in seconds.
    pub purge_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            points: 60,
            duration_secs: 60,
            purge_interval_secs: 300,
        }
    }
}

/// Path classification rules.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PathRulesConfig {
    /// Prefix every API route lives under.
    pub api_prefix: String,

    /// API sub-trees exempt from auth and rate limiting.
    pub public_api_prefixes: Vec<String>,

    /// Sign-in pages, matched exactly.
    pub auth_pages: Vec<String>,

    /// Where authenticated users land.
    pub landing_page: String,

    /// Where anonymous users are sent.
    pub login_page: String,

    /// Prefixes the gate never runs for (static assets).
    pub excluded_prefixes: Vec<String>,

    /// Skip any path containing a `.` (files with an extension).
    pub exclude_dotted: bool,
}

impl Default for PathRulesConfig {
    fn default() -> Self {
        Self {
            api_prefix: "/api".to_string(),
            public_api_prefixes: vec![
                "/api/visitor".to_string(),
                "/api/auth".to_string(),
                "/api/general".to_string(),
            ],
            auth_pages: vec!["/login".to_string(), "/register".to_string()],
            landing_page: "/analytics".to_string(),
            login_page: "/login".to_string(),
            excluded_prefixes: vec![
                "/_next/static".to_string(),
                "/_next/image".to_string(),
                "/favicon.ico".to_string(),
            ],
            exclude_dotted: true,
        }
    }
}

/// Visitor tracking configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Enable tracking calls.
    pub enabled: bool,

    /// Base URL of the tracking endpoints. Defaults to the site base URL.
    pub base_url: Option<String>,

    /// Per-event delivery timeout in milliseconds.
    pub timeout_ms: u64,

    /// Events buffered before new ones are dropped.
    pub queue_capacity: usize,

    /// Deliveries allowed in flight at once.
    pub max_in_flight: usize,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: None,
            timeout_ms: 2000,
            queue_capacity: 1024,
            max_in_flight: 32,
        }
    }
}

/// Client IP resolution.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientIpConfig {
    /// Read `X-Forwarded-For` / `X-Real-IP` before the socket address.
    pub trust_forwarded_headers: bool,

    /// Proxies in front of the gate that append to `X-Forwarded-For`. The
    /// client is the entry this many places from the right; anything further
    /// left was supplied by the client.
    pub trusted_proxy_hops: usize,
}

impl ClientIpConfig {
    /// Hops to trust, or 0 when forwarded headers are ignored.
    pub fn effective_hops(&self) -> usize {
        if self.trust_forwarded_headers {
            self.trusted_proxy_hops
        } else {
            0
        }
    }
}

impl Default for ClientIpConfig {
    fn default() -> Self {
        Self {
            trust_forwarded_headers: true,
            trusted_proxy_hops: 1,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
