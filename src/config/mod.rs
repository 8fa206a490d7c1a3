//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + environment (.env, DOMAIN_URL, JWT_SECRET, ...)
//!     → loader.rs (parse, deserialize, apply env overrides)
//!     → validation.rs (semantic checks)
//!     → GateConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Startup fails fast on a missing secret or a non-positive quota

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_from_env, ConfigError};
pub use schema::{
    AuthConfig, ClientIpConfig, GateConfig, ListenerConfig, ObservabilityConfig, PathRulesConfig,
    RateLimitConfig, SiteConfig, TimeoutConfig, TrackingConfig, UpstreamConfig,
};
