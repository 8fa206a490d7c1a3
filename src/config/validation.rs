//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (quota > 0, window > 0)
//! - Check addresses and URLs parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GateConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::GateConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check a configuration, collecting every error found.
pub fn validate_config(config: &GateConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.auth.token_secret.trim().is_empty() {
        errors.push(ValidationError::new("auth.token_secret", "must be set"));
    }
    if config.auth.session_cookies.is_empty() && !config.auth.accept_bearer {
        errors.push(ValidationError::new(
            "auth.session_cookies",
            "no token source configured",
        ));
    }

    if config.rate_limit.points == 0 {
        errors.push(ValidationError::new("rate_limit.points", "must be positive"));
    }
    if config.rate_limit.duration_secs == 0 {
        errors.push(ValidationError::new(
            "rate_limit.duration_secs",
            "must be positive",
        ));
    }
    if config.rate_limit.purge_interval_secs == 0 {
        errors.push(ValidationError::new(
            "rate_limit.purge_interval_secs",
            "must be positive",
        ));
    }

    if config.site.domain_url.trim().is_empty() {
        errors.push(ValidationError::new("site.domain_url", "must be set"));
    } else if url::Url::parse(&config.site.base_url()).is_err() {
        errors.push(ValidationError::new(
            "site.domain_url",
            format!("not a valid URL: {}", config.site.base_url()),
        ));
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("invalid socket address: {}", config.listener.bind_address),
        ));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::new(
            "listener.max_connections",
            "must be positive",
        ));
    }
    if config.upstream.address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "upstream.address",
            format!("invalid socket address: {}", config.upstream.address),
        ));
    }

    if config.client_ip.trust_forwarded_headers && config.client_ip.trusted_proxy_hops == 0 {
        errors.push(ValidationError::new(
            "client_ip.trusted_proxy_hops",
            "must be positive when forwarded headers are trusted",
        ));
    }

    for (field, path) in [
        ("paths.api_prefix", &config.paths.api_prefix),
        ("paths.landing_page", &config.paths.landing_page),
        ("paths.login_page", &config.paths.login_page),
    ] {
        if !path.starts_with('/') {
            errors.push(ValidationError::new(field, "must start with '/'"));
        }
    }

    if let Some(base) = &config.tracking.base_url {
        if url::Url::parse(base).is_err() {
            errors.push(ValidationError::new(
                "tracking.base_url",
                format!("not a valid URL: {}", base),
            ));
        }
    }
    if config.tracking.queue_capacity == 0 {
        errors.push(ValidationError::new(
            "tracking.queue_capacity",
            "must be positive",
        ));
    }
    if config.tracking.max_in_flight == 0 {
        errors.push(ValidationError::new(
            "tracking.max_in_flight",
            "must be positive",
        ));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!(
                "invalid socket address: {}",
                config.observability.metrics_address
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
