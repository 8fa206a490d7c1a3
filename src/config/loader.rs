//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GateConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {name}: {value}")]
    Env { name: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file, then apply
/// environment overrides.
pub fn load_config(path: &Path) -> Result<GateConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: GateConfig = toml::from_str(&content)?;

    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Build a configuration from defaults and the environment only.
pub fn load_from_env() -> Result<GateConfig, ConfigError> {
    let mut config = GateConfig::default();
    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overlay environment variables onto a configuration.
///
/// `lookup` is injected so tests do not touch the process environment.
pub fn apply_env_overrides<F>(config: &mut GateConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(domain) = lookup("DOMAIN_URL") {
        config.site.domain_url = domain;
    }
    if let Some(secret) = lookup("JWT_SECRET").or_else(|| lookup("NEXTAUTH_SECRET")) {
        config.auth.token_secret = secret;
    }
    if let Some(points) = lookup("LIMIT_POINTS") {
        config.rate_limit.points = points.trim().parse().map_err(|_| ConfigError::Env {
            name: "LIMIT_POINTS",
            value: points.clone(),
        })?;
    }
    if let Some(duration) = lookup("LIMIT_DURATION") {
        config.rate_limit.duration_secs =
            duration.trim().parse().map_err(|_| ConfigError::Env {
                name: "LIMIT_DURATION",
                value: duration.clone(),
            })?;
    }
    if let Some(upstream) = lookup("UPSTREAM_ADDR") {
        config.upstream.address = upstream;
    }
    if let Some(bind) = lookup("BIND_ADDR") {
        config.listener.bind_address = bind;
    }
    Ok(())
}
