//! Session token resolution.
//!
//! # Responsibilities
//! - Find a session token in the request (cookie or bearer header)
//! - Verify it and expose the claims
//!
//! # Design Decisions
//! - Fail closed: every verification failure means "anonymous"
//! - Verification is a trait so other token formats can be plugged in
//! - Claims live for one request and are never stored

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;

/// Claims carried by a verified session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    #[serde(default)]
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    pub fn subject(&self) -> &str {
        &self.sub
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Capability: verify a raw token.
pub trait SessionVerifier: Send + Sync {
    /// Claims for a valid token, `None` for anything else.
    fn verify(&self, token: &str) -> Option<SessionClaims>;
}

/// HS256 JWT verification with a shared secret.
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str, leeway_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = leeway_secs;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

impl SessionVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Option<SessionClaims> {
        match decode::<SessionClaims>(token, &self.key, &self.validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                tracing::debug!(error = %e, "Session token rejected");
                None
            }
        }
    }
}

/// Pulls a token out of a request and hands it to a verifier.
pub struct SessionResolver {
    verifier: Box<dyn SessionVerifier>,
    cookie_names: Vec<String>,
    accept_bearer: bool,
}

impl SessionResolver {
    pub fn new(verifier: Box<dyn SessionVerifier>, cookie_names: Vec<String>, accept_bearer: bool) -> Self {
        Self {
            verifier,
            cookie_names,
            accept_bearer,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            Box::new(JwtVerifier::new(&config.token_secret, config.leeway_secs)),
            config.session_cookies.clone(),
            config.accept_bearer,
        )
    }

    /// Claims for the request's session, or `None` when anonymous.
    pub fn resolve(&self, headers: &HeaderMap) -> Option<SessionClaims> {
        let token = self.extract_token(headers)?;
        self.verifier.verify(&token)
    }

    fn extract_token(&self, headers: &HeaderMap) -> Option<String> {
        for name in &self.cookie_names {
            if let Some(value) = find_cookie(headers, name) {
                return Some(value);
            }
        }

        if self.accept_bearer {
            return headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string);
        }

        None
    }
}

/// Value of the first cookie called `name` across all `Cookie` headers.
fn find_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}
