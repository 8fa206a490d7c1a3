//! Policy decisions.
//!
//! # Responsibilities
//! - Turn a path class and an authentication state into a decision
//! - Describe rejections as structured JSON bodies
//!
//! # Design Decisions
//! - Pure functions only; the orchestration lives in `gate.rs`
//! - Anonymous users get a redirect, never a 403/404, so they cannot learn
//!   which protected resources exist

use axum::http::StatusCode;
use serde::Serialize;

use crate::config::PathRulesConfig;
use crate::routing::PathClass;
use crate::security::RateLimitOutcome;

/// The sole output of the policy engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// Redirect to a site-relative path.
    RedirectTo(String),
    Reject { status: StatusCode, body: RejectBody },
}

impl Decision {
    /// Label used in logs and metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::RedirectTo(_) => "redirect",
            Decision::Reject { status, .. } if *status == StatusCode::TOO_MANY_REQUESTS => {
                "rate_limited"
            }
            Decision::Reject { .. } => "error",
        }
    }
}

/// JSON body of a rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectBody {
    pub status: &'static str,
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u32>,
    #[serde(rename = "retryAfter", skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl RejectBody {
    pub fn rate_limited(outcome: &RateLimitOutcome, window_secs: u64) -> Self {
        Self {
            status: "error",
            code: StatusCode::TOO_MANY_REQUESTS.as_u16(),
            message: format!(
                "Too many requests. You have exceeded the limit of {} requests per {} seconds. Please try again in {} seconds.",
                outcome.limit, window_secs, outcome.retry_after
            ),
            limit: Some(outcome.limit),
            remaining: Some(0),
            retry_after: Some(outcome.retry_after),
        }
    }

    pub fn internal() -> Self {
        Self {
            status: "error",
            code: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            message: "Internal Server Error".to_string(),
            limit: None,
            remaining: None,
            retry_after: None,
        }
    }
}

/// Combines path class and authentication into a decision.
#[derive(Debug, Clone)]
pub struct PolicyEngine {
    landing_page: String,
    login_page: String,
    window_secs: u64,
}

impl PolicyEngine {
    pub fn new(landing_page: impl Into<String>, login_page: impl Into<String>, window_secs: u64) -> Self {
        Self {
            landing_page: landing_page.into(),
            login_page: login_page.into(),
            window_secs,
        }
    }

    pub fn from_config(paths: &PathRulesConfig, window_secs: u64) -> Self {
        Self::new(paths.landing_page.clone(), paths.login_page.clone(), window_secs)
    }

    /// Decision for a protected API request the limiter refused.
    pub fn rate_limited(&self, outcome: &RateLimitOutcome) -> Decision {
        Decision::Reject {
            status: StatusCode::TOO_MANY_REQUESTS,
            body: RejectBody::rate_limited(outcome, self.window_secs),
        }
    }

    /// Authentication step, reached only when throttling let the request through.
    pub fn decide(&self, class: &PathClass, authenticated: bool) -> Decision {
        if authenticated {
            if class.is_auth_page || class.is_root {
                Decision::RedirectTo(self.landing_page.clone())
            } else {
                Decision::Allow
            }
        } else if class.is_public() {
            Decision::Allow
        } else {
            Decision::RedirectTo(self.login_page.clone())
        }
    }
}

impl Default for PolicyEngine {
    fn default() -> Self {
        Self::new("/analytics", "/login", 60)
    }
}
