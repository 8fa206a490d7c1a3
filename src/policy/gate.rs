//! The gate: one evaluation per request.

use std::sync::Arc;

use axum::http::{HeaderMap, HeaderValue};
use chrono::Utc;

use crate::config::GateConfig;
use crate::error::{GateError, GateResult};
use crate::policy::context::RequestContext;
use crate::policy::decision::{Decision, PolicyEngine};
use crate::routing::{GateScope, PathClass, PathClassifier};
use crate::security::{FixedWindowLimiter, RateLimitOutcome, SecurityHeaders, SessionClaims, SessionResolver};
use crate::tracking::{TrackingEmitter, TrackingEvent};

/// Everything the response step needs to know.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub class: PathClass,
    pub decision: Decision,
    /// Present when the request went through the limiter.
    pub rate_limit: Option<RateLimitOutcome>,
    /// Present when the session resolved to a user.
    pub session: Option<SessionClaims>,
}

/// Shared, immutable gate state. One instance per process.
pub struct Gate {
    scope: GateScope,
    classifier: PathClassifier,
    sessions: SessionResolver,
    limiter: Arc<FixedWindowLimiter>,
    engine: PolicyEngine,
    headers: SecurityHeaders,
    emitter: TrackingEmitter,
    redirect_base: String,
    trusted_hops: usize,
}

impl Gate {
    pub fn from_config(config: &GateConfig, emitter: TrackingEmitter) -> Self {
        let limiter = Arc::new(FixedWindowLimiter::from_config(&config.rate_limit));
        Self {
            scope: GateScope::from_config(&config.paths),
            classifier: PathClassifier::from_config(&config.paths),
            sessions: SessionResolver::from_config(&config.auth),
            engine: PolicyEngine::from_config(&config.paths, limiter.window().as_secs()),
            limiter,
            headers: SecurityHeaders::new(),
            emitter,
            redirect_base: config.site.base_url(),
            trusted_hops: config.client_ip.effective_hops(),
        }
    }

    pub fn limiter(&self) -> &Arc<FixedWindowLimiter> {
        &self.limiter
    }

    pub fn security_headers(&self) -> &SecurityHeaders {
        &self.headers
    }

    /// Proxies whose `X-Forwarded-For` entries are trusted; 0 for none.
    pub fn trusted_proxy_hops(&self) -> usize {
        self.trusted_hops
    }

    /// False for static assets and other excluded paths.
    pub fn applies_to(&self, path: &str) -> bool {
        self.scope.applies_to(path)
    }

    /// Classify, throttle, authenticate and decide. Schedules tracking
    /// before returning; never waits on it.
    pub fn evaluate(&self, ctx: &RequestContext, headers: &HeaderMap) -> Evaluation {
        let class = self.classifier.classify(&ctx.path);

        let rate_limit = class
            .is_protected_api()
            .then(|| self.limiter.consume(&ctx.client_ip));

        let evaluation = match rate_limit {
            Some(outcome) if !outcome.allowed => {
                tracing::warn!(
                    client_ip = %ctx.client_ip,
                    path = %ctx.path,
                    retry_after = outcome.retry_after,
                    "Rate limit exceeded"
                );
                Evaluation {
                    class,
                    decision: self.engine.rate_limited(&outcome),
                    rate_limit,
                    session: None,
                }
            }
            _ => {
                let session = self.sessions.resolve(headers);
                let decision = self.engine.decide(&class, session.is_some());
                tracing::debug!(
                    path = %ctx.path,
                    client_ip = %ctx.client_ip,
                    authenticated = session.is_some(),
                    outcome = decision.outcome(),
                    "Gate decision"
                );
                Evaluation {
                    class,
                    decision,
                    rate_limit,
                    session,
                }
            }
        };

        if let Some(event) = TrackingEvent::for_request(&ctx.path, &class, Utc::now()) {
            self.emitter.emit(event);
        }

        evaluation
    }

    /// Absolute `Location` value for a site-relative target.
    pub fn redirect_location(&self, target: &str) -> GateResult<HeaderValue> {
        let url = format!("{}{}", self.redirect_base, target);
        HeaderValue::from_str(&url).map_err(|_| GateError::InvalidRedirect(url))
    }
}
