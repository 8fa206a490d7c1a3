//! Response construction for gate outcomes.
//!
//! # Responsibilities
//! - Render rejections as JSON with the right status and headers
//! - Build redirects with an absolute `Location`
//! - Provide the last-resort 500 used for faults and panics
//!
//! # Design Decisions
//! - Security headers are stamped by the caller on every path; the 500
//!   builders stamp them too because they also run outside the middleware

use std::any::Any;

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::error::GateResult;
use crate::policy::RejectBody;
use crate::security::{RateLimitOutcome, SecurityHeaders};

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Attach `X-RateLimit-*` headers.
pub fn apply_rate_limit_headers(headers: &mut HeaderMap, outcome: &RateLimitOutcome) {
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(outcome.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(outcome.remaining));
    headers.insert(X_RATELIMIT_RESET, HeaderValue::from(outcome.reset_at));
}

/// JSON rejection. Rate-limit rejections also carry `Retry-After`.
pub fn rejection_response(
    status: StatusCode,
    body: &RejectBody,
    rate_limit: Option<&RateLimitOutcome>,
) -> Response {
    let mut response = (status, Json(body)).into_response();
    if let Some(outcome) = rate_limit {
        let headers = response.headers_mut();
        headers.insert(header::RETRY_AFTER, HeaderValue::from(outcome.retry_after));
        apply_rate_limit_headers(headers, outcome);
        headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(0u32));
    }
    response
}

/// `307 Temporary Redirect` to `location`.
pub fn redirect_response(location: HeaderValue) -> GateResult<Response> {
    let response = Response::builder()
        .status(StatusCode::TEMPORARY_REDIRECT)
        .header(header::LOCATION, location)
        .body(Body::empty())?;
    Ok(response)
}

/// The 500 every unexpected fault ends in.
pub fn internal_error_response(headers: &SecurityHeaders) -> Response {
    let mut response = rejection_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        &RejectBody::internal(),
        None,
    );
    headers.apply(response.headers_mut());
    response
}

/// Handler for `CatchPanicLayer`.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(error = %message, "Request handler panicked");
    internal_error_response(&SecurityHeaders::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    fn outcome() -> RateLimitOutcome {
        RateLimitOutcome {
            allowed: false,
            limit: 5,
            remaining: 0,
            reset_at: 1_700_000_000,
            retry_after: 12,
        }
    }

    #[tokio::test]
    async fn test_rate_limited_response() {
        let body = RejectBody::rate_limited(&outcome(), 60);
        let response = rejection_response(StatusCode::TOO_MANY_REQUESTS, &body, Some(&outcome()));

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let headers = response.headers();
        assert_eq!(headers.get(header::RETRY_AFTER).unwrap(), "12");
        assert_eq!(headers.get("x-ratelimit-limit").unwrap(), "5");
        assert_eq!(headers.get("x-ratelimit-remaining").unwrap(), "0");
        assert_eq!(headers.get("x-ratelimit-reset").unwrap(), "1700000000");
        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "application/json");

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["retryAfter"], 12);
    }

    #[test]
    fn test_redirect_response() {
        let response = redirect_response(HeaderValue::from_static("https://example.com/login")).unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "https://example.com/login"
        );
    }

    #[test]
    fn test_panic_response_has_security_headers() {
        let response = panic_response(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(SecurityHeaders::new().is_present_in(response.headers()));
    }
}
