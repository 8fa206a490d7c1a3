//! Request-gating middleware.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::error::GateError;
use crate::http::response::{
    apply_rate_limit_headers, internal_error_response, redirect_response, rejection_response,
};
use crate::observability::metrics;
use crate::policy::{Decision, Gate, RequestContext};

/// Gate every in-scope request.
///
/// Every response leaving this function, including faults and upstream
/// timeouts, carries the security header set.
pub async fn gate_middleware(
    State(gate): State<Arc<Gate>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !gate.applies_to(request.uri().path()) {
        return next.run(request).await;
    }

    let start = Instant::now();
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ctx = RequestContext::from_parts(
        request.method(),
        request.uri().path(),
        request.headers(),
        peer,
        gate.trusted_proxy_hops(),
    );

    tracing::debug!(path = %ctx.path, client_ip = %ctx.client_ip, method = %ctx.method, "Gating request");

    let evaluation = gate.evaluate(&ctx, request.headers());
    let outcome = evaluation.decision.outcome();
    metrics::record_decision(outcome, start);
    if outcome == "rate_limited" {
        metrics::record_rate_limited();
    }

    let result: Result<Response, GateError> = match evaluation.decision {
        Decision::Allow => {
            let mut response = next.run(request).await;
            if let Some(rate) = &evaluation.rate_limit {
                apply_rate_limit_headers(response.headers_mut(), rate);
            }
            Ok(response)
        }
        Decision::RedirectTo(target) => {
            tracing::info!(
                path = %ctx.path,
                target = %target,
                user = evaluation.session.as_ref().map(|s| s.subject()),
                "Redirecting"
            );
            gate.redirect_location(&target).and_then(redirect_response)
        }
        Decision::Reject { status, body } => Ok(rejection_response(
            status,
            &body,
            evaluation.rate_limit.as_ref(),
        )),
    };

    match result {
        Ok(mut response) => {
            gate.security_headers().apply(response.headers_mut());
            response
        }
        Err(e) => {
            tracing::error!(
                path = %ctx.path,
                client_ip = %ctx.client_ip,
                error = %e,
                status = e.status_code().as_u16(),
                "Unhandled gate error"
            );
            internal_error_response(gate.security_headers())
        }
    }
}
