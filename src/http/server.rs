//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the gate and its background tasks from config
//! - Wire up middleware (gate, panic capture, timeout, request ID, tracing)
//! - Forward allowed requests to the upstream application
//! - Serve until the shutdown coordinator fires

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{
        uri::{Authority, PathAndQuery, Scheme},
        Request, StatusCode, Uri,
    },
    middleware,
    response::{IntoResponse, Response},
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GateConfig;
use crate::http::middleware::gate_middleware;
use crate::http::response::panic_response;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::policy::Gate;
use crate::tracking::{HttpTrackingSink, TrackingEmitter, TrackingError};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid upstream address '{0}'")]
    InvalidUpstream(String),

    #[error("failed to build tracking sink: {0}")]
    Tracking(#[from] TrackingError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// State for the upstream forwarding handler.
#[derive(Clone)]
struct UpstreamState {
    client: Client<HttpConnector, Body>,
    authority: Authority,
}

/// The edge gate in front of one upstream application.
pub struct GateServer {
    gate: Arc<Gate>,
    router: Router,
    config: GateConfig,
    shutdown: Shutdown,
}

impl GateServer {
    /// Build the server. Must be called from within a Tokio runtime because
    /// the tracking worker starts here.
    pub fn new(config: GateConfig, shutdown: Shutdown) -> Result<Self, ServerError> {
        let emitter = build_emitter(&config, &shutdown)?;
        let gate = Arc::new(Gate::from_config(&config, emitter));

        let authority = Authority::from_str(&config.upstream.address)
            .map_err(|_| ServerError::InvalidUpstream(config.upstream.address.clone()))?;
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.upstream.connect_timeout_secs)));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        let upstream = Router::new()
            .fallback(proxy_handler)
            .with_state(UpstreamState { client, authority });

        let router = build_app(Arc::clone(&gate), upstream, &config);

        Ok(Self {
            gate,
            router,
            config,
            shutdown,
        })
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.address,
            "Gate server starting"
        );

        self.gate.limiter().spawn_purge_task(
            Duration::from_secs(self.config.rate_limit.purge_interval_secs),
            &self.shutdown,
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(self.shutdown.signalled())
            .await?;

        tracing::info!("Gate server stopped");
        Ok(())
    }
}

fn build_emitter(config: &GateConfig, shutdown: &Shutdown) -> Result<TrackingEmitter, ServerError> {
    if !config.tracking.enabled {
        tracing::info!("Visitor tracking disabled");
        return Ok(TrackingEmitter::disabled());
    }
    let base_url = config
        .tracking
        .base_url
        .clone()
        .unwrap_or_else(|| config.site.base_url());
    let timeout = Duration::from_millis(config.tracking.timeout_ms);
    let sink = HttpTrackingSink::new(base_url.as_str(), timeout)?;
    tracing::info!(base_url = %base_url, "Visitor tracking enabled");
    Ok(TrackingEmitter::spawn(
        Arc::new(sink),
        config.tracking.queue_capacity,
        config.tracking.max_in_flight,
        timeout,
        shutdown,
    ))
}

/// Wrap `inner` in the gate and the standard middleware stack.
///
/// Layers run outermost first: concurrency limit, request ID, trace, panic
/// capture, the gate, then the request timeout. The timeout sits inside the
/// gate so its `408` is stamped like any other response.
#[allow(deprecated)]
pub fn build_app(gate: Arc<Gate>, inner: Router, config: &GateConfig) -> Router {
    inner
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(middleware::from_fn_with_state(gate, gate_middleware))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(ConcurrencyLimitLayer::new(config.listener.max_connections))
}

/// Forward an allowed request to the upstream application.
async fn proxy_handler(State(state): State<UpstreamState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let (mut parts, body) = request.into_parts();
    let path = parts.uri.path().to_string();

    let mut uri_parts = parts.uri.clone().into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    uri_parts.authority = Some(state.authority.clone());
    if uri_parts.path_and_query.is_none() {
        uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    parts.uri = match Uri::from_parts(uri_parts) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(path = %path, error = %e, "Failed to build upstream URI");
            metrics::record_upstream(StatusCode::BAD_GATEWAY.as_u16());
            return (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response();
        }
    };

    match state.client.request(Request::from_parts(parts, body)).await {
        Ok(response) => {
            let status = response.status();
            tracing::debug!(
                path = %path,
                status = status.as_u16(),
                latency_ms = start.elapsed().as_millis() as u64,
                "Upstream responded"
            );
            metrics::record_upstream(status.as_u16());
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(path = %path, upstream = %state.authority, error = %e, "Upstream error");
            metrics::record_upstream(StatusCode::BAD_GATEWAY.as_u16());
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}
