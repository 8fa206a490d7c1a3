//! End-to-end gate behavior through the full middleware stack.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use edge_gate::config::GateConfig;
use edge_gate::security::SecurityHeaders;
use edge_gate::tracking::{TrackingEmitter, TrackingEvent};
use edge_gate::{build_app, Gate, Shutdown};

mod common;
use common::{request, session_token, test_config, BrokenSink, RecordingSink};

async fn boom() -> &'static str {
    panic!("handler exploded")
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_secs(3)).await;
    "late"
}

fn app(config: &GateConfig, emitter: TrackingEmitter) -> Router {
    let gate = Arc::new(Gate::from_config(config, emitter));
    let inner = Router::new()
        .route("/api/widgets", get(|| async { "widgets" }))
        .route("/boom", get(boom))
        .route("/slow", get(slow))
        .fallback(|| async { "upstream" });
    build_app(gate, inner, config)
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response) -> &str {
    response.headers().get(header::LOCATION).unwrap().to_str().unwrap()
}

#[tokio::test]
async fn test_quota_counts_down_then_rejects() {
    let app = app(&test_config(5), TrackingEmitter::disabled());
    let token = session_token("alice");

    for expected in ["4", "3", "2", "1", "0"] {
        let response = send(&app, request("/api/widgets", Some(&token))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("x-ratelimit-limit").unwrap(), "5");
        assert_eq!(response.headers().get("x-ratelimit-remaining").unwrap(), expected);
        assert!(SecurityHeaders::new().is_present_in(response.headers()));
    }

    let response = send(&app, request("/api/widgets", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(SecurityHeaders::new().is_present_in(response.headers()));
    assert_eq!(response.headers().get("x-ratelimit-remaining").unwrap(), "0");
    let retry_after: u64 = response
        .headers()
        .get(header::RETRY_AFTER)
        .unwrap()
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((1..=60).contains(&retry_after));

    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["status"], "error");
    assert_eq!(json["code"], 429);
    assert_eq!(json["limit"], 5);
    assert_eq!(json["remaining"], 0);
    assert_eq!(json["retryAfter"], retry_after);
}

#[tokio::test]
async fn test_throttled_before_authentication() {
    let app = app(&test_config(1), TrackingEmitter::disabled());

    let first = send(&app, request("/api/widgets", None)).await;
    assert_eq!(first.status(), StatusCode::TEMPORARY_REDIRECT);

    let second = send(&app, request("/api/widgets", None)).await;
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_clients_have_separate_quotas() {
    let app = app(&test_config(1), TrackingEmitter::disabled());
    let token = session_token("alice");

    assert_eq!(send(&app, request("/api/widgets", Some(&token))).await.status(), StatusCode::OK);
    assert_eq!(
        send(&app, request("/api/widgets", Some(&token))).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    let other = Request::builder()
        .uri("/api/widgets")
        .header("x-forwarded-for", "5.6.7.8")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, other).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_anonymous_root_redirects_to_login() {
    let app = app(&test_config(5), TrackingEmitter::disabled());

    let response = send(&app, request("/", None)).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "https://dash.example.com/login");
    assert!(SecurityHeaders::new().is_present_in(response.headers()));
}

#[tokio::test]
async fn test_anonymous_protected_page_redirects_to_login() {
    let app = app(&test_config(5), TrackingEmitter::disabled());

    let response = send(&app, request("/analytics", None)).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "https://dash.example.com/login");
}

#[tokio::test]
async fn test_signed_in_user_leaves_auth_pages() {
    let app = app(&test_config(5), TrackingEmitter::disabled());
    let token = session_token("alice");

    for path in ["/login", "/register", "/"] {
        let response = send(&app, request(path, Some(&token))).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT, "{path}");
        assert_eq!(location(&response), "https://dash.example.com/analytics");
    }

    let response = send(&app, request("/analytics", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "upstream");
}

#[tokio::test]
async fn test_public_api_is_open_and_unthrottled() {
    let app = app(&test_config(1), TrackingEmitter::disabled());

    for _ in 0..3 {
        let response = send(&app, request("/api/auth/callback", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get("x-ratelimit-limit").is_none());
        assert!(SecurityHeaders::new().is_present_in(response.headers()));
    }
}

#[tokio::test]
async fn test_invalid_token_is_anonymous() {
    let app = app(&test_config(5), TrackingEmitter::disabled());

    let response = send(&app, request("/analytics", Some("not-a-token"))).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "https://dash.example.com/login");
}

#[tokio::test]
async fn test_static_assets_bypass_gate() {
    let app = app(&test_config(5), TrackingEmitter::disabled());

    for path in ["/_next/static/chunk.js", "/_next/image", "/favicon.ico", "/robots.txt"] {
        let response = send(&app, request(path, None)).await;
        assert_eq!(response.status(), StatusCode::OK, "{path}");
        assert!(response.headers().get(header::LOCATION).is_none());
    }
}

#[tokio::test]
async fn test_panic_becomes_500_with_security_headers() {
    let app = app(&test_config(5), TrackingEmitter::disabled());
    let token = session_token("alice");

    let response = send(&app, request("/boom", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(SecurityHeaders::new().is_present_in(response.headers()));

    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["code"], 500);
    assert_eq!(json["message"], "Internal Server Error");
}

#[tokio::test]
async fn test_request_timeout_carries_security_headers() {
    let mut config = test_config(5);
    config.timeouts.request_secs = 1;
    let app = app(&config, TrackingEmitter::disabled());
    let token = session_token("alice");

    let response = send(&app, request("/slow", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    assert!(SecurityHeaders::new().is_present_in(response.headers()));
}

#[tokio::test]
async fn test_spoofed_forwarded_entries_share_one_quota() {
    let app = app(&test_config(2), TrackingEmitter::disabled());
    let token = session_token("alice");

    let spoofed = |i: u8| {
        Request::builder()
            .uri("/api/widgets")
            .header("x-forwarded-for", format!("10.0.{i}.{i}, 203.0.113.7"))
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap()
    };

    assert_eq!(send(&app, spoofed(1)).await.status(), StatusCode::OK);
    assert_eq!(send(&app, spoofed(2)).await.status(), StatusCode::OK);
    let response = send(&app, spoofed(3)).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(SecurityHeaders::new().is_present_in(response.headers()));
}

#[tokio::test]
async fn test_unroutable_domain_becomes_500() {
    let mut config = test_config(5);
    config.site.domain_url = "bad\ndomain".into();
    let app = app(&config, TrackingEmitter::disabled());

    let response = send(&app, request("/", None)).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(SecurityHeaders::new().is_present_in(response.headers()));
}

#[tokio::test]
async fn test_request_id_is_set() {
    let app = app(&test_config(5), TrackingEmitter::disabled());

    let response = send(&app, request("/login", None)).await;
    assert!(response.headers().get("x-request-id").is_some());
}

#[tokio::test]
async fn test_tracking_events_follow_path_class() {
    let shutdown = Shutdown::new();
    let (sink, mut events) = RecordingSink::new();
    let emitter = TrackingEmitter::spawn(sink, 16, 4, Duration::from_secs(1), &shutdown);
    let app = app(&test_config(5), emitter);
    let token = session_token("alice");

    send(&app, request("/api/widgets", Some(&token))).await;
    let event = tokio::time::timeout(Duration::from_secs(1), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(event, TrackingEvent::ApiHit { ref path, .. } if path == "/api/widgets"));

    // Auth pages and public API routes are not tracked.
    send(&app, request("/login", None)).await;
    send(&app, request("/api/auth/session", None)).await;
    // Redirected pages still are.
    send(&app, request("/notifications", None)).await;
    let event = tokio::time::timeout(Duration::from_secs(1), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(event, TrackingEvent::PageVisit { ref path, .. } if path == "/notifications"));
}

#[tokio::test]
async fn test_tracking_failure_does_not_delay_or_change_response() {
    let shutdown = Shutdown::new();
    let emitter = TrackingEmitter::spawn(Arc::new(BrokenSink), 16, 4, Duration::from_secs(10), &shutdown);
    let app = app(&test_config(5), emitter);

    let response = tokio::time::timeout(Duration::from_secs(1), send(&app, request("/analytics", None)))
        .await
        .expect("response must not wait on tracking");
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "https://dash.example.com/login");
}
