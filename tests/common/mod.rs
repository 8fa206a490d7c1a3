//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{header, HeaderValue, Request};
use axum::body::Body;
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use edge_gate::config::GateConfig;
use edge_gate::security::SessionClaims;
use edge_gate::tracking::{TrackingError, TrackingEvent, TrackingSink};

pub const SECRET: &str = "integration-secret";
pub const DOMAIN: &str = "dash.example.com";
pub const CLIENT_IP: &str = "1.2.3.4";

/// Config with a known secret and domain. Tracking is off unless a test
/// wires its own emitter.
pub fn test_config(points: u32) -> GateConfig {
    let mut config = GateConfig::default();
    config.auth.token_secret = SECRET.to_string();
    config.site.domain_url = DOMAIN.to_string();
    config.rate_limit.points = points;
    config.rate_limit.duration_secs = 60;
    config.tracking.enabled = false;
    config
}

/// A session token signed with [`SECRET`], valid for ten minutes.
pub fn session_token(subject: &str) -> String {
    let now = Utc::now().timestamp();
    let claims = SessionClaims {
        sub: subject.to_string(),
        email: format!("{subject}@example.com"),
        iat: now,
        exp: now + 600,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

/// GET `path` from [`CLIENT_IP`], optionally signed in.
pub fn request(path: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .uri(path)
        .header("x-forwarded-for", CLIENT_IP);
    if let Some(token) = token {
        builder = builder.header(
            header::COOKIE,
            HeaderValue::from_str(&format!("next-auth.session-token={token}")).unwrap(),
        );
    }
    builder.body(Body::empty()).unwrap()
}

/// Sink that forwards every event to a channel.
pub struct RecordingSink {
    tx: mpsc::UnboundedSender<TrackingEvent>,
}

impl RecordingSink {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<TrackingEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

#[async_trait]
impl TrackingSink for RecordingSink {
    async fn deliver(&self, event: &TrackingEvent) -> Result<(), TrackingError> {
        let _ = self.tx.send(event.clone());
        Ok(())
    }
}

/// Sink that is slow and then fails.
pub struct BrokenSink;

#[async_trait]
impl TrackingSink for BrokenSink {
    async fn deliver(&self, _event: &TrackingEvent) -> Result<(), TrackingError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Err(TrackingError::Unavailable("tracking service down".into()))
    }
}

/// Start a mock upstream that answers every request with `200` and the
/// request line as the body.
pub async fn start_mock_upstream(addr: SocketAddr) {
    let listener = TcpListener::bind(addr).await.unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 8192];
                        let n = socket.read(&mut buf).await.unwrap_or(0);
                        let head = String::from_utf8_lossy(&buf[..n]);
                        let request_line = head.lines().next().unwrap_or("").to_string();

                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            request_line.len(),
                            request_line
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });
}

/// Wait for a server to accept connections.
pub async fn wait_for_server(addr: SocketAddr) {
    for _ in 0..50 {
        if tokio::net::TcpStream::connect(addr).await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("server at {addr} did not start");
}
