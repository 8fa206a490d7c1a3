//! Per-request context.

use std::net::SocketAddr;

use axum::http::{HeaderMap, Method};

use crate::security::client_ip::resolve_client_ip;

/// What the gate knows about a request. Built once at entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub path: String,
    pub client_ip: String,
    pub method: Method,
}

impl RequestContext {
    pub fn new(path: impl Into<String>, client_ip: impl Into<String>, method: Method) -> Self {
        Self {
            path: path.into(),
            client_ip: client_ip.into(),
            method,
        }
    }

    pub fn from_parts(
        method: &Method,
        path: &str,
        headers: &HeaderMap,
        peer: Option<SocketAddr>,
        trusted_hops: usize,
    ) -> Self {
        Self {
            path: path.to_string(),
            client_ip: resolve_client_ip(headers, peer, trusted_hops),
            method: method.clone(),
        }
    }
}
