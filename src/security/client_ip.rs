//! Client IP resolution.
//!
//! # Design Decisions
//! - Forwarded headers are read only when configured as trusted
//! - Each trusted proxy appends the address it saw to `X-Forwarded-For`, so
//!   the client is counted from the right; leftmost entries are client input
//! - Anything unresolvable becomes the shared `"unknown"` key

use std::net::{IpAddr, SocketAddr};

use axum::http::HeaderMap;

use crate::security::rate_limit::UNKNOWN_CLIENT;

/// Resolve the client IP for rate limiting and logging.
///
/// `trusted_hops` is the number of proxies in front of the gate; 0 ignores
/// forwarded headers entirely.
pub fn resolve_client_ip(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trusted_hops: usize,
) -> String {
    if trusted_hops > 0 {
        if let Some(ip) = forwarded_ip(headers, trusted_hops) {
            return ip.to_string();
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn forwarded_ip(headers: &HeaderMap, trusted_hops: usize) -> Option<IpAddr> {
    // Repeated headers form one list, in order.
    let entries: Vec<&str> = headers
        .get_all("x-forwarded-for")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .collect();

    if !entries.is_empty() {
        return entries
            .len()
            .checked_sub(trusted_hops)
            .and_then(|idx| entries[idx].parse::<IpAddr>().ok());
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<IpAddr>().ok())
}
