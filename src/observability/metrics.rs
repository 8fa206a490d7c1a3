//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gate_decisions_total` (counter): decisions by outcome
//! - `gate_decision_duration_seconds` (histogram): time spent deciding
//! - `gate_rate_limited_total` (counter): 429 responses
//! - `gate_rate_limit_clients` (gauge): buckets currently held
//! - `gate_tracking_events_total` (counter): tracking events by result
//! - `gate_upstream_requests_total` (counter): forwarded requests by status
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_decision(outcome: &'static str, start: Instant) {
    counter!("gate_decisions_total", "outcome" => outcome).increment(1);
    histogram!("gate_decision_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited() {
    counter!("gate_rate_limited_total").increment(1);
}

pub fn record_tracked_clients(count: usize) {
    gauge!("gate_rate_limit_clients").set(count as f64);
}

pub fn record_tracking_event(result: &'static str) {
    counter!("gate_tracking_events_total", "result" => result).increment(1);
}

pub fn record_upstream(status: u16) {
    counter!("gate_upstream_requests_total", "status" => status.to_string()).increment(1);
}
