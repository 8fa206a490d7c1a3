//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Gate, limiter, tracking worker, upstream handler:
//!     → logging.rs (tracing events, request ID from the TraceLayer span)
//!     → metrics.rs (decision, throttle, tracking and upstream counters)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → Prometheus scrape endpoint, when enabled
//! ```

pub mod logging;
pub mod metrics;
