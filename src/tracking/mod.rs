//! Visitor tracking subsystem.
//!
//! # Data Flow
//! ```text
//! Gate decision made
//!     → sink.rs (map request to ApiHit / PageVisit / nothing)
//!     → emitter.rs (try_send onto bounded queue, return immediately)
//!     → worker task (deliver with timeout, log + count failures)
//!     → HTTP tracking endpoints
//! ```
//!
//! # Design Decisions
//! - At-most-once, best-effort: no retries
//! - A full queue drops events instead of applying backpressure
//! - Failures never reach the response path

pub mod emitter;
pub mod sink;

pub use emitter::TrackingEmitter;
pub use sink::{HttpTrackingSink, TrackingError, TrackingEvent, TrackingSink};
