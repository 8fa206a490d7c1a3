//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → server stops accepting and drains
//!             → limiter purge task exits
//!             → tracking worker exits (queued events are dropped)
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
