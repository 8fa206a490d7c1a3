//! HTTP handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → middleware/gate.rs (classify, throttle, authenticate, decide)
//!     → response.rs (rejections, redirects, security headers)
//!     → server.rs proxy handler (allowed requests to the upstream)
//!     → Send to client
//! ```

pub mod middleware;
pub mod response;
pub mod server;

pub use server::{build_app, GateServer, ServerError};
