//! Edge request gate.
//!
//! Sits in front of a web application and decides, per request, whether to
//! let it through, redirect it, or reject it. Protected API calls are rate
//! limited per client IP, session cookies decide authentication, every
//! response carries a fixed set of security headers, and visits are reported
//! to a tracking endpoint without delaying the response.
//!
//! ```text
//! request → scope check → classify → rate limit → session → decide
//!                                                              │
//!          allow → upstream    redirect → 307    reject → 429 JSON
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod policy;
pub mod routing;
pub mod security;
pub mod tracking;

pub use config::GateConfig;
pub use error::{GateError, GateResult};
pub use http::{build_app, GateServer};
pub use lifecycle::Shutdown;
pub use policy::{Decision, Gate};
