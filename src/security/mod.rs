//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → client_ip.rs (who is asking)
//!     → rate_limit.rs (per-IP fixed window, protected API only)
//!     → session.rs (verify session token → claims or anonymous)
//!     → headers.rs (security header set on every response)
//! ```
//!
//! # Design Decisions
//! - Defense in depth: throttling runs before authentication
//! - Fail closed: verification problems mean anonymous, not error
//! - No trust in client input unless configured

pub mod client_ip;
pub mod headers;
pub mod rate_limit;
pub mod session;

pub use headers::SecurityHeaders;
pub use rate_limit::{FixedWindowLimiter, RateLimitOutcome, UNKNOWN_CLIENT};
pub use session::{JwtVerifier, SessionClaims, SessionResolver, SessionVerifier};
