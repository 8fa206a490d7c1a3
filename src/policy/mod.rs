//! Policy subsystem: the request-gating decision core.
//!
//! # Data Flow
//! ```text
//! RequestContext (path, client IP, method)
//!     → routing::PathClassifier (path facts)
//!     → security::FixedWindowLimiter (protected API only; 429 short-circuits)
//!     → security::SessionResolver (claims or anonymous)
//!     → decision.rs (Allow | RedirectTo | Reject)
//!     → tracking::TrackingEmitter (scheduled, not awaited)
//! ```
//!
//! # Design Decisions
//! - Throttling precedes authentication so login attempts cannot bypass it
//! - Every sub-component has a defined failure value; nothing panics upward
//! - The gate holds no per-request state; it is shared via Arc

pub mod context;
pub mod decision;
pub mod gate;

pub use context::RequestContext;
pub use decision::{Decision, PolicyEngine, RejectBody};
pub use gate::{Evaluation, Gate};
