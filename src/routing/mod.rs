//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → matcher.rs (is the gate in scope for this path?)
//!     → classifier.rs (public API, protected API, auth page, root, page)
//!     → Return: PathClass consumed by the policy engine
//!
//! Rule Compilation (at startup):
//!     PathRulesConfig
//!     → Normalize prefixes
//!     → Freeze as immutable classifier + scope
//! ```
//!
//! # Design Decisions
//! - Rules compiled at startup, immutable at runtime
//! - No regex in hot path (prefix and exact matching only)
//! - Deterministic: same path always yields the same class

pub mod classifier;
pub mod matcher;

pub use classifier::{PathClass, PathClassifier};
pub use matcher::GateScope;
