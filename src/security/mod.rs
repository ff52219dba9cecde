//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → abuse.rs (scan URL + headers for injection signatures)
//!     → rate_limit.rs (sliding-window admission per caller)
//!     → sanitize.rs (clean body/query/params before validation)
//! Outgoing response:
//!     → headers.rs (fixed security-header set)
//! ```
//!
//! # Design Decisions
//! - Defense in depth: multiple coarse layers, each cheap
//! - Fail closed: reject on any security check failure
//! - No trust in client input

pub mod abuse;
pub mod headers;
pub mod rate_limit;
pub mod sanitize;
