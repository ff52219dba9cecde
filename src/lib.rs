//! Request middleware pipeline for the agent trust-registry API.
//!
//! # Architecture Overview
//!
//! ```text
//!   Inbound request
//!        │
//!        ▼
//!   ┌───────────────────────────── pipeline ─────────────────────────────┐
//!   │ method check → abuse scan → rate limit → auth → authz →            │
//!   │ sanitize + validate → handler(RequestContext) → envelope + headers │
//!   └────────────────────────────────────────────────────────────────────┘
//!        │                                    ▲
//!        ▼                                    │
//!   ┌──────────┐   account lookup only   ┌─────────┐
//!   │ security │ ◀──────────────────────▶│ storage │
//!   └──────────┘                         └─────────┘
//! ```
//!
//! Business handlers (agent CRUD, trust declarations, login) live
//! outside this crate; they receive validated input and a
//! [`pipeline::RequestContext`] and return a [`pipeline::HandlerReply`].

// Core subsystems
pub mod config;
pub mod http;
pub mod pipeline;
pub mod storage;
pub mod validate;

// Cross-cutting concerns
pub mod auth;
pub mod observability;
pub mod security;

pub use config::AppConfig;
pub use http::ApiResponse;
pub use pipeline::{EndpointPolicy, Pipeline};
