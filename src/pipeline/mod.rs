//! The request middleware pipeline.
//!
//! Every endpoint is registered through [`Pipeline::endpoint`] with an
//! [`EndpointPolicy`]; the orchestrator enforces the policy around the
//! business handler and is the only piece the other subsystems are
//! called from.

pub mod context;
pub mod error;
pub mod orchestrator;
pub mod policy;

pub use context::{Principal, RequestContext};
pub use error::PipelineError;
pub use orchestrator::{HandlerReply, HandlerResult, Pipeline};
pub use policy::{AuthMode, EndpointPolicy, RateClass, RateLimitSelector};
