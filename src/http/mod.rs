//! HTTP surface: uniform envelopes and request-side helpers.

pub mod request;
pub mod response;

pub use response::{ApiResponse, Envelope};
