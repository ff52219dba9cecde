//! Observability: structured logging and metrics counters.

pub mod logging;
pub mod metrics;
