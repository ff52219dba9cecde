//! Configuration subsystem.

pub mod loader;
pub mod schema;

pub use loader::{load_config, validate_config, ConfigError};
pub use schema::{
    AppConfig, AuthConfig, Environment, ObservabilityConfig, QuotaConfig, RateLimitConfig,
    ServerConfig,
};
