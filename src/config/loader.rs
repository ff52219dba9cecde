//! Configuration loading and validation.

use std::path::Path;

use crate::config::schema::{AppConfig, Environment};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

/// Load a config file and validate it.
pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&raw)?;
    validate_config(&config)?;
    Ok(config)
}

/// Structural checks that deserialization alone cannot express. All
/// problems are collected so operators see every issue at once.
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(format!(
            "server.bind_address '{}' is not a valid socket address",
            config.server.bind_address
        ));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push("server.request_timeout_secs must be positive".to_string());
    }

    if config.environment == Environment::Production && config.auth.jwt_secret.is_empty() {
        errors.push("auth.jwt_secret must be set in production".to_string());
    }
    if !config.auth.jwt_secret.is_empty() && config.auth.jwt_secret.len() < 32 {
        tracing::warn!("auth.jwt_secret is shorter than the recommended 32 bytes");
    }

    for (name, quota) in [
        ("auth", config.rate_limit.auth),
        ("agents", config.rate_limit.agents),
        ("trust", config.rate_limit.trust),
        ("default", config.rate_limit.default),
    ] {
        if quota.window_ms == 0 {
            errors.push(format!("rate_limit.{name}.window_ms must be positive"));
        }
        if quota.max_requests == 0 {
            errors.push(format!("rate_limit.{name}.max_requests must be positive"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Validation(errors))
    }
}
