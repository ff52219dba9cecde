//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files;
//! every field has a visible default.

use serde::{Deserialize, Serialize};

use crate::pipeline::policy::RateClass;
use crate::security::rate_limit::Quota;

/// Root configuration for the API.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Build environment; controls internal-error detail exposure.
    pub environment: Environment,

    /// Listener configuration.
    pub server: ServerConfig,

    /// Credential verification settings.
    pub auth: AuthConfig,

    /// Named rate-limit classes.
    pub rate_limit: RateLimitConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Whole-request deadline enforced by the timeout layer.
    pub request_timeout_secs: u64,

    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
            max_body_bytes: 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing secret. Must be set outside of development.
    #[serde(skip_serializing)]
    pub jwt_secret: String,

    /// Lifetime of tokens issued by the login endpoint.
    pub token_ttl_secs: i64,

    /// Clock-skew tolerance for expiry checks.
    pub leeway_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_secs: 3600,
            leeway_secs: 30,
        }
    }
}

/// One named class's window and quota.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct QuotaConfig {
    pub window_ms: u64,
    pub max_requests: usize,
}

impl From<QuotaConfig> for Quota {
    fn from(cfg: QuotaConfig) -> Self {
        Quota {
            window_ms: cfg.window_ms,
            max_requests: cfg.max_requests,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub auth: QuotaConfig,
    pub agents: QuotaConfig,
    pub trust: QuotaConfig,
    pub default: QuotaConfig,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            // Login endpoints get the tightest budget.
            auth: QuotaConfig {
                window_ms: 900_000,
                max_requests: 20,
            },
            agents: QuotaConfig {
                window_ms: 60_000,
                max_requests: 60,
            },
            trust: QuotaConfig {
                window_ms: 60_000,
                max_requests: 30,
            },
            default: QuotaConfig {
                window_ms: 60_000,
                max_requests: 100,
            },
        }
    }
}

impl RateLimitConfig {
    pub fn quota(&self, class: RateClass) -> Quota {
        match class {
            RateClass::Auth => self.auth.into(),
            RateClass::Agents => self.agents.into(),
            RateClass::Trust => self.trust.into(),
            RateClass::Default => self.default.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default tracing filter when RUST_LOG is unset.
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "agent_trust_api=info,tower_http=info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_class() {
        let config = AppConfig::default();
        assert_eq!(config.rate_limit.quota(RateClass::Auth).max_requests, 20);
        assert_eq!(config.rate_limit.quota(RateClass::Default).window_ms, 60_000);
        assert_eq!(config.environment, Environment::Development);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            environment = "production"

            [auth]
            jwt_secret = "0123456789abcdef0123456789abcdef"

            [rate_limit.default]
            window_ms = 1000
            max_requests = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.rate_limit.quota(RateClass::Default).max_requests, 5);
        // Untouched sections keep their defaults.
        assert_eq!(config.rate_limit.quota(RateClass::Auth).max_requests, 20);
        assert_eq!(config.server.request_timeout_secs, 30);
    }

    #[test]
    fn secret_is_never_serialized() {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = "topsecret".into();
        let rendered = toml::to_string(&config).unwrap();
        assert!(!rendered.contains("topsecret"));
    }
}
