//! Declarative per-endpoint policy.
//!
//! A policy is built once at registration time and immutable afterwards;
//! every default is visible at the construction site.

use axum::http::Method;

use crate::security::rate_limit::Quota;
use crate::validate::Contract;

/// How the authenticator participates for an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// A resolved principal is mandatory; absence is a 401.
    Required,
    /// Resolution is attempted; the handler sees `Option<Principal>`.
    Optional,
    /// The authenticator is skipped entirely.
    None,
}

/// Named rate-limit classes, each with its own window and quota in the
/// application config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateClass {
    Auth,
    Agents,
    Trust,
    Default,
}

impl RateClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateClass::Auth => "auth",
            RateClass::Agents => "agents",
            RateClass::Trust => "trust",
            RateClass::Default => "default",
        }
    }
}

/// Either a named class resolved through config, or an ad-hoc quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitSelector {
    Class(RateClass),
    Custom(Quota),
}

/// Immutable per-endpoint configuration consumed by the orchestrator.
#[derive(Debug, Clone)]
pub struct EndpointPolicy {
    pub auth: AuthMode,
    pub methods: Vec<Method>,
    pub required_roles: Vec<String>,
    pub rate_limit: RateLimitSelector,
    pub body: Option<Contract>,
    pub query: Option<Contract>,
    pub params: Option<Contract>,
}

impl EndpointPolicy {
    /// Fail-closed baseline: auth required, default rate class, no
    /// contracts, no role requirement.
    pub fn new(methods: impl IntoIterator<Item = Method>) -> Self {
        Self {
            auth: AuthMode::Required,
            methods: methods.into_iter().collect(),
            required_roles: Vec::new(),
            rate_limit: RateLimitSelector::Class(RateClass::Default),
            body: None,
            query: None,
            params: None,
        }
    }

    pub fn auth(mut self, mode: AuthMode) -> Self {
        self.auth = mode;
        self
    }

    pub fn roles(mut self, roles: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.required_roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn rate_class(mut self, class: RateClass) -> Self {
        self.rate_limit = RateLimitSelector::Class(class);
        self
    }

    pub fn rate_quota(mut self, quota: Quota) -> Self {
        self.rate_limit = RateLimitSelector::Custom(quota);
        self
    }

    pub fn body(mut self, contract: Contract) -> Self {
        self.body = Some(contract);
        self
    }

    pub fn query(mut self, contract: Contract) -> Self {
        self.query = Some(contract);
        self
    }

    pub fn params(mut self, contract: Contract) -> Self {
        self.params = Some(contract);
        self
    }

    pub fn allows_method(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }

    pub fn allowed_method_names(&self) -> Vec<String> {
        self.methods.iter().map(|m| m.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fail_closed() {
        let policy = EndpointPolicy::new([Method::GET]);
        assert_eq!(policy.auth, AuthMode::Required);
        assert_eq!(
            policy.rate_limit,
            RateLimitSelector::Class(RateClass::Default)
        );
        assert!(policy.required_roles.is_empty());
        assert!(policy.body.is_none());
    }

    #[test]
    fn method_allowance() {
        let policy = EndpointPolicy::new([Method::GET, Method::POST]);
        assert!(policy.allows_method(&Method::GET));
        assert!(!policy.allows_method(&Method::DELETE));
        assert_eq!(policy.allowed_method_names(), vec!["GET", "POST"]);
    }

    #[test]
    fn builder_sets_every_knob() {
        let policy = EndpointPolicy::new([Method::PUT])
            .auth(AuthMode::Optional)
            .roles(["admin"])
            .rate_class(RateClass::Trust)
            .rate_quota(Quota {
                window_ms: 500,
                max_requests: 5,
            });
        assert_eq!(policy.auth, AuthMode::Optional);
        assert_eq!(policy.required_roles, vec!["admin".to_string()]);
        // Last write wins.
        assert!(matches!(policy.rate_limit, RateLimitSelector::Custom(_)));
    }
}
