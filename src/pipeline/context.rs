//! Per-request context handed to business handlers.

use std::sync::Arc;

use axum::http::Method;
use serde_json::Value;

use crate::storage::{Account, AccountStore};

/// The authenticated caller. Exists in a context if and only if the
/// bearer credential verified *and* the backing account was found; it is
/// never partially populated and never carries secret material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
    pub email: String,
    /// Primary role; defaults to `"user"` when the account record has an
    /// empty role.
    pub role: String,
    pub scopes: Vec<String>,
}

impl Principal {
    pub fn from_account(account: &Account) -> Self {
        let role = if account.role.is_empty() {
            "user".to_string()
        } else {
            account.role.clone()
        };
        Self {
            id: account.id.clone(),
            email: account.email.clone(),
            role,
            scopes: account.scopes.clone(),
        }
    }
}

/// Created once per inbound request by the orchestrator, shared with the
/// handler, dropped after the response is sent.
pub struct RequestContext {
    /// Correlation id threaded through both log records and the envelope.
    pub request_id: String,
    pub method: Method,
    pub path: String,
    pub principal: Option<Principal>,
    /// Connection capability to the document store.
    pub store: Arc<dyn AccountStore>,
    /// Sanitized and validated body. `Null` when the request had none.
    pub body: Value,
    /// Sanitized and validated query parameters.
    pub query: Value,
    /// Sanitized and validated route parameters.
    pub params: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn principal_never_carries_password_material() {
        let account = Account {
            id: "a1".into(),
            email: "a1@example.com".into(),
            password_hash: "supersecret".into(),
            role: "admin".into(),
            scopes: vec!["trust:write".into()],
        };
        let principal = Principal::from_account(&account);
        assert_eq!(principal.id, "a1");
        assert_eq!(principal.role, "admin");
        assert_eq!(principal.scopes, vec!["trust:write".to_string()]);
        // Struct has no secret field; this is a compile-time guarantee,
        // the assertion just documents the invariant.
        assert_eq!(format!("{principal:?}").contains("supersecret"), false);
    }

    #[test]
    fn empty_role_defaults_to_user() {
        let account = Account {
            id: "a2".into(),
            email: "a2@example.com".into(),
            password_hash: String::new(),
            role: String::new(),
            scopes: vec![],
        };
        assert_eq!(Principal::from_account(&account).role, "user");
    }
}
