//! Credential resolution.
//!
//! # Responsibilities
//! - Extract a bearer credential from the authorization header
//! - Verify it and resolve the backing account to a [`Principal`]
//!
//! # Design Decisions
//! - Absent, malformed, tampered, expired and unknown-account all
//!   resolve to `None`; nothing about *why* auth failed leaks out
//! - A verified token alone is never enough: the account must still
//!   exist at resolve time

use axum::http::HeaderMap;

use crate::auth::token::TokenVerifier;
use crate::pipeline::context::Principal;
use crate::storage::{AccountStore, StoreError};

/// Pull the bearer token out of the authorization header, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

pub struct Authenticator {
    verifier: TokenVerifier,
}

impl Authenticator {
    pub fn new(verifier: TokenVerifier) -> Self {
        Self { verifier }
    }

    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    /// Resolve the request's credential to a principal.
    ///
    /// `Ok(None)` covers every authentication failure shape; `Err` is
    /// reserved for store outages, which are the pipeline's problem, not
    /// the caller's.
    pub async fn resolve(
        &self,
        headers: &HeaderMap,
        store: &dyn AccountStore,
    ) -> Result<Option<Principal>, StoreError> {
        let Some(token) = bearer_token(headers) else {
            return Ok(None);
        };
        let Some(claims) = self.verifier.verify(token) else {
            return Ok(None);
        };
        match store.find_account(&claims.sub).await? {
            Some(account) => Ok(Some(Principal::from_account(&account))),
            None => {
                tracing::debug!(subject = %claims.sub, "token subject has no backing account");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Account, MemoryStore};
    use axum::http::HeaderValue;

    fn store_with(id: &str) -> MemoryStore {
        let store = MemoryStore::new();
        store.insert(Account {
            id: id.into(),
            email: format!("{id}@example.com"),
            password_hash: "hash".into(),
            role: "user".into(),
            scopes: vec![],
        });
        store
    }

    fn auth() -> Authenticator {
        Authenticator::new(TokenVerifier::new("test-secret-at-least-32-bytes-long!", 0))
    }

    fn headers_with_token(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    #[test]
    fn bearer_extraction() {
        assert_eq!(bearer_token(&headers_with_token("abc")), Some("abc"));
        assert_eq!(bearer_token(&HeaderMap::new()), None);

        let mut basic = HeaderMap::new();
        basic.insert("authorization", HeaderValue::from_static("Basic Zm9v"));
        assert_eq!(bearer_token(&basic), None);

        let mut empty = HeaderMap::new();
        empty.insert("authorization", HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&empty), None);
    }

    #[tokio::test]
    async fn valid_token_with_live_account_resolves() {
        let authenticator = auth();
        let store = store_with("acct-1");
        let token = authenticator.verifier().issue("acct-1", 3600).unwrap();

        let principal = authenticator
            .resolve(&headers_with_token(&token), &store)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(principal.id, "acct-1");
    }

    #[tokio::test]
    async fn expired_token_resolves_like_no_token() {
        let authenticator = auth();
        let store = store_with("acct-1");
        let expired = authenticator.verifier().issue("acct-1", -60).unwrap();

        let with_expired = authenticator
            .resolve(&headers_with_token(&expired), &store)
            .await
            .unwrap();
        let without = authenticator
            .resolve(&HeaderMap::new(), &store)
            .await
            .unwrap();
        assert_eq!(with_expired.is_none(), without.is_none());
    }

    #[tokio::test]
    async fn deleted_account_resolves_to_none() {
        let authenticator = auth();
        let store = store_with("acct-1");
        let token = authenticator.verifier().issue("acct-1", 3600).unwrap();
        store.remove("acct-1");

        let resolved = authenticator
            .resolve(&headers_with_token(&token), &store)
            .await
            .unwrap();
        assert!(resolved.is_none());
    }
}
