//! Storage boundary.
//!
//! The pipeline touches storage for exactly one thing: resolving the
//! account behind a verified credential. Everything else about the
//! document store lives outside this crate, behind [`AccountStore`].

use async_trait::async_trait;
use dashmap::DashMap;

/// A stored account record. `password_hash` never leaves this layer; the
/// authenticator copies everything except secret material into the
/// request's principal.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub scopes: Vec<String>,
}

/// Errors from the backing store. Lookup misses are not errors; they are
/// `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("account store unavailable: {0}")]
    Unavailable(String),
}

/// Connection capability to the document store, scoped to what the
/// pipeline needs.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_account(&self, id: &str) -> Result<Option<Account>, StoreError>;
}

/// In-memory store used by the demo binary and tests.
#[derive(Default)]
pub struct MemoryStore {
    accounts: DashMap<String, Account>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, account: Account) {
        self.accounts.insert(account.id.clone(), account);
    }

    pub fn remove(&self, id: &str) {
        self.accounts.remove(id);
    }

    pub fn find_by_email(&self, email: &str) -> Option<Account> {
        self.accounts
            .iter()
            .find(|entry| entry.email == email)
            .map(|entry| entry.clone())
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_account(&self, id: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.get(id).map(|entry| entry.clone()))
    }
}
