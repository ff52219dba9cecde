//! Sliding-window rate limiting keyed by caller identifier.
//!
//! # Responsibilities
//! - Track request timestamps per identifier inside a moving window
//! - Admit or reject against a per-endpoint quota
//!
//! # Design Decisions
//! - Intentionally approximate: timestamps are pruned lazily on each
//!   check, there is no background sweeper and no token bucket
//! - The in-process map lives behind `RateLimitStore` so a shared
//!   external counter store can replace it without touching the pipeline
//! - Each map entry is checked-and-updated under the entry lock, so two
//!   concurrent requests can never both be admitted past the quota

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::DashMap;

/// A window/quota pair. Named classes in the config resolve to one of
/// these; policies may also carry an ad-hoc quota directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub window_ms: u64,
    pub max_requests: usize,
}

/// Outcome of a single admission check.
#[derive(Debug, Clone, Copy)]
pub struct RateDecision {
    pub admitted: bool,
    pub limit: usize,
    pub window_ms: u64,
    /// Seconds until the oldest in-window request expires. Only
    /// meaningful on rejection.
    pub retry_after_secs: u64,
}

/// Storage backend for the identifier -> timestamps mapping.
///
/// `check` must treat the read-filter-append-store sequence for one
/// identifier as a critical section.
pub trait RateLimitStore: Send + Sync {
    fn check(&self, identifier: &str, quota: Quota, now_ms: u64) -> RateDecision;
}

/// Default in-process store. State is process-lifetime and per-instance;
/// multi-instance deployments need a shared backend instead.
#[derive(Default)]
pub struct SlidingWindowStore {
    entries: DashMap<String, Vec<u64>>,
}

impl SlidingWindowStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RateLimitStore for SlidingWindowStore {
    fn check(&self, identifier: &str, quota: Quota, now_ms: u64) -> RateDecision {
        // The DashMap entry guard holds the shard lock for the whole
        // read-filter-append-store sequence.
        let mut timestamps = self.entries.entry(identifier.to_string()).or_default();
        let window_start = now_ms.saturating_sub(quota.window_ms);
        timestamps.retain(|&ts| ts > window_start);

        if timestamps.len() >= quota.max_requests {
            let oldest = timestamps.first().copied().unwrap_or(now_ms);
            let expires_in_ms = (oldest + quota.window_ms).saturating_sub(now_ms);
            return RateDecision {
                admitted: false,
                limit: quota.max_requests,
                window_ms: quota.window_ms,
                retry_after_secs: expires_in_ms.div_ceil(1000).max(1),
            };
        }

        timestamps.push(now_ms);
        RateDecision {
            admitted: true,
            limit: quota.max_requests,
            window_ms: quota.window_ms,
            retry_after_secs: 0,
        }
    }
}

/// Facade the pipeline calls into. Owns the store and the clock.
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_store(Arc::new(SlidingWindowStore::new()))
    }

    pub fn with_store(store: Arc<dyn RateLimitStore>) -> Self {
        Self { store }
    }

    /// Admission check against the wall clock.
    pub fn admit(&self, identifier: &str, quota: Quota) -> RateDecision {
        self.store.check(identifier, quota, now_ms())
    }

    /// Admission check at an explicit instant. Tests drive the clock
    /// through this.
    pub fn admit_at(&self, identifier: &str, quota: Quota, now_ms: u64) -> RateDecision {
        self.store.check(identifier, quota, now_ms)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
