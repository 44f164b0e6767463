//! The shared key-value cache capability.
//!
//! Listing state lives in an externally-hosted key-value store shared by
//! every process. The contract is deliberately thin: string get, string set
//! with a per-key TTL, no transactions, no compare-and-set. Concurrent
//! writers race with last-writer-wins semantics, which is safe here because
//! every write is an idempotent recomputation of the same truth.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),
}

impl CacheError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Injected cache dependency.
///
/// Absence of a key is indistinguishable from expiry; both surface as
/// `Ok(None)`. Each `set` starts an independent TTL clock for that key.
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;
}
