//! In-memory key-value cache with per-key TTLs.
//!
//! Default driver for single-process deployments and the test double for the
//! listing cache. Deadlines use `tokio::time::Instant`, so tests running
//! under a paused runtime clock can advance time deterministically.

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::{sync::RwLock, time::Instant};

use super::driver::{CacheError, KeyValueCache};

#[derive(Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

/// Process-local cache. Cloning shares the underlying map.
#[derive(Clone, Default)]
pub struct MemoryCache {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop entries whose deadline has passed. Expired entries are already
    /// invisible to `get`; this only reclaims memory.
    pub async fn evict_expired(&self) {
        let now = Instant::now();
        let mut guard = self.entries.write().await;
        guard.retain(|_, entry| entry.expires_at > now);
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl KeyValueCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let guard = self.entries.read().await;
        match guard.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            _ => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let entry = Entry {
            value: value.to_string(),
            expires_at: Instant::now() + ttl,
        };
        let mut guard = self.entries.write().await;
        guard.insert(key.to_string(), entry);
        Ok(())
    }
}
