//! Redis-backed key-value cache driver.
//!
//! The production cache for multi-process deployments: every instance shares
//! the same listing keys, last-writer-wins. Uses plain `GET` and `SET .. EX`,
//! so expiry is enforced server-side and a fresh TTL clock starts on every
//! write.

use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};

use crate::cache::{CacheError, KeyValueCache};

use super::error::InfraError;

#[derive(Clone)]
pub struct RedisCache {
    manager: ConnectionManager,
}

impl RedisCache {
    /// Connect and build a self-reconnecting manager around one multiplexed
    /// connection.
    pub async fn connect(url: &str) -> Result<Self, InfraError> {
        let client = Client::open(url)
            .map_err(|err| InfraError::cache(format!("invalid redis url: {err}")))?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|err| InfraError::cache(format!("redis connection failed: {err}")))?;

        Ok(Self { manager })
    }
}

#[async_trait]
impl KeyValueCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.manager.clone();
        conn.get(key).await.map_err(CacheError::backend)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.manager.clone();
        // SET EX truncates sub-second TTLs; a zero would mean "no expiry"
        let seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, seconds)
            .await
            .map_err(CacheError::backend)
    }
}
