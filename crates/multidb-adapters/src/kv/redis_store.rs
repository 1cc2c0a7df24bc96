// crates/multidb-adapters/src/kv/redis_store.rs
// ============================================================================
// Module: Redis Key-Value Store
// Description: Redis client behind a lazily opened connection manager.
// Purpose: Serve the key-value tools from a shared Redis deployment.
// Dependencies: redis, tokio
// ============================================================================

//! ## Overview
//! The client is parsed at startup; the multiplexed [`ConnectionManager`] is
//! opened on first use and then cloned per call. A failed first connect is
//! not cached, so the next call retries.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::Client;
use redis::RedisError;
use redis::aio::ConnectionManager;
use redis::aio::ConnectionManagerConfig;
use tokio::sync::OnceCell;

use super::KeyValueStore;
use crate::error::StoreError;

/// Connect attempts per lazy open.
const CONNECT_RETRIES: usize = 2;
/// Per-attempt connect timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Redis-backed key-value store.
pub struct RedisStore {
    /// Parsed client (no connection yet).
    client: Client,
    /// Shared connection, opened on first use.
    connection: OnceCell<ConnectionManager>,
}

impl RedisStore {
    /// Parses the Redis URL without connecting.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] when the URL is not a Redis URL.
    pub fn new(url: &str) -> Result<Self, StoreError> {
        let client = Client::open(url).map_err(|err| StoreError::Unavailable(err.to_string()))?;
        Ok(Self {
            client,
            connection: OnceCell::new(),
        })
    }

    /// Returns a handle to the shared connection, opening it if needed.
    async fn connection(&self) -> Result<ConnectionManager, StoreError> {
        let manager = self
            .connection
            .get_or_try_init(|| async {
                let config = ConnectionManagerConfig::new()
                    .set_number_of_retries(CONNECT_RETRIES)
                    .set_connection_timeout(CONNECT_TIMEOUT);
                ConnectionManager::new_with_config(self.client.clone(), config)
                    .await
                    .map_err(|err| StoreError::Unavailable(err.to_string()))
            })
            .await?;
        Ok(manager.clone())
    }
}

/// Classifies a Redis error as connectivity or command failure.
fn classify(err: &RedisError) -> StoreError {
    if err.is_io_error()
        || err.is_connection_refusal()
        || err.is_connection_dropped()
        || err.is_timeout()
    {
        StoreError::Unavailable(err.to_string())
    } else {
        StoreError::Backend(err.to_string())
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection().await?;
        conn.get(key).await.map_err(|err| classify(&err))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        match ttl {
            Some(ttl) => conn.set_ex(key, value, ttl.as_secs()).await,
            None => conn.set(key, value).await,
        }
        .map_err(|err| classify(&err))
    }

    async fn del(&self, key: &str) -> Result<u64, StoreError> {
        let mut conn = self.connection().await?;
        conn.del(key).await.map_err(|err| classify(&err))
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        let _: u64 = conn.hset(key, field, value).await.map_err(|err| classify(&err))?;
        Ok(())
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection().await?;
        conn.hget(key, field).await.map_err(|err| classify(&err))
    }

    async fn hgetall(&self, key: &str) -> Result<BTreeMap<String, String>, StoreError> {
        let mut conn = self.connection().await?;
        conn.hgetall(key).await.map_err(|err| classify(&err))
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<u64, StoreError> {
        let mut conn = self.connection().await?;
        conn.hdel(key, field).await.map_err(|err| classify(&err))
    }
}
