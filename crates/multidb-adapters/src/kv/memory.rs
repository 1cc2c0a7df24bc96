// crates/multidb-adapters/src/kv/memory.rs
// ============================================================================
// Module: In-Memory Key-Value Store
// Description: Process-local string and hash keys with expiry.
// Purpose: Serve the key-value tools without an external server.
// Dependencies: async-trait
// ============================================================================

//! ## Overview
//! Mirrors the Redis semantics the adapter relies on: string and hash keys
//! share one keyspace, type mismatches fail with `WRONGTYPE`, and expired
//! keys read as absent.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;

use super::KeyValueStore;
use crate::error::StoreError;

/// Error text for operations against a key of the other type.
const WRONG_TYPE: &str = "WRONGTYPE Operation against a key holding the wrong kind of value";
/// Redis error for an expiry that cannot be represented.
const INVALID_EXPIRE: &str = "invalid expire time in 'set' command";

/// Stored value shapes.
#[derive(Debug, Clone)]
enum Stored {
    /// Plain string key.
    Text(String),
    /// Hash key.
    Hash(BTreeMap<String, String>),
}

/// One keyspace entry.
#[derive(Debug, Clone)]
struct Entry {
    /// Stored value.
    value: Stored,
    /// Expiry deadline, when set.
    expires_at: Option<Instant>,
}

impl Entry {
    /// Returns true once the expiry deadline has passed.
    fn expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

/// In-memory key-value store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Keyspace guarded by a mutex; critical sections never await.
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the keyspace and evicts `key` if it has expired.
    fn lock_live(&self, key: &str) -> Result<MutexGuard<'_, HashMap<String, Entry>>, StoreError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))?;
        if guard.get(key).is_some_and(|entry| entry.expired(Instant::now())) {
            guard.remove(key);
        }
        Ok(guard)
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let guard = self.lock_live(key)?;
        match guard.get(key).map(|entry| &entry.value) {
            None => Ok(None),
            Some(Stored::Text(text)) => Ok(Some(text.clone())),
            Some(Stored::Hash(_)) => Err(StoreError::Backend(WRONG_TYPE.to_string())),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError> {
        let expires_at = match ttl {
            Some(ttl) => Some(
                Instant::now()
                    .checked_add(ttl)
                    .ok_or_else(|| StoreError::Backend(INVALID_EXPIRE.to_string()))?,
            ),
            None => None,
        };
        let mut guard = self.lock_live(key)?;
        guard.insert(
            key.to_string(),
            Entry {
                value: Stored::Text(value.to_string()),
                expires_at,
            },
        );
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<u64, StoreError> {
        let mut guard = self.lock_live(key)?;
        Ok(u64::from(guard.remove(key).is_some()))
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError> {
        let mut guard = self.lock_live(key)?;
        let entry = guard.entry(key.to_string()).or_insert_with(|| Entry {
            value: Stored::Hash(BTreeMap::new()),
            expires_at: None,
        });
        match &mut entry.value {
            Stored::Hash(fields) => {
                fields.insert(field.to_string(), value.to_string());
                Ok(())
            }
            Stored::Text(_) => Err(StoreError::Backend(WRONG_TYPE.to_string())),
        }
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, StoreError> {
        let guard = self.lock_live(key)?;
        match guard.get(key).map(|entry| &entry.value) {
            None => Ok(None),
            Some(Stored::Hash(fields)) => Ok(fields.get(field).cloned()),
            Some(Stored::Text(_)) => Err(StoreError::Backend(WRONG_TYPE.to_string())),
        }
    }

    async fn hgetall(&self, key: &str) -> Result<BTreeMap<String, String>, StoreError> {
        let guard = self.lock_live(key)?;
        match guard.get(key).map(|entry| &entry.value) {
            None => Ok(BTreeMap::new()),
            Some(Stored::Hash(fields)) => Ok(fields.clone()),
            Some(Stored::Text(_)) => Err(StoreError::Backend(WRONG_TYPE.to_string())),
        }
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<u64, StoreError> {
        let mut guard = self.lock_live(key)?;
        let Some(entry) = guard.get_mut(key) else {
            return Ok(0);
        };
        let removed = match &mut entry.value {
            Stored::Hash(fields) => fields.remove(field).is_some(),
            Stored::Text(_) => return Err(StoreError::Backend(WRONG_TYPE.to_string())),
        };
        if matches!(&entry.value, Stored::Hash(fields) if fields.is_empty()) {
            guard.remove(key);
        }
        Ok(u64::from(removed))
    }
}
