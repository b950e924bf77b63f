//! Keyed cache with TTL.
//!
//! [`CacheStore`] is the boundary to the backing keyed store: string keys,
//! serialized string values, set-with-expiry. [`Cache`] layers typed
//! serde_json encoding and deterministic key generation on top of it.
//! [`MemoryStore`] is the in-process backend.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::error::CacheError;

/// Raw string-keyed store with per-key expiry.
///
/// Entries are always written whole; there is no update-in-place. Missing or
/// expired keys read back as `None`, never as an error.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    /// Idempotent; deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
    async fn has(&self, key: &str) -> Result<bool, CacheError>;
}

/// In-process [`CacheStore`] backed by a map with lazy expiry on read.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let expires_at = Instant::now() + ttl;
        self.entries
            .lock()
            .await
            .insert(key.to_string(), (value.to_string(), expires_at));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some((_, expires_at)) if *expires_at <= Instant::now() => {
                entries.remove(key);
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value.clone())),
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn has(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.get(key).await?.is_some())
    }
}

/// Typed cache adapter over a [`CacheStore`].
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn CacheStore>,
}

impl Cache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Serialize `value` and write it with the given TTL.
    pub async fn set<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl_secs: u64,
    ) -> Result<(), CacheError> {
        let payload = serde_json::to_string(value).map_err(|err| CacheError::Write {
            key: key.to_string(),
            reason: err.to_string(),
        })?;
        self.store
            .set(key, &payload, Duration::from_secs(ttl_secs))
            .await?;
        debug!(key, ttl_secs, "cache set");
        Ok(())
    }

    /// Read and decode a value. Missing or expired keys are `Ok(None)`;
    /// an undecodable payload is a read-side error, not a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.store.get(key).await? {
            None => {
                debug!(key, "cache miss");
                Ok(None)
            }
            Some(raw) => {
                debug!(key, "cache hit");
                serde_json::from_str(&raw)
                    .map(Some)
                    .map_err(|err| CacheError::Corrupt {
                        key: key.to_string(),
                        reason: err.to_string(),
                    })
            }
        }
    }

    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.store.delete(key).await?;
        debug!(key, "cache delete");
        Ok(())
    }

    pub async fn has(&self, key: &str) -> Result<bool, CacheError> {
        self.store.has(key).await
    }
}

/// Build a deterministic cache key from a prefix and a parameter set.
///
/// Parameters are sorted by name and encoded as canonical JSON, so the key is
/// independent of the caller's insertion order, and a `:` inside a value
/// cannot make two distinct parameter sets collide (the separator only ever
/// appears inside JSON string escaping, never as a bare join character).
pub fn generate_key(prefix: &str, params: &[(&str, serde_json::Value)]) -> String {
    let mut pairs: Vec<&(&str, serde_json::Value)> = params.iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));

    let mut map = serde_json::Map::new();
    for (name, value) in pairs {
        map.insert((*name).to_string(), value.clone());
    }

    format!("{prefix}:{}", serde_json::Value::Object(map))
}
