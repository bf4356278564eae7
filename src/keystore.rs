//! Keyed store for short-lived values such as access tokens.
//!
//! Injected wherever session-like state is needed instead of living in a
//! module-level global. Expired entries read as absent.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use sqlx::SqlitePool;

use crate::db::StoreError;

#[async_trait]
pub trait KeyedStore: Send + Sync {
    /// Store `value` under `key` for `ttl`, replacing any previous value.
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// The live value for `key`; expired entries are evicted and read as `None`.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// Process-local store.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyedStore for MemoryStore {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let expires_at = Instant::now() + ttl;
        self.entries
            .lock()
            .insert(key.to_string(), (value.to_string(), expires_at));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some((value, expires_at)) if *expires_at > Instant::now() => Ok(Some(value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// Store backed by the `kv_store` table; survives restarts.
#[derive(Clone)]
pub struct SqliteKeyedStore {
    pool: SqlitePool,
}

impl SqliteKeyedStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    /// Drop every expired entry. Returns how many were removed.
    pub async fn purge_expired(&self) -> Result<u64, StoreError> {
        Ok(crate::db::kv_purge_expired(&self.pool, Self::now()).await?)
    }
}

#[async_trait]
impl KeyedStore for SqliteKeyedStore {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let expires_at = Self::now().saturating_add(ttl.as_secs() as i64);
        crate::db::kv_put(&self.pool, key, value, expires_at).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match crate::db::kv_get(&self.pool, key).await? {
            Some((value, expires_at)) if expires_at > Self::now() => Ok(Some(value)),
            Some(_) => {
                crate::db::kv_delete(&self.pool, key).await?;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        crate::db::kv_delete(&self.pool, key).await?;
        Ok(())
    }
}
