//! # Cache Accessor (C2)
//!
//! Read-through/write-through Redis layer for by-id lookups. Never
//! authoritative: every read falls through to storage on miss, and every
//! mutation in the core either overwrites or deletes the affected keys
//! before returning (spec.md §4.2, §9).

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::Result;

/// Cache TTL configuration (spec.md §4.2: 1h entities, 5min list pages).
#[derive(Debug, Clone, Copy)]
pub struct CacheTtl {
    pub entity: Duration,
    pub list: Duration,
}

impl Default for CacheTtl {
    fn default() -> Self {
        Self {
            entity: Duration::from_secs(3600),
            list: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub url: String,
    pub ttl: CacheTtl,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            ttl: CacheTtl::default(),
        }
    }
}

/// Thin wrapper over a Redis connection manager. Grounded on
/// `original_source/internal/adapters/redis/cache_repository.go`: JSON
/// marshal on write, JSON-unmarshal-with-plain-string-fallback on read.
#[derive(Clone)]
pub struct CacheClient {
    conn: ConnectionManager,
    config: CacheConfig,
}

impl CacheClient {
    pub async fn new(config: CacheConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str())?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn, config })
    }

    #[must_use]
    pub const fn ttl(&self) -> CacheTtl {
        self.config.ttl
    }

    /// Get a JSON-decoded value. Cache misses and decode failures are
    /// never surfaced as hard errors by callers (spec.md §7: "Cache
    /// misses are never errors").
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(key).await?;
        match raw {
            Some(s) => Ok(serde_json::from_str(&s).ok()),
            None => Ok(None),
        }
    }

    /// Get a string value, falling back to the raw stored bytes if they
    /// don't happen to be valid JSON (the "scalar types round-trip via
    /// JSON with a plain-string fallback" rule of spec.md §4.2, mirroring
    /// the original's `Get` type-switch on `*string`).
    pub async fn get_string(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(key).await?;
        Ok(raw.map(|s| serde_json::from_str::<String>(&s).unwrap_or(s)))
    }

    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(value)?;
        let _: () = conn.set_ex(key, json, ttl.as_secs()).await?;
        Ok(())
    }

    /// `SETNX` + `EXPIRE`, for lock idioms (spec.md §4.2: "SET-if-absent
    /// supported for lock idioms").
    pub async fn set_if_not_exists<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<bool> {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(value)?;
        let set: bool = conn.set_nx(key, json).await?;
        if set {
            let _: () = conn.expire(key, ttl.as_secs() as i64).await?;
        }
        Ok(set)
    }

    pub async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let deleted: i64 = conn.del(key).await?;
        Ok(deleted > 0)
    }

    pub async fn delete_many(&self, keys: &[String]) -> Result<i64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.clone();
        let deleted: i64 = conn.del(keys).await?;
        Ok(deleted)
    }

    pub async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let exists: bool = conn.exists(key).await?;
        Ok(exists)
    }
}

/// Object-safe cache surface the core services depend on, mirroring the
/// trait-object seam `DroneRepository`/`OrderRepository` use for the
/// Storage Gateway: production wires a live [`CacheClient`], tests wire
/// [`InMemoryCache`] instead of standing up Redis. Values cross the
/// boundary as `serde_json::Value` since a trait object can't carry a
/// generic method.
#[async_trait]
pub trait CacheAccessor: Send + Sync {
    fn ttl(&self) -> CacheTtl;
    async fn get_json(&self, key: &str) -> Result<Option<serde_json::Value>>;
    async fn set_json(&self, key: &str, value: serde_json::Value, ttl: Duration) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<bool>;
}

#[async_trait]
impl CacheAccessor for CacheClient {
    fn ttl(&self) -> CacheTtl {
        Self::ttl(self)
    }

    async fn get_json(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(key).await?;
        match raw {
            Some(s) => Ok(serde_json::from_str(&s).ok()),
            None => Ok(None),
        }
    }

    async fn set_json(&self, key: &str, value: serde_json::Value, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(&value)?;
        let _: () = conn.set_ex(key, json, ttl.as_secs()).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Self::delete(self, key).await
    }
}

/// Shared cache handle, cloned into every repository/core service.
pub type SharedCacheClient = Arc<dyn CacheAccessor>;

#[must_use]
pub fn shared_cache(client: CacheClient) -> SharedCacheClient {
    Arc::new(client)
}

/// In-process stand-in for [`CacheClient`], used by scenario tests that
/// exercise the read-through/write-through choreography without a live
/// Redis (SPEC_FULL.md §B.4).
#[derive(Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, String>>,
    ttl: CacheTtl,
}

impl InMemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheAccessor for InMemoryCache {
    fn ttl(&self) -> CacheTtl {
        self.ttl
    }

    async fn get_json(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let guard = self.entries.lock().unwrap();
        Ok(guard.get(key).and_then(|s| serde_json::from_str(s).ok()))
    }

    async fn set_json(&self, key: &str, value: serde_json::Value, _ttl: Duration) -> Result<()> {
        let json = serde_json::to_string(&value)?;
        self.entries.lock().unwrap().insert(key.to_string(), json);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.entries.lock().unwrap().remove(key).is_some())
    }
}

/// Domain-typed key helpers so the core never hand-builds a cache key
/// string inline. `drone:{id}` and `order:{id}` per spec.md §4.2.
pub mod keys {
    use uuid::Uuid;

    #[must_use]
    pub fn drone(id: Uuid) -> String {
        format!("drone:{id}")
    }

    #[must_use]
    pub fn order(id: Uuid) -> String {
        format!("order:{id}")
    }

    #[must_use]
    pub fn order_current_for_drone(drone_id: Uuid) -> String {
        format!("order:current:{drone_id}")
    }
}

#[cfg(test)]
mod tests {
    use super::keys;
    use uuid::Uuid;

    #[test]
    fn key_shapes_match_the_spec() {
        let id = Uuid::nil();
        assert_eq!(keys::drone(id), "drone:00000000-0000-0000-0000-000000000000");
        assert_eq!(keys::order(id), "order:00000000-0000-0000-0000-000000000000");
    }
}
