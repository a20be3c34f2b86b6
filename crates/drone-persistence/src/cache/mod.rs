//! # Cache Accessor (C2)
//!
//! Redis-backed read-through/write-through cache for drone and order
//! by-id lookups.

pub mod redis_client;

pub use redis_client::{
    keys, shared_cache, CacheAccessor, CacheClient, CacheConfig, CacheTtl, InMemoryCache, SharedCacheClient,
};
