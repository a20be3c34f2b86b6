//! # Drone Persistence
//!
//! Storage Gateway (C1) and Cache Accessor (C2) for the drone delivery
//! coordination service.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Drone / Order Core                      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │           DroneRepository / OrderRepository (traits)          │
//! └─────────────────────────────────────────────────────────────┘
//!                    │                   │
//!                    ▼                   ▼
//! ┌─────────────────────────┐   ┌──────────────────────────────┐
//! │     CacheClient (Redis) │   │   Postgres*Repository (sqlx)  │
//! │  by-id read-through      │   │        source of truth        │
//! └─────────────────────────┘   └──────────────────────────────┘
//! ```
//!
//! Cache population/invalidation is the caller's responsibility (the core
//! services own the read-through/write-through choreography); this crate
//! only exposes the two primitives.
//!
//! ## Features
//!
//! - `postgres`: Enable the PostgreSQL storage gateway (default)
//! - `redis`: Enable the Redis cache accessor (default)

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod error;
pub mod repository;

pub use cache::{
    keys, shared_cache, CacheAccessor, CacheClient, CacheConfig, CacheTtl, InMemoryCache, SharedCacheClient,
};
pub use error::{PersistenceError, Result};
pub use repository::{DroneRepository, OrderRepository};

#[cfg(feature = "postgres")]
pub use repository::{PgClient, PgConfig, PostgresDroneRepository, PostgresOrderRepository};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the persistence layer with default configuration.
///
/// # Errors
///
/// Returns an error if either the Postgres or Redis connection fails.
#[cfg(all(feature = "postgres", feature = "redis"))]
pub async fn init_default() -> Result<(PgClient, CacheClient)> {
    let pg = PgClient::connect(&PgConfig::default()).await?;
    let cache = CacheClient::new(CacheConfig::default()).await?;
    Ok((pg, cache))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
