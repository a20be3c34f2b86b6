//! # Repository Module
//!
//! Repository pattern implementations for domain entity persistence.

pub mod traits;

#[cfg(feature = "postgres")]
pub mod postgres_impl;

pub use traits::{DroneRepository, OrderRepository};

#[cfg(feature = "postgres")]
pub use postgres_impl::{PgClient, PgConfig, PostgresDroneRepository, PostgresOrderRepository};
