//! # Drone Core
//!
//! The Drone Core (C4) and Order Core (C5): the two service layers that
//! validate state transitions, orchestrate the Storage Gateway and Cache
//! Accessor, and publish domain events. HTTP handlers depend on this
//! crate, never on `drone-persistence` directly.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod drone_service;
pub mod error;
pub mod heartbeat_handler;
pub mod order_service;
#[cfg(test)]
mod scenario_tests;
#[cfg(test)]
mod test_support;

pub use drone_service::DroneService;
pub use error::{CoreError, Result};
pub use heartbeat_handler::{DroneLocationUpdatedData, HeartbeatEventHandler};
pub use order_service::OrderService;
