//! # Drone Delivery Coordination — Domain Model
//!
//! Shared entities, state machines, and error types for the drone fleet /
//! delivery order core. These types are the single source of truth across
//! the persistence, event, auth, core, and HTTP layers.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod actor;
pub mod drone;
pub mod error;
pub mod geo;
pub mod order;
pub mod pagination;
pub mod patch;
pub mod validation;

pub use actor::{Actor, RequestCtx, Role, RoleGuard};
pub use drone::{
    CreateDroneRequest, Drone, DroneFilter, DroneStatus, GeoFilter, ProcessHeartbeatRequest,
    UpdateDroneRequest,
};
pub use error::{DomainError, DomainErrorCode};
pub use order::{
    derived_drone_status, CreateOrderRequest, Order, OrderFilter, OrderStatus,
    UpdateOrderLocationRequest, UpdateOrderRequest, UpdateStatusRequest,
};
pub use pagination::{Page, Pagination};
pub use patch::Patch;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
