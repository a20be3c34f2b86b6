//! # Storage Gateway traits (C1)
//!
//! Abstract, transactional key/query interface. All cross-aggregate
//! mutations (`set_status_broken`, `process_heartbeat`,
//! `update_status`) MUST run inside a single serializable transaction;
//! all single-aggregate mutations run at read-committed or stronger
//! (spec.md §4.1).

use async_trait::async_trait;
use uuid::Uuid;

use drone_domain::{
    CreateDroneRequest, CreateOrderRequest, Drone, DroneFilter, DroneStatus, Order, OrderFilter,
    Page, Pagination, ProcessHeartbeatRequest, UpdateDroneRequest, UpdateOrderRequest,
    UpdateStatusRequest,
};

use crate::error::Result;

#[async_trait]
pub trait DroneRepository: Send + Sync {
    async fn create(&self, spec: &CreateDroneRequest, created_by_id: Uuid) -> Result<Drone>;

    async fn get(&self, id: Uuid) -> Result<Option<Drone>>;

    async fn get_by_filter(&self, filter: &DroneFilter) -> Result<Option<Drone>>;

    async fn list(&self, filter: &DroneFilter, pagination: Pagination) -> Result<Page<Drone>>;

    async fn nearby(&self, center_lat: f64, center_lon: f64, radius_km: f64) -> Result<Vec<Drone>>;

    async fn update(&self, id: Uuid, patch: UpdateDroneRequest) -> Result<Option<Drone>>;

    /// Plain status write with no cross-aggregate side-effect (used by
    /// every drone transition except the move into `broken`).
    async fn update_status_plain(&self, id: Uuid, status: DroneStatus, actor_id: Uuid) -> Result<Option<Drone>>;

    /// Transactional: sets the drone's status to `Broken` and detaches
    /// every active, non-terminal order it carries into `handoff`
    /// (spec.md §4.1 `set_status_broken`, I4).
    async fn set_status_broken(&self, drone_id: Uuid, actor_id: Uuid) -> Result<Option<Drone>>;

    /// Transactional: writes the drone's position/battery and propagates
    /// position to every order it is currently carrying (spec.md §4.1
    /// `process_heartbeat`).
    async fn process_heartbeat(
        &self,
        drone_id: Uuid,
        actor_id: Uuid,
        sample: &ProcessHeartbeatRequest,
    ) -> Result<Option<Drone>>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn create(&self, user_id: Uuid, spec: &CreateOrderRequest) -> Result<Order>;

    async fn get(&self, id: Uuid, filter: &OrderFilter) -> Result<Option<Order>>;

    async fn get_by_filter(&self, filter: &OrderFilter) -> Result<Option<Order>>;

    async fn list(&self, filter: &OrderFilter, pagination: Pagination) -> Result<Page<Order>>;

    async fn update(&self, id: Uuid, patch: UpdateOrderRequest, updated_by_id: Uuid) -> Result<Option<Order>>;

    async fn delete(&self, id: Uuid) -> Result<bool>;

    async fn update_location(
        &self,
        id: Uuid,
        lat: f64,
        lon: f64,
        altitude: f64,
    ) -> Result<Option<Order>>;

    /// Transactional with derived drone-status update (spec.md §4.1's
    /// table). Returns `None` if the order does not exist.
    async fn update_status(&self, id: Uuid, req: UpdateStatusRequest) -> Result<Option<Order>>;
}
