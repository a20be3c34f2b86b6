//! In-memory `DroneRepository`/`OrderRepository` fakes for scenario
//! testing the cross-aggregate transactions of spec.md §8, grounded on
//! the trait-object seam `drone-persistence/src/repository/traits.rs`
//! defines (the corpus's own pattern for swapping a real backend for a
//! test double, rather than reaching for a mocking crate — SPEC_FULL
//! §B.4). Both fakes share one `Stores` so the cross-aggregate
//! side-effects `PostgresDroneRepository`/`PostgresOrderRepository` run
//! inside a SQL transaction — broken-drone fanout, heartbeat
//! propagation, derived drone-status on order transitions — happen here
//! too, just under a mutex instead of a transaction.
#![cfg(test)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use drone_domain::{
    derived_drone_status, CreateDroneRequest, CreateOrderRequest, Drone, DroneFilter, DroneStatus,
    Order, OrderFilter, OrderStatus, Page, Pagination, ProcessHeartbeatRequest, UpdateDroneRequest,
    UpdateOrderRequest, UpdateStatusRequest,
};
use drone_persistence::{DroneRepository, OrderRepository, Result};
use uuid::Uuid;

#[derive(Default)]
struct Stores {
    drones: Mutex<HashMap<Uuid, Drone>>,
    orders: Mutex<HashMap<Uuid, Order>>,
    seq: Mutex<u64>,
}

pub struct InMemoryDroneRepository {
    stores: Arc<Stores>,
}

pub struct InMemoryOrderRepository {
    stores: Arc<Stores>,
}

/// Builds a pair of fakes sharing one backing store, the way both
/// `PostgresDroneRepository` and `PostgresOrderRepository` share one
/// connection pool against the same database.
#[must_use]
pub fn in_memory_repositories() -> (Arc<InMemoryDroneRepository>, Arc<InMemoryOrderRepository>) {
    let stores = Arc::new(Stores::default());
    (
        Arc::new(InMemoryDroneRepository {
            stores: Arc::clone(&stores),
        }),
        Arc::new(InMemoryOrderRepository { stores }),
    )
}

impl InMemoryDroneRepository {
    /// Test seam: inserts a drone with caller-chosen id/status, bypassing
    /// `create`'s always-idle default. Scenario setup needs drones that
    /// start mid-lifecycle (e.g. already `delivering`).
    pub fn seed(&self, drone: Drone) {
        self.stores.drones.lock().unwrap().insert(drone.id, drone);
    }
}

#[async_trait]
impl DroneRepository for InMemoryDroneRepository {
    async fn create(&self, spec: &CreateDroneRequest, created_by_id: Uuid) -> Result<Drone> {
        let now = Utc::now();
        let drone = Drone {
            id: Uuid::new_v4(),
            drone_identifier: spec.drone_identifier.clone(),
            user_id: created_by_id,
            model: spec.model.clone(),
            serial_number: spec.serial_number.clone(),
            manufacturer: spec.manufacturer.clone(),
            max_weight_kg: spec.max_weight_kg,
            max_speed_kmh: spec.max_speed_kmh,
            max_range_km: spec.max_range_km,
            battery_capacity_mah: spec.battery_capacity_mah,
            status: DroneStatus::Idle,
            battery_level_percent: 100,
            current_lat: None,
            current_lon: None,
            current_altitude: None,
            last_location_update_at: None,
            total_flight_hours: 0.0,
            total_deliveries: 0,
            last_maintenance_at: None,
            next_maintenance_due_at: None,
            created_at: now,
            updated_at: now,
            active: true,
            created_by_id: Some(created_by_id),
            updated_by_id: Some(created_by_id),
        };
        self.stores.drones.lock().unwrap().insert(drone.id, drone.clone());
        Ok(drone)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Drone>> {
        Ok(self.stores.drones.lock().unwrap().get(&id).filter(|d| d.active).cloned())
    }

    async fn get_by_filter(&self, filter: &DroneFilter) -> Result<Option<Drone>> {
        let page = self.list(filter, Pagination { limit: 1, offset: 0 }).await?;
        Ok(page.items.into_iter().next())
    }

    async fn list(&self, filter: &DroneFilter, pagination: Pagination) -> Result<Page<Drone>> {
        let all: Vec<Drone> = self
            .stores
            .drones
            .lock()
            .unwrap()
            .values()
            .filter(|d| d.active)
            .filter(|d| filter.status.is_none_or(|s| d.status == s))
            .filter(|d| filter.user_id.is_none_or(|u| d.user_id == u))
            .cloned()
            .collect();
        let total = all.len() as i64;
        let items = all
            .into_iter()
            .skip(pagination.offset as usize)
            .take(pagination.limit as usize)
            .collect();
        Ok(Page::new(items, total, pagination))
    }

    async fn nearby(&self, _center_lat: f64, _center_lon: f64, _radius_km: f64) -> Result<Vec<Drone>> {
        Ok(self.stores.drones.lock().unwrap().values().filter(|d| d.active).cloned().collect())
    }

    async fn update(&self, id: Uuid, patch: UpdateDroneRequest) -> Result<Option<Drone>> {
        let mut guard = self.stores.drones.lock().unwrap();
        let Some(drone) = guard.get_mut(&id) else {
            return Ok(None);
        };
        let updated_by = drone.updated_by_id.unwrap_or(drone.user_id);
        patch.apply(drone, updated_by);
        Ok(Some(drone.clone()))
    }

    async fn update_status_plain(&self, id: Uuid, status: DroneStatus, actor_id: Uuid) -> Result<Option<Drone>> {
        let mut guard = self.stores.drones.lock().unwrap();
        let Some(drone) = guard.get_mut(&id) else {
            return Ok(None);
        };
        drone.status = status;
        drone.updated_by_id = Some(actor_id);
        drone.updated_at = Utc::now();
        Ok(Some(drone.clone()))
    }

    /// Mirrors `PostgresDroneRepository::set_status_broken`'s fanout: every
    /// active, non-terminal order the drone carries moves to `handoff` and
    /// loses its carrier (spec.md §4.1, I4).
    async fn set_status_broken(&self, drone_id: Uuid, actor_id: Uuid) -> Result<Option<Drone>> {
        let result = {
            let mut guard = self.stores.drones.lock().unwrap();
            let Some(drone) = guard.get_mut(&drone_id) else {
                return Ok(None);
            };
            drone.status = DroneStatus::Broken;
            drone.updated_by_id = Some(actor_id);
            drone.updated_at = Utc::now();
            drone.clone()
        };

        let mut oguard = self.stores.orders.lock().unwrap();
        for order in oguard.values_mut() {
            if order.drone_id == Some(drone_id) && order.active && order.status.is_detachable() {
                order.status = OrderStatus::Handoff;
                order.drone_id = None;
                order.updated_at = Utc::now();
            }
        }
        Ok(Some(result))
    }

    /// Mirrors `PostgresDroneRepository::process_heartbeat`'s propagation:
    /// position/battery land on the drone, position also lands on every
    /// order it is currently carrying (spec.md §4.1).
    async fn process_heartbeat(
        &self,
        drone_id: Uuid,
        actor_id: Uuid,
        sample: &ProcessHeartbeatRequest,
    ) -> Result<Option<Drone>> {
        let result = {
            let mut guard = self.stores.drones.lock().unwrap();
            let Some(drone) = guard.get_mut(&drone_id) else {
                return Ok(None);
            };
            drone.current_lat = Some(sample.lat);
            drone.current_lon = Some(sample.lon);
            drone.current_altitude = Some(sample.altitude);
            drone.battery_level_percent = sample.battery_level_percent;
            drone.last_location_update_at = Some(Utc::now());
            drone.updated_by_id = Some(actor_id);
            drone.updated_at = Utc::now();
            drone.clone()
        };

        let mut oguard = self.stores.orders.lock().unwrap();
        for order in oguard.values_mut() {
            if order.drone_id == Some(drone_id) && order.active && order.status.is_carrying() {
                order.current_lat = Some(sample.lat);
                order.current_lon = Some(sample.lon);
                order.current_altitude = Some(sample.altitude);
                order.last_location_update_at = Some(Utc::now());
            }
        }
        Ok(Some(result))
    }
}

impl InMemoryOrderRepository {
    fn next_order_number(&self) -> String {
        let mut seq = self.stores.seq.lock().unwrap();
        *seq += 1;
        format!("ORD-{:08}", *seq)
    }

    /// Test seam, symmetric with `InMemoryDroneRepository::seed`.
    pub fn seed(&self, order: Order) {
        self.stores.orders.lock().unwrap().insert(order.id, order);
    }

    fn matches(order: &Order, filter: &OrderFilter) -> bool {
        if let Some(user_id) = filter.user_id {
            if order.user_id != user_id {
                return false;
            }
        }
        if let Some(carrier) = filter.carrier_or_merge() {
            if order.drone_id != Some(carrier) && order.delivered_by_drone_id != Some(carrier) {
                return false;
            }
        } else {
            if let Some(drone_id) = filter.drone_id {
                if order.drone_id != Some(drone_id) {
                    return false;
                }
            }
            if let Some(delivered_by) = filter.delivered_by_drone_id {
                if order.delivered_by_drone_id != Some(delivered_by) {
                    return false;
                }
            }
        }
        if let Some(status) = filter.status {
            if order.status != status {
                return false;
            }
        }
        true
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create(&self, user_id: Uuid, spec: &CreateOrderRequest) -> Result<Order> {
        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            order_number: self.next_order_number(),
            user_id,
            receiver_name: spec.receiver_name.clone(),
            receiver_phone: spec.receiver_phone.clone(),
            package_weight_kg: spec.package_weight_kg,
            delivery_note: spec.delivery_note.clone(),
            origin_address: spec.origin_address.clone(),
            origin_lat: spec.origin_lat,
            origin_lon: spec.origin_lon,
            destination_address: spec.destination_address.clone(),
            destination_lat: spec.destination_lat,
            destination_lon: spec.destination_lon,
            status: OrderStatus::Pending,
            scheduled_at: spec.scheduled_at,
            delivered_at: None,
            cancelled_at: None,
            withdrawn_at: None,
            failed_at: None,
            estimated_arrival_at: None,
            drone_id: None,
            delivered_by_drone_id: None,
            current_lat: None,
            current_lon: None,
            current_altitude: None,
            last_location_update_at: None,
            created_at: now,
            updated_at: now,
            active: true,
            created_by_id: Some(user_id),
            updated_by_id: Some(user_id),
        };
        self.stores.orders.lock().unwrap().insert(order.id, order.clone());
        Ok(order)
    }

    async fn get(&self, id: Uuid, filter: &OrderFilter) -> Result<Option<Order>> {
        Ok(self
            .stores
            .orders
            .lock()
            .unwrap()
            .get(&id)
            .filter(|o| o.active && Self::matches(o, filter))
            .cloned())
    }

    async fn get_by_filter(&self, filter: &OrderFilter) -> Result<Option<Order>> {
        Ok(self
            .stores
            .orders
            .lock()
            .unwrap()
            .values()
            .find(|o| o.active && Self::matches(o, filter))
            .cloned())
    }

    async fn list(&self, filter: &OrderFilter, pagination: Pagination) -> Result<Page<Order>> {
        let all: Vec<Order> = self
            .stores
            .orders
            .lock()
            .unwrap()
            .values()
            .filter(|o| o.active && Self::matches(o, filter))
            .cloned()
            .collect();
        let total = all.len() as i64;
        let items = all
            .into_iter()
            .skip(pagination.offset as usize)
            .take(pagination.limit as usize)
            .collect();
        Ok(Page::new(items, total, pagination))
    }

    async fn update(&self, id: Uuid, patch: UpdateOrderRequest, updated_by_id: Uuid) -> Result<Option<Order>> {
        let mut guard = self.stores.orders.lock().unwrap();
        let Some(order) = guard.get_mut(&id) else {
            return Ok(None);
        };
        patch.apply(order, updated_by_id);
        Ok(Some(order.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.stores.orders.lock().unwrap().remove(&id).is_some())
    }

    async fn update_location(&self, id: Uuid, lat: f64, lon: f64, altitude: f64) -> Result<Option<Order>> {
        let mut guard = self.stores.orders.lock().unwrap();
        let Some(order) = guard.get_mut(&id) else {
            return Ok(None);
        };
        order.current_lat = Some(lat);
        order.current_lon = Some(lon);
        order.current_altitude = Some(altitude);
        order.last_location_update_at = Some(Utc::now());
        Ok(Some(order.clone()))
    }

    /// Mirrors `PostgresOrderRepository::update_status`'s drone_id /
    /// `delivered_by_drone_id` policy and its derived drone-status
    /// side-effect (spec.md §4.1's table).
    async fn update_status(&self, id: Uuid, req: UpdateStatusRequest) -> Result<Option<Order>> {
        let result = {
            let mut guard = self.stores.orders.lock().unwrap();
            let Some(order) = guard.get_mut(&id) else {
                return Ok(None);
            };

            order.status = req.status;
            order.drone_id = match req.status {
                OrderStatus::Reserved | OrderStatus::Reassigned => req.drone_id,
                OrderStatus::Delivered => None,
                _ => order.drone_id,
            };
            order.delivered_by_drone_id = match req.status {
                OrderStatus::Delivered | OrderStatus::Reassigned => req.drone_id.or(order.delivered_by_drone_id),
                _ => order.delivered_by_drone_id,
            };
            if req.delivered_at.is_some() {
                order.delivered_at = req.delivered_at;
            }
            if req.failed_at.is_some() {
                order.failed_at = req.failed_at;
            }
            if req.withdrawn_at.is_some() {
                order.withdrawn_at = req.withdrawn_at;
            }
            if req.cancelled_at.is_some() {
                order.cancelled_at = req.cancelled_at;
            }
            order.updated_by_id = Some(req.actor_id);
            order.updated_at = Utc::now();
            order.clone()
        };

        if let Some(new_drone_status) = derived_drone_status(req.status) {
            let carrier = req.drone_id.or(result.drone_id).or(result.delivered_by_drone_id);
            if let Some(drone_id) = carrier {
                if let Some(drone) = self.stores.drones.lock().unwrap().get_mut(&drone_id) {
                    drone.status = new_drone_status;
                    drone.updated_at = Utc::now();
                }
            }
        }
        Ok(Some(result))
    }
}
