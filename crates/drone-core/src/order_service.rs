//! Order Core (C5): the ten-transition delivery lifecycle, each one
//! fetch-with-scope → validate current status → resolve-drone-if-needed
//! → `C1.update_status` (or `C1.update`/`C1.update_location`) →
//! publish `order_updated` (best-effort) → refresh cache (spec.md §4.5).

use std::sync::Arc;

use chrono::Utc;
use drone_domain::{
    Actor, CreateOrderRequest, DomainError, DroneStatus, Order, OrderFilter, OrderStatus, Page,
    Pagination, Role, UpdateOrderLocationRequest, UpdateOrderRequest, UpdateStatusRequest,
};
use drone_events::{event_types, EventMetadata, EventSink};
use drone_persistence::{keys, DroneRepository, OrderRepository, SharedCacheClient};
use tracing::warn;
use uuid::Uuid;

use crate::error::{CoreError, Result};

pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
    drones: Arc<dyn DroneRepository>,
    cache: SharedCacheClient,
    publisher: Arc<dyn EventSink>,
}

impl OrderService {
    #[must_use]
    pub const fn new(
        orders: Arc<dyn OrderRepository>,
        drones: Arc<dyn DroneRepository>,
        cache: SharedCacheClient,
        publisher: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            orders,
            drones,
            cache,
            publisher,
        }
    }

    // ---- scope helpers (spec.md §4.5's "Scope filter") ----

    /// Scope applied on the *write* path: a drone actor is scoped to
    /// orders it currently carries (`drone_id`), not ones it has merely
    /// delivered in the past — the OR-merge only matters for reads.
    fn write_scope(actor: &Actor) -> OrderFilter {
        match actor.role {
            Role::Admin => OrderFilter::default(),
            Role::Enduser => OrderFilter::default().scoped_to_user(actor.id),
            Role::Drone => OrderFilter {
                drone_id: actor.drone_id,
                ..OrderFilter::default()
            },
        }
    }

    /// Scope applied on the *read* path: a drone actor also sees orders
    /// it has delivered historically (OR-merge, spec.md §4.1).
    #[must_use]
    pub fn read_scope(actor: &Actor) -> OrderFilter {
        match actor.role {
            Role::Admin => OrderFilter::default(),
            Role::Enduser => OrderFilter::default().scoped_to_user(actor.id),
            Role::Drone => actor
                .drone_id
                .map_or_else(OrderFilter::default, |id| OrderFilter::default().scoped_to_drone(id)),
        }
    }

    async fn fetch_scoped(&self, id: Uuid, actor: &Actor) -> Result<Order> {
        self.orders
            .get(id, &Self::write_scope(actor))
            .await?
            .ok_or_else(DomainError::order_not_found)
            .map_err(CoreError::Domain)
    }

    async fn warm_cache(&self, order: &Order) {
        let ttl = self.cache.ttl().entity;
        let result = match serde_json::to_value(order) {
            Ok(value) => self.cache.set_json(&keys::order(order.id), value, ttl).await,
            Err(err) => Err(err.into()),
        };
        if let Err(err) = result {
            warn!(error = %err, order_id = %order.id, "cache refresh failed");
        }
    }

    /// Publishes `order_updated` with the full order snapshot, logging and
    /// swallowing any failure (spec.md §4.3, §7: "publish failures ...
    /// never roll back the preceding authoritative mutation").
    async fn publish_updated(&self, order: &Order, correlation_id: &str) {
        let metadata = EventMetadata::new("drone-core", correlation_id).with_user_id(order.user_id);
        let payload = match serde_json::to_value(order) {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, order_id = %order.id, "order_updated payload serialization failed");
                return;
            }
        };
        if let Err(err) = self
            .publisher
            .publish_order_event(event_types::ORDER_UPDATED, order.id, payload, metadata)
            .await
        {
            warn!(error = %err, order_id = %order.id, "order_updated publish failed");
        }
    }

    // ---- CRUD ----

    pub async fn create(&self, actor: &Actor, correlation_id: &str, spec: &CreateOrderRequest) -> Result<Order> {
        if !spec.origin_differs_from_destination() {
            return Err(CoreError::Domain(DomainError::invalid_input(
                "destination must differ from origin",
            )));
        }
        let order = self.orders.create(actor.id, spec).await?;
        self.warm_cache(&order).await;

        let metadata = EventMetadata::new("drone-core", correlation_id).with_user_id(order.user_id);
        match serde_json::to_value(&order) {
            Ok(payload) => {
                if let Err(err) = self
                    .publisher
                    .publish_order_event(event_types::ORDER_CREATED, order.id, payload, metadata)
                    .await
                {
                    warn!(error = %err, order_id = %order.id, "order_created publish failed");
                }
            }
            Err(err) => warn!(error = %err, order_id = %order.id, "order_created payload serialization failed"),
        }
        Ok(order)
    }

    pub async fn get(&self, id: Uuid, filter: &OrderFilter) -> Result<Order> {
        let cached = self
            .cache
            .get_json(&keys::order(id))
            .await
            .unwrap_or(None)
            .and_then(|value| serde_json::from_value::<Order>(value).ok());
        if let Some(cached) = cached {
            if filter.is_empty() || order_matches(&cached, filter) {
                return Ok(cached);
            }
        }
        let order = self
            .orders
            .get(id, filter)
            .await?
            .ok_or_else(DomainError::order_not_found)?;
        self.warm_cache(&order).await;
        Ok(order)
    }

    pub async fn list(&self, filter: &OrderFilter, pagination: Pagination) -> Result<Page<Order>> {
        Ok(self.orders.list(filter, pagination).await?)
    }

    /// `GET /orders/current`: the drone's sole non-terminal order, if any
    /// (at most one per I4).
    pub async fn current_for_drone(&self, drone_id: Uuid) -> Result<Order> {
        let filter = OrderFilter {
            drone_id: Some(drone_id),
            ..OrderFilter::default()
        };
        self.orders
            .get_by_filter(&filter)
            .await?
            .ok_or_else(DomainError::order_not_found)
            .map_err(CoreError::Domain)
    }

    pub async fn update(&self, actor: &Actor, id: Uuid, patch: UpdateOrderRequest) -> Result<Order> {
        let order = self
            .orders
            .update(id, patch, actor.id)
            .await?
            .ok_or_else(DomainError::order_not_found)?;
        self.warm_cache(&order).await;
        Ok(order)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let deleted = self.orders.delete(id).await?;
        if deleted {
            let _ = self.cache.delete(&keys::order(id)).await;
        }
        Ok(deleted)
    }

    // ---- the ten transition operations ----

    /// `pending → cancelled`, enduser-only.
    pub async fn withdraw(&self, actor: &Actor, correlation_id: &str, id: Uuid) -> Result<Order> {
        let current = self.fetch_scoped(id, actor).await?;
        match current.status {
            OrderStatus::Pending => {}
            OrderStatus::Cancelled => return Err(CoreError::Domain(DomainError::already_withdrawn())),
            _ => return Err(CoreError::Domain(DomainError::withdraw_not_allowed())),
        }

        let mut req = UpdateStatusRequest::new(actor.id, OrderStatus::Cancelled);
        req.cancelled_at = Some(Utc::now());
        let updated = self.apply_transition(id, req).await?;
        self.publish_updated(&updated, correlation_id).await;
        Ok(updated)
    }

    /// `pending → reserved`, drone-only. The drone must be idle; rejection
    /// is dispatched by the drone's *current* status (spec.md §4.5).
    pub async fn reserve(&self, actor: &Actor, correlation_id: &str, id: Uuid) -> Result<Order> {
        let drone_id = actor.drone_id.ok_or_else(DomainError::user_not_found)?;

        // Unscoped fetch: a pending order has no carrier yet, so the
        // write-scope's `drone_id = actor.drone_id` predicate would never
        // match it.
        let current = self
            .orders
            .get(id, &OrderFilter::default())
            .await?
            .ok_or_else(DomainError::order_not_found)?;

        match current.status {
            OrderStatus::Pending => {}
            s if s.is_reserved() => return Err(CoreError::Domain(DomainError::already_reserved())),
            _ => return Err(CoreError::Domain(DomainError::reserve_not_allowed())),
        }

        let drone = self.drones.get(drone_id).await?.ok_or_else(DomainError::drone_not_found)?;
        if drone.status != DroneStatus::Idle {
            return Err(CoreError::Domain(DomainError::drone_busy(drone.status)));
        }

        let req = UpdateStatusRequest::new(actor.id, OrderStatus::Reserved).with_drone_id(drone_id);
        let updated = self.apply_transition(id, req).await?;
        self.publish_updated(&updated, correlation_id).await;
        Ok(updated)
    }

    /// `reserved → picked_up`, drone-only, scoped to the carrying drone.
    pub async fn confirm_pickup(&self, actor: &Actor, correlation_id: &str, id: Uuid) -> Result<Order> {
        let current = self.fetch_scoped(id, actor).await?;
        if current.status != OrderStatus::Reserved {
            return Err(CoreError::Domain(DomainError::confirm_not_allowed()));
        }
        let req = UpdateStatusRequest::new(actor.id, OrderStatus::PickedUp);
        let updated = self.apply_transition(id, req).await?;
        self.publish_updated(&updated, correlation_id).await;
        Ok(updated)
    }

    /// `picked_up | reassigned → in_transit`, drone-only.
    pub async fn start_transit(&self, actor: &Actor, correlation_id: &str, id: Uuid) -> Result<Order> {
        let current = self.fetch_scoped(id, actor).await?;
        if !matches!(current.status, OrderStatus::PickedUp | OrderStatus::Reassigned) {
            return Err(CoreError::Domain(DomainError::transit_not_allowed()));
        }
        let req = UpdateStatusRequest::new(actor.id, OrderStatus::InTransit);
        let updated = self.apply_transition(id, req).await?;
        self.publish_updated(&updated, correlation_id).await;
        Ok(updated)
    }

    /// `in_transit → arrived`, drone-only.
    pub async fn confirm_arrived(&self, actor: &Actor, correlation_id: &str, id: Uuid) -> Result<Order> {
        let current = self.fetch_scoped(id, actor).await?;
        if current.status != OrderStatus::InTransit {
            return Err(CoreError::Domain(DomainError::arrive_not_allowed()));
        }
        let req = UpdateStatusRequest::new(actor.id, OrderStatus::Arrived);
        let updated = self.apply_transition(id, req).await?;
        self.publish_updated(&updated, correlation_id).await;
        Ok(updated)
    }

    /// `arrived → delivered`, drone-only. Detaches the carrier and sets
    /// the sticky `delivered_by_drone_id` (I2, P7).
    pub async fn confirm_delivery(&self, actor: &Actor, correlation_id: &str, id: Uuid) -> Result<Order> {
        let drone_id = actor.drone_id.ok_or_else(DomainError::user_not_found)?;
        let current = self.fetch_scoped(id, actor).await?;
        if current.status != OrderStatus::Arrived {
            return Err(CoreError::Domain(DomainError::deliver_not_allowed()));
        }

        let mut req = UpdateStatusRequest::new(actor.id, OrderStatus::Delivered).with_drone_id(drone_id);
        req.delivered_at = Some(Utc::now());
        let updated = self.apply_transition(id, req).await?;
        self.publish_updated(&updated, correlation_id).await;
        Ok(updated)
    }

    /// `picked_up | in_transit | arrived → failed`, drone-only. Does NOT
    /// detach the carrier (SPEC_FULL.md A.9 decision 1).
    pub async fn delivery_failed(&self, actor: &Actor, correlation_id: &str, id: Uuid) -> Result<Order> {
        let current = self.fetch_scoped(id, actor).await?;
        if !matches!(
            current.status,
            OrderStatus::PickedUp | OrderStatus::InTransit | OrderStatus::Arrived
        ) {
            return Err(CoreError::Domain(DomainError::deliver_failed_not_allowed()));
        }

        let mut req = UpdateStatusRequest::new(actor.id, OrderStatus::Failed);
        req.failed_at = Some(Utc::now());
        let updated = self.apply_transition(id, req).await?;
        self.publish_updated(&updated, correlation_id).await;
        Ok(updated)
    }

    /// `failed → handoff`, admin-only.
    pub async fn handoff(&self, actor: &Actor, correlation_id: &str, id: Uuid) -> Result<Order> {
        let current = self
            .orders
            .get(id, &OrderFilter::default())
            .await?
            .ok_or_else(DomainError::order_not_found)?;
        if current.status != OrderStatus::Failed {
            return Err(CoreError::Domain(DomainError::handoff_not_allowed()));
        }
        let req = UpdateStatusRequest::new(actor.id, OrderStatus::Handoff);
        let updated = self.apply_transition(id, req).await?;
        self.publish_updated(&updated, correlation_id).await;
        Ok(updated)
    }

    /// `handoff → reassigned`, admin/drone. Validates the new carrier
    /// exists and is idle before transitioning (SPEC_FULL.md A.9 decision
    /// 4 — a deliberate deviation from the source's unchecked reassign).
    /// Sets `order.drone_id` to the new carrier outright so the new drone
    /// can subsequently call `StartTransit` (see DESIGN.md).
    pub async fn reassign(&self, actor: &Actor, correlation_id: &str, id: Uuid, new_drone_id: Uuid) -> Result<Order> {
        let current = self
            .orders
            .get(id, &OrderFilter::default())
            .await?
            .ok_or_else(DomainError::order_not_found)?;
        if current.status != OrderStatus::Handoff {
            return Err(CoreError::Domain(DomainError::reassign_not_allowed()));
        }

        let new_drone = self
            .drones
            .get(new_drone_id)
            .await?
            .ok_or_else(DomainError::drone_not_found)?;
        if new_drone.status != DroneStatus::Idle {
            return Err(CoreError::Domain(DomainError::drone_busy(new_drone.status)));
        }

        let req = UpdateStatusRequest::new(actor.id, OrderStatus::Reassigned).with_drone_id(new_drone_id);
        let updated = self.apply_transition(id, req).await?;
        self.publish_updated(&updated, correlation_id).await;
        Ok(updated)
    }

    /// Position-only update for any carrying state, drone-only, scoped to
    /// the carrying drone. Publishes `order_updated` with position fields
    /// only (spec.md §4.5's `UpdateLocation` row).
    pub async fn update_location(
        &self,
        actor: &Actor,
        correlation_id: &str,
        id: Uuid,
        req: &UpdateOrderLocationRequest,
    ) -> Result<Order> {
        let current = self.fetch_scoped(id, actor).await?;
        if !current.status.is_carrying() {
            return Err(CoreError::Domain(DomainError::location_update_not_allowed()));
        }

        let updated = self
            .orders
            .update_location(id, req.lat, req.lon, req.altitude)
            .await?
            .ok_or_else(DomainError::order_not_found)?;
        self.warm_cache(&updated).await;

        let metadata = EventMetadata::new("drone-core", correlation_id).with_user_id(updated.user_id);
        let payload = serde_json::json!({
            "current_lat": updated.current_lat,
            "current_lon": updated.current_lon,
            "current_altitude": updated.current_altitude,
        });
        if let Err(err) = self
            .publisher
            .publish_order_event(event_types::ORDER_UPDATED, updated.id, payload, metadata)
            .await
        {
            warn!(error = %err, order_id = %updated.id, "order_updated (location) publish failed");
        }
        Ok(updated)
    }

    async fn apply_transition(&self, id: Uuid, req: UpdateStatusRequest) -> Result<Order> {
        let updated = self
            .orders
            .update_status(id, req)
            .await?
            .ok_or_else(DomainError::order_not_found)?;
        self.warm_cache(&updated).await;
        Ok(updated)
    }
}

/// Applies an already-fetched (and thus already-scoped) order's filter
/// predicates in memory, so a cache hit isn't served across a scope
/// boundary it wasn't fetched under.
fn order_matches(order: &Order, filter: &OrderFilter) -> bool {
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
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_scope_or_merges_for_drone_actors() {
        let drone_id = Uuid::new_v4();
        let actor = Actor::drone(drone_id, drone_id);
        let scope = OrderService::read_scope(&actor);
        assert_eq!(scope.carrier_or_merge(), Some(drone_id));
    }

    #[test]
    fn read_scope_is_empty_for_admin() {
        let actor = Actor::admin(Uuid::new_v4());
        assert!(OrderService::read_scope(&actor).is_empty());
    }
}
