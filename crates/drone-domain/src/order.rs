//! The Order aggregate: identity, route, carrier linkage, and the
//! ten-state delivery lifecycle (spec.md §3.1, §3.3, §4.5).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::patch::{self, Patch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Reserved,
    PickedUp,
    InTransit,
    Arrived,
    Delivered,
    Failed,
    Cancelled,
    Handoff,
    Reassigned,
}

impl OrderStatus {
    #[must_use]
    pub const fn as_wire_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Reserved => "reserved",
            Self::PickedUp => "picked_up",
            Self::InTransit => "in_transit",
            Self::Arrived => "arrived",
            Self::Delivered => "delivered",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Handoff => "handoff",
            Self::Reassigned => "reassigned",
        }
    }

    /// True for any status implying the order has at some point been
    /// claimed by a drone (used by `Reserve` to reject double-reservation,
    /// spec.md §4.5's "IsReserved helper").
    #[must_use]
    pub const fn is_reserved(self) -> bool {
        matches!(
            self,
            Self::Reserved | Self::PickedUp | Self::InTransit | Self::Arrived | Self::Delivered
        )
    }

    /// Statuses in which an order is actively carried by a drone and thus
    /// eligible for heartbeat position propagation (spec.md §4.1
    /// `process_heartbeat`).
    #[must_use]
    pub const fn is_carrying(self) -> bool {
        matches!(
            self,
            Self::PickedUp | Self::InTransit | Self::Arrived | Self::Handoff | Self::Reassigned
        )
    }

    /// Statuses eligible for the broken-drone detach fanout (spec.md §4.1
    /// `set_status_broken`): any active, non-terminal status.
    #[must_use]
    pub const fn is_detachable(self) -> bool {
        !matches!(self, Self::Delivered | Self::Cancelled | Self::Handoff)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,

    pub user_id: Uuid,
    pub receiver_name: String,
    pub receiver_phone: String,

    pub package_weight_kg: f64,
    pub delivery_note: Option<String>,

    pub origin_address: String,
    pub origin_lat: f64,
    pub origin_lon: f64,
    pub destination_address: String,
    pub destination_lat: f64,
    pub destination_lon: f64,

    pub status: OrderStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub withdrawn_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
    pub estimated_arrival_at: Option<DateTime<Utc>>,

    pub drone_id: Option<Uuid>,
    pub delivered_by_drone_id: Option<Uuid>,

    pub current_lat: Option<f64>,
    pub current_lon: Option<f64>,
    pub current_altitude: Option<f64>,
    pub last_location_update_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub active: bool,
    pub created_by_id: Option<Uuid>,
    pub updated_by_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, max = 100))]
    pub receiver_name: String,
    #[validate(custom(function = "crate::validation::saudi_phone_number"))]
    pub receiver_phone: String,
    #[validate(range(min = 0.01))]
    pub package_weight_kg: f64,
    pub delivery_note: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub origin_address: String,
    #[validate(custom(function = "crate::validation::saudi_lat"))]
    pub origin_lat: f64,
    #[validate(custom(function = "crate::validation::saudi_lon"))]
    pub origin_lon: f64,
    #[validate(length(min = 1, max = 255))]
    pub destination_address: String,
    #[validate(custom(function = "crate::validation::saudi_lat"))]
    pub destination_lat: f64,
    #[validate(custom(function = "crate::validation::saudi_lon"))]
    pub destination_lon: f64,
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl CreateOrderRequest {
    /// I6: origin and destination must differ geographically.
    #[must_use]
    pub fn origin_differs_from_destination(&self) -> bool {
        (self.origin_lat - self.destination_lat).abs() > f64::EPSILON
            || (self.origin_lon - self.destination_lon).abs() > f64::EPSILON
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateOrderRequest {
    #[serde(default, deserialize_with = "patch::deserialize")]
    pub receiver_name: Patch<String>,
    #[serde(default, deserialize_with = "patch::deserialize")]
    pub receiver_phone: Patch<String>,
    #[serde(default, deserialize_with = "patch::deserialize")]
    pub package_weight_kg: Patch<f64>,
    #[serde(default, deserialize_with = "patch::deserialize")]
    pub delivery_note: Patch<String>,
    #[serde(default, deserialize_with = "patch::deserialize")]
    pub origin_address: Patch<String>,
    #[serde(default, deserialize_with = "patch::deserialize")]
    pub destination_address: Patch<String>,
    #[serde(default, deserialize_with = "patch::deserialize")]
    pub scheduled_at: Patch<DateTime<Utc>>,
}

impl UpdateOrderRequest {
    pub fn apply(self, order: &mut Order, updated_by_id: Uuid) {
        self.receiver_name.apply_required(&mut order.receiver_name);
        self.receiver_phone.apply_required(&mut order.receiver_phone);
        self.package_weight_kg.apply_required(&mut order.package_weight_kg);
        self.delivery_note.apply_to(&mut order.delivery_note);
        self.origin_address.apply_required(&mut order.origin_address);
        self.destination_address.apply_required(&mut order.destination_address);
        self.scheduled_at.apply_to(&mut order.scheduled_at);
        order.updated_by_id = Some(updated_by_id);
        order.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateOrderLocationRequest {
    #[validate(custom(function = "crate::validation::saudi_lat"))]
    pub lat: f64,
    #[validate(custom(function = "crate::validation::saudi_lon"))]
    pub lon: f64,
    #[validate(range(min = 0.0))]
    pub altitude: f64,
}

/// Scope + search predicate composed with an id/list lookup (spec.md
/// §4.1, §4.5's "Scope filter"). When both `drone_id` and
/// `delivered_by_drone_id` are set and equal, the storage gateway treats
/// them as `(drone_id = X OR delivered_by_drone_id = X)`; otherwise both
/// are AND-combined (spec.md §4.1).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
    pub user_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
    pub drone_id: Option<Uuid>,
    pub delivered_by_drone_id: Option<Uuid>,
    pub address_contains: Option<String>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub scheduled_after: Option<DateTime<Utc>>,
    pub scheduled_before: Option<DateTime<Utc>>,
    pub min_weight_kg: Option<f64>,
    pub max_weight_kg: Option<f64>,
    pub receiver_name: Option<String>,
    pub receiver_phone: Option<String>,
}

impl OrderFilter {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let Self {
            user_id,
            status,
            drone_id,
            delivered_by_drone_id,
            address_contains,
            created_after,
            created_before,
            scheduled_after,
            scheduled_before,
            min_weight_kg,
            max_weight_kg,
            receiver_name,
            receiver_phone,
        } = self;
        user_id.is_none()
            && status.is_none()
            && drone_id.is_none()
            && delivered_by_drone_id.is_none()
            && address_contains.is_none()
            && created_after.is_none()
            && created_before.is_none()
            && scheduled_after.is_none()
            && scheduled_before.is_none()
            && min_weight_kg.is_none()
            && max_weight_kg.is_none()
            && receiver_name.is_none()
            && receiver_phone.is_none()
    }

    /// True when `drone_id` and `delivered_by_drone_id` are both set to the
    /// same value — the OR-merge case from spec.md §4.1.
    #[must_use]
    pub fn carrier_or_merge(&self) -> Option<Uuid> {
        match (self.drone_id, self.delivered_by_drone_id) {
            (Some(a), Some(b)) if a == b => Some(a),
            _ => None,
        }
    }

    #[must_use]
    pub fn scoped_to_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    #[must_use]
    pub fn scoped_to_drone(mut self, drone_id: Uuid) -> Self {
        self.drone_id = Some(drone_id);
        self.delivered_by_drone_id = Some(drone_id);
        self
    }
}

/// Instructions for `StorageGateway::update_status` (spec.md §4.1). The
/// caller supplies only the fields relevant to the transition being made;
/// timestamps default to `now` inside the gateway when the target status
/// implies one (e.g. `delivered_at` on transition to `Delivered`).
#[derive(Debug, Clone)]
pub struct UpdateStatusRequest {
    pub actor_id: Uuid,
    pub status: OrderStatus,
    pub drone_id: Option<Uuid>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
    pub withdrawn_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl UpdateStatusRequest {
    #[must_use]
    pub fn new(actor_id: Uuid, status: OrderStatus) -> Self {
        Self {
            actor_id,
            status,
            drone_id: None,
            delivered_at: None,
            failed_at: None,
            withdrawn_at: None,
            cancelled_at: None,
        }
    }

    #[must_use]
    pub fn with_drone_id(mut self, drone_id: Uuid) -> Self {
        self.drone_id = Some(drone_id);
        self
    }
}

/// Derived drone-status side-effect for an order status transition
/// (spec.md §4.1's table). `None` means no drone-status change.
#[must_use]
pub fn derived_drone_status(new_order_status: OrderStatus) -> Option<crate::drone::DroneStatus> {
    use crate::drone::DroneStatus;
    match new_order_status {
        OrderStatus::Reserved => Some(DroneStatus::Loading),
        OrderStatus::InTransit => Some(DroneStatus::Delivering),
        OrderStatus::Delivered | OrderStatus::Failed => Some(DroneStatus::Returning),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_reserved_covers_every_claimed_status() {
        for s in [
            OrderStatus::Reserved,
            OrderStatus::PickedUp,
            OrderStatus::InTransit,
            OrderStatus::Arrived,
            OrderStatus::Delivered,
        ] {
            assert!(s.is_reserved(), "{s:?} should be reserved");
        }
        assert!(!OrderStatus::Pending.is_reserved());
        assert!(!OrderStatus::Cancelled.is_reserved());
    }

    #[test]
    fn failed_is_not_detachable_trigger_but_handoff_is_excluded_from_refanout() {
        // handoff orders are already detached; delivered/cancelled are terminal.
        assert!(!OrderStatus::Handoff.is_detachable());
        assert!(!OrderStatus::Delivered.is_detachable());
        assert!(!OrderStatus::Cancelled.is_detachable());
        assert!(OrderStatus::Failed.is_detachable());
        assert!(OrderStatus::InTransit.is_detachable());
    }

    #[test]
    fn delivered_and_failed_both_return_the_drone() {
        use crate::drone::DroneStatus;
        assert_eq!(derived_drone_status(OrderStatus::Delivered), Some(DroneStatus::Returning));
        assert_eq!(derived_drone_status(OrderStatus::Failed), Some(DroneStatus::Returning));
        assert_eq!(derived_drone_status(OrderStatus::Cancelled), None);
    }

    #[test]
    fn carrier_or_merge_only_when_both_set_and_equal() {
        let id = Uuid::new_v4();
        let f = OrderFilter {
            drone_id: Some(id),
            delivered_by_drone_id: Some(id),
            ..Default::default()
        };
        assert_eq!(f.carrier_or_merge(), Some(id));

        let other = Uuid::new_v4();
        let f2 = OrderFilter {
            drone_id: Some(id),
            delivered_by_drone_id: Some(other),
            ..Default::default()
        };
        assert_eq!(f2.carrier_or_merge(), None);
    }
}
