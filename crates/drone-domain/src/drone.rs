//! The Drone aggregate: identity, specs, live state, and the
//! eight-state status machine (spec.md §3.1, §3.3, §4.4).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::DomainError;
use crate::patch::{self, Patch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DroneStatus {
    Idle,
    Loading,
    Delivering,
    /// Persisted wire value is the source system's misspelling
    /// `"returing"` (see SPEC_FULL.md A.9 item 3 — preserved deliberately
    /// for wire compatibility with the original system).
    #[serde(rename = "returing")]
    Returning,
    Charging,
    Broken,
    UnderRepair,
    Maintenanced,
}

impl DroneStatus {
    #[must_use]
    pub const fn as_wire_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Delivering => "delivering",
            Self::Returning => "returing",
            Self::Charging => "charging",
            Self::Broken => "broken",
            Self::UnderRepair => "under_repair",
            Self::Maintenanced => "maintenanced",
        }
    }

    /// The allowed target states for this source state (spec.md §4.4's
    /// `IsTransitionAllowed` table). No status allows a self-transition.
    #[must_use]
    pub const fn allowed_targets(self) -> &'static [Self] {
        match self {
            Self::Idle => &[Self::Loading, Self::Charging, Self::Maintenanced, Self::Broken],
            Self::Loading => &[Self::Delivering, Self::Broken],
            Self::Delivering => &[Self::Returning, Self::Broken],
            Self::Returning => &[Self::Idle, Self::Charging, Self::Broken],
            Self::Charging => &[Self::Idle, Self::Returning, Self::Broken],
            Self::Broken => &[Self::UnderRepair],
            Self::UnderRepair => &[Self::Maintenanced],
            Self::Maintenanced => &[Self::Idle, Self::Returning],
        }
    }

    #[must_use]
    pub fn is_transition_allowed(self, to: Self) -> bool {
        self.allowed_targets().contains(&to)
    }

    /// Validates `self -> to`, returning the source-state-specific
    /// rejection `DomainError` on failure.
    pub fn transition_to(self, to: Self) -> Result<(), DomainError> {
        if self.is_transition_allowed(to) {
            Ok(())
        } else {
            Err(DomainError::drone_transition_rejection(self))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drone {
    pub id: Uuid,
    pub drone_identifier: String,
    pub user_id: Uuid,

    pub model: String,
    pub serial_number: String,
    pub manufacturer: String,
    pub max_weight_kg: f64,
    pub max_speed_kmh: f64,
    pub max_range_km: f64,
    pub battery_capacity_mah: i32,

    pub status: DroneStatus,
    pub battery_level_percent: i16,
    pub current_lat: Option<f64>,
    pub current_lon: Option<f64>,
    pub current_altitude: Option<f64>,
    pub last_location_update_at: Option<DateTime<Utc>>,

    pub total_flight_hours: f64,
    pub total_deliveries: i32,
    pub last_maintenance_at: Option<DateTime<Utc>>,
    pub next_maintenance_due_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub active: bool,
    pub created_by_id: Option<Uuid>,
    pub updated_by_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDroneRequest {
    #[validate(length(min = 1, max = 100))]
    pub drone_identifier: String,
    #[validate(length(min = 1, max = 100))]
    pub model: String,
    #[validate(custom(function = "crate::validation::serial_number"))]
    pub serial_number: String,
    #[validate(length(min = 1, max = 100))]
    pub manufacturer: String,
    #[validate(range(min = 0.01))]
    pub max_weight_kg: f64,
    #[validate(range(min = 0.01))]
    pub max_speed_kmh: f64,
    #[validate(range(min = 0.01))]
    pub max_range_km: f64,
    #[validate(range(min = 1))]
    pub battery_capacity_mah: i32,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDroneRequest {
    #[serde(default, deserialize_with = "patch::deserialize")]
    pub drone_identifier: Patch<String>,
    #[serde(default, deserialize_with = "patch::deserialize")]
    pub model: Patch<String>,
    #[serde(default, deserialize_with = "patch::deserialize")]
    pub manufacturer: Patch<String>,
    #[serde(default, deserialize_with = "patch::deserialize")]
    pub max_weight_kg: Patch<f64>,
    #[serde(default, deserialize_with = "patch::deserialize")]
    pub max_speed_kmh: Patch<f64>,
    #[serde(default, deserialize_with = "patch::deserialize")]
    pub max_range_km: Patch<f64>,
    #[serde(default, deserialize_with = "patch::deserialize")]
    pub battery_capacity_mah: Patch<i32>,
    #[serde(default, deserialize_with = "patch::deserialize")]
    pub active: Patch<bool>,
}

impl UpdateDroneRequest {
    pub fn apply(self, drone: &mut Drone, updated_by_id: Uuid) {
        self.drone_identifier.apply_required(&mut drone.drone_identifier);
        self.model.apply_required(&mut drone.model);
        self.manufacturer.apply_required(&mut drone.manufacturer);
        self.max_weight_kg.apply_required(&mut drone.max_weight_kg);
        self.max_speed_kmh.apply_required(&mut drone.max_speed_kmh);
        self.max_range_km.apply_required(&mut drone.max_range_km);
        self.battery_capacity_mah
            .apply_required(&mut drone.battery_capacity_mah);
        self.active.apply_required(&mut drone.active);
        drone.updated_by_id = Some(updated_by_id);
        drone.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProcessHeartbeatRequest {
    #[validate(custom(function = "crate::validation::saudi_lat"))]
    pub lat: f64,
    #[validate(custom(function = "crate::validation::saudi_lon"))]
    pub lon: f64,
    #[validate(range(min = 0.0))]
    pub altitude: f64,
    #[validate(range(min = 0, max = 100))]
    pub battery_level_percent: i16,
}

/// Geospatial predicate component of `DroneFilter` (spec.md §4.1's
/// `center_lat`/`center_lon`/`radius_km`).
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct GeoFilter {
    pub center_lat: f64,
    pub center_lon: f64,
    pub radius_km: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DroneFilter {
    pub status: Option<DroneStatus>,
    pub statuses: Option<Vec<DroneStatus>>,
    pub active: Option<bool>,
    pub user_id: Option<Uuid>,
    pub geo: Option<GeoFilter>,
}

impl DroneFilter {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.statuses.is_none()
            && self.active.is_none()
            && self.user_id.is_none()
            && self.geo.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returning_serializes_as_the_misspelled_wire_value() {
        let json = serde_json::to_string(&DroneStatus::Returning).unwrap();
        assert_eq!(json, "\"returing\"");
    }

    #[test]
    fn returning_deserializes_back_from_the_misspelled_wire_value() {
        let status: DroneStatus = serde_json::from_str("\"returing\"").unwrap();
        assert_eq!(status, DroneStatus::Returning);
    }

    #[test]
    fn idle_cannot_self_transition() {
        assert!(!DroneStatus::Idle.is_transition_allowed(DroneStatus::Idle));
    }

    #[test]
    fn delivering_can_only_go_to_returning_or_broken() {
        assert!(DroneStatus::Delivering.is_transition_allowed(DroneStatus::Returning));
        assert!(DroneStatus::Delivering.is_transition_allowed(DroneStatus::Broken));
        assert!(!DroneStatus::Delivering.is_transition_allowed(DroneStatus::Idle));
    }

    #[test]
    fn broken_only_escapes_via_under_repair() {
        assert_eq!(DroneStatus::Broken.allowed_targets(), &[DroneStatus::UnderRepair]);
    }

    #[test]
    fn illegal_transition_carries_source_state_message() {
        let err = DroneStatus::Delivering.transition_to(DroneStatus::Idle).unwrap_err();
        assert_eq!(err.message, "delivering can only transition to returning, broken");
    }

    #[test]
    fn every_state_can_eventually_reach_idle_via_the_repair_chain() {
        // I5: broken -> under_repair -> maintenanced -> idle|returning is the
        // only path back to operational service.
        assert!(DroneStatus::Broken.is_transition_allowed(DroneStatus::UnderRepair));
        assert!(DroneStatus::UnderRepair.is_transition_allowed(DroneStatus::Maintenanced));
        assert!(DroneStatus::Maintenanced.is_transition_allowed(DroneStatus::Idle));
    }
}
