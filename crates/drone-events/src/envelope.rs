//! The domain event envelope (spec.md §4.3). Every message published to
//! NATS, regardless of subject, is wrapped in this shape so that
//! consumers can dispatch on `event_type` without decoding `data` first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Context carried alongside every event for tracing and idempotency
/// (spec.md §4.3's metadata block; grounded on
/// `original_source/internal/core/events/orders.go`'s `EventMetadata`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    pub source: String,
    pub correlation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub causation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
}

impl EventMetadata {
    #[must_use]
    pub fn new(source: impl Into<String>, correlation_id: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            correlation_id: correlation_id.into(),
            causation_id: None,
            user_id: None,
        }
    }

    #[must_use]
    pub fn with_user_id(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    #[must_use]
    pub fn with_causation_id(mut self, causation_id: impl Into<String>) -> Self {
        self.causation_id = Some(causation_id.into());
        self
    }
}

/// An envelope wraps one unit of domain state change: its type, the
/// aggregate it concerns, a schema version, and the payload itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope<T> {
    pub id: String,
    pub event_type: String,
    pub aggregate_id: Uuid,
    pub version: u32,
    pub data: T,
    pub metadata: EventMetadata,
    pub timestamp: DateTime<Utc>,
}

impl<T> EventEnvelope<T> {
    /// `id` takes the shape `evt_<unix_nanos>` used by the original
    /// publisher so that downstream log correlation by id keeps working.
    #[must_use]
    pub fn new(
        event_type: impl Into<String>,
        aggregate_id: Uuid,
        data: T,
        metadata: EventMetadata,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: format!("evt_{}", now.timestamp_nanos_opt().unwrap_or_default()),
            event_type: event_type.into(),
            aggregate_id,
            version: 1,
            data,
            metadata,
            timestamp: now,
        }
    }
}

/// Event type identifiers (spec.md §4.3). These are the `event_type`
/// field values, not the NATS subjects — many event types multiplex onto
/// one subject.
pub mod event_types {
    pub const ORDER_CREATED: &str = "order_created";
    pub const ORDER_RESERVED: &str = "order_reserved";
    pub const ORDER_PICKED_UP: &str = "order_picked_up";
    pub const ORDER_IN_TRANSIT: &str = "order_in_transit";
    pub const ORDER_ARRIVED: &str = "order_arrived";
    pub const ORDER_DELIVERED: &str = "order_delivered";
    pub const ORDER_FAILED: &str = "order_failed";
    pub const ORDER_CANCELLED: &str = "order_cancelled";
    pub const ORDER_HANDOFF: &str = "order_handoff";
    pub const ORDER_REASSIGNED: &str = "order_reassigned";
    pub const ORDER_UPDATED: &str = "order_updated";

    pub const DRONE_CREATED: &str = "drone_created";
    pub const DRONE_UPDATED: &str = "drone_updated";
    pub const DRONE_STATUS_CHANGED: &str = "drone_status_changed";
    pub const DRONE_BROKEN: &str = "drone_broken";
    pub const DRONE_LOCATION_UPDATED: &str = "drone_location_updated";

    pub const USER_CREATED: &str = "user_created";
    pub const USER_UPDATED: &str = "user_updated";
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_round_trips_through_json() {
        let now = Utc::now();
        let meta = EventMetadata::new("drone-core", "corr-1");
        let env = EventEnvelope::new(
            event_types::ORDER_UPDATED,
            Uuid::nil(),
            json!({"status": "reserved"}),
            meta,
            now,
        );
        let raw = serde_json::to_string(&env).unwrap();
        let back: EventEnvelope<serde_json::Value> = serde_json::from_str(&raw).unwrap();
        assert_eq!(back.event_type, event_types::ORDER_UPDATED);
        assert_eq!(back.aggregate_id, Uuid::nil());
    }

    #[test]
    fn id_carries_the_evt_prefix() {
        let env = EventEnvelope::new(
            event_types::DRONE_CREATED,
            Uuid::nil(),
            (),
            EventMetadata::new("drone-core", "corr-2"),
            Utc::now(),
        );
        assert!(env.id.starts_with("evt_"));
    }
}
