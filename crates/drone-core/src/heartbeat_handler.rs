//! Wires the Event Consumer (C3) to Drone Core's `process_heartbeat`.
//!
//! Grounded on `original_source/internal/core/events/drone_handlers.go`'s
//! `HandleDroneLocationUpdated`: a heartbeat may arrive either directly
//! over HTTP (the drone calling its own endpoint) or redelivered off the
//! `drones.events` subject (another service relaying a sample it
//! received). Both paths converge on the same idempotent
//! `DroneService::process_heartbeat` call, so handling the same envelope
//! twice is a no-op beyond re-writing the same position twice (spec.md
//! §8's R2).

use std::sync::Arc;

use drone_domain::ProcessHeartbeatRequest;
use drone_events::{EventEnvelope, EventHandler};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::DroneService;

/// Payload carried by a `drone.location_updated` envelope (spec.md §4.3):
/// the heartbeat sample plus the actor id the original write was
/// attributed to, since `process_heartbeat` needs it for `updated_by`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DroneLocationUpdatedData {
    pub drone_id: Uuid,
    pub actor_id: Uuid,
    pub sample: ProcessHeartbeatRequest,
}

pub struct HeartbeatEventHandler {
    drones: Arc<DroneService>,
}

impl HeartbeatEventHandler {
    #[must_use]
    pub const fn new(drones: Arc<DroneService>) -> Self {
        Self { drones }
    }
}

#[async_trait::async_trait]
impl EventHandler<DroneLocationUpdatedData> for HeartbeatEventHandler {
    async fn handle(&self, envelope: EventEnvelope<DroneLocationUpdatedData>) -> drone_events::Result<()> {
        let data = envelope.data;
        let actor = drone_domain::Actor::drone(data.actor_id, data.drone_id);
        if let Err(err) = self.drones.process_heartbeat(&actor, data.drone_id, &data.sample).await {
            // Handler errors are logged but not retransmitted by this
            // component (spec.md §4.3) — the transport's own redelivery,
            // if any, is the retry mechanism.
            warn!(error = %err, drone_id = %data.drone_id, "heartbeat handler failed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_updated_data_round_trips_through_json() {
        let data = DroneLocationUpdatedData {
            drone_id: Uuid::new_v4(),
            actor_id: Uuid::new_v4(),
            sample: ProcessHeartbeatRequest {
                lat: 24.71,
                lon: 46.67,
                altitude: 50.0,
                battery_level_percent: 80,
            },
        };
        let json = serde_json::to_string(&data).unwrap();
        let back: DroneLocationUpdatedData = serde_json::from_str(&json).unwrap();
        assert_eq!(back.drone_id, data.drone_id);
        assert_eq!(back.sample.lat, data.sample.lat);
    }
}
