//! Event Emitter (C3 — publish half).
//!
//! Grounded on `original_source/internal/adapters/nats/event_publisher.go`:
//! lazy connect with a bounded retry/backoff loop, one `publish_*` method
//! per aggregate subject, envelope serialized to JSON with routing
//! metadata carried as NATS headers rather than folded into the body.

use std::time::Duration;

use async_nats::{Client, HeaderMap};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::NatsConfig;
use crate::envelope::{EventEnvelope, EventMetadata};
use crate::error::{EventError, Result};

const MAX_CONNECT_ATTEMPTS: u32 = 5;
const RETRY_BACKOFF: Duration = Duration::from_secs(1);

#[derive(Clone)]
pub struct EventPublisher {
    client: Client,
    config: NatsConfig,
}

impl EventPublisher {
    /// Connects with up to [`MAX_CONNECT_ATTEMPTS`] tries, sleeping
    /// [`RETRY_BACKOFF`] between each (spec.md §4.3: "emitter connects
    /// lazily and retries a bounded number of times before giving up").
    pub async fn connect(config: NatsConfig) -> Result<Self> {
        let mut last_err = None;
        for attempt in 1..=MAX_CONNECT_ATTEMPTS {
            match async_nats::connect(&config.url).await {
                Ok(client) => {
                    info!(attempt, "connected to NATS");
                    return Ok(Self { client, config });
                }
                Err(err) => {
                    warn!(attempt, error = %err, "NATS connect attempt failed");
                    last_err = Some(err.to_string());
                    if attempt < MAX_CONNECT_ATTEMPTS {
                        tokio::time::sleep(RETRY_BACKOFF).await;
                    }
                }
            }
        }
        Err(EventError::ConnectExhausted {
            attempts: MAX_CONNECT_ATTEMPTS,
            source: last_err.unwrap_or_else(|| "unknown".to_string()),
        })
    }

    async fn publish<T: Serialize>(
        &self,
        subject: &str,
        envelope: &EventEnvelope<T>,
    ) -> Result<()> {
        let payload = serde_json::to_vec(envelope)?;

        let mut headers = HeaderMap::new();
        headers.insert("event-type", envelope.event_type.as_str());
        headers.insert("event-id", envelope.id.as_str());
        headers.insert("correlation-id", envelope.metadata.correlation_id.as_str());
        headers.insert("aggregate-id", envelope.aggregate_id.to_string().as_str());

        self.client
            .publish_with_headers(subject.to_string(), headers, payload.into())
            .await
            .map_err(|e| EventError::Publish(e.to_string()))?;
        self.client.flush().await.map_err(|e| EventError::Publish(e.to_string()))?;
        Ok(())
    }

    pub async fn publish_order_event<T: Serialize>(
        &self,
        event_type: &str,
        order_id: Uuid,
        data: T,
        metadata: EventMetadata,
    ) -> Result<()> {
        let envelope = EventEnvelope::new(event_type, order_id, data, metadata, chrono::Utc::now());
        self.publish(&self.config.subject_orders_events, &envelope).await
    }

    pub async fn publish_drone_event<T: Serialize>(
        &self,
        event_type: &str,
        drone_id: Uuid,
        data: T,
        metadata: EventMetadata,
    ) -> Result<()> {
        let envelope = EventEnvelope::new(event_type, drone_id, data, metadata, chrono::Utc::now());
        self.publish(&self.config.subject_drones_events, &envelope).await
    }

    pub async fn publish_user_event<T: Serialize>(
        &self,
        event_type: &str,
        user_id: Uuid,
        data: T,
        metadata: EventMetadata,
    ) -> Result<()> {
        let envelope = EventEnvelope::new(event_type, user_id, data, metadata, chrono::Utc::now());
        self.publish(&self.config.subject_users_events, &envelope).await
    }

    pub async fn publish_log_activity<T: Serialize>(
        &self,
        event_type: &str,
        aggregate_id: Uuid,
        data: T,
        metadata: EventMetadata,
    ) -> Result<()> {
        let envelope = EventEnvelope::new(event_type, aggregate_id, data, metadata, chrono::Utc::now());
        self.publish(&self.config.subject_log_activity_events, &envelope).await
    }
}

/// Narrow, object-safe publishing surface that `OrderService` depends on,
/// mirroring the trait-object seam `DroneRepository`/`OrderRepository`
/// use for the Storage Gateway: production wires a live [`EventPublisher`],
/// tests wire [`NoopEventSink`] instead of standing up a NATS broker.
#[async_trait::async_trait]
pub trait EventSink: Send + Sync {
    async fn publish_order_event(
        &self,
        event_type: &str,
        order_id: Uuid,
        data: serde_json::Value,
        metadata: EventMetadata,
    ) -> Result<()>;
}

#[async_trait::async_trait]
impl EventSink for EventPublisher {
    async fn publish_order_event(
        &self,
        event_type: &str,
        order_id: Uuid,
        data: serde_json::Value,
        metadata: EventMetadata,
    ) -> Result<()> {
        let envelope = EventEnvelope::new(event_type, order_id, data, metadata, chrono::Utc::now());
        self.publish(&self.config.subject_orders_events, &envelope).await
    }
}

/// Records nothing and always succeeds. Scenario tests exercise
/// repository state transitions, not bus delivery, and publish failures
/// are swallowed by callers anyway (spec.md §4.3, §7).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventSink;

#[async_trait::async_trait]
impl EventSink for NoopEventSink {
    async fn publish_order_event(
        &self,
        _event_type: &str,
        _order_id: Uuid,
        _data: serde_json::Value,
        _metadata: EventMetadata,
    ) -> Result<()> {
        Ok(())
    }
}
