//! Event Consumer (C3 — subscribe half).
//!
//! Grounded on `original_source/internal/adapters/nats/event_consumer.go`
//! and `event_handlers.go`: queue-group subscription (so only one
//! instance of a horizontally-scaled service handles a given message),
//! one spawned task per message so a slow handler cannot head-of-line
//! block the subject, and a drain step on shutdown that lets in-flight
//! handlers finish before the process exits.

use std::sync::Arc;

use async_nats::{Client, Subscriber};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::envelope::EventEnvelope;
use crate::error::{EventError, Result};

/// Implemented once per subject by the crate that owns the side-effect
/// (`drone-core`'s heartbeat handler for `drones.events`, for instance).
/// Handlers that don't recognize `event_type` should return
/// `Ok(())` — unknown event types are logged and acked, never nacked
/// (spec.md §4.3: "forward-compatible with event types this consumer
/// doesn't yet know about").
#[async_trait::async_trait]
pub trait EventHandler<T>: Send + Sync + 'static
where
    T: DeserializeOwned + Send + 'static,
{
    async fn handle(&self, envelope: EventEnvelope<T>) -> Result<()>;
}

pub struct EventConsumer {
    client: Client,
    queue_group: String,
}

impl EventConsumer {
    #[must_use]
    pub const fn new(client: Client, queue_group: String) -> Self {
        Self { client, queue_group }
    }

    /// Subscribes to `subject` under the configured queue group and drives
    /// `handler` for every message until the subscription stream ends
    /// (on client shutdown) or `stop` resolves. Each message is handled in
    /// its own task; `run` awaits all outstanding tasks before returning
    /// so a caller can be sure nothing is mid-flight once it returns.
    pub async fn run<T, H>(
        &self,
        subject: &str,
        handler: Arc<H>,
        stop: impl std::future::Future<Output = ()>,
    ) -> Result<()>
    where
        T: DeserializeOwned + Send + 'static,
        H: EventHandler<T>,
    {
        let mut sub: Subscriber = self
            .client
            .queue_subscribe(subject.to_string(), self.queue_group.clone())
            .await
            .map_err(|e| EventError::Subscribe(e.to_string()))?;

        info!(subject, queue_group = %self.queue_group, "subscribed");

        let mut tasks = JoinSet::new();
        tokio::pin!(stop);

        loop {
            tokio::select! {
                biased;
                () = &mut stop => {
                    info!(subject, "stop signal received, draining in-flight handlers");
                    break;
                }
                msg = sub.next() => {
                    let Some(msg) = msg else {
                        warn!(subject, "subscription stream ended");
                        break;
                    };
                    match serde_json::from_slice::<EventEnvelope<T>>(&msg.payload) {
                        Ok(envelope) => {
                            let handler = Arc::clone(&handler);
                            tasks.spawn(async move {
                                if let Err(err) = handler.handle(envelope).await {
                                    error!(error = %err, "event handler failed");
                                }
                            });
                        }
                        Err(err) => {
                            warn!(error = %err, subject, "unrecognized event payload, acked and dropped");
                        }
                    }
                }
            }
        }

        while tasks.join_next().await.is_some() {}
        Ok(())
    }
}
