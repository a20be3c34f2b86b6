//! NATS connection/subject configuration, grounded on
//! `original_source/configs/config.go`'s `NATSConfig` (exact env var
//! names preserved so deployments can carry over their `.env` files).

use std::env;

#[derive(Debug, Clone)]
pub struct NatsConfig {
    pub url: String,
    pub servers: Vec<String>,
    pub queue_group: String,
    pub subject_orders_events: String,
    pub subject_drones_events: String,
    pub subject_users_events: String,
    pub subject_log_activity_events: String,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: "nats://localhost:4222".to_string(),
            servers: vec!["nats://localhost:4222".to_string()],
            queue_group: "drones.service".to_string(),
            subject_orders_events: "orders.events".to_string(),
            subject_drones_events: "drones.events".to_string(),
            subject_users_events: "users.events".to_string(),
            subject_log_activity_events: "log_activity.events".to_string(),
        }
    }
}

impl NatsConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let default = Self::default();
        let servers = env::var("NATS_SERVERS")
            .ok()
            .map(|s| s.split(',').map(str::trim).map(str::to_string).collect())
            .unwrap_or(default.servers);

        Self {
            url: env::var("NATS_URL").unwrap_or(default.url),
            servers,
            queue_group: env::var("NATS_QUEUE_GROUP").unwrap_or(default.queue_group),
            subject_orders_events: env::var("NATS_SUBJECT_ORDERS_EVENTS")
                .unwrap_or(default.subject_orders_events),
            subject_drones_events: env::var("NATS_SUBJECT_DRONES_EVENTS")
                .unwrap_or(default.subject_drones_events),
            subject_users_events: env::var("NATS_SUBJECT_USERS_EVENTS")
                .unwrap_or(default.subject_users_events),
            subject_log_activity_events: env::var("NATS_SUBJECT_LOG_ACTIVITY_EVENTS")
                .unwrap_or(default.subject_log_activity_events),
        }
    }
}
