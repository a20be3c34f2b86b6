//! Event layer error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("NATS connection error: {0}")]
    Connection(String),

    #[error("failed to connect to NATS after {attempts} attempts: {source}")]
    ConnectExhausted { attempts: u32, source: String },

    #[error("publish failed: {0}")]
    Publish(String),

    #[error("subscribe failed: {0}")]
    Subscribe(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unknown event type: {0}")]
    UnknownEventType(String),
}

pub type Result<T> = std::result::Result<T, EventError>;
