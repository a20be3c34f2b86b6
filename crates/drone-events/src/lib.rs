//! # Drone Events
//!
//! Event Emitter/Consumer (C3): NATS-backed publish/subscribe for the
//! drone delivery coordination service. Domain events are notifications
//! of state that has *already* been committed by the Storage Gateway —
//! publishing failures are logged and swallowed by callers, never
//! propagated as a transaction failure (spec.md §4.3, §7).

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod consumer;
pub mod envelope;
pub mod error;
pub mod publisher;

pub use config::NatsConfig;
pub use consumer::{EventConsumer, EventHandler};
pub use envelope::{event_types, EventEnvelope, EventMetadata};
pub use error::{EventError, Result};
pub use publisher::{EventPublisher, EventSink, NoopEventSink};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
