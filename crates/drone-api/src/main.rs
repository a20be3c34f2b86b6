//! # Drone Delivery Coordination Service — HTTP entry point
//!
//! Wires the Storage Gateway (C1), Cache Accessor (C2), Event
//! Emitter/Consumer (C3), Drone Core (C4), Order Core (C5), and
//! Authorization Context (C6) together and serves the REST surface of
//! spec.md §6.1. Grounded on the teacher's `drone-graphql-api/src/main.rs`
//! startup/shutdown sequence (dotenv → config → tracing → connect
//! datastores → build router → serve with graceful shutdown), adapted
//! from a GraphQL schema build to a plain axum router.

mod config;
mod dto;
mod error;
mod extract;
mod handlers;
mod router;
mod state;

use std::sync::Arc;
use std::time::Duration;

use drone_core::{DroneService, HeartbeatEventHandler, OrderService};
use drone_events::{EventConsumer, EventPublisher};
use drone_persistence::{shared_cache, CacheClient, PgClient, PostgresDroneRepository, PostgresOrderRepository};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use config::Config;
use state::AppState;

/// Bounds the graceful-shutdown wait: stop accepting new requests, cancel
/// the consumer context, await in-flight workers, close the bus/cache/DB
/// connections (spec.md §5).
const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting drone delivery coordinator");

    tracing::info!(host = %config.database.host, dbname = %config.database.dbname, "connecting to PostgreSQL");
    let pg = PgClient::connect(&config.database).await?;

    tracing::info!(url = %config.redis.url, "connecting to Redis");
    let cache = shared_cache(CacheClient::new(config.redis.clone()).await?);

    tracing::info!(url = %config.nats.url, "connecting to NATS (publisher)");
    let publisher = Arc::new(EventPublisher::connect(config.nats.clone()).await?);

    let drone_repo: Arc<dyn drone_persistence::DroneRepository> =
        Arc::new(PostgresDroneRepository::new(pg.clone()));
    let order_repo: Arc<dyn drone_persistence::OrderRepository> =
        Arc::new(PostgresOrderRepository::new(pg.clone()));

    let drones = Arc::new(DroneService::new(Arc::clone(&drone_repo), Arc::clone(&cache)));
    let orders = Arc::new(OrderService::new(
        order_repo,
        Arc::clone(&drone_repo),
        Arc::clone(&cache),
        Arc::clone(&publisher),
    ));

    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);
    let consumer_stop = {
        let mut rx = shutdown_tx.subscribe();
        async move {
            let _ = rx.recv().await;
        }
    };

    tracing::info!(url = %config.nats.url, "connecting to NATS (consumer)");
    let consumer_client = async_nats::connect(&config.nats.url).await?;
    let consumer = EventConsumer::new(consumer_client, config.nats.queue_group.clone());
    let heartbeat_handler = Arc::new(HeartbeatEventHandler::new(Arc::clone(&drones)));
    let drones_subject = config.nats.subject_drones_events.clone();
    let consumer_task = tokio::spawn(async move {
        if let Err(err) = consumer
            .run::<drone_core::DroneLocationUpdatedData, _>(&drones_subject, heartbeat_handler, consumer_stop)
            .await
        {
            tracing::error!(error = %err, "event consumer exited with error");
        }
    });

    let state = AppState {
        drones,
        orders,
        jwt: config.jwt.clone(),
    };

    let app = router::build_router(state, &config.server.api_prefix);
    let addr = config.server.bind_addr();
    tracing::info!(%addr, prefix = %config.server.api_prefix, "HTTP server listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped, draining event consumer");
    let _ = shutdown_tx.send(());
    let _ = tokio::time::timeout(SHUTDOWN_DEADLINE, consumer_task).await;

    pg.close().await;
    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
