//! Route table, grounded on spec.md §6.1's path list and the teacher's
//! `drone-graphql-api/src/lib.rs` layering of `TraceLayer`/CORS over the
//! router. REST, not GraphQL — each path maps to exactly one handler
//! function rather than a resolver field.

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{auth, drones, health, orders};
use crate::state::AppState;

#[must_use]
pub fn build_router(state: AppState, api_prefix: &str) -> Router {
    let api = Router::new()
        .route("/authorize/token", post(auth::issue_token))
        .route("/drones", get(drones::list).post(drones::create))
        .route("/drones/{id}", get(drones::get).put(drones::update))
        .route("/drones/{id}/status", post(drones::change_status))
        .route("/drones/{id}/heartbeat", post(drones::heartbeat))
        .route("/orders", get(orders::list).post(orders::create))
        .route("/orders/current", get(orders::current))
        .route("/orders/{id}", get(orders::get).put(orders::update))
        .route("/orders/{id}/withdraw", post(orders::withdraw))
        .route("/orders/{id}/reserve", post(orders::reserve))
        .route("/orders/{id}/confirm-pickup", post(orders::confirm_pickup))
        .route("/orders/{id}/start-transit", post(orders::start_transit))
        .route("/orders/{id}/confirm-arrival", post(orders::confirm_arrived))
        .route("/orders/{id}/confirm-delivery", post(orders::confirm_delivery))
        .route("/orders/{id}/delivery-failed", post(orders::delivery_failed))
        .route("/orders/{id}/handoff", post(orders::handoff))
        .route("/orders/{id}/reassign", post(orders::reassign))
        .route("/orders/{id}/location", post(orders::update_location))
        .with_state(state);

    Router::new()
        .route("/health", get(health::health))
        .nest(api_prefix, api)
        .layer(drone_auth::cors::permissive())
        .layer(TraceLayer::new_for_http())
}
