//! Shared application state threaded through every handler via axum's
//! `State` extractor, grounded on the teacher's `ApiContext` (shape, not
//! content — this crate's handlers are REST, not GraphQL resolvers).

use std::sync::Arc;

use axum::extract::FromRef;
use drone_auth::JwtConfig;
use drone_core::{DroneService, OrderService};

#[derive(Clone)]
pub struct AppState {
    pub drones: Arc<DroneService>,
    pub orders: Arc<OrderService>,
    pub jwt: JwtConfig,
}

impl FromRef<AppState> for JwtConfig {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}
