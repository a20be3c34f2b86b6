//! Permissive CORS layer, grounded on
//! `original_source/internal/adapters/http/middlewares.go`'s CORS
//! middleware (the original allows any origin since the API is only
//! ever consumed by trusted first-party clients, spec.md §6).

use tower_http::cors::{Any, CorsLayer};

#[must_use]
pub fn permissive() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}
