//! `POST /authorize/token`: issues a bearer token for `{name, type}`
//! (spec.md §6.1). Unauthenticated — this is the entry point that makes
//! every other guarded endpoint reachable.
//!
//! Grounded on `original_source/internal/adapters/http/auth_handler.go`'s
//! `Authorize` handler and `pkg/utils/token.go`'s `GenerateToken`: the
//! original looks up (or upserts) a user row keyed by `name`; this repo
//! has no user table in its core scope (spec.md's explicit Non-goal),
//! so the actor id is derived deterministically from `name` instead
//! (SPEC_FULL.md §B.7).

use axum::extract::State;
use axum::Json;
use drone_core::CoreError;
use drone_domain::{Actor, DomainError};

use crate::dto::{AuthorizeTokenRequest, AuthorizeTokenResponse};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub async fn issue_token(
    State(state): State<AppState>,
    Json(req): Json<AuthorizeTokenRequest>,
) -> ApiResult<Json<AuthorizeTokenResponse>> {
    let role = req
        .role()
        .map_err(|_| ApiError::from(CoreError::Domain(DomainError::invalid_input("type must be one of admin, enduser, drone"))))?;

    let actor = match role {
        drone_domain::Role::Drone => {
            let drone_id = req.drone_id.ok_or_else(|| ApiError::from(CoreError::Domain(DomainError::user_not_found())))?;
            // Claims carry only {sub, utype, exp} (spec.md §6.4), so `sub`
            // is the sole slot available to recover `drone_id` on verify —
            // it must equal `drone_id` itself, not a name-derived id, or
            // `AuthenticatedActor::drone_id` would point at no real drone.
            Actor::drone(drone_id, drone_id)
        }
        drone_domain::Role::Admin => Actor::admin(req.deterministic_id()),
        drone_domain::Role::Enduser => Actor::enduser(req.deterministic_id()),
    };

    let access_token =
        drone_auth::issue_token(&actor, &state.jwt).map_err(|e| ApiError::from(CoreError::Domain(e)))?;
    Ok(Json(AuthorizeTokenResponse { access_token }))
}
