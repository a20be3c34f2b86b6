//! Bearer-token extraction and role guarding, grounded on
//! `original_source/internal/adapters/http/middlewares.go`'s
//! `AuthMiddleware`/`RequireRole` pair, reimplemented as axum extractors
//! so each handler declares the identity/role it needs in its signature
//! rather than relying on a side-channel context value.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use drone_domain::{Actor, Role, RoleGuard};

use crate::config::JwtConfig;
use crate::error::AuthError;
use crate::jwt::verify_token;

/// Extracts and verifies the bearer token, yielding the resolved
/// [`Actor`]. Requires a [`JwtConfig`] to be inserted as request-level
/// state (`axum::Extension` or router state) by the caller.
pub struct AuthenticatedActor(pub Actor);

impl<S> FromRequestParts<S> for AuthenticatedActor
where
    S: Send + Sync,
    JwtConfig: axum::extract::FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = JwtConfig::from_ref(state);
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .ok_or(AuthError::MissingToken)?;
        let value = header.to_str().map_err(|_| AuthError::MalformedHeader)?;
        let token = value.strip_prefix("Bearer ").ok_or(AuthError::MalformedHeader)?;
        let actor = verify_token(token, &config)?;
        Ok(Self(actor))
    }
}

/// A guarded extractor: resolves like [`AuthenticatedActor`], then
/// rejects with `AccessDeniedError` unless the actor's role is allowed
/// by `GUARD`. Handlers accepting admin-only routes take
/// `RoleGuarded<{ role guard }>` instead of hand-rolling the check.
pub struct RequireRole<const ROLE: u8>(pub Actor);

impl<const ROLE: u8> RequireRole<ROLE> {
    const fn guard() -> RoleGuard {
        match ROLE {
            0 => RoleGuard::Exactly(Role::Admin),
            1 => RoleGuard::Exactly(Role::Enduser),
            2 => RoleGuard::Exactly(Role::Drone),
            _ => RoleGuard::Any,
        }
    }
}

impl<S, const ROLE: u8> FromRequestParts<S> for RequireRole<ROLE>
where
    S: Send + Sync,
    JwtConfig: axum::extract::FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedActor(actor) = AuthenticatedActor::from_request_parts(parts, state).await?;
        if Self::guard().allows(actor.role) {
            Ok(Self(actor))
        } else {
            Err(AuthError::Domain(drone_domain::DomainError::access_denied()))
        }
    }
}

pub const ADMIN: u8 = 0;
pub const ENDUSER: u8 = 1;
pub const DRONE: u8 = 2;
pub const ANY: u8 = 255;

pub type RequireAdmin = RequireRole<ADMIN>;
pub type RequireEnduser = RequireRole<ENDUSER>;
pub type RequireDrone = RequireRole<DRONE>;
pub type RequireAnyRole = RequireRole<ANY>;
