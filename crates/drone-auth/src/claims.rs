//! JWT claim set, grounded on the original's `utype`-bearing claims
//! (`internal/core/domain/auth.go`'s `JWTCustomClaims`).

use chrono::{Duration, Utc};
use drone_domain::{Actor, Role};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub utype: Role,
    pub exp: i64,
}

impl Claims {
    #[must_use]
    pub fn for_actor(actor: &Actor, expires_in: std::time::Duration) -> Self {
        let expires_in = Duration::from_std(expires_in).unwrap_or(Duration::hours(24));
        Self {
            sub: actor.id,
            utype: actor.role,
            exp: (Utc::now() + expires_in).timestamp(),
        }
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.exp < Utc::now().timestamp()
    }
}
