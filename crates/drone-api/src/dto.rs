//! Request/response shapes that spec.md's operation list implies but
//! doesn't name as domain types — the HTTP-only seam between the wire
//! and the core (spec.md §6.1, SPEC_FULL.md §B.5/§B.7).

use std::str::FromStr;

use drone_domain::{DroneStatus, Role};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pagination query params shared by every list endpoint
/// (`?limit=20&offset=0`, spec.md §6.1).
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PaginationQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Flat query-string projection of `DroneFilter` (spec.md §4.1). The
/// domain type's `geo: Option<GeoFilter>` doesn't deserialize cleanly
/// from a query string, so the three geo fields are carried flat here
/// and recomposed by the handler.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DroneListQuery {
    pub status: Option<DroneStatus>,
    pub active: Option<bool>,
    pub user_id: Option<Uuid>,
    pub center_lat: Option<f64>,
    pub center_lon: Option<f64>,
    pub radius_km: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateDroneStatusRequest {
    pub status: DroneStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReassignRequest {
    pub new_drone_id: Uuid,
}

/// `POST /authorize/token` body (spec.md §6.1's "Issue bearer token for
/// {name, type}").
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizeTokenRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub user_type: String,
    /// Required when `type == "drone"`: the drone this token acts as.
    /// Absent for `admin`/`enduser` (SPEC_FULL.md §B.7 — this repo has
    /// no persisted user table, so the actor id is derived from `name`
    /// rather than looked up).
    pub drone_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthorizeTokenResponse {
    pub access_token: String,
}

impl AuthorizeTokenRequest {
    /// Resolves `type` to a [`Role`], rejecting anything outside the
    /// three recognised strings (mirrors the original's
    /// `validate:"oneof=admin enduser drone"` tag).
    pub fn role(&self) -> Result<Role, &'static str> {
        Role::from_str(&self.user_type).map_err(|()| "type must be one of admin, enduser, drone")
    }

    /// A stable actor id derived from `name` (and, for drone actors,
    /// from the supplied `drone_id` instead — see SPEC_FULL.md §B.7's
    /// open question decision in DESIGN.md).
    #[must_use]
    pub fn deterministic_id(&self) -> Uuid {
        Uuid::new_v5(&Uuid::NAMESPACE_OID, self.name.as_bytes())
    }
}
