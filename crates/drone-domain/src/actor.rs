//! The authenticated caller, resolved upstream (C6) and threaded through
//! every core operation as an explicit argument rather than via
//! process-wide request-local state (see spec.md §9's re-architecture
//! note on the source's context-value pattern).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Enduser,
    Drone,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Enduser => "enduser",
            Self::Drone => "drone",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "enduser" => Ok(Self::Enduser),
            "drone" => Ok(Self::Drone),
            _ => Err(()),
        }
    }
}

/// A role guard accepted by an endpoint. `Any` is the wildcard `*` guard:
/// any authenticated actor is allowed regardless of role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleGuard {
    Exactly(Role),
    Any,
}

impl RoleGuard {
    #[must_use]
    pub fn allows(self, role: Role) -> bool {
        match self {
            Self::Any => true,
            Self::Exactly(r) => r == role,
        }
    }
}

/// The resolved identity of the caller, attached to every core operation.
/// `drone_id` is present iff `role == Role::Drone`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
    pub drone_id: Option<Uuid>,
}

impl Actor {
    #[must_use]
    pub const fn admin(id: Uuid) -> Self {
        Self {
            id,
            role: Role::Admin,
            drone_id: None,
        }
    }

    #[must_use]
    pub const fn enduser(id: Uuid) -> Self {
        Self {
            id,
            role: Role::Enduser,
            drone_id: None,
        }
    }

    #[must_use]
    pub const fn drone(id: Uuid, drone_id: Uuid) -> Self {
        Self {
            id,
            role: Role::Drone,
            drone_id: Some(drone_id),
        }
    }
}

/// Per-request context threaded explicitly through the core, replacing the
/// source's request-scoped context-value injection (spec.md §9).
#[derive(Debug, Clone)]
pub struct RequestCtx {
    pub actor: Actor,
    pub correlation_id: String,
}

impl RequestCtx {
    #[must_use]
    pub fn new(actor: Actor, correlation_id: impl Into<String>) -> Self {
        Self {
            actor,
            correlation_id: correlation_id.into(),
        }
    }
}
