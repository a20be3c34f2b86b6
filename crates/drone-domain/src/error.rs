//! Domain-level errors: the `unable_to_process_error`/`resource_not_found_error`/...
//! family from spec.md §7, grounded verbatim on
//! `original_source/internal/core/domain/errors.go`. Every human-readable
//! message below is reproduced exactly because spec.md §7 requires
//! implementations to "preserve the distinct messages" even though they
//! all share the single `unable_to_process_error` code.

use serde::Serialize;

use crate::drone::DroneStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainErrorCode {
    InvalidInputError,
    BodyIsRequiredError,
    MissingParameterError,
    ResourceNotFoundError,
    ResourceConflictError,
    InvalidResourceError,
    InvalidAuthTokenFormatError,
    AuthTokenInvalidError,
    AuthTokenExpiredError,
    InvalidAuthTokenTypeError,
    UnauthenticatedError,
    AccessDeniedError,
    UserNotFoundError,
    UnableToProcessError,
}

impl DomainErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInputError => "invalid_input_error",
            Self::BodyIsRequiredError => "body_is_required_error",
            Self::MissingParameterError => "missing_parameter_error",
            Self::ResourceNotFoundError => "resource_not_found_error",
            Self::ResourceConflictError => "resource_conflict_error",
            Self::InvalidResourceError => "invalid_resource_error",
            Self::InvalidAuthTokenFormatError => "invalid_auth_token_format_error",
            Self::AuthTokenInvalidError => "auth_token_invalid_error",
            Self::AuthTokenExpiredError => "auth_token_expired_error",
            Self::InvalidAuthTokenTypeError => "invalid_auth_token_type_error",
            Self::UnauthenticatedError => "unauthenticated_error",
            Self::AccessDeniedError => "access_denied_error",
            Self::UserNotFoundError => "user_not_found_error",
            Self::UnableToProcessError => "unable_to_process_error",
        }
    }
}

#[derive(Debug, Clone, thiserror::Error, Serialize)]
#[error("{code:?}: {message}")]
pub struct DomainError {
    pub code: DomainErrorCode,
    pub message: String,
}

impl DomainError {
    #[must_use]
    pub fn new(code: DomainErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn unable_to_process() -> Self {
        Self::new(DomainErrorCode::UnableToProcessError, "Unable to process request")
    }

    // ---- resource lookups ----

    #[must_use]
    pub fn drone_not_found() -> Self {
        Self::new(DomainErrorCode::ResourceNotFoundError, "Drone not found")
    }

    #[must_use]
    pub fn order_not_found() -> Self {
        Self::new(DomainErrorCode::ResourceNotFoundError, "Order not found")
    }

    // ---- input / auth ----

    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(DomainErrorCode::InvalidInputError, message)
    }

    #[must_use]
    pub fn body_is_required() -> Self {
        Self::new(DomainErrorCode::BodyIsRequiredError, "Request body is required")
    }

    #[must_use]
    pub fn unauthenticated() -> Self {
        Self::new(DomainErrorCode::UnauthenticatedError, "Authentication required")
    }

    #[must_use]
    pub fn access_denied() -> Self {
        Self::new(DomainErrorCode::AccessDeniedError, "Access denied")
    }

    #[must_use]
    pub fn user_not_found() -> Self {
        Self::new(DomainErrorCode::UserNotFoundError, "User not found")
    }

    #[must_use]
    pub fn invalid_auth_token_format() -> Self {
        Self::new(
            DomainErrorCode::InvalidAuthTokenFormatError,
            "Authorization header must be 'Bearer <token>'",
        )
    }

    #[must_use]
    pub fn auth_token_invalid() -> Self {
        Self::new(DomainErrorCode::AuthTokenInvalidError, "Invalid authentication token")
    }

    #[must_use]
    pub fn auth_token_expired() -> Self {
        Self::new(DomainErrorCode::AuthTokenExpiredError, "Authentication token expired")
    }

    // ---- order transition rejections ----

    #[must_use]
    pub fn withdraw_not_allowed() -> Self {
        Self::process_error("Only pending orders can be withdrawn")
    }

    #[must_use]
    pub fn already_withdrawn() -> Self {
        Self::process_error("Order has already been withdrawn")
    }

    #[must_use]
    pub fn reserve_not_allowed() -> Self {
        Self::process_error("Only pending orders can be reserved")
    }

    #[must_use]
    pub fn already_reserved() -> Self {
        Self::process_error("Order has already been reserved")
    }

    #[must_use]
    pub fn confirm_not_allowed() -> Self {
        Self::process_error("Only reserved orders can be confirmed")
    }

    #[must_use]
    pub fn transit_not_allowed() -> Self {
        Self::process_error("Only picked up orders can be marked as in transit")
    }

    #[must_use]
    pub fn handoff_not_allowed() -> Self {
        Self::process_error("Only failed orders can be handed off")
    }

    #[must_use]
    pub fn arrive_not_allowed() -> Self {
        Self::process_error("Only in transit orders can be marked as arrived")
    }

    #[must_use]
    pub fn deliver_not_allowed() -> Self {
        Self::process_error("Only arrived orders can be marked as delivered")
    }

    #[must_use]
    pub fn deliver_failed_not_allowed() -> Self {
        Self::process_error(
            "Only in picked or transit or arrived orders can be marked as delivery failed",
        )
    }

    #[must_use]
    pub fn drone_failed_not_allowed() -> Self {
        Self::process_error("Only in transit or pickup orders can be marked as drone failed")
    }

    #[must_use]
    pub fn reassign_not_allowed() -> Self {
        Self::process_error("Only handoff orders can be reassigned")
    }

    #[must_use]
    pub fn location_update_not_allowed() -> Self {
        Self::process_error("Location updates are only accepted while the order is being carried")
    }

    // ---- drone-busy rejections (dispatched by the DRONE's current status) ----

    #[must_use]
    pub fn drone_must_be_idle() -> Self {
        Self::process_error("Drone must be in idle status to reserve an order")
    }

    #[must_use]
    pub fn drone_is_loading() -> Self {
        Self::process_error("Drone is currently loading a package")
    }

    #[must_use]
    pub fn drone_is_delivering() -> Self {
        Self::process_error("Drone is currently delivering a package")
    }

    #[must_use]
    pub fn drone_is_returning() -> Self {
        Self::process_error("Drone is currently returning to base")
    }

    #[must_use]
    pub fn drone_is_charging() -> Self {
        Self::process_error("Drone is currently charging")
    }

    #[must_use]
    pub fn drone_in_maintenance() -> Self {
        Self::process_error("Drone is under maintenance")
    }

    #[must_use]
    pub fn drone_is_broken() -> Self {
        Self::process_error("Drone is broken")
    }

    #[must_use]
    pub fn drone_under_repair() -> Self {
        Self::process_error("Drone is under repair")
    }

    /// Dispatches the drone-busy rejection by the drone's *current* status,
    /// per spec.md §4.5: "The drone-state rejection error from Reserve
    /// dispatches by the drone's current status, not by the order."
    #[must_use]
    pub fn drone_busy(status: DroneStatus) -> Self {
        match status {
            DroneStatus::Idle => Self::drone_must_be_idle(),
            DroneStatus::Loading => Self::drone_is_loading(),
            DroneStatus::Delivering => Self::drone_is_delivering(),
            DroneStatus::Returning => Self::drone_is_returning(),
            DroneStatus::Charging => Self::drone_is_charging(),
            DroneStatus::Maintenanced => Self::drone_in_maintenance(),
            DroneStatus::Broken => Self::drone_is_broken(),
            DroneStatus::UnderRepair => Self::drone_under_repair(),
        }
    }

    // ---- drone transition rejections ----

    #[must_use]
    pub fn idle_transition() -> Self {
        Self::process_error("idle can only transition to loading, charging, maintenanced, broken")
    }

    #[must_use]
    pub fn loading_transition() -> Self {
        Self::process_error("loading can only transition to delivering, broken")
    }

    #[must_use]
    pub fn delivering_transition() -> Self {
        Self::process_error("delivering can only transition to returning, broken")
    }

    #[must_use]
    pub fn returning_transition() -> Self {
        Self::process_error("returning can only transition to idle, charging, broken")
    }

    #[must_use]
    pub fn charging_transition() -> Self {
        Self::process_error("charging can only transition to idle, broken, returning")
    }

    #[must_use]
    pub fn broken_transition() -> Self {
        Self::process_error("broken can only transition to under_repair")
    }

    #[must_use]
    pub fn under_repair_transition() -> Self {
        Self::process_error("under_repair can only transition to maintenanced")
    }

    #[must_use]
    pub fn maintenanced_transition() -> Self {
        Self::process_error("maintenanced can only transition to idle, returning")
    }

    /// The source-state-specific rejection for an illegal drone transition,
    /// keyed by the *source* state (spec.md §4.4: "Rejection MUST carry the
    /// source-state-specific reason").
    #[must_use]
    pub fn drone_transition_rejection(from: DroneStatus) -> Self {
        match from {
            DroneStatus::Idle => Self::idle_transition(),
            DroneStatus::Loading => Self::loading_transition(),
            DroneStatus::Delivering => Self::delivering_transition(),
            DroneStatus::Returning => Self::returning_transition(),
            DroneStatus::Charging => Self::charging_transition(),
            DroneStatus::Broken => Self::broken_transition(),
            DroneStatus::UnderRepair => Self::under_repair_transition(),
            DroneStatus::Maintenanced => Self::maintenanced_transition(),
        }
    }

    fn process_error(message: &'static str) -> Self {
        Self::new(DomainErrorCode::UnableToProcessError, message)
    }
}
