//! HTTP-facing error rendering. Unlike the teacher's `drone-graphql-api`
//! `ApiError` (which nests its body under an `"error"` key for GraphQL
//! extensions), this crate renders the flat `{"message", "code"}` shape
//! spec.md §6.2 requires, and reuses `drone-auth::AuthError`'s status
//! mapping for the shared `DomainErrorCode` families.

use std::collections::HashMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use drone_auth::AuthError;
use drone_core::CoreError;
use drone_domain::{DomainError, DomainErrorCode};
use serde::Serialize;
use validator::{Validate, ValidationErrors as ValidatorErrors};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("validation failed")]
    Validation(ValidationErrorMap),
    #[error("request body is required")]
    MissingBody,
}

pub type ValidationErrorMap = HashMap<String, Vec<FieldError>>;

#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

/// Flattens `validator`'s nested error tree into the field → errors map
/// spec.md §6.2 specifies, grounded on
/// `original_source/internal/core/domain/validation.go`'s `ToSnowflake`
/// style field-error rendering.
#[must_use]
pub fn flatten_validation_errors(errors: ValidatorErrors) -> ValidationErrorMap {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let rendered = errs
                .iter()
                .map(|e| FieldError {
                    code: e.code.to_string(),
                    message: e
                        .message
                        .clone()
                        .map_or_else(|| format!("{field} is invalid"), |m| m.to_string()),
                    params: if e.params.is_empty() {
                        None
                    } else {
                        Some(serde_json::to_value(&e.params).unwrap_or(serde_json::Value::Null))
                    },
                })
                .collect();
            (field.to_string(), rendered)
        })
        .collect()
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

fn domain_status(code: DomainErrorCode) -> StatusCode {
    match code {
        DomainErrorCode::ResourceNotFoundError => StatusCode::NOT_FOUND,
        DomainErrorCode::AccessDeniedError => StatusCode::FORBIDDEN,
        DomainErrorCode::UnauthenticatedError
        | DomainErrorCode::AuthTokenInvalidError
        | DomainErrorCode::AuthTokenExpiredError
        | DomainErrorCode::InvalidAuthTokenFormatError
        | DomainErrorCode::InvalidAuthTokenTypeError => StatusCode::UNAUTHORIZED,
        _ => StatusCode::BAD_REQUEST,
    }
}

fn domain_response(domain: DomainError) -> Response {
    let status = domain_status(domain.code);
    let body = ErrorBody {
        code: domain.code.as_str(),
        message: domain.message,
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Core(CoreError::Domain(domain)) => domain_response(domain),
            Self::Core(err @ CoreError::Storage(_)) => {
                tracing::error!(error = %err, "infrastructure failure");
                domain_response(DomainError::unable_to_process())
            }
            Self::Auth(err) => err.into_response(),
            Self::Validation(errors) => {
                (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "errors": errors }))).into_response()
            }
            Self::MissingBody => domain_response(DomainError::body_is_required()),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Runs `validator::Validate` over a decoded request body, translating
/// any failure into the flat-field `ApiError::Validation` shape every
/// handler returns verbatim.
pub fn validate<T: Validate>(req: &T) -> ApiResult<()> {
    req.validate()
        .map_err(|errs| ApiError::Validation(flatten_validation_errors(errs)))
}
