//! Authorization errors, grounded on
//! `original_source/internal/core/domain/errors.go`'s auth-token error
//! family and rendered the way `drone-graphql-api`'s `ApiError` renders
//! `DomainError` (status/code/message triad, spec.md §7).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use drone_domain::{DomainError, DomainErrorCode};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing Authorization header")]
    MissingToken,
    #[error("malformed Authorization header")]
    MalformedHeader,
    #[error(transparent)]
    Domain(#[from] DomainError),
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let domain = match self {
            Self::MissingToken => DomainError::unauthenticated(),
            Self::MalformedHeader => DomainError::invalid_auth_token_format(),
            Self::Domain(d) => d,
        };
        let status = match domain.code {
            DomainErrorCode::AccessDeniedError => StatusCode::FORBIDDEN,
            DomainErrorCode::UnauthenticatedError
            | DomainErrorCode::AuthTokenInvalidError
            | DomainErrorCode::AuthTokenExpiredError
            | DomainErrorCode::InvalidAuthTokenFormatError
            | DomainErrorCode::InvalidAuthTokenTypeError => StatusCode::UNAUTHORIZED,
            _ => StatusCode::BAD_REQUEST,
        };
        let body = ErrorBody {
            code: domain.code.as_str(),
            message: domain.message,
        };
        (status, Json(body)).into_response()
    }
}
