//! The correlation-id extractor: carries the caller's `X-Correlation-Id`
//! header through to the event envelope, generating one when absent
//! (grounded on `original_source/internal/adapters/nats/utils.go`'s
//! `getCorrelationID` context-or-generate fallback).

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::convert::Infallible;
use uuid::Uuid;

pub struct CorrelationId(pub String);

impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get("x-correlation-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| format!("req_{}", Uuid::new_v4()));
        Ok(Self(id))
    }
}
