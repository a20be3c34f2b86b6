//! Unifies persistence and domain-rule failures into one error the HTTP
//! layer can render (spec.md §7's three-tier error model: persistence
//! errors become `unable_to_process_error`, domain errors keep their own
//! code).

use drone_domain::DomainError;
use drone_persistence::PersistenceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("storage error: {0}")]
    Storage(#[from] PersistenceError),
}

impl CoreError {
    #[must_use]
    pub fn into_domain(self) -> DomainError {
        match self {
            Self::Domain(d) => d,
            Self::Storage(_) => DomainError::unable_to_process(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
