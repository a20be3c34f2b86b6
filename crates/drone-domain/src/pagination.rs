//! Pagination parameters and the generic paged-result envelope.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Default page size when the caller supplies none (spec.md B3).
pub const DEFAULT_LIMIT: i64 = 20;
/// Hard cap; requests above this are clamped, not rejected.
pub const MAX_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl Pagination {
    /// Normalises a raw, caller-supplied limit/offset pair: an absent
    /// limit falls back to the default, `limit > MAX_LIMIT` is capped,
    /// and a negative offset is clamped to zero. A *supplied* limit of
    /// zero or less is rejected outright (spec.md §8 B3: "limit = 0 →
    /// rejected"), distinct from an absent limit defaulting to 20.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::invalid_input`] if `limit` is `Some(l)`
    /// with `l <= 0`.
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Result<Self, DomainError> {
        let limit = match limit {
            None => DEFAULT_LIMIT,
            Some(l) if l <= 0 => {
                return Err(DomainError::invalid_input("limit must be greater than zero"))
            }
            Some(l) => l.min(MAX_LIMIT),
        };
        let offset = offset.unwrap_or(0).max(0);
        Ok(Self { limit, offset })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, total: i64, pagination: Pagination) -> Self {
        Self {
            items,
            total,
            limit: pagination.limit,
            offset: pagination.offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_limit_falls_back_to_default() {
        assert_eq!(Pagination::new(None, None).unwrap().limit, DEFAULT_LIMIT);
    }

    #[test]
    fn supplied_zero_limit_is_rejected() {
        assert!(Pagination::new(Some(0), None).is_err());
    }

    #[test]
    fn supplied_negative_limit_is_rejected() {
        assert!(Pagination::new(Some(-1), None).is_err());
    }

    #[test]
    fn over_cap_limit_is_clamped() {
        assert_eq!(Pagination::new(Some(101), None).unwrap().limit, MAX_LIMIT);
    }

    #[test]
    fn negative_offset_is_clamped_to_zero() {
        assert_eq!(Pagination::new(None, Some(-5)).unwrap().offset, 0);
    }
}
