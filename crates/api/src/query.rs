//! Shared query parameter types for API handlers.

use kct_core::pagination::{clamp_limit, clamp_offset, DEFAULT_LIMIT, MAX_LIMIT};
use serde::Deserialize;

/// Generic pagination parameters (`?limit=&offset=`).
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaginationParams {
    /// Clamped `(limit, offset)`.
    pub fn resolve(&self) -> (i64, i64) {
        resolve_page(self.limit, self.offset)
    }
}

/// Clamp raw `limit`/`offset` query values.
///
/// List endpoints with extra filters declare `limit`/`offset` inline rather
/// than flattening [`PaginationParams`]: `serde(flatten)` loses the numeric
/// types of query-string values.
pub fn resolve_page(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    (
        clamp_limit(limit, DEFAULT_LIMIT, MAX_LIMIT),
        clamp_offset(offset),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_and_bounds() {
        assert_eq!(resolve_page(None, None), (DEFAULT_LIMIT, 0));
        assert_eq!(resolve_page(Some(10_000), Some(-5)), (MAX_LIMIT, 0));
        assert_eq!(resolve_page(Some(0), Some(20)), (1, 20));
    }
}
