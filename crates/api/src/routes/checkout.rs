//! Route definitions for `/checkout`.

use axum::routing::post;
use axum::Router;

use crate::handlers::checkout;
use crate::state::AppState;

/// Routes mounted at `/checkout`.
///
/// ```text
/// POST   /validate                  -> validate
/// POST   /release                   -> release
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/validate", post(checkout::validate))
        .route("/release", post(checkout::release))
}
