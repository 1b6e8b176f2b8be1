//! Route definitions for the groomsmen portal.

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::wedding;
use crate::state::AppState;

/// Portal routes, merged at the `/api/v1` root.
///
/// ```text
/// POST   /groomsmen-invitation/validate        -> validate_invitation
/// POST   /groomsmen-invitation/accept          -> accept_invitation
/// GET    /weddings/{id}/members                -> list_members
/// POST   /wedding-members/{id}/measurements    -> submit_measurements
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/groomsmen-invitation/validate",
            post(wedding::validate_invitation),
        )
        .route(
            "/groomsmen-invitation/accept",
            post(wedding::accept_invitation),
        )
        .route("/weddings/{id}/members", get(wedding::list_members))
        .route(
            "/wedding-members/{id}/measurements",
            post(wedding::submit_measurements),
        )
}

/// Routes mounted at `/admin/measurements`.
///
/// ```text
/// PATCH  /{id}/review               -> review_measurements
/// ```
pub fn admin_router() -> Router<AppState> {
    Router::new().route("/{id}/review", patch(wedding::review_measurements))
}
