use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::inventory;
use crate::state::AppState;

/// Routes mounted at `/admin/inventory`.
///
/// ```text
/// GET    /variants                  -> list_variants
/// PATCH  /variants/{id}             -> update_variant
/// POST   /low-stock-scan            -> low_stock_scan
/// GET    /alerts                    -> list_alerts
/// POST   /reservations/sweep        -> sweep_reservations
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/variants", get(inventory::list_variants))
        .route("/variants/{id}", patch(inventory::update_variant))
        .route("/low-stock-scan", post(inventory::low_stock_scan))
        .route("/alerts", get(inventory::list_alerts))
        .route("/reservations/sweep", post(inventory::sweep_reservations))
}
