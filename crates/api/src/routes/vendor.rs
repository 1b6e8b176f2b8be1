use axum::routing::{get, post};
use axum::Router;

use crate::handlers::vendor;
use crate::state::AppState;

/// Routes mounted at `/admin/vendor`.
///
/// ```text
/// GET    /products                  -> list_products
/// GET    /products/{id}             -> get_product
/// POST   /products/{id}/decision    -> decide
/// POST   /sync                      -> run_sync
/// POST   /inventory-sync            -> run_inventory
/// GET    /sync-runs                 -> list_sync_runs
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(vendor::list_products))
        .route("/products/{id}", get(vendor::get_product))
        .route("/products/{id}/decision", post(vendor::decide))
        .route("/sync", post(vendor::run_sync))
        .route("/inventory-sync", post(vendor::run_inventory))
        .route("/sync-runs", get(vendor::list_sync_runs))
}
