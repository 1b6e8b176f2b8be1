//! Route definitions for orders and shipping.

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::{orders, shipping};
use crate::state::AppState;

/// Routes mounted at `/orders`.
///
/// ```text
/// POST   /                          -> create_order
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(orders::create_order))
}

/// Routes mounted at `/admin/orders`.
///
/// ```text
/// GET    /                          -> list_orders
/// GET    /{id}                      -> get_order
/// PATCH  /{id}/status               -> update_status
/// POST   /{id}/shipping/rates       -> quote_rates
/// POST   /{id}/shipping/label       -> buy_label
/// ```
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list_orders))
        .route("/{id}", get(orders::get_order))
        .route("/{id}/status", patch(orders::update_status))
        .route("/{id}/shipping/rates", post(shipping::quote_rates))
        .route("/{id}/shipping/label", post(shipping::buy_label))
}
