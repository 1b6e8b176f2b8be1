pub mod checkout;
pub mod health;
pub mod inventory;
pub mod notifications;
pub mod orders;
pub mod payments;
pub mod vendor;
pub mod webhooks;
pub mod wedding;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /checkout/validate                               validate + reserve (public)
/// /checkout/release                                drop session holds (public)
///
/// /orders                                          create from session (public)
/// /payments/intents                                Stripe payment intent (public)
///
/// /webhooks/shopify                                HMAC-verified
/// /webhooks/stripe                                 HMAC-verified
/// /webhooks/easypost                               HMAC-verified
///
/// /groomsmen-invitation/validate                   read-only lookup (public)
/// /groomsmen-invitation/accept                     join the party (public)
/// /weddings/{id}/members                           roster (auth required)
/// /wedding-members/{id}/measurements               submit (auth required)
///
/// /admin/orders                                    list
/// /admin/orders/{id}                               detail
/// /admin/orders/{id}/status                        transition (PATCH)
/// /admin/orders/{id}/shipping/rates                quote (POST)
/// /admin/orders/{id}/shipping/label                buy label (POST)
///
/// /admin/measurements/{id}/review                  approve / reject (PATCH)
///
/// /admin/notifications                             list
/// /admin/notifications/unread-count                count
/// /admin/notifications/read-all                    mark all read (POST)
/// /admin/notifications/{id}/read                   mark read (POST)
///
/// /admin/vendor/products                           list mirror
/// /admin/vendor/products/{id}                      detail
/// /admin/vendor/products/{id}/decision             import / skip (POST)
/// /admin/vendor/sync                               catalog sync now (POST)
/// /admin/vendor/inventory-sync                     inventory sync now (POST)
/// /admin/vendor/sync-runs                          run history
///
/// /admin/inventory/variants                        effective stock
/// /admin/inventory/variants/{id}                   edit stock (PATCH)
/// /admin/inventory/low-stock-scan                  scan now (POST)
/// /admin/inventory/alerts                          low-stock alerts
/// /admin/inventory/reservations/sweep              drop expired holds (POST)
/// ```
///
/// Every `/admin` route requires a JWT with the `admin` or `service_role`
/// role.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/checkout", checkout::router())
        .nest("/orders", orders::router())
        .nest("/payments", payments::router())
        .nest("/webhooks", webhooks::router())
        .merge(wedding::router())
        .nest("/admin", admin_routes())
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .nest("/orders", orders::admin_router())
        .nest("/measurements", wedding::admin_router())
        .nest("/notifications", notifications::router())
        .nest("/vendor", vendor::router())
        .nest("/inventory", inventory::router())
}
