use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the database is reachable.
    pub db_healthy: bool,
    /// Which third-party integrations have credentials.
    pub integrations: IntegrationStatus,
}

#[derive(Serialize)]
pub struct IntegrationStatus {
    pub shopify: bool,
    pub stripe: bool,
    pub easypost: bool,
    pub sendgrid: bool,
}

/// GET /health -- returns service, database and integration health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = kct_db::health_check(&state.pool).await.is_ok();

    let status = if db_healthy { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        integrations: IntegrationStatus {
            shopify: state.integrations.catalog.is_some(),
            stripe: state.integrations.payments.is_some(),
            easypost: state.integrations.shipping.is_some(),
            sendgrid: state.integrations.mailer.is_some(),
        },
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
