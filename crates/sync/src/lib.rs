//! Catalog and stock jobs shared by the API (on-demand admin triggers) and
//! the worker (fixed intervals).
//!
//! - [`catalog`]: Shopify product pages into the vendor mirror.
//! - [`inventory`]: Shopify inventory levels into vendor and internal stock.
//! - [`low_stock`]: threshold scan maintaining one alert per variant.
//! - [`import`]: applying an admin import decision to a vendor product.
//! - [`reservations`]: expired hold sweep.
//! - [`webhook`]: Shopify webhook payloads applied to the mirror.

pub mod catalog;
pub mod import;
pub mod inventory;
pub mod low_stock;
pub mod reservations;
pub mod retry;
pub mod transform;
pub mod webhook;

use kct_integrations::IntegrationError;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Integration(#[from] IntegrationError),

    #[error("{0}")]
    Core(#[from] kct_core::error::CoreError),

    /// The run's cancellation token fired between pages.
    #[error("Sync cancelled before completion")]
    Cancelled,
}

/// Raise a critical admin notification for a failed sync run. Best effort:
/// a failure to write it is only logged.
pub async fn notify_sync_failed(
    pool: &sqlx::PgPool,
    kind: &str,
    run_id: kct_core::types::DbId,
    error: Option<&str>,
) {
    use kct_core::notifications::{Severity, KIND_SYNC_FAILED};
    use kct_db::models::admin_notification::CreateAdminNotification;
    use kct_db::repositories::AdminNotificationRepo;

    let input = CreateAdminNotification {
        kind: KIND_SYNC_FAILED,
        severity: Severity::Critical,
        title: format!("Shopify {kind} sync failed"),
        message: error.unwrap_or("Unknown error").to_string(),
        data: serde_json::json!({ "run_id": run_id, "sync_kind": kind }),
    };
    if let Err(e) = AdminNotificationRepo::create(pool, &input).await {
        tracing::warn!(run_id, error = %e, "Failed to write sync failure notification");
    }
}
