//! Low-stock scan: one alert row per variant at or below its threshold.

use kct_core::notifications::{low_stock_severity, KIND_LOW_STOCK};
use kct_db::models::admin_notification::CreateAdminNotification;
use kct_db::repositories::{AdminNotificationRepo, LowStockAlertRepo, VariantRepo};
use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LowStockReport {
    /// Live variants examined.
    pub scanned: i64,
    /// Alerts opened by this scan (new or re-opened).
    pub alerts_created: u64,
    /// Already open alerts refreshed.
    pub alerts_refreshed: u64,
    pub alerts_resolved: u64,
}

/// Run the scan. Safe to repeat: an already open alert is refreshed, never
/// duplicated, and notifies only when it opens.
pub async fn run_low_stock_scan(pool: &PgPool) -> Result<LowStockReport, sqlx::Error> {
    let refreshed_statuses = VariantRepo::refresh_stock_statuses(pool).await?;
    let scanned = VariantRepo::count_active(pool).await?;
    let breaching = VariantRepo::list_at_or_below_threshold(pool).await?;

    let mut report = LowStockReport {
        scanned,
        ..LowStockReport::default()
    };

    for level in &breaching {
        let opened = LowStockAlertRepo::upsert_open(
            pool,
            level.id,
            level.available_quantity,
            level.low_stock_threshold,
        )
        .await?;

        if !opened {
            report.alerts_refreshed += 1;
            continue;
        }
        report.alerts_created += 1;

        AdminNotificationRepo::create(
            pool,
            &CreateAdminNotification {
                kind: KIND_LOW_STOCK,
                severity: low_stock_severity(level.available_quantity),
                title: format!("Low stock: {}", level.sku),
                message: format!(
                    "{} ({}) has {} left (threshold {})",
                    level.product_name, level.sku, level.available_quantity, level.low_stock_threshold
                ),
                data: json!({
                    "variant_id": level.id,
                    "sku": level.sku,
                    "available_quantity": level.available_quantity,
                    "threshold": level.low_stock_threshold,
                }),
            },
        )
        .await?;
    }

    report.alerts_resolved = LowStockAlertRepo::resolve_recovered(pool).await?;

    tracing::info!(
        scanned = report.scanned,
        statuses_refreshed = refreshed_statuses,
        alerts_created = report.alerts_created,
        alerts_refreshed = report.alerts_refreshed,
        alerts_resolved = report.alerts_resolved,
        "Low-stock scan finished"
    );
    Ok(report)
}
