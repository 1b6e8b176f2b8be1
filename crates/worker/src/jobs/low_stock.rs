use std::time::Duration;

use kct_sync::low_stock::run_low_stock_scan;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

pub async fn tick(pool: &PgPool) {
    match run_low_stock_scan(pool).await {
        Ok(report) if report.alerts_created > 0 || report.alerts_resolved > 0 => {
            tracing::info!(
                scanned = report.scanned,
                created = report.alerts_created,
                resolved = report.alerts_resolved,
                "Low-stock scan changed alerts"
            );
        }
        Ok(report) => tracing::debug!(scanned = report.scanned, "Low-stock scan: no changes"),
        Err(e) => tracing::error!(error = %e, "Low-stock scan failed"),
    }
}

pub async fn run(pool: PgPool, period: Duration, cancel: CancellationToken) {
    super::run_periodic("low_stock_scan", period, cancel, || tick(&pool)).await;
}
