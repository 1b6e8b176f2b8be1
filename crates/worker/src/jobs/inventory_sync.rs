use std::sync::Arc;
use std::time::Duration;

use kct_core::vendor::{SYNC_FAILED, SYNC_KIND_INVENTORY};
use kct_integrations::CatalogSource;
use kct_sync::catalog::SyncOptions;
use kct_sync::inventory::run_inventory_sync;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

/// Refresh stock levels of every mirrored inventory item.
pub async fn tick(pool: &PgPool, source: &dyn CatalogSource, options: &SyncOptions) {
    match run_inventory_sync(pool, source, options).await {
        Ok(report) if report.status == SYNC_FAILED => {
            if options.cancel.is_cancelled() {
                tracing::info!(run_id = report.run_id, "Inventory sync interrupted by shutdown");
                return;
            }
            kct_sync::notify_sync_failed(
                pool,
                SYNC_KIND_INVENTORY,
                report.run_id,
                report.error.as_deref(),
            )
            .await;
        }
        Ok(_) => {}
        Err(e) => tracing::error!(error = %e, "Scheduled inventory sync could not run"),
    }
}

pub async fn run(
    pool: PgPool,
    source: Arc<dyn CatalogSource>,
    options: SyncOptions,
    period: Duration,
    cancel: CancellationToken,
) {
    super::run_periodic("inventory_sync", period, cancel, || {
        tick(&pool, source.as_ref(), &options)
    })
    .await;
}
