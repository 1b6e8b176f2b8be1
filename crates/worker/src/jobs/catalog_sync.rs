use std::sync::Arc;
use std::time::Duration;

use kct_core::vendor::{SYNC_FAILED, SYNC_KIND_CATALOG};
use kct_integrations::CatalogSource;
use kct_sync::catalog::{run_catalog_sync, SyncOptions};
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

/// One full catalog sync. A failed run raises a critical notification.
pub async fn tick(pool: &PgPool, source: &dyn CatalogSource, options: &SyncOptions) {
    match run_catalog_sync(pool, source, options).await {
        Ok(report) if report.status == SYNC_FAILED => {
            if options.cancel.is_cancelled() {
                tracing::info!(run_id = report.run_id, "Catalog sync interrupted by shutdown");
                return;
            }
            kct_sync::notify_sync_failed(pool, SYNC_KIND_CATALOG, report.run_id, report.error.as_deref())
                .await;
        }
        Ok(report) => {
            tracing::info!(
                run_id = report.run_id,
                pages = report.pages,
                products = report.products_upserted,
                "Scheduled catalog sync finished"
            );
        }
        Err(e) => tracing::error!(error = %e, "Scheduled catalog sync could not run"),
    }
}

pub async fn run(
    pool: PgPool,
    source: Arc<dyn CatalogSource>,
    options: SyncOptions,
    period: Duration,
    cancel: CancellationToken,
) {
    super::run_periodic("catalog_sync", period, cancel, || {
        tick(&pool, source.as_ref(), &options)
    })
    .await;
}
