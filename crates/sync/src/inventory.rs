//! Reconciliation of Shopify inventory levels into vendor and internal stock.

use kct_core::types::DbId;
use kct_core::vendor::{INVENTORY_CHUNK_SIZE, SYNC_KIND_INVENTORY};
use kct_db::models::vendor::SyncCounters;
use kct_db::repositories::{SyncRunRepo, VariantRepo, VendorRepo};
use kct_integrations::catalog::InventoryLevel;
use kct_integrations::CatalogSource;
use serde::Serialize;
use sqlx::PgPool;

use crate::catalog::SyncOptions;
use crate::retry::with_retry;
use crate::SyncError;

#[derive(Debug, Clone, Default, Serialize)]
pub struct InventoryReport {
    pub run_id: DbId,
    pub status: String,
    pub items_checked: usize,
    pub vendor_variants_updated: usize,
    pub variants_updated: u64,
    pub error: Option<String>,
}

/// Pull current levels for every mirrored inventory item, 50 ids per call.
///
/// Each chunk is applied in its own transaction. As with the catalog sync any
/// failure after the run starts (vendor or database) is recorded on the run
/// row and reported, not returned.
pub async fn run_inventory_sync(
    pool: &PgPool,
    source: &dyn CatalogSource,
    options: &SyncOptions,
) -> Result<InventoryReport, SyncError> {
    let run = SyncRunRepo::start(pool, SYNC_KIND_INVENTORY).await?;

    let mut report = InventoryReport {
        run_id: run.id,
        ..InventoryReport::default()
    };

    let outcome = sync_chunks(pool, source, options, run.id, &mut report).await;

    let finished = match outcome {
        Ok(()) => SyncRunRepo::complete(pool, run.id).await?,
        Err(err) => {
            tracing::error!(
                run_id = run.id,
                items_checked = report.items_checked,
                error = %err,
                "Inventory sync failed"
            );
            SyncRunRepo::fail(pool, run.id, &err.to_string()).await?
        }
    };
    report.status = finished.status;
    report.error = finished.error;

    tracing::info!(
        run_id = run.id,
        status = %report.status,
        items_checked = report.items_checked,
        vendor_variants_updated = report.vendor_variants_updated,
        variants_updated = report.variants_updated,
        "Inventory sync finished"
    );
    Ok(report)
}

async fn sync_chunks(
    pool: &PgPool,
    source: &dyn CatalogSource,
    options: &SyncOptions,
    run_id: DbId,
    report: &mut InventoryReport,
) -> Result<(), SyncError> {
    let item_ids = VendorRepo::list_inventory_item_ids(pool).await?;
    tracing::info!(run_id, items = item_ids.len(), "Inventory sync started");

    let mut counters = SyncCounters::default();
    for chunk in item_ids.chunks(INVENTORY_CHUNK_SIZE) {
        if options.cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }
        let levels =
            with_retry(&options.retry_delays, || source.fetch_inventory_levels(chunk)).await?;
        let (vendor_updated, internal_updated) = apply_levels(pool, &levels).await?;

        report.items_checked += chunk.len();
        report.vendor_variants_updated += vendor_updated;
        report.variants_updated += internal_updated;
        counters.pages += 1;
        counters.variants_upserted += vendor_updated as i32;
        SyncRunRepo::record_progress(pool, run_id, &counters, None).await?;
    }
    Ok(())
}

/// Apply levels in one transaction. Returns (vendor variants, internal
/// variants) updated.
pub async fn apply_levels(
    pool: &PgPool,
    levels: &[InventoryLevel],
) -> Result<(usize, u64), sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut vendor_updated = 0;
    let mut internal_updated = 0;

    for level in levels {
        let variant_ids =
            VendorRepo::set_inventory_quantity(&mut tx, level.inventory_item_id, level.available)
                .await?;
        vendor_updated += variant_ids.len();
        for shopify_variant_id in variant_ids {
            internal_updated += VariantRepo::set_available_by_vendor_variant(
                &mut tx,
                shopify_variant_id,
                level.available.max(0),
            )
            .await?;
        }
    }

    tx.commit().await?;
    Ok((vendor_updated, internal_updated))
}
