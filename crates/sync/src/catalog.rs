//! Paginated catalog sync from Shopify into the vendor mirror tables.
//!
//! Each page is written in its own transaction and checkpointed on the
//! `vendor_sync_runs` row (counters plus the page's end cursor). A failure
//! aborts the run but keeps every page committed before it.

use std::time::Duration;

use kct_core::types::DbId;
use kct_core::vendor::{CATALOG_PAGE_SIZE, DEFAULT_PAGE_DELAY_MS, SYNC_KIND_CATALOG};
use kct_db::models::vendor::{SyncCounters, VendorSyncRun};
use kct_db::repositories::{SyncRunRepo, VendorRepo};
use kct_integrations::CatalogSource;
use serde::Serialize;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use crate::retry::{with_retry, DEFAULT_RETRY_DELAYS};
use crate::transform::{transform_product, TransformedProduct};
use crate::SyncError;

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub page_size: u32,
    /// Pause between pages.
    pub page_delay: Duration,
    /// Stop after this many pages even if more remain.
    pub max_pages: Option<u32>,
    pub retry_delays: Vec<Duration>,
    /// Checked between pages; a cancelled run is recorded as failed.
    pub cancel: CancellationToken,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            page_size: CATALOG_PAGE_SIZE,
            page_delay: Duration::from_millis(DEFAULT_PAGE_DELAY_MS),
            max_pages: None,
            retry_delays: DEFAULT_RETRY_DELAYS.to_vec(),
            cancel: CancellationToken::new(),
        }
    }
}

impl SyncOptions {
    /// Defaults, with `SYNC_PAGE_DELAY_MS` overriding the page delay.
    pub fn from_env() -> Self {
        let page_delay_ms = std::env::var("SYNC_PAGE_DELAY_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PAGE_DELAY_MS);
        Self {
            page_delay: Duration::from_millis(page_delay_ms),
            ..Self::default()
        }
    }
}

/// Outcome of a sync run, mirroring its final `vendor_sync_runs` row.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub run_id: DbId,
    pub status: String,
    pub pages: i32,
    pub products_upserted: i32,
    pub variants_upserted: i32,
    pub images_upserted: i32,
    pub last_cursor: Option<String>,
    pub error: Option<String>,
}

impl From<VendorSyncRun> for SyncReport {
    fn from(run: VendorSyncRun) -> Self {
        Self {
            run_id: run.id,
            status: run.status,
            pages: run.pages,
            products_upserted: run.products_upserted,
            variants_upserted: run.variants_upserted,
            images_upserted: run.images_upserted,
            last_cursor: run.last_cursor,
            error: run.error,
        }
    }
}

/// Run a full catalog sync.
///
/// Vendor failures are recorded on the run row and reported with
/// `status = "failed"`; only a failure to write the run row itself is
/// returned as `Err`.
pub async fn run_catalog_sync(
    pool: &PgPool,
    source: &dyn CatalogSource,
    options: &SyncOptions,
) -> Result<SyncReport, SyncError> {
    let run = SyncRunRepo::start(pool, SYNC_KIND_CATALOG).await?;
    tracing::info!(run_id = run.id, page_size = options.page_size, "Catalog sync started");

    let mut counters = SyncCounters::default();
    let mut cursor: Option<String> = None;

    let outcome = sync_pages(pool, source, options, run.id, &mut counters, &mut cursor).await;

    let finished = match outcome {
        Ok(()) => {
            tracing::info!(
                run_id = run.id,
                pages = counters.pages,
                products = counters.products_upserted,
                variants = counters.variants_upserted,
                images = counters.images_upserted,
                "Catalog sync completed"
            );
            SyncRunRepo::complete(pool, run.id).await?
        }
        Err(err) => {
            tracing::error!(
                run_id = run.id,
                pages = counters.pages,
                last_cursor = ?cursor,
                error = %err,
                "Catalog sync failed"
            );
            SyncRunRepo::fail(pool, run.id, &err.to_string()).await?
        }
    };

    Ok(finished.into())
}

async fn sync_pages(
    pool: &PgPool,
    source: &dyn CatalogSource,
    options: &SyncOptions,
    run_id: DbId,
    counters: &mut SyncCounters,
    cursor: &mut Option<String>,
) -> Result<(), SyncError> {
    loop {
        if options.cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }
        if options.max_pages.is_some_and(|max| counters.pages as u32 >= max) {
            tracing::info!(run_id, pages = counters.pages, "Catalog sync reached page limit");
            return Ok(());
        }

        let after = cursor.clone();
        let page = with_retry(&options.retry_delays, || {
            source.fetch_products_page(after.as_deref(), options.page_size)
        })
        .await?;

        let rows: Vec<TransformedProduct> =
            page.products.iter().filter_map(transform_product).collect();
        let written = write_page(pool, &rows).await?;

        counters.pages += 1;
        counters.products_upserted += written.products_upserted;
        counters.variants_upserted += written.variants_upserted;
        counters.images_upserted += written.images_upserted;
        if page.end_cursor.is_some() {
            *cursor = page.end_cursor;
        }
        SyncRunRepo::record_progress(pool, run_id, counters, cursor.as_deref()).await?;

        tracing::debug!(
            run_id,
            page = counters.pages,
            products = written.products_upserted,
            "Catalog page committed"
        );

        if !page.has_next_page {
            return Ok(());
        }
        if !options.page_delay.is_zero() {
            tokio::select! {
                _ = options.cancel.cancelled() => return Err(SyncError::Cancelled),
                _ = tokio::time::sleep(options.page_delay) => {}
            }
        }
    }
}

/// Upsert one page of rows in a single transaction.
async fn write_page(
    pool: &PgPool,
    rows: &[TransformedProduct],
) -> Result<SyncCounters, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut written = SyncCounters::default();

    for row in rows {
        VendorRepo::upsert_product(&mut tx, &row.product).await?;
        written.products_upserted += 1;
        for variant in &row.variants {
            VendorRepo::upsert_variant(&mut tx, variant).await?;
            written.variants_upserted += 1;
        }
        for image in &row.images {
            VendorRepo::upsert_image(&mut tx, image).await?;
            written.images_upserted += 1;
        }
    }

    tx.commit().await?;
    Ok(written)
}
