//! Repository for the `vendor_sync_runs` table.

use kct_core::types::DbId;
use kct_core::vendor::{SYNC_COMPLETED, SYNC_FAILED};
use sqlx::PgPool;

use crate::models::vendor::{SyncCounters, VendorSyncRun};

const COLUMNS: &str = "id, kind, status, pages, products_upserted, variants_upserted, \
    images_upserted, last_cursor, error, started_at, finished_at";

pub struct SyncRunRepo;

impl SyncRunRepo {
    /// Open a `running` row for a job of the given kind.
    pub async fn start(pool: &PgPool, kind: &str) -> Result<VendorSyncRun, sqlx::Error> {
        let query = format!(
            "INSERT INTO vendor_sync_runs (kind) VALUES ($1) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, VendorSyncRun>(&query)
            .bind(kind)
            .fetch_one(pool)
            .await
    }

    /// Checkpoint progress after a committed page.
    pub async fn record_progress(
        pool: &PgPool,
        id: DbId,
        counters: &SyncCounters,
        last_cursor: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE vendor_sync_runs SET \
                pages = $2, products_upserted = $3, variants_upserted = $4, \
                images_upserted = $5, last_cursor = COALESCE($6, last_cursor) \
             WHERE id = $1",
        )
        .bind(id)
        .bind(counters.pages)
        .bind(counters.products_upserted)
        .bind(counters.variants_upserted)
        .bind(counters.images_upserted)
        .bind(last_cursor)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn complete(pool: &PgPool, id: DbId) -> Result<VendorSyncRun, sqlx::Error> {
        Self::finish(pool, id, SYNC_COMPLETED, None).await
    }

    /// Mark a run failed. Counters and `last_cursor` keep their last
    /// checkpointed values.
    pub async fn fail(pool: &PgPool, id: DbId, error: &str) -> Result<VendorSyncRun, sqlx::Error> {
        Self::finish(pool, id, SYNC_FAILED, Some(error)).await
    }

    async fn finish(
        pool: &PgPool,
        id: DbId,
        status: &str,
        error: Option<&str>,
    ) -> Result<VendorSyncRun, sqlx::Error> {
        let query = format!(
            "UPDATE vendor_sync_runs SET status = $2, error = $3, finished_at = NOW() \
             WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, VendorSyncRun>(&query)
            .bind(id)
            .bind(status)
            .bind(error)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<VendorSyncRun>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM vendor_sync_runs WHERE id = $1");
        sqlx::query_as::<_, VendorSyncRun>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Most recent runs first, optionally of one kind.
    pub async fn list_recent(
        pool: &PgPool,
        kind: Option<&str>,
        limit: i64,
    ) -> Result<Vec<VendorSyncRun>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM vendor_sync_runs \
             WHERE ($1::TEXT IS NULL OR kind = $1) \
             ORDER BY started_at DESC, id DESC LIMIT $2"
        );
        sqlx::query_as::<_, VendorSyncRun>(&query)
            .bind(kind)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
