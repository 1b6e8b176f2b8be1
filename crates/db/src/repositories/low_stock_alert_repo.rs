//! Repository for the `low_stock_alerts` table.
//!
//! One row per variant, enforced by `uq_low_stock_alerts_variant`. The scan
//! upserts onto it, so repeated scans refresh the existing row.

use kct_core::types::DbId;
use sqlx::PgPool;

use crate::models::low_stock_alert::LowStockAlert;

/// Column list, qualified for the join with `product_variants`.
const COLUMNS: &str = "a.id, a.variant_id, v.sku, a.available_quantity, a.threshold, a.status, \
    a.first_detected_at, a.last_detected_at, a.resolved_at";

pub struct LowStockAlertRepo;

impl LowStockAlertRepo {
    /// Record a breach for a variant.
    ///
    /// Returns `true` when this call opened the alert (new row, or a
    /// previously resolved row re-opened) and `false` when an already open
    /// alert was only refreshed.
    pub async fn upsert_open(
        pool: &PgPool,
        variant_id: DbId,
        available_quantity: i32,
        threshold: i32,
    ) -> Result<bool, sqlx::Error> {
        // `prev` reads the snapshot taken before the upsert runs.
        sqlx::query_scalar(
            "WITH prev AS ( \
                SELECT status FROM low_stock_alerts WHERE variant_id = $1 \
             ), upserted AS ( \
                INSERT INTO low_stock_alerts (variant_id, available_quantity, threshold) \
                VALUES ($1, $2, $3) \
                ON CONFLICT (variant_id) DO UPDATE SET \
                    available_quantity = EXCLUDED.available_quantity, \
                    threshold = EXCLUDED.threshold, \
                    last_detected_at = NOW(), \
                    first_detected_at = CASE WHEN low_stock_alerts.status = 'resolved' \
                        THEN NOW() ELSE low_stock_alerts.first_detected_at END, \
                    status = 'open', \
                    resolved_at = NULL \
                RETURNING id \
             ) \
             SELECT COALESCE((SELECT status FROM prev), 'resolved') <> 'open' FROM upserted",
        )
        .bind(variant_id)
        .bind(available_quantity)
        .bind(threshold)
        .fetch_one(pool)
        .await
    }

    /// Resolve open alerts whose variant recovered above its threshold or was
    /// deleted. Returns the number resolved.
    pub async fn resolve_recovered(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE low_stock_alerts a \
             SET status = 'resolved', resolved_at = NOW() \
             FROM product_variants v \
             WHERE a.variant_id = v.id AND a.status = 'open' \
               AND (v.available_quantity > v.low_stock_threshold OR v.deleted_at IS NOT NULL)",
        )
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// List alerts, newest detection first, optionally filtered by status.
    pub async fn list(
        pool: &PgPool,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LowStockAlert>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM low_stock_alerts a \
             JOIN product_variants v ON v.id = a.variant_id \
             WHERE ($1::TEXT IS NULL OR a.status = $1) \
             ORDER BY a.last_detected_at DESC, a.id DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, LowStockAlert>(&query)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM low_stock_alerts")
            .fetch_one(pool)
            .await
    }
}
