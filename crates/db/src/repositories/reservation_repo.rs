//! Repository for the `inventory_reservations` table.
//!
//! Reservations are short-lived holds written by checkout validation. The
//! batch write locks the requested variant rows (`SELECT ... FOR UPDATE`, in
//! ascending id order) before reading effective availability, so two
//! concurrent checkouts for the same variant serialize instead of both
//! passing the check and overselling.

use std::collections::HashMap;

use chrono::Utc;
use kct_core::checkout::{batch_is_valid, check_item, LineItem};
use kct_core::stock::reservation_ttl;
use kct_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::reservation::{InventoryReservation, ReservationOutcome};

/// Column list for the `inventory_reservations` table.
const COLUMNS: &str =
    "id, variant_id, session_id, user_id, order_id, quantity, expires_at, created_at";

pub struct ReservationRepo;

impl ReservationRepo {
    /// Validate a checkout batch and, if every item fits, reserve it.
    ///
    /// `items` must already be normalized (merged and sorted ascending by
    /// `variant_id`, see `kct_core::checkout::normalize_line_items`).
    ///
    /// The session's previous unattached holds are released inside the same
    /// transaction before availability is read, so re-validating a cart does
    /// not count the shopper's own holds against them. If any item fails the
    /// transaction is rolled back: no reservation is written and the previous
    /// holds survive.
    pub async fn reserve_batch(
        pool: &PgPool,
        session_id: &str,
        user_id: Option<&str>,
        order_id: Option<DbId>,
        items: &[LineItem],
    ) -> Result<ReservationOutcome, sqlx::Error> {
        let variant_ids: Vec<DbId> = items.iter().map(|i| i.variant_id).collect();

        let mut tx = pool.begin().await?;

        // Lock in ascending id order; `items` is sorted so concurrent batches
        // acquire overlapping locks in the same order.
        sqlx::query(
            "SELECT id FROM product_variants \
             WHERE id = ANY($1) \
             ORDER BY id \
             FOR UPDATE",
        )
        .bind(&variant_ids)
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query(
            "DELETE FROM inventory_reservations \
             WHERE session_id = $1 AND order_id IS NOT DISTINCT FROM $2",
        )
        .bind(session_id)
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

        let rows: Vec<(DbId, i64)> = sqlx::query_as(
            "SELECT variant_id, effective_available \
             FROM v_product_variants_effective \
             WHERE variant_id = ANY($1)",
        )
        .bind(&variant_ids)
        .fetch_all(&mut *tx)
        .await?;
        let available: HashMap<DbId, i64> = rows.into_iter().collect();

        let checks: Vec<_> = items
            .iter()
            .map(|item| check_item(*item, available.get(&item.variant_id).copied()))
            .collect();

        if !batch_is_valid(&checks) {
            tx.rollback().await?;
            return Ok(ReservationOutcome {
                valid: false,
                items: checks,
                reservations: Vec::new(),
                expires_at: None,
            });
        }

        let expires_at = Utc::now() + reservation_ttl();
        let insert = format!(
            "INSERT INTO inventory_reservations \
                (variant_id, session_id, user_id, order_id, quantity, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        let mut reservations = Vec::with_capacity(items.len());
        for item in items {
            let reservation = sqlx::query_as::<_, InventoryReservation>(&insert)
                .bind(item.variant_id)
                .bind(session_id)
                .bind(user_id)
                .bind(order_id)
                .bind(item.quantity)
                .bind(expires_at)
                .fetch_one(&mut *tx)
                .await?;
            reservations.push(reservation);
        }

        tx.commit().await?;

        Ok(ReservationOutcome {
            valid: true,
            items: checks,
            reservations,
            expires_at: Some(expires_at),
        })
    }

    /// Active (unexpired) reservations of a session not yet tied to an order.
    pub async fn list_active_for_session(
        pool: &PgPool,
        session_id: &str,
    ) -> Result<Vec<InventoryReservation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM inventory_reservations \
             WHERE session_id = $1 AND order_id IS NULL AND expires_at > NOW() \
             ORDER BY variant_id"
        );
        sqlx::query_as::<_, InventoryReservation>(&query)
            .bind(session_id)
            .fetch_all(pool)
            .await
    }

    pub async fn list_for_order(
        pool: &PgPool,
        order_id: DbId,
    ) -> Result<Vec<InventoryReservation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM inventory_reservations \
             WHERE order_id = $1 ORDER BY variant_id"
        );
        sqlx::query_as::<_, InventoryReservation>(&query)
            .bind(order_id)
            .fetch_all(pool)
            .await
    }

    /// Delete every hold of a session that is not attached to an order.
    pub async fn release_session(pool: &PgPool, session_id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM inventory_reservations WHERE session_id = $1 AND order_id IS NULL",
        )
        .bind(session_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete expired holds. Returns the number removed.
    pub async fn sweep_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM inventory_reservations WHERE expires_at <= NOW()")
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Tie a session's active holds to a freshly created order.
    pub async fn attach_to_order(
        tx: &mut Transaction<'_, Postgres>,
        session_id: &str,
        order_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE inventory_reservations SET order_id = $2 \
             WHERE session_id = $1 AND order_id IS NULL AND expires_at > NOW()",
        )
        .bind(session_id)
        .bind(order_id)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }

    /// Drop an order's holds (after payment committed the stock, or on
    /// cancellation).
    pub async fn delete_for_order(
        tx: &mut Transaction<'_, Postgres>,
        order_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM inventory_reservations WHERE order_id = $1")
            .bind(order_id)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected())
    }
}
