//! Repository for the `payments` table.

use kct_core::payments::{PAYMENT_FAILED, PAYMENT_PENDING, PAYMENT_SUCCEEDED};
use kct_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::payment::{CreatePayment, Payment};

const COLUMNS: &str = "id, stripe_payment_intent_id, payment_type, wedding_id, order_id, \
    member_ids, amount_cents, currency, status, metadata, failure_message, created_at, updated_at";

pub struct PaymentRepo;

impl PaymentRepo {
    pub async fn create(pool: &PgPool, input: &CreatePayment) -> Result<Payment, sqlx::Error> {
        let query = format!(
            "INSERT INTO payments \
                (stripe_payment_intent_id, payment_type, wedding_id, order_id, member_ids, \
                 amount_cents, currency, metadata) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(&input.stripe_payment_intent_id)
            .bind(&input.payment_type)
            .bind(input.wedding_id)
            .bind(input.order_id)
            .bind(&input.member_ids)
            .bind(input.amount_cents)
            .bind(&input.currency)
            .bind(&input.metadata)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_intent_id(
        pool: &PgPool,
        intent_id: &str,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM payments WHERE stripe_payment_intent_id = $1");
        sqlx::query_as::<_, Payment>(&query)
            .bind(intent_id)
            .fetch_optional(pool)
            .await
    }

    /// Mark an intent succeeded inside the caller's transaction.
    ///
    /// A `failed` intent can still succeed when the customer retries the card
    /// on the same intent, so both `pending` and `failed` rows qualify.
    /// Returns `None` if the intent is unknown or already succeeded.
    pub async fn mark_succeeded(
        tx: &mut Transaction<'_, Postgres>,
        intent_id: &str,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let query = format!(
            "UPDATE payments SET status = $2, failure_message = NULL \
             WHERE stripe_payment_intent_id = $1 AND status = ANY($3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(intent_id)
            .bind(PAYMENT_SUCCEEDED)
            .bind([PAYMENT_PENDING, PAYMENT_FAILED].as_slice())
            .fetch_optional(&mut **tx)
            .await
    }

    /// Mark an intent failed. A succeeded intent is never moved back; a
    /// repeated decline refreshes the failure message.
    pub async fn mark_failed(
        pool: &PgPool,
        intent_id: &str,
        failure_message: Option<&str>,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let query = format!(
            "UPDATE payments SET status = $2, failure_message = $4 \
             WHERE stripe_payment_intent_id = $1 AND status = ANY($3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(intent_id)
            .bind(PAYMENT_FAILED)
            .bind([PAYMENT_PENDING, PAYMENT_FAILED].as_slice())
            .bind(failure_message)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_wedding(
        pool: &PgPool,
        wedding_id: DbId,
    ) -> Result<Vec<Payment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM payments WHERE wedding_id = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(wedding_id)
            .fetch_all(pool)
            .await
    }
}
