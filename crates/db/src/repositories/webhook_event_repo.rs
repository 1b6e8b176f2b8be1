//! Repository for the `webhook_events` table.

use kct_core::types::DbId;
use sqlx::PgPool;

use crate::models::webhook_event::WebhookEvent;

const COLUMNS: &str =
    "id, source, external_id, event_type, payload, received_at, processed_at, error";

pub struct WebhookEventRepo;

impl WebhookEventRepo {
    /// Record a verified event.
    ///
    /// Returns the row id to process, or `None` if `(source, external_id)`
    /// was already processed (a redelivery). A redelivery of an event whose
    /// processing failed returns the existing id so it is tried again.
    pub async fn record(
        pool: &PgPool,
        source: &str,
        external_id: &str,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO webhook_events (source, external_id, event_type, payload) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT ON CONSTRAINT uq_webhook_events_source_external_id DO UPDATE SET \
                payload = EXCLUDED.payload, received_at = NOW() \
             WHERE webhook_events.processed_at IS NULL \
             RETURNING id",
        )
        .bind(source)
        .bind(external_id)
        .bind(event_type)
        .bind(payload)
        .fetch_optional(pool)
        .await
    }

    pub async fn mark_processed(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE webhook_events SET processed_at = NOW(), error = NULL WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn mark_failed(pool: &PgPool, id: DbId, error: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE webhook_events SET error = $2 WHERE id = $1")
            .bind(id)
            .bind(error)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// The logged delivery of one provider event.
    pub async fn find_by_external_id(
        pool: &PgPool,
        source: &str,
        external_id: &str,
    ) -> Result<Option<WebhookEvent>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM webhook_events WHERE source = $1 AND external_id = $2"
        );
        sqlx::query_as::<_, WebhookEvent>(&query)
            .bind(source)
            .bind(external_id)
            .fetch_optional(pool)
            .await
    }
}
