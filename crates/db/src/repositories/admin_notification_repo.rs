//! Repository for the `admin_notifications` table.

use kct_core::types::DbId;
use sqlx::PgPool;

use crate::models::admin_notification::{AdminNotification, CreateAdminNotification};

/// Column list for `admin_notifications` queries.
const COLUMNS: &str = "id, kind, severity, title, message, data, is_read, read_at, created_at";

pub struct AdminNotificationRepo;

impl AdminNotificationRepo {
    /// Create a notification, returning the stored row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateAdminNotification,
    ) -> Result<AdminNotification, sqlx::Error> {
        let query = format!(
            "INSERT INTO admin_notifications (kind, severity, title, message, data) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AdminNotification>(&query)
            .bind(input.kind)
            .bind(input.severity.as_str())
            .bind(&input.title)
            .bind(&input.message)
            .bind(&input.data)
            .fetch_one(pool)
            .await
    }

    /// List notifications, newest first.
    ///
    /// When `unread_only` is `true`, only rows with `is_read = false` are
    /// returned.
    pub async fn list(
        pool: &PgPool,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AdminNotification>, sqlx::Error> {
        let filter = if unread_only {
            "WHERE is_read = false"
        } else {
            ""
        };
        let query = format!(
            "SELECT {COLUMNS} FROM admin_notifications \
             {filter} \
             ORDER BY created_at DESC, id DESC \
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, AdminNotification>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<AdminNotification>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM admin_notifications WHERE id = $1");
        sqlx::query_as::<_, AdminNotification>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Mark a single notification as read.
    ///
    /// Returns `true` if an unread row was found and updated.
    pub async fn mark_read(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE admin_notifications \
             SET is_read = true, read_at = NOW() \
             WHERE id = $1 AND is_read = false",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark every unread notification as read. Already-read rows keep their
    /// original `read_at`.
    ///
    /// Returns the number of notifications that were marked read.
    pub async fn mark_all_read(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE admin_notifications \
             SET is_read = true, read_at = NOW() \
             WHERE is_read = false",
        )
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn unread_count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM admin_notifications WHERE is_read = false")
            .fetch_one(pool)
            .await
    }
}
