//! Admin dashboard notification model.

use kct_core::notifications::Severity;
use kct_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `admin_notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AdminNotification {
    pub id: DbId,
    pub kind: String,
    pub severity: String,
    pub title: String,
    pub message: String,
    pub data: serde_json::Value,
    pub is_read: bool,
    pub read_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// Insert DTO.
#[derive(Debug, Clone)]
pub struct CreateAdminNotification {
    pub kind: &'static str,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub data: serde_json::Value,
}
