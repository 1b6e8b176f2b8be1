//! Low-stock alert model.

use kct_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

pub const ALERT_OPEN: &str = "open";
pub const ALERT_RESOLVED: &str = "resolved";

/// A row from the `low_stock_alerts` table joined with its variant's SKU.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LowStockAlert {
    pub id: DbId,
    pub variant_id: DbId,
    pub sku: String,
    pub available_quantity: i32,
    pub threshold: i32,
    pub status: String,
    pub first_detected_at: Timestamp,
    pub last_detected_at: Timestamp,
    pub resolved_at: Option<Timestamp>,
}
