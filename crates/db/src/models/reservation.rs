//! Inventory reservation models.

use kct_core::checkout::ItemCheck;
use kct_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `inventory_reservations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InventoryReservation {
    pub id: DbId,
    pub variant_id: DbId,
    pub session_id: String,
    pub user_id: Option<String>,
    pub order_id: Option<DbId>,
    pub quantity: i32,
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
}

/// Result of validating and reserving a checkout batch.
///
/// `reservations` is empty whenever `valid` is false.
#[derive(Debug, Clone, Serialize)]
pub struct ReservationOutcome {
    pub valid: bool,
    pub items: Vec<ItemCheck>,
    pub reservations: Vec<InventoryReservation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<Timestamp>,
}
