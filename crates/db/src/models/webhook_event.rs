//! Inbound webhook log model.

use kct_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

pub const SOURCE_SHOPIFY: &str = "shopify";
pub const SOURCE_STRIPE: &str = "stripe";
pub const SOURCE_EASYPOST: &str = "easypost";

/// A row from the `webhook_events` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WebhookEvent {
    pub id: DbId,
    pub source: String,
    pub external_id: String,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub received_at: Timestamp,
    pub processed_at: Option<Timestamp>,
    pub error: Option<String>,
}
