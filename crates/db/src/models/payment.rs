//! Payment (Stripe payment intent) model.

use kct_core::types::{Cents, DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `payments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Payment {
    pub id: DbId,
    pub stripe_payment_intent_id: String,
    pub payment_type: String,
    pub wedding_id: Option<DbId>,
    pub order_id: Option<DbId>,
    pub member_ids: Vec<DbId>,
    pub amount_cents: Cents,
    pub currency: String,
    pub status: String,
    pub metadata: serde_json::Value,
    pub failure_message: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Insert DTO, filled after Stripe returned the intent id.
#[derive(Debug, Clone)]
pub struct CreatePayment {
    pub stripe_payment_intent_id: String,
    pub payment_type: String,
    pub wedding_id: Option<DbId>,
    pub order_id: Option<DbId>,
    pub member_ids: Vec<DbId>,
    pub amount_cents: Cents,
    pub currency: String,
    pub metadata: serde_json::Value,
}
