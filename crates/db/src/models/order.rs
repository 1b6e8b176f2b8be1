//! Order, line item and status-history models.

use kct_core::checkout::LineItem;
use kct_core::types::{Cents, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `orders` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: DbId,
    pub order_number: String,
    pub session_id: Option<String>,
    pub customer_email: String,
    pub customer_name: Option<String>,
    pub status: String,
    pub payment_status: String,
    pub subtotal_cents: Cents,
    pub shipping_cents: Cents,
    pub total_cents: Cents,
    pub shipping_address: Option<serde_json::Value>,
    pub easypost_shipment_id: Option<String>,
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub label_url: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for `POST /orders`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrder {
    pub session_id: String,
    pub customer_email: String,
    pub customer_name: Option<String>,
    pub shipping_address: serde_json::Value,
    pub items: Vec<LineItem>,
}

/// A row from the `order_items` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrderItem {
    pub id: DbId,
    pub order_id: DbId,
    pub variant_id: DbId,
    pub sku: String,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price_cents: Cents,
    pub created_at: Timestamp,
}

/// A row from the `order_status_history` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrderStatusHistory {
    pub id: DbId,
    pub order_id: DbId,
    pub from_status: String,
    pub to_status: String,
    pub note: Option<String>,
    pub changed_by: Option<String>,
    pub created_at: Timestamp,
}

/// An order with its items and history, for the admin detail view.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub history: Vec<OrderStatusHistory>,
}

/// Label purchase result stored on the order.
#[derive(Debug, Clone)]
pub struct ShippingLabel {
    pub shipment_id: String,
    pub tracking_number: String,
    pub carrier: String,
    pub label_url: String,
}

/// Result of trying to turn a reserved checkout session into an order.
#[derive(Debug, Clone)]
pub enum OrderCreation {
    Created(OrderDetail),
    /// These variants are not (fully) covered by the session's active holds.
    NotReserved { variant_ids: Vec<DbId> },
}

/// Result of applying a successful payment to an order.
#[derive(Debug, Clone)]
pub struct PaidOrder {
    pub order: Order,
    /// The order moved `pending -> confirmed` as part of the payment.
    pub confirmed: bool,
}
