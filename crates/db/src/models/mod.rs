//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` create / update DTOs where the API writes the table

pub mod admin_notification;
pub mod low_stock_alert;
pub mod order;
pub mod payment;
pub mod product;
pub mod reservation;
pub mod vendor;
pub mod webhook_event;
pub mod wedding;
