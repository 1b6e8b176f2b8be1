//! Admin notification kinds and severities.
//!
//! Notifications are written by handlers and jobs as a side effect and read
//! by the dashboard. The `kind` strings are stable because the dashboard
//! filters and styles by them.

pub const KIND_LOW_STOCK: &str = "low_stock";
pub const KIND_PAYMENT_SUCCEEDED: &str = "payment_succeeded";
pub const KIND_PAYMENT_FAILED: &str = "payment_failed";
pub const KIND_ORDER_CREATED: &str = "order_created";
pub const KIND_ORDER_STATUS: &str = "order_status";
pub const KIND_SHIPPING_EXCEPTION: &str = "shipping_exception";
pub const KIND_MEASUREMENTS_SUBMITTED: &str = "measurements_submitted";
pub const KIND_INVITATION_ACCEPTED: &str = "invitation_accepted";
pub const KIND_SYNC_FAILED: &str = "sync_failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

/// Severity of a low-stock alert: empty shelves are critical.
pub fn low_stock_severity(available_quantity: i32) -> Severity {
    if available_quantity <= 0 {
        Severity::Critical
    } else {
        Severity::Warning
    }
}
