//! Mapping of carrier tracking states onto the order lifecycle.

use crate::order_status::OrderStatus;

/// Default parcel used for rate quotes when an order has no explicit one
/// (a boxed suit: 24x16x6 in, 80 oz).
pub const DEFAULT_PARCEL_LENGTH_IN: f64 = 24.0;
pub const DEFAULT_PARCEL_WIDTH_IN: f64 = 16.0;
pub const DEFAULT_PARCEL_HEIGHT_IN: f64 = 6.0;
pub const DEFAULT_PARCEL_WEIGHT_OZ: f64 = 80.0;

/// Order status implied by an EasyPost tracker status, if any.
///
/// `pre_transit` and `unknown` imply nothing; `return_to_sender` and
/// `failure` need a human and are surfaced as notifications instead.
pub fn order_status_for_tracker(tracker_status: &str) -> Option<OrderStatus> {
    match tracker_status {
        "in_transit" | "out_for_delivery" | "available_for_pickup" => Some(OrderStatus::Shipped),
        "delivered" => Some(OrderStatus::Delivered),
        _ => None,
    }
}

/// Tracker statuses that should raise an admin notification.
pub fn tracker_needs_attention(tracker_status: &str) -> bool {
    matches!(tracker_status, "return_to_sender" | "failure" | "error" | "cancelled")
}
