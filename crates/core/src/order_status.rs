//! Order lifecycle: statuses, the transition table and order numbers.
//!
//! Every status change (admin PATCH, Stripe webhook, label purchase, EasyPost
//! tracker) goes through [`validate_transition`], so the table below is the
//! single authority on what an order may become next.
//!
//! ```text
//! pending    -> confirmed | cancelled
//! confirmed  -> processing | cancelled
//! processing -> shipped | cancelled
//! shipped    -> delivered
//! delivered  -> refunded
//! ```

use rand::Rng;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Order status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 7] = [
        Self::Pending,
        Self::Confirmed,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
        Self::Refunded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }

    /// Statuses reachable from `self` in one step.
    pub fn allowed_next(&self) -> &'static [OrderStatus] {
        match self {
            Self::Pending => &[Self::Confirmed, Self::Cancelled],
            Self::Confirmed => &[Self::Processing, Self::Cancelled],
            Self::Processing => &[Self::Shipped, Self::Cancelled],
            Self::Shipped => &[Self::Delivered],
            Self::Delivered => &[Self::Refunded],
            Self::Cancelled | Self::Refunded => &[],
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        self.allowed_next().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        self.allowed_next().is_empty()
    }

    /// Subject line used for the customer status email.
    pub fn email_subject(&self) -> &'static str {
        match self {
            Self::Pending => "We received your order",
            Self::Confirmed => "Your order is confirmed",
            Self::Processing => "Your order is being prepared",
            Self::Shipped => "Your order has shipped",
            Self::Delivered => "Your order was delivered",
            Self::Cancelled => "Your order was cancelled",
            Self::Refunded => "Your order was refunded",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a client-supplied status, listing the valid values on failure.
pub fn parse_status(value: &str) -> Result<OrderStatus, CoreError> {
    OrderStatus::parse(value).ok_or_else(|| {
        let valid: Vec<&str> = OrderStatus::ALL.iter().map(|s| s.as_str()).collect();
        CoreError::Validation(format!(
            "Invalid order status '{value}'. Must be one of: {}",
            valid.join(", ")
        ))
    })
}

/// Check a transition against the table.
///
/// A stored status that no longer parses is treated as an internal error,
/// an illegal move as a conflict.
pub fn validate_transition(current: &str, next: OrderStatus) -> Result<OrderStatus, CoreError> {
    let current = OrderStatus::parse(current)
        .ok_or_else(|| CoreError::Internal(format!("Unknown stored order status '{current}'")))?;

    if !current.can_transition_to(next) {
        return Err(CoreError::Conflict(format!(
            "Order cannot move from '{current}' to '{next}'"
        )));
    }
    Ok(current)
}

// ---------------------------------------------------------------------------
// Payment status
// ---------------------------------------------------------------------------

pub const PAYMENT_UNPAID: &str = "unpaid";
pub const PAYMENT_PAID: &str = "paid";
pub const PAYMENT_REFUNDED: &str = "refunded";

// ---------------------------------------------------------------------------
// Order numbers
// ---------------------------------------------------------------------------

/// Prefix of every human-facing order number.
pub const ORDER_NUMBER_PREFIX: &str = "KCT";

/// Characters used in order numbers (no 0/O or 1/I look-alikes).
const ORDER_NUMBER_ALPHABET: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";

/// Length of the random part of an order number.
const ORDER_NUMBER_LEN: usize = 8;

/// Generate a random order number such as `KCT-7Q2MZK4D`.
pub fn generate_order_number() -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..ORDER_NUMBER_LEN)
        .map(|_| {
            let idx = rng.random_range(0..ORDER_NUMBER_ALPHABET.len());
            ORDER_NUMBER_ALPHABET[idx] as char
        })
        .collect();
    format!("{ORDER_NUMBER_PREFIX}-{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn happy_path_is_allowed() {
        let path = [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Refunded,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn skipping_steps_is_rejected() {
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Shipped));
        assert!(!OrderStatus::Confirmed.can_transition_to(OrderStatus::Delivered));
    }

    #[test]
    fn shipped_orders_cannot_be_cancelled() {
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn terminal_statuses() {
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(OrderStatus::Refunded.is_terminal());
        assert!(!OrderStatus::Delivered.is_terminal());
    }

    #[test]
    fn self_transition_is_rejected() {
        for status in OrderStatus::ALL {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn validate_transition_reports_conflict() {
        let err = validate_transition("pending", OrderStatus::Delivered).unwrap_err();
        assert_matches!(err, CoreError::Conflict(_));
    }

    #[test]
    fn validate_transition_rejects_unknown_stored_status() {
        let err = validate_transition("lost", OrderStatus::Confirmed).unwrap_err();
        assert_matches!(err, CoreError::Internal(_));
    }

    #[test]
    fn parse_status_lists_valid_values() {
        let err = parse_status("teleported").unwrap_err();
        assert!(err.to_string().contains("pending, confirmed"));
        assert_eq!(parse_status("shipped").unwrap(), OrderStatus::Shipped);
    }

    #[test]
    fn order_number_format() {
        let number = generate_order_number();
        assert!(number.starts_with("KCT-"));
        assert_eq!(number.len(), 4 + ORDER_NUMBER_LEN);
        assert!(number[4..]
            .bytes()
            .all(|b| ORDER_NUMBER_ALPHABET.contains(&b)));
    }
}
