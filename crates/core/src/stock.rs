//! Stock levels, stock status derivation and reservation timing.
//!
//! `stock_status` is stored on `product_variants` for cheap filtering, but it
//! is always derived through [`compute_stock_status`] so every writer (admin
//! edits, webhooks, inventory sync, low-stock scan) agrees on the result.

use chrono::Duration;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// How long a checkout reservation holds stock.
pub const RESERVATION_TTL_MINUTES: i64 = 15;

/// Threshold applied to variants created without an explicit one.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 5;

/// Upper bound for manually entered stock counts.
pub const MAX_STOCK_QUANTITY: i32 = 1_000_000;

/// Reservation lifetime as a [`chrono::Duration`].
pub fn reservation_ttl() -> Duration {
    Duration::minutes(RESERVATION_TTL_MINUTES)
}

// ---------------------------------------------------------------------------
// Stock status
// ---------------------------------------------------------------------------

/// Derived availability bucket for a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
}

impl StockStatus {
    /// Return the string stored in `product_variants.stock_status`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InStock => "in_stock",
            Self::LowStock => "low_stock",
            Self::OutOfStock => "out_of_stock",
        }
    }

    /// Parse a stored status string.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "in_stock" => Some(Self::InStock),
            "low_stock" => Some(Self::LowStock),
            "out_of_stock" => Some(Self::OutOfStock),
            _ => None,
        }
    }
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive the stock status for an on-hand quantity and a threshold.
///
/// Zero (or negative, which can happen transiently after a Shopify
/// oversell) is out of stock; anything at or below the threshold is low.
pub fn compute_stock_status(available_quantity: i32, low_stock_threshold: i32) -> StockStatus {
    if available_quantity <= 0 {
        StockStatus::OutOfStock
    } else if available_quantity <= low_stock_threshold {
        StockStatus::LowStock
    } else {
        StockStatus::InStock
    }
}

/// Whether a variant breaches its low-stock threshold (the scan criterion).
pub fn is_low_stock(available_quantity: i32, low_stock_threshold: i32) -> bool {
    available_quantity <= low_stock_threshold
}

/// Quantity that can still be promised to a new checkout.
pub fn effective_available(available: i32, committed: i32, reserved: i64) -> i64 {
    (i64::from(available) - i64::from(committed) - reserved).max(0)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a manually entered stock quantity.
pub fn validate_stock_quantity(quantity: i32) -> Result<(), CoreError> {
    if !(0..=MAX_STOCK_QUANTITY).contains(&quantity) {
        return Err(CoreError::Validation(format!(
            "available_quantity must be between 0 and {MAX_STOCK_QUANTITY}, got {quantity}"
        )));
    }
    Ok(())
}

/// Validate a low-stock threshold.
pub fn validate_threshold(threshold: i32) -> Result<(), CoreError> {
    if threshold < 0 {
        return Err(CoreError::Validation(format!(
            "low_stock_threshold must not be negative, got {threshold}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_out_of_stock() {
        assert_eq!(compute_stock_status(0, 5), StockStatus::OutOfStock);
        assert_eq!(compute_stock_status(-2, 5), StockStatus::OutOfStock);
    }

    #[test]
    fn at_threshold_is_low_stock() {
        assert_eq!(compute_stock_status(5, 5), StockStatus::LowStock);
        assert_eq!(compute_stock_status(1, 5), StockStatus::LowStock);
    }

    #[test]
    fn above_threshold_is_in_stock() {
        assert_eq!(compute_stock_status(6, 5), StockStatus::InStock);
    }

    #[test]
    fn zero_threshold_only_flags_empty_stock() {
        assert_eq!(compute_stock_status(1, 0), StockStatus::InStock);
        assert!(is_low_stock(0, 0));
        assert!(!is_low_stock(1, 0));
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            StockStatus::InStock,
            StockStatus::LowStock,
            StockStatus::OutOfStock,
        ] {
            assert_eq!(StockStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(StockStatus::parse("discontinued"), None);
    }

    #[test]
    fn effective_available_subtracts_holds() {
        assert_eq!(effective_available(10, 2, 3), 5);
    }

    #[test]
    fn effective_available_never_negative() {
        assert_eq!(effective_available(2, 1, 4), 0);
    }

    #[test]
    fn reservation_ttl_is_fifteen_minutes() {
        assert_eq!(reservation_ttl().num_minutes(), 15);
    }

    #[test]
    fn negative_quantity_rejected() {
        assert!(validate_stock_quantity(-1).is_err());
        assert!(validate_stock_quantity(0).is_ok());
        assert!(validate_stock_quantity(MAX_STOCK_QUANTITY + 1).is_err());
    }

    #[test]
    fn negative_threshold_rejected() {
        assert!(validate_threshold(-1).is_err());
        assert!(validate_threshold(0).is_ok());
    }
}
