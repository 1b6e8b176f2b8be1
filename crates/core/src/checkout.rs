//! Checkout line-item validation and per-item availability decisions.
//!
//! The reservation repository locks the variant rows, reads their effective
//! availability and hands each item to [`check_item`]. The batch is valid only
//! when every item is; otherwise no reservation is written at all.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

/// Maximum quantity of a single variant in one checkout.
pub const MAX_ITEM_QUANTITY: i32 = 100;

/// Maximum number of distinct variants in one checkout.
pub const MAX_LINE_ITEMS: usize = 50;

/// Maximum length of a client-supplied checkout session id.
pub const MAX_SESSION_ID_LEN: usize = 128;

/// Reason reported when the variant does not exist or was deleted.
pub const REASON_NOT_FOUND: &str = "variant_not_found";

/// Reason reported when the requested quantity exceeds availability.
pub const REASON_INSUFFICIENT: &str = "insufficient_stock";

/// One requested `(variant, quantity)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub variant_id: DbId,
    pub quantity: i32,
}

/// Outcome of checking one line item against effective availability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemCheck {
    pub variant_id: DbId,
    pub requested: i32,
    pub available: i64,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

/// Validate a checkout session id.
pub fn validate_session_id(session_id: &str) -> Result<(), CoreError> {
    let trimmed = session_id.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("session_id must not be empty".into()));
    }
    if trimmed.len() > MAX_SESSION_ID_LEN {
        return Err(CoreError::Validation(format!(
            "session_id must be at most {MAX_SESSION_ID_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate requested items and merge duplicates.
///
/// Quantities for a repeated `variant_id` are summed. The result is sorted by
/// `variant_id` ascending, which is also the order rows are locked in.
pub fn normalize_line_items(items: &[LineItem]) -> Result<Vec<LineItem>, CoreError> {
    if items.is_empty() {
        return Err(CoreError::Validation("items must not be empty".into()));
    }

    let mut merged: BTreeMap<DbId, i32> = BTreeMap::new();
    for item in items {
        if item.quantity < 1 {
            return Err(CoreError::Validation(format!(
                "quantity for variant {} must be at least 1",
                item.variant_id
            )));
        }
        let total = merged.entry(item.variant_id).or_insert(0);
        *total = total.saturating_add(item.quantity);
        if *total > MAX_ITEM_QUANTITY {
            return Err(CoreError::Validation(format!(
                "quantity for variant {} must be at most {MAX_ITEM_QUANTITY}",
                item.variant_id
            )));
        }
    }

    if merged.len() > MAX_LINE_ITEMS {
        return Err(CoreError::Validation(format!(
            "a checkout may contain at most {MAX_LINE_ITEMS} distinct variants"
        )));
    }

    Ok(merged
        .into_iter()
        .map(|(variant_id, quantity)| LineItem {
            variant_id,
            quantity,
        })
        .collect())
}

/// Decide whether one item can be reserved.
///
/// `effective_available` is `None` when the variant is unknown or deleted.
pub fn check_item(item: LineItem, effective_available: Option<i64>) -> ItemCheck {
    match effective_available {
        None => ItemCheck {
            variant_id: item.variant_id,
            requested: item.quantity,
            available: 0,
            valid: false,
            reason: Some(REASON_NOT_FOUND),
        },
        Some(available) => {
            let valid = i64::from(item.quantity) <= available;
            ItemCheck {
                variant_id: item.variant_id,
                requested: item.quantity,
                available,
                valid,
                reason: (!valid).then_some(REASON_INSUFFICIENT),
            }
        }
    }
}

/// A batch is reservable only if every item is.
pub fn batch_is_valid(checks: &[ItemCheck]) -> bool {
    !checks.is_empty() && checks.iter().all(|c| c.valid)
}
