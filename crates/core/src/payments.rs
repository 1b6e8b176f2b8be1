//! Payment types, amount rules and Stripe metadata.

use std::collections::BTreeMap;

use crate::error::CoreError;
use crate::types::{Cents, DbId};

/// Currency for every charge.
pub const DEFAULT_CURRENCY: &str = "usd";

/// Smallest amount Stripe accepts for a USD charge.
pub const MIN_CHARGE_CENTS: Cents = 50;

/// Largest single charge the backend will create ($50,000).
pub const MAX_CHARGE_CENTS: Cents = 5_000_000;

/// Maximum number of members covered by one group payment.
pub const MAX_GROUP_MEMBERS: usize = 30;

// Payment row statuses.
pub const PAYMENT_PENDING: &str = "pending";
pub const PAYMENT_SUCCEEDED: &str = "succeeded";
pub const PAYMENT_FAILED: &str = "failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentType {
    /// One member's outfit, or one order.
    Individual,
    /// Several members' outfits paid by one person.
    GroupPayment,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::GroupPayment => "group_payment",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "individual" => Ok(Self::Individual),
            "group_payment" => Ok(Self::GroupPayment),
            other => Err(CoreError::Validation(format!(
                "Invalid payment_type '{other}'. Must be one of: individual, group_payment"
            ))),
        }
    }
}

impl std::fmt::Display for PaymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check a charge amount against Stripe's minimum and our maximum.
pub fn validate_amount(amount: Cents) -> Result<(), CoreError> {
    if amount < MIN_CHARGE_CENTS {
        return Err(CoreError::Validation(format!(
            "Amount must be at least {MIN_CHARGE_CENTS} cents, got {amount}"
        )));
    }
    if amount > MAX_CHARGE_CENTS {
        return Err(CoreError::Validation(format!(
            "Amount must be at most {MAX_CHARGE_CENTS} cents, got {amount}"
        )));
    }
    Ok(())
}

/// Validate the member list for a payment of the given type.
pub fn validate_member_ids(payment_type: PaymentType, member_ids: &[DbId]) -> Result<(), CoreError> {
    let mut sorted = member_ids.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    if sorted.len() != member_ids.len() {
        return Err(CoreError::Validation("member_ids must not repeat".into()));
    }
    match payment_type {
        PaymentType::Individual if member_ids.len() > 1 => Err(CoreError::Validation(
            "An individual payment covers at most one member".into(),
        )),
        PaymentType::GroupPayment if member_ids.is_empty() => Err(CoreError::Validation(
            "A group payment needs at least one member".into(),
        )),
        PaymentType::GroupPayment if member_ids.len() > MAX_GROUP_MEMBERS => {
            Err(CoreError::Validation(format!(
                "A group payment covers at most {MAX_GROUP_MEMBERS} members"
            )))
        }
        _ => Ok(()),
    }
}

/// Sum the per-member outfit prices of a group payment.
pub fn group_total(member_amounts: &[Cents]) -> Result<Cents, CoreError> {
    member_amounts.iter().try_fold(0 as Cents, |acc, amount| {
        if *amount < 0 {
            return Err(CoreError::Internal(format!(
                "Negative member amount {amount}"
            )));
        }
        acc.checked_add(*amount)
            .ok_or_else(|| CoreError::Validation("Payment total overflows".into()))
    })
}

/// Metadata attached to the Stripe payment intent.
///
/// The Stripe webhook reads these keys back to find what was paid for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentContext {
    pub payment_type: PaymentType,
    pub wedding_id: Option<DbId>,
    pub order_id: Option<DbId>,
    pub member_ids: Vec<DbId>,
}

impl IntentContext {
    pub fn to_metadata(&self) -> BTreeMap<String, String> {
        let mut metadata = BTreeMap::new();
        metadata.insert("payment_type".to_string(), self.payment_type.to_string());
        if let Some(wedding_id) = self.wedding_id {
            metadata.insert("wedding_id".to_string(), wedding_id.to_string());
        }
        if let Some(order_id) = self.order_id {
            metadata.insert("order_id".to_string(), order_id.to_string());
        }
        if !self.member_ids.is_empty() {
            let ids: Vec<String> = self.member_ids.iter().map(|id| id.to_string()).collect();
            metadata.insert("member_ids".to_string(), ids.join(","));
            metadata.insert("member_count".to_string(), self.member_ids.len().to_string());
        }
        metadata
    }
}

/// Parse the `member_ids` metadata value written by [`IntentContext::to_metadata`].
pub fn parse_member_ids(value: &str) -> Vec<DbId> {
    value
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect()
}
