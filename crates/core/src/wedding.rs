//! Wedding-party rules: invitation codes, measurement workflow, member payment.

use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Invitations
// ---------------------------------------------------------------------------

/// Invitation is waiting for the groomsman to accept it.
pub const INVITATION_PENDING: &str = "pending";

/// Invitation was accepted and produced a party member.
pub const INVITATION_ACCEPTED: &str = "accepted";

/// Invitation was withdrawn by the couple or coordinator.
pub const INVITATION_REVOKED: &str = "revoked";

/// Valid shape of a normalized invitation code.
const INVITE_CODE_PATTERN: &str = r"^[A-Z0-9-]{6,32}$";

static INVITE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(INVITE_CODE_PATTERN).expect("valid regex"));

/// Characters used for generated codes (no 0/O or 1/I look-alikes).
const INVITE_CODE_ALPHABET: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";

/// Length of a generated invitation code.
pub const INVITE_CODE_LEN: usize = 8;

/// Trim and upper-case a code, then check its shape.
///
/// Codes are typed by hand from printed cards, so `" abc-123 "` and
/// `"ABC-123"` must resolve to the same invitation.
pub fn normalize_invite_code(raw: &str) -> Result<String, CoreError> {
    let code = raw.trim().to_ascii_uppercase();
    if !INVITE_CODE_RE.is_match(&code) {
        return Err(CoreError::Validation(
            "invite_code must be 6-32 characters of A-Z, 0-9 or '-'".into(),
        ));
    }
    Ok(code)
}

/// Generate a fresh invitation code.
pub fn generate_invite_code() -> String {
    let mut rng = rand::rng();
    (0..INVITE_CODE_LEN)
        .map(|_| INVITE_CODE_ALPHABET[rng.random_range(0..INVITE_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Why an invitation cannot be used right now, if anything.
pub fn invitation_blocker(status: &str, expired: bool) -> Option<String> {
    match status {
        INVITATION_PENDING if expired => Some("Invitation has expired".into()),
        INVITATION_PENDING => None,
        INVITATION_ACCEPTED => Some("Invitation has already been accepted".into()),
        INVITATION_REVOKED => Some("Invitation has been revoked".into()),
        other => Some(format!("Invitation is not usable (status '{other}')")),
    }
}

// ---------------------------------------------------------------------------
// Measurement workflow
// ---------------------------------------------------------------------------

/// Measurement status of a party member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementStatus {
    Pending,
    Submitted,
    Approved,
}

impl MeasurementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Submitted => "submitted",
            Self::Approved => "approved",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "submitted" => Some(Self::Submitted),
            "approved" => Some(Self::Approved),
            _ => None,
        }
    }
}

impl std::fmt::Display for MeasurementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A member may (re)submit measurements until they have been approved.
pub fn validate_can_submit(current: &str) -> Result<(), CoreError> {
    match MeasurementStatus::parse(current) {
        Some(MeasurementStatus::Pending | MeasurementStatus::Submitted) => Ok(()),
        Some(MeasurementStatus::Approved) => Err(CoreError::Conflict(
            "Measurements were already approved and can no longer be changed".into(),
        )),
        None => Err(CoreError::Internal(format!(
            "Unknown stored measurement status '{current}'"
        ))),
    }
}

/// Only submitted measurements can be reviewed. Returns the member's next
/// status for the given decision.
pub fn review_outcome(current: &str, approved: bool) -> Result<MeasurementStatus, CoreError> {
    match MeasurementStatus::parse(current) {
        Some(MeasurementStatus::Submitted) => Ok(if approved {
            MeasurementStatus::Approved
        } else {
            MeasurementStatus::Pending
        }),
        Some(other) => Err(CoreError::Conflict(format!(
            "Only submitted measurements can be reviewed (member is '{other}')"
        ))),
        None => Err(CoreError::Internal(format!(
            "Unknown stored measurement status '{current}'"
        ))),
    }
}

/// Stored status of a measurement record after review.
pub const MEASUREMENT_RECORD_SUBMITTED: &str = "submitted";
pub const MEASUREMENT_RECORD_APPROVED: &str = "approved";
pub const MEASUREMENT_RECORD_REJECTED: &str = "rejected";

/// Numeric measurement fields accepted from the portal, in inches.
pub const MEASUREMENT_FIELDS: &[&str] = &[
    "chest", "waist", "hips", "neck", "sleeve", "inseam", "outseam", "shoulder", "height",
    "weight",
];

/// Plausible upper bound for any single measurement value.
const MAX_MEASUREMENT_VALUE: f64 = 400.0;

/// Validate a measurement payload.
///
/// Must be an object with at least one known numeric field. Values must be
/// positive and plausible. A free-text `notes` string is allowed; any other key
/// is rejected so typos do not silently disappear.
pub fn validate_measurements(value: &serde_json::Value) -> Result<(), CoreError> {
    let obj = value
        .as_object()
        .ok_or_else(|| CoreError::Validation("measurements must be an object".into()))?;

    let mut numeric_fields = 0;
    for (key, v) in obj {
        if key == "notes" {
            if !v.is_string() && !v.is_null() {
                return Err(CoreError::Validation("notes must be a string".into()));
            }
            continue;
        }
        if !MEASUREMENT_FIELDS.contains(&key.as_str()) {
            return Err(CoreError::Validation(format!(
                "Unknown measurement field '{key}'"
            )));
        }
        let n = v.as_f64().ok_or_else(|| {
            CoreError::Validation(format!("Measurement '{key}' must be a number"))
        })?;
        if !(n > 0.0 && n <= MAX_MEASUREMENT_VALUE) {
            return Err(CoreError::Validation(format!(
                "Measurement '{key}' must be between 0 and {MAX_MEASUREMENT_VALUE}"
            )));
        }
        numeric_fields += 1;
    }

    if numeric_fields == 0 {
        return Err(CoreError::Validation(
            "measurements must include at least one value".into(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Member payment
// ---------------------------------------------------------------------------

pub const MEMBER_UNPAID: &str = "unpaid";
pub const MEMBER_PAID: &str = "paid";

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn invite_code_is_trimmed_and_uppercased() {
        assert_eq!(normalize_invite_code("  abc-123 ").unwrap(), "ABC-123");
    }

    #[test]
    fn invite_code_shape_enforced() {
        assert!(normalize_invite_code("ab1").is_err());
        assert!(normalize_invite_code("ABC 1234").is_err());
        assert!(normalize_invite_code("ABC_1234").is_err());
    }

    #[test]
    fn generated_codes_are_valid() {
        for _ in 0..20 {
            let code = generate_invite_code();
            assert_eq!(normalize_invite_code(&code).unwrap(), code);
        }
    }

    #[test]
    fn blocker_for_each_status() {
        assert_eq!(invitation_blocker(INVITATION_PENDING, false), None);
        assert!(invitation_blocker(INVITATION_PENDING, true)
            .unwrap()
            .contains("expired"));
        assert!(invitation_blocker(INVITATION_ACCEPTED, false).is_some());
        assert!(invitation_blocker(INVITATION_REVOKED, false).is_some());
    }

    #[test]
    fn submit_allowed_until_approved() {
        assert!(validate_can_submit("pending").is_ok());
        assert!(validate_can_submit("submitted").is_ok());
        assert_matches!(validate_can_submit("approved"), Err(CoreError::Conflict(_)));
    }

    #[test]
    fn review_requires_submitted() {
        assert_eq!(review_outcome("submitted", true).unwrap(), MeasurementStatus::Approved);
        assert_eq!(review_outcome("submitted", false).unwrap(), MeasurementStatus::Pending);
        assert_matches!(review_outcome("pending", true), Err(CoreError::Conflict(_)));
    }

    #[test]
    fn measurements_accept_known_fields() {
        assert!(validate_measurements(&json!({"chest": 40, "waist": 34.5, "notes": "slim"})).is_ok());
    }

    #[test]
    fn measurements_reject_unknown_and_bad_values() {
        assert!(validate_measurements(&json!({"chset": 40})).is_err());
        assert!(validate_measurements(&json!({"chest": -1})).is_err());
        assert!(validate_measurements(&json!({"chest": "forty"})).is_err());
        assert!(validate_measurements(&json!({"notes": "only notes"})).is_err());
        assert!(validate_measurements(&json!([40, 34])).is_err());
    }
}
