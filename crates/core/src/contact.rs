//! Customer contact details entered on the storefront and the portal.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

/// Loose shape check; deliverability is the mail provider's problem.
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid regex"));

const MAX_EMAIL_LEN: usize = 254;
const MAX_NAME_LEN: usize = 100;

/// Trim an email address and check its shape. Returns the trimmed value.
pub fn validate_email(field: &str, email: &str) -> Result<String, CoreError> {
    let email = email.trim();
    if email.len() > MAX_EMAIL_LEN || !EMAIL_RE.is_match(email) {
        return Err(CoreError::Validation(format!(
            "{field} must be a valid email address"
        )));
    }
    Ok(email.to_string())
}

/// Require a non-empty name of sensible length. Returns the trimmed value.
pub fn validate_name(field: &str, name: &str) -> Result<String, CoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be empty")));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "{field} must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_trimmed() {
        assert_eq!(
            validate_email("email", "  best.man@example.com ").unwrap(),
            "best.man@example.com"
        );
    }

    #[test]
    fn malformed_emails_rejected() {
        for bad in ["", "no-at-sign", "a@b", "two@@example.com", "sp ace@example.com"] {
            assert!(validate_email("email", bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn blank_names_rejected() {
        assert!(validate_name("first_name", "   ").is_err());
        assert_eq!(validate_name("first_name", " Jordan ").unwrap(), "Jordan");
    }
}
