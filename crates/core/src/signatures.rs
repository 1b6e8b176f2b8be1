//! Inbound webhook signature verification (Shopify, Stripe, EasyPost).
//!
//! All three providers sign the raw request body with HMAC-SHA256 and differ
//! only in how the digest is encoded and what else is mixed in:
//!
//! | Provider | Header                   | Signed payload      | Encoding              |
//! |----------|--------------------------|---------------------|-----------------------|
//! | Shopify  | `X-Shopify-Hmac-Sha256`  | body                | base64                |
//! | Stripe   | `Stripe-Signature`       | `"{t}.{body}"`      | hex, `t=..,v1=..`     |
//! | EasyPost | `X-Hmac-Signature`       | body                | `hmac-sha256-hex=...` |
//!
//! Provided signatures are decoded and checked with `Mac::verify_slice`,
//! which compares in constant time.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Maximum age of a Stripe signature timestamp, in seconds.
pub const STRIPE_TOLERANCE_SECS: i64 = 300;

/// Prefix EasyPost puts in front of the hex digest.
const EASYPOST_PREFIX: &str = "hmac-sha256-hex=";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("Signature header is missing")]
    Missing,

    #[error("Signature header is malformed")]
    Malformed,

    #[error("Signature does not match payload")]
    Mismatch,

    #[error("Signature timestamp is outside the tolerance window")]
    Expired,
}

// ---------------------------------------------------------------------------
// HMAC primitives
// ---------------------------------------------------------------------------

fn keyed_mac(secret: &[u8], payload: &[u8]) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(payload);
    mac
}

/// Raw HMAC-SHA256 digest of `payload` under `secret`.
pub fn hmac_sha256(secret: &[u8], payload: &[u8]) -> Vec<u8> {
    keyed_mac(secret, payload).finalize().into_bytes().to_vec()
}

/// Constant-time check of a decoded digest against `payload` under `secret`.
fn digest_matches(secret: &str, payload: &[u8], provided: &[u8]) -> bool {
    keyed_mac(secret.as_bytes(), payload).verify_slice(provided).is_ok()
}

/// Lowercase-hex HMAC-SHA256 signature (outbound and test helper).
pub fn compute_hex_signature(secret: &str, payload: &[u8]) -> String {
    encoding::hex(&hmac_sha256(secret.as_bytes(), payload))
}

/// Base64 HMAC-SHA256 signature, as Shopify sends it.
pub fn compute_shopify_signature(secret: &str, body: &[u8]) -> String {
    BASE64.encode(hmac_sha256(secret.as_bytes(), body))
}

/// Build a `Stripe-Signature` header value for a body at a given time.
pub fn compute_stripe_header(secret: &str, body: &[u8], timestamp: i64) -> String {
    let signed = stripe_signed_payload(timestamp, body);
    format!(
        "t={timestamp},v1={}",
        compute_hex_signature(secret, &signed)
    )
}

/// Build an `X-Hmac-Signature` header value as EasyPost sends it.
pub fn compute_easypost_header(secret: &str, body: &[u8]) -> String {
    format!("{EASYPOST_PREFIX}{}", compute_hex_signature(secret, body))
}

fn stripe_signed_payload(timestamp: i64, body: &[u8]) -> Vec<u8> {
    let mut signed = format!("{timestamp}.").into_bytes();
    signed.extend_from_slice(body);
    signed
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Verify a Shopify webhook.
pub fn verify_shopify(secret: &str, body: &[u8], header: Option<&str>) -> Result<(), SignatureError> {
    let header = header.map(str::trim).filter(|h| !h.is_empty()).ok_or(SignatureError::Missing)?;
    let provided = BASE64.decode(header).map_err(|_| SignatureError::Malformed)?;
    if digest_matches(secret, body, &provided) {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// Verify a Stripe webhook at wall-clock time `now` (unix seconds).
///
/// Any of the `v1` entries may match; Stripe sends several while a signing
/// secret is being rolled.
pub fn verify_stripe(
    secret: &str,
    body: &[u8],
    header: Option<&str>,
    now: i64,
    tolerance_secs: i64,
) -> Result<(), SignatureError> {
    let header = header.filter(|h| !h.trim().is_empty()).ok_or(SignatureError::Missing)?;

    let mut timestamp: Option<i64> = None;
    let mut signatures: Vec<&str> = Vec::new();
    for part in header.split(',') {
        let (key, value) = part.trim().split_once('=').ok_or(SignatureError::Malformed)?;
        match key {
            "t" => timestamp = Some(value.parse().map_err(|_| SignatureError::Malformed)?),
            "v1" => signatures.push(value),
            _ => {}
        }
    }
    let timestamp = timestamp.ok_or(SignatureError::Malformed)?;
    if signatures.is_empty() {
        return Err(SignatureError::Malformed);
    }

    if (now - timestamp).abs() > tolerance_secs {
        return Err(SignatureError::Expired);
    }

    let signed = stripe_signed_payload(timestamp, body);
    if signatures.iter().any(|sig| {
        encoding::decode_hex(sig).is_some_and(|provided| digest_matches(secret, &signed, &provided))
    }) {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// Verify an EasyPost webhook.
pub fn verify_easypost(secret: &str, body: &[u8], header: Option<&str>) -> Result<(), SignatureError> {
    let header = header.map(str::trim).filter(|h| !h.is_empty()).ok_or(SignatureError::Missing)?;
    let provided = header
        .strip_prefix(EASYPOST_PREFIX)
        .and_then(encoding::decode_hex)
        .ok_or(SignatureError::Malformed)?;
    if digest_matches(secret, body, &provided) {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

// ---------------------------------------------------------------------------
// Hex helpers (no extra dep)
// ---------------------------------------------------------------------------

mod encoding {
    /// Encode bytes as a lowercase hex string.
    pub fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Decode a hex string of either case. `None` on odd length or a
    /// non-hex digit.
    pub fn decode_hex(text: &str) -> Option<Vec<u8>> {
        if text.len() % 2 != 0 || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        text.as_bytes()
            .chunks(2)
            .map(|pair| {
                let digits = std::str::from_utf8(pair).ok()?;
                u8::from_str_radix(digits, 16).ok()
            })
            .collect()
    }
}
