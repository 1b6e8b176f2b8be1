//! Vendor (Shopify) catalog constants, id/price parsing and import decisions.

use crate::error::CoreError;
use crate::types::Cents;

// ---------------------------------------------------------------------------
// Sync constants
// ---------------------------------------------------------------------------

/// Products requested per GraphQL page.
pub const CATALOG_PAGE_SIZE: u32 = 100;

/// Inventory item ids per inventory-level request.
pub const INVENTORY_CHUNK_SIZE: usize = 50;

/// Default pause between catalog pages, in milliseconds.
pub const DEFAULT_PAGE_DELAY_MS: u64 = 500;

pub const SYNC_KIND_CATALOG: &str = "catalog";
pub const SYNC_KIND_INVENTORY: &str = "inventory";

pub const SYNC_RUNNING: &str = "running";
pub const SYNC_COMPLETED: &str = "completed";
pub const SYNC_FAILED: &str = "failed";

// ---------------------------------------------------------------------------
// Import decisions
// ---------------------------------------------------------------------------

pub const IMPORT_PENDING: &str = "pending";
pub const IMPORT_IMPORTED: &str = "imported";
pub const IMPORT_SKIPPED: &str = "skipped";

pub const VALID_IMPORT_STATUSES: &[&str] = &[IMPORT_PENDING, IMPORT_IMPORTED, IMPORT_SKIPPED];

/// Admin decision on a vendor product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportDecision {
    Import,
    Skip,
}

impl ImportDecision {
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "import" => Ok(Self::Import),
            "skip" => Ok(Self::Skip),
            other => Err(CoreError::Validation(format!(
                "Invalid decision '{other}'. Must be one of: import, skip"
            ))),
        }
    }

    /// `import_status` written for this decision.
    pub fn resulting_status(&self) -> &'static str {
        match self {
            Self::Import => IMPORT_IMPORTED,
            Self::Skip => IMPORT_SKIPPED,
        }
    }
}

/// Validate an `import_status` list filter.
pub fn validate_import_status(status: &str) -> Result<(), CoreError> {
    if VALID_IMPORT_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid import_status '{status}'. Must be one of: {}",
            VALID_IMPORT_STATUSES.join(", ")
        )))
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Extract the numeric id from a Shopify GID such as
/// `gid://shopify/ProductVariant/4242`.
///
/// The resource type must match `resource` exactly.
pub fn parse_gid(gid: &str, resource: &str) -> Option<i64> {
    let rest = gid.strip_prefix("gid://shopify/")?;
    let (kind, id) = rest.split_once('/')?;
    if kind != resource {
        return None;
    }
    // Some GIDs carry a query suffix (`.../123?inventory=true`).
    let id = id.split('?').next()?;
    id.parse().ok().filter(|n: &i64| *n > 0)
}

/// Build a GID from a numeric id.
pub fn format_gid(resource: &str, id: i64) -> String {
    format!("gid://shopify/{resource}/{id}")
}

/// Convert a Shopify decimal money string (`"129.99"`, `"45"`, `"12.5"`) to
/// cents. Returns `None` for negative or malformed input.
pub fn price_to_cents(price: &str) -> Option<Cents> {
    let price = price.trim();
    let (whole, frac) = match price.split_once('.') {
        Some((w, f)) => (w, f),
        None => (price, ""),
    };
    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if frac.len() > 2 || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let whole: Cents = whole.parse().ok()?;
    let frac: Cents = match frac.len() {
        0 => 0,
        1 => frac.parse::<Cents>().ok()? * 10,
        _ => frac.parse().ok()?,
    };
    whole.checked_mul(100)?.checked_add(frac)
}

/// Derive a URL handle from a title: lowercase ASCII words joined by `-`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Validate an admin price override.
pub fn validate_override_price(price_cents: Cents) -> Result<(), CoreError> {
    if price_cents <= 0 {
        return Err(CoreError::Validation(format!(
            "override_price_cents must be positive, got {price_cents}"
        )));
    }
    Ok(())
}
