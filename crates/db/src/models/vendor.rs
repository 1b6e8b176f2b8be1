//! Vendor (Shopify) mirror models and sync run history.

use kct_core::types::{Cents, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `vendor_products` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VendorProduct {
    pub id: DbId,
    pub shopify_product_id: i64,
    pub title: String,
    pub handle: Option<String>,
    pub vendor: Option<String>,
    pub product_type: Option<String>,
    pub status: Option<String>,
    pub tags: Vec<String>,
    pub description_html: Option<String>,
    pub shopify_updated_at: Option<Timestamp>,
    pub import_status: String,
    pub imported_product_id: Option<DbId>,
    pub override_title: Option<String>,
    pub override_price_cents: Option<Cents>,
    pub decided_at: Option<Timestamp>,
    pub synced_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `vendor_variants` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VendorVariant {
    pub id: DbId,
    pub shopify_variant_id: i64,
    pub shopify_product_id: i64,
    pub title: String,
    pub sku: Option<String>,
    pub price_cents: Cents,
    pub size: Option<String>,
    pub color: Option<String>,
    pub inventory_item_id: Option<i64>,
    pub inventory_quantity: i32,
    pub synced_at: Timestamp,
}

/// A row from the `vendor_images` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VendorImage {
    pub id: DbId,
    pub shopify_image_id: i64,
    pub shopify_product_id: i64,
    pub src: String,
    pub alt_text: Option<String>,
    pub position: i32,
    pub synced_at: Timestamp,
}

/// A vendor product with its variants and images.
#[derive(Debug, Clone, Serialize)]
pub struct VendorProductDetail {
    #[serde(flatten)]
    pub product: VendorProduct,
    pub variants: Vec<VendorVariant>,
    pub images: Vec<VendorImage>,
}

/// Flattened product row produced by the catalog transform, keyed by
/// `shopify_product_id` on upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVendorProduct {
    pub shopify_product_id: i64,
    pub title: String,
    pub handle: Option<String>,
    pub vendor: Option<String>,
    pub product_type: Option<String>,
    pub status: Option<String>,
    pub tags: Vec<String>,
    pub description_html: Option<String>,
    pub shopify_updated_at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewVendorVariant {
    pub shopify_variant_id: i64,
    pub shopify_product_id: i64,
    pub title: String,
    pub sku: Option<String>,
    pub price_cents: Cents,
    pub size: Option<String>,
    pub color: Option<String>,
    pub inventory_item_id: Option<i64>,
    pub inventory_quantity: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewVendorImage {
    pub shopify_image_id: i64,
    pub shopify_product_id: i64,
    pub src: String,
    pub alt_text: Option<String>,
    pub position: i32,
}

/// Admin import decision body.
#[derive(Debug, Clone, Deserialize)]
pub struct DecideVendorProduct {
    pub decision: String,
    pub override_title: Option<String>,
    pub override_price_cents: Option<Cents>,
}

/// A row from the `vendor_sync_runs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VendorSyncRun {
    pub id: DbId,
    pub kind: String,
    pub status: String,
    pub pages: i32,
    pub products_upserted: i32,
    pub variants_upserted: i32,
    pub images_upserted: i32,
    pub last_cursor: Option<String>,
    pub error: Option<String>,
    pub started_at: Timestamp,
    pub finished_at: Option<Timestamp>,
}

/// Counters written after each committed sync page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncCounters {
    pub pages: i32,
    pub products_upserted: i32,
    pub variants_upserted: i32,
    pub images_upserted: i32,
}
