//! Product and variant models, plus rows of the effective-availability view.

use kct_core::types::{Cents, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `products` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Product {
    pub id: DbId,
    pub name: String,
    pub handle: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub base_price_cents: Cents,
    pub vendor: Option<String>,
    pub is_active: bool,
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a product.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProduct {
    pub name: String,
    pub handle: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub base_price_cents: Cents,
    pub vendor: Option<String>,
}

/// A row from the `product_variants` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProductVariant {
    pub id: DbId,
    pub product_id: DbId,
    pub sku: String,
    pub size: Option<String>,
    pub color: Option<String>,
    pub price_cents: Cents,
    pub available_quantity: i32,
    pub committed_quantity: i32,
    pub low_stock_threshold: i32,
    pub stock_status: String,
    pub vendor_variant_id: Option<i64>,
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a variant.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductVariant {
    pub product_id: DbId,
    pub sku: String,
    pub size: Option<String>,
    pub color: Option<String>,
    pub price_cents: Cents,
    pub available_quantity: i32,
    pub low_stock_threshold: Option<i32>,
    pub vendor_variant_id: Option<i64>,
}

/// DTO for the admin stock edit. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateVariantStock {
    pub available_quantity: Option<i32>,
    pub low_stock_threshold: Option<i32>,
}

/// A row of `v_product_variants_effective`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EffectiveVariant {
    pub variant_id: DbId,
    pub product_id: DbId,
    pub product_name: String,
    pub sku: String,
    pub size: Option<String>,
    pub color: Option<String>,
    pub price_cents: Cents,
    pub available_quantity: i32,
    pub committed_quantity: i32,
    pub reserved_quantity: i64,
    pub effective_available: i64,
    pub low_stock_threshold: i32,
    pub stock_status: String,
    pub updated_at: Timestamp,
}

/// Minimal variant facts the low-stock scan needs.
#[derive(Debug, Clone, FromRow)]
pub struct StockLevel {
    pub id: DbId,
    pub sku: String,
    pub product_name: String,
    pub available_quantity: i32,
    pub low_stock_threshold: i32,
}
