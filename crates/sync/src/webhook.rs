//! Shopify webhook payloads (REST shape) applied to the vendor mirror.
//!
//! Webhooks carry numeric ids and `option1..3` columns instead of GIDs and
//! selected options, so they get their own flattening.

use chrono::{DateTime, Utc};
use kct_core::vendor::price_to_cents;
use kct_db::models::vendor::{NewVendorImage, NewVendorProduct, NewVendorVariant};
use kct_db::repositories::VendorRepo;
use kct_integrations::catalog::InventoryLevel;
use kct_integrations::CatalogSource;
use serde::Deserialize;
use sqlx::PgPool;

use crate::inventory::apply_levels;
use crate::transform::TransformedProduct;
use crate::SyncError;

/// `products/create` and `products/update` body.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductPayload {
    pub id: i64,
    pub title: String,
    pub handle: Option<String>,
    pub vendor: Option<String>,
    pub product_type: Option<String>,
    pub status: Option<String>,
    /// Comma separated.
    #[serde(default)]
    pub tags: String,
    pub body_html: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub options: Vec<OptionPayload>,
    #[serde(default)]
    pub variants: Vec<VariantPayload>,
    #[serde(default)]
    pub images: Vec<ImagePayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptionPayload {
    pub name: String,
    /// 1-based, matches `optionN` on the variants.
    pub position: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VariantPayload {
    pub id: i64,
    pub title: Option<String>,
    pub sku: Option<String>,
    pub price: Option<String>,
    pub option1: Option<String>,
    pub option2: Option<String>,
    pub option3: Option<String>,
    pub inventory_item_id: Option<i64>,
    pub inventory_quantity: Option<i32>,
}

impl VariantPayload {
    fn option_at(&self, position: usize) -> Option<&str> {
        match position {
            1 => self.option1.as_deref(),
            2 => self.option2.as_deref(),
            3 => self.option3.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImagePayload {
    pub id: i64,
    pub src: String,
    pub alt: Option<String>,
    pub position: Option<i32>,
}

/// `inventory_levels/update` body.
#[derive(Debug, Clone, Deserialize)]
pub struct InventoryLevelPayload {
    pub inventory_item_id: i64,
    pub location_id: Option<i64>,
    pub available: Option<i32>,
}

/// Flatten a webhook product into mirror rows.
///
/// Variants with a malformed price are dropped with a warning.
pub fn transform_product_payload(payload: &ProductPayload) -> TransformedProduct {
    let shopify_product_id = payload.id;
    let position_of = |name: &str| {
        payload
            .options
            .iter()
            .find(|o| o.name.eq_ignore_ascii_case(name))
            .map(|o| o.position)
    };
    let size_at = position_of("Size");
    let color_at = position_of("Color");

    let product = NewVendorProduct {
        shopify_product_id,
        title: payload.title.trim().to_string(),
        handle: payload.handle.clone(),
        vendor: payload.vendor.clone(),
        product_type: payload.product_type.clone().filter(|t| !t.is_empty()),
        status: payload.status.as_ref().map(|s| s.to_lowercase()),
        tags: payload
            .tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        description_html: payload.body_html.clone(),
        shopify_updated_at: payload.updated_at,
    };

    let variants = payload
        .variants
        .iter()
        .filter_map(|v| {
            let price_cents = match v.price.as_deref() {
                None => 0,
                Some(raw) => match price_to_cents(raw) {
                    Some(cents) => cents,
                    None => {
                        tracing::warn!(shopify_variant_id = v.id, price = raw, "Skipping variant with malformed price");
                        return None;
                    }
                },
            };
            Some(NewVendorVariant {
                shopify_variant_id: v.id,
                shopify_product_id,
                title: v.title.clone().unwrap_or_else(|| "Default Title".to_string()),
                sku: v.sku.clone().filter(|s| !s.trim().is_empty()),
                price_cents,
                size: size_at.and_then(|p| v.option_at(p)).map(str::to_string),
                color: color_at.and_then(|p| v.option_at(p)).map(str::to_string),
                inventory_item_id: v.inventory_item_id,
                inventory_quantity: v.inventory_quantity.unwrap_or(0),
            })
        })
        .collect();

    let images = payload
        .images
        .iter()
        .enumerate()
        .map(|(index, image)| NewVendorImage {
            shopify_image_id: image.id,
            shopify_product_id,
            src: image.src.clone(),
            alt_text: image.alt.clone().filter(|a| !a.is_empty()),
            position: image.position.unwrap_or(index as i32 + 1) - 1,
        })
        .collect();

    TransformedProduct {
        product,
        variants,
        images,
    }
}

/// Upsert a webhook product with its variants and images in one transaction.
/// Returns the vendor product row id.
pub async fn apply_product_payload(
    pool: &PgPool,
    payload: &ProductPayload,
) -> Result<i64, sqlx::Error> {
    let rows = transform_product_payload(payload);
    let mut tx = pool.begin().await?;
    let id = VendorRepo::upsert_product(&mut tx, &rows.product).await?;
    for variant in &rows.variants {
        VendorRepo::upsert_variant(&mut tx, variant).await?;
    }
    for image in &rows.images {
        VendorRepo::upsert_image(&mut tx, image).await?;
    }
    tx.commit().await?;

    tracing::info!(
        shopify_product_id = payload.id,
        variants = rows.variants.len(),
        images = rows.images.len(),
        "Vendor product updated from webhook"
    );
    Ok(id)
}

/// Apply a level update. Returns (vendor variants, internal variants)
/// updated; a level without `available` changes nothing.
///
/// The payload only carries one location's count. With a catalog source the
/// item's level is re-read so it matches the summed value the periodic sync
/// writes; without one the payload value is applied as-is.
pub async fn apply_inventory_level(
    pool: &PgPool,
    source: Option<&dyn CatalogSource>,
    payload: &InventoryLevelPayload,
) -> Result<(usize, u64), SyncError> {
    let Some(available) = payload.available else {
        return Ok((0, 0));
    };
    let levels = match source {
        Some(source) => {
            source
                .fetch_inventory_levels(&[payload.inventory_item_id])
                .await?
        }
        None => vec![InventoryLevel {
            inventory_item_id: payload.inventory_item_id,
            available,
        }],
    };
    Ok(apply_levels(pool, &levels).await?)
}
