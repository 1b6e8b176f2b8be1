//! Applying an admin import decision to a vendor product.

use kct_core::error::CoreError;
use kct_core::types::DbId;
use kct_core::vendor::{slugify, validate_override_price, ImportDecision};
use kct_db::models::product::{CreateProduct, CreateProductVariant, Product, ProductVariant};
use kct_db::models::vendor::{DecideVendorProduct, VendorProduct, VendorProductDetail};
use kct_db::repositories::{ProductRepo, VariantRepo, VendorRepo};
use serde::Serialize;
use sqlx::PgPool;

use crate::SyncError;

#[derive(Debug, Clone, Serialize)]
pub struct ImportOutcome {
    pub vendor_product: VendorProduct,
    pub product: Option<Product>,
    pub variants: Vec<ProductVariant>,
}

/// Record `decision` for a vendor product.
///
/// `import` creates the internal product and one variant per vendor variant
/// (or refreshes them when the product was imported before) in the same
/// transaction as the decision. Returns `None` for an unknown vendor product.
pub async fn apply_decision(
    pool: &PgPool,
    vendor_product_id: DbId,
    input: &DecideVendorProduct,
) -> Result<Option<ImportOutcome>, SyncError> {
    let decision = ImportDecision::parse(&input.decision)?;
    if let Some(price) = input.override_price_cents {
        validate_override_price(price)?;
    }
    let override_title = input
        .override_title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let Some(detail) = VendorRepo::find_detail(pool, vendor_product_id).await? else {
        return Ok(None);
    };

    let mut tx = pool.begin().await?;

    let outcome = match decision {
        ImportDecision::Skip => {
            let vendor_product = VendorRepo::set_decision(
                &mut tx,
                vendor_product_id,
                decision.resulting_status(),
                None,
                override_title,
                input.override_price_cents,
            )
            .await?;
            ImportOutcome {
                vendor_product,
                product: None,
                variants: Vec::new(),
            }
        }
        ImportDecision::Import => {
            if detail.variants.is_empty() {
                return Err(CoreError::Validation(
                    "Vendor product has no variants to import".into(),
                )
                .into());
            }
            let product_input =
                product_from_vendor(&detail, override_title, input.override_price_cents);
            let product = ProductRepo::upsert_imported(
                &mut tx,
                detail.product.imported_product_id,
                &product_input,
            )
            .await?;

            let mut variants = Vec::with_capacity(detail.variants.len());
            for variant_input in variants_from_vendor(&detail, product.id, input.override_price_cents)
            {
                variants.push(VariantRepo::upsert_imported(&mut tx, &variant_input).await?);
            }

            let vendor_product = VendorRepo::set_decision(
                &mut tx,
                vendor_product_id,
                decision.resulting_status(),
                Some(product.id),
                override_title,
                input.override_price_cents,
            )
            .await?;

            ImportOutcome {
                vendor_product,
                product: Some(product),
                variants,
            }
        }
    };

    tx.commit().await?;

    tracing::info!(
        vendor_product_id,
        decision = %input.decision,
        product_id = ?outcome.product.as_ref().map(|p| p.id),
        variants = outcome.variants.len(),
        "Vendor product decision applied"
    );
    Ok(Some(outcome))
}

fn product_from_vendor(
    detail: &VendorProductDetail,
    override_title: Option<&str>,
    override_price_cents: Option<i64>,
) -> CreateProduct {
    let vendor = &detail.product;
    let name = override_title.unwrap_or(&vendor.title).to_string();
    let handle = vendor
        .handle
        .clone()
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| slugify(&vendor.title));
    let base_price_cents = override_price_cents.unwrap_or_else(|| {
        detail
            .variants
            .iter()
            .map(|v| v.price_cents)
            .min()
            .unwrap_or(0)
    });
    CreateProduct {
        name,
        handle,
        description: vendor.description_html.clone(),
        category: vendor.product_type.clone(),
        base_price_cents,
        vendor: vendor.vendor.clone(),
    }
}

fn variants_from_vendor(
    detail: &VendorProductDetail,
    product_id: DbId,
    override_price_cents: Option<i64>,
) -> Vec<CreateProductVariant> {
    detail
        .variants
        .iter()
        .map(|v| CreateProductVariant {
            product_id,
            sku: v
                .sku
                .clone()
                .unwrap_or_else(|| format!("SHOPIFY-{}", v.shopify_variant_id)),
            size: v.size.clone(),
            color: v.color.clone(),
            price_cents: override_price_cents.unwrap_or(v.price_cents),
            available_quantity: v.inventory_quantity.max(0),
            low_stock_threshold: None,
            vendor_variant_id: Some(v.shopify_variant_id),
        })
        .collect()
}
