//! Flattening of Shopify product nodes into vendor mirror rows.

use kct_core::vendor::{parse_gid, price_to_cents};
use kct_db::models::vendor::{NewVendorImage, NewVendorProduct, NewVendorVariant};
use kct_integrations::catalog::{ProductNode, VariantNode};

/// Rows produced from one product node.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedProduct {
    pub product: NewVendorProduct,
    pub variants: Vec<NewVendorVariant>,
    pub images: Vec<NewVendorImage>,
}

/// Transform one product node.
///
/// Returns `None` (with a warning) when the product GID cannot be parsed.
/// Variants and images with unparsable GIDs, and variants with a malformed
/// price, are dropped individually.
pub fn transform_product(node: &ProductNode) -> Option<TransformedProduct> {
    let Some(shopify_product_id) = parse_gid(&node.id, "Product") else {
        tracing::warn!(gid = %node.id, "Skipping product with unparsable GID");
        return None;
    };

    let product = NewVendorProduct {
        shopify_product_id,
        title: node.title.trim().to_string(),
        handle: node.handle.clone(),
        vendor: node.vendor.clone(),
        product_type: node.product_type.clone().filter(|t| !t.is_empty()),
        status: node.status.as_ref().map(|s| s.to_lowercase()),
        tags: node.tags.clone(),
        description_html: node.description_html.clone(),
        shopify_updated_at: node.updated_at,
    };

    let variants = node
        .variants
        .nodes
        .iter()
        .filter_map(|v| transform_variant(shopify_product_id, v))
        .collect();

    let images = node
        .images
        .nodes
        .iter()
        .enumerate()
        .filter_map(|(position, image)| {
            let Some(shopify_image_id) = parse_gid(&image.id, "ProductImage")
                .or_else(|| parse_gid(&image.id, "MediaImage"))
            else {
                tracing::warn!(gid = %image.id, shopify_product_id, "Skipping image with unparsable GID");
                return None;
            };
            Some(NewVendorImage {
                shopify_image_id,
                shopify_product_id,
                src: image.url.clone(),
                alt_text: image.alt_text.clone().filter(|a| !a.is_empty()),
                position: position as i32,
            })
        })
        .collect();

    Some(TransformedProduct {
        product,
        variants,
        images,
    })
}

fn transform_variant(shopify_product_id: i64, node: &VariantNode) -> Option<NewVendorVariant> {
    let Some(shopify_variant_id) = parse_gid(&node.id, "ProductVariant") else {
        tracing::warn!(gid = %node.id, shopify_product_id, "Skipping variant with unparsable GID");
        return None;
    };
    let price_cents = match node.price.as_deref() {
        None => 0,
        Some(raw) => match price_to_cents(raw) {
            Some(cents) => cents,
            None => {
                tracing::warn!(shopify_variant_id, price = raw, "Skipping variant with malformed price");
                return None;
            }
        },
    };
    let inventory_item_id = node
        .inventory_item
        .as_ref()
        .and_then(|item| parse_gid(&item.id, "InventoryItem"));

    Some(NewVendorVariant {
        shopify_variant_id,
        shopify_product_id,
        title: node
            .title
            .clone()
            .unwrap_or_else(|| "Default Title".to_string()),
        sku: node.sku.clone().filter(|s| !s.trim().is_empty()),
        price_cents,
        size: node.option("Size").map(str::to_string),
        color: node.option("Color").map(str::to_string),
        inventory_item_id,
        inventory_quantity: node.inventory_quantity.unwrap_or(0),
    })
}
