//! Fixtures shared by the repository integration tests.

#![allow(dead_code)]

use kct_db::models::product::{CreateProduct, CreateProductVariant, ProductVariant};
use kct_db::repositories::{ProductRepo, VariantRepo};
use sqlx::PgPool;

/// Create a product with one variant holding `available` units.
pub async fn seed_variant(pool: &PgPool, sku: &str, available: i32) -> ProductVariant {
    seed_variant_with(pool, sku, available, 5, 29_900).await
}

pub async fn seed_variant_with(
    pool: &PgPool,
    sku: &str,
    available: i32,
    threshold: i32,
    price_cents: i64,
) -> ProductVariant {
    let product = ProductRepo::create(
        pool,
        &CreateProduct {
            name: format!("Product {sku}"),
            handle: format!("product-{}", sku.to_lowercase()),
            description: None,
            category: Some("suits".into()),
            base_price_cents: price_cents,
            vendor: None,
        },
    )
    .await
    .unwrap();

    VariantRepo::create(
        pool,
        &CreateProductVariant {
            product_id: product.id,
            sku: sku.to_string(),
            size: Some("40R".into()),
            color: Some("Navy".into()),
            price_cents,
            available_quantity: available,
            low_stock_threshold: Some(threshold),
            vendor_variant_id: None,
        },
    )
    .await
    .unwrap()
}

pub async fn reservation_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM inventory_reservations")
        .fetch_one(pool)
        .await
        .unwrap()
}
