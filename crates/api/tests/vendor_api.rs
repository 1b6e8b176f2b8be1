//! Admin vendor catalog endpoints.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use common::{admin_token, body_json, count_rows, expect_data, post_json_auth, send};
use kct_core::types::DbId;
use kct_integrations::catalog::{CatalogPage, CatalogSource, InventoryLevel};
use kct_integrations::{IntegrationError, Integrations};
use serde_json::json;
use sqlx::PgPool;

/// Catalog source whose every call fails with a non-retryable error.
struct BrokenCatalog;

#[async_trait]
impl CatalogSource for BrokenCatalog {
    async fn fetch_products_page(
        &self,
        _cursor: Option<&str>,
        _page_size: u32,
    ) -> Result<CatalogPage, IntegrationError> {
        Err(IntegrationError::Api {
            service: "Shopify",
            status: 401,
            body: "Invalid API key".into(),
        })
    }

    async fn fetch_inventory_levels(
        &self,
        _inventory_item_ids: &[i64],
    ) -> Result<Vec<InventoryLevel>, IntegrationError> {
        Ok(Vec::new())
    }
}

async fn seed_vendor_product(pool: &PgPool) -> DbId {
    let (id,): (DbId,) = sqlx::query_as(
        "INSERT INTO vendor_products (shopify_product_id, title, handle, status) \
         VALUES (8001, 'Slim Fit Navy Suit', 'slim-fit-navy-suit', 'active') RETURNING id",
    )
    .fetch_one(pool)
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO vendor_variants \
            (shopify_variant_id, shopify_product_id, title, sku, price_cents, size, inventory_quantity) \
         VALUES (9001, 8001, '40R', 'SUIT-NAVY-40R', 29900, '40R', 6)",
    )
    .execute(pool)
    .await
    .unwrap();
    id
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn sync_without_shopify_credentials_is_503(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(app, "/api/v1/admin/vendor/sync", json!({}), &admin_token()).await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(count_rows(&pool, "vendor_sync_runs").await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failed_sync_reports_failure_and_notifies(pool: PgPool) {
    let integrations = Integrations {
        catalog: Some(Arc::new(BrokenCatalog)),
        ..Integrations::default()
    };
    let app = common::build_test_app_with(pool.clone(), integrations);

    let report = expect_data(
        post_json_auth(app.clone(), "/api/v1/admin/vendor/sync", json!({}), &admin_token()).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(report["status"], "failed");

    let runs = expect_data(
        send(
            app,
            Method::GET,
            "/api/v1/admin/vendor/sync-runs?kind=catalog",
            Some(&admin_token()),
            None,
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(runs[0]["status"], "failed");

    let (kind, severity): (String, String) =
        sqlx::query_as("SELECT kind, severity FROM admin_notifications")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(kind, "sync_failed");
    assert_eq!(severity, "critical");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn import_decision_creates_internal_product(pool: PgPool) {
    let vendor_id = seed_vendor_product(&pool).await;
    let app = common::build_test_app(pool.clone());

    let outcome = expect_data(
        post_json_auth(
            app.clone(),
            &format!("/api/v1/admin/vendor/products/{vendor_id}/decision"),
            json!({ "decision": "import", "override_price_cents": 27500 }),
            &admin_token(),
        )
        .await,
        StatusCode::OK,
    )
    .await;

    assert_eq!(outcome["vendor_product"]["import_status"], "imported");
    assert_eq!(outcome["product"]["base_price_cents"], 27_500);
    assert_eq!(outcome["variants"].as_array().unwrap().len(), 1);
    assert_eq!(outcome["variants"][0]["available_quantity"], 6);

    let listed = expect_data(
        send(
            app,
            Method::GET,
            "/api/v1/admin/vendor/products?import_status=imported",
            Some(&admin_token()),
            None,
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_decision_is_400(pool: PgPool) {
    let vendor_id = seed_vendor_product(&pool).await;
    let app = common::build_test_app(pool.clone());

    let response = post_json_auth(
        app,
        &format!("/api/v1/admin/vendor/products/{vendor_id}/decision"),
        json!({ "decision": "archive" }),
        &admin_token(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(count_rows(&pool, "products").await, 0);
}
