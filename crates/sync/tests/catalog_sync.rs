mod common;

use common::{count, fast_options, page, product_node, FakeCatalog};
use kct_db::models::vendor::DecideVendorProduct;
use kct_db::repositories::{SyncRunRepo, VariantRepo, VendorRepo};
use kct_integrations::IntegrationError;
use kct_sync::catalog::run_catalog_sync;
use kct_sync::import::apply_decision;
use kct_sync::inventory::run_inventory_sync;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn sync_upserts_every_page_and_completes(pool: PgPool) {
    let source = FakeCatalog::with_pages(vec![
        Ok(page(vec![product_node(1, "Black Tux", &["38R", "40R"], 3)], "c1", true)),
        Ok(page(vec![product_node(2, "Navy Suit", &["42L"], 1)], "c2", false)),
    ]);

    let report = run_catalog_sync(&pool, &source, &fast_options()).await.unwrap();

    assert_eq!(report.status, "completed");
    assert_eq!(report.pages, 2);
    assert_eq!(report.products_upserted, 2);
    assert_eq!(report.variants_upserted, 3);
    assert_eq!(report.images_upserted, 2);
    assert_eq!(report.last_cursor.as_deref(), Some("c2"));
    assert_eq!(count(&pool, "vendor_variants").await, 3);

    let variants = VendorRepo::variants_for(&pool, 1).await.unwrap();
    assert_eq!(variants[0].size.as_deref(), Some("38R"));
    assert_eq!(variants[0].price_cents, 24_999);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn resync_updates_rows_in_place(pool: PgPool) {
    let first = FakeCatalog::with_pages(vec![Ok(page(
        vec![product_node(1, "Black Tux", &["38R"], 3)],
        "c1",
        false,
    ))]);
    run_catalog_sync(&pool, &first, &fast_options()).await.unwrap();

    let second = FakeCatalog::with_pages(vec![Ok(page(
        vec![product_node(1, "Black Tuxedo", &["38R"], 9)],
        "c1",
        false,
    ))]);
    run_catalog_sync(&pool, &second, &fast_options()).await.unwrap();

    assert_eq!(count(&pool, "vendor_products").await, 1);
    let product = VendorRepo::find_product_by_shopify_id(&pool, 1)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(product.title, "Black Tuxedo");
    assert_eq!(product.import_status, "pending");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failed_run_keeps_committed_pages_and_cursor(pool: PgPool) {
    let source = FakeCatalog::with_pages(vec![
        Ok(page(vec![product_node(1, "Black Tux", &["38R"], 3)], "c1", true)),
        Err(IntegrationError::GraphQl("Internal error".into())),
    ]);

    let report = run_catalog_sync(&pool, &source, &fast_options()).await.unwrap();

    assert_eq!(report.status, "failed");
    assert_eq!(report.pages, 1);
    assert_eq!(report.last_cursor.as_deref(), Some("c1"));
    assert!(report.error.unwrap().contains("Internal error"));
    assert_eq!(count(&pool, "vendor_products").await, 1);

    let run = SyncRunRepo::find_by_id(&pool, report.run_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(run.status, "failed");
    assert!(run.finished_at.is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn transient_errors_are_retried(pool: PgPool) {
    let unavailable = || IntegrationError::Api {
        service: "Shopify",
        status: 502,
        body: "bad gateway".into(),
    };
    let source = FakeCatalog::with_pages(vec![
        Err(unavailable()),
        Err(IntegrationError::RateLimited {
            service: "Shopify",
            retry_after_secs: Some(0),
        }),
        Ok(page(vec![product_node(1, "Black Tux", &["38R"], 3)], "c1", false)),
    ]);

    let report = run_catalog_sync(&pool, &source, &fast_options()).await.unwrap();

    assert_eq!(report.status, "completed");
    assert_eq!(source.page_calls(), 3);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn max_pages_stops_early(pool: PgPool) {
    let source = FakeCatalog::with_pages(vec![
        Ok(page(vec![product_node(1, "A", &["S"], 1)], "c1", true)),
        Ok(page(vec![product_node(2, "B", &["S"], 1)], "c2", true)),
    ]);
    let mut options = fast_options();
    options.max_pages = Some(1);

    let report = run_catalog_sync(&pool, &source, &options).await.unwrap();

    assert_eq!(report.status, "completed");
    assert_eq!(report.pages, 1);
    assert_eq!(source.page_calls(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn import_then_inventory_sync_updates_internal_stock(pool: PgPool) {
    let source = FakeCatalog::with_pages(vec![Ok(page(
        vec![product_node(7, "Ivory Dinner Jacket", &["40R", "42R"], 4)],
        "c1",
        false,
    ))]);
    run_catalog_sync(&pool, &source, &fast_options()).await.unwrap();
    let vendor = VendorRepo::find_product_by_shopify_id(&pool, 7)
        .await
        .unwrap()
        .unwrap();

    let decision = DecideVendorProduct {
        decision: "import".into(),
        override_title: Some("Ivory Jacket".into()),
        override_price_cents: Some(19_900),
    };
    let outcome = apply_decision(&pool, vendor.id, &decision)
        .await
        .unwrap()
        .unwrap();
    let product = outcome.product.unwrap();
    assert_eq!(product.name, "Ivory Jacket");
    assert_eq!(outcome.variants.len(), 2);
    assert!(outcome.variants.iter().all(|v| v.price_cents == 19_900));
    assert_eq!(outcome.vendor_product.import_status, "imported");

    // Re-importing refreshes the same product.
    let again = apply_decision(&pool, vendor.id, &decision)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(again.product.unwrap().id, product.id);
    assert_eq!(count(&pool, "product_variants").await, 2);

    // Inventory item ids are variant id + 50_000 in the fixture.
    let levels = FakeCatalog::with_levels(&[(700 + 50_000, 1), (701 + 50_000, 12)]);
    let report = run_inventory_sync(&pool, &levels, &fast_options()).await.unwrap();
    assert_eq!(report.status, "completed");
    assert_eq!(report.items_checked, 2);
    assert_eq!(report.variants_updated, 2);

    let low = VariantRepo::find_by_id(&pool, outcome.variants[0].id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(low.available_quantity, 1);
    assert_eq!(low.stock_status, "low_stock");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn skip_decision_creates_nothing(pool: PgPool) {
    let source = FakeCatalog::with_pages(vec![Ok(page(
        vec![product_node(3, "Cummerbund", &["OS"], 10)],
        "c1",
        false,
    ))]);
    run_catalog_sync(&pool, &source, &fast_options()).await.unwrap();
    let vendor = VendorRepo::find_product_by_shopify_id(&pool, 3)
        .await
        .unwrap()
        .unwrap();

    let outcome = apply_decision(
        &pool,
        vendor.id,
        &DecideVendorProduct {
            decision: "skip".into(),
            override_title: None,
            override_price_cents: None,
        },
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(outcome.vendor_product.import_status, "skipped");
    assert!(outcome.product.is_none());
    assert_eq!(count(&pool, "products").await, 0);
}
