//! One pass of each scheduled job against a real database.

use std::time::Duration;

use async_trait::async_trait;
use kct_core::types::DbId;
use kct_integrations::catalog::{CatalogPage, CatalogSource, InventoryLevel};
use kct_integrations::IntegrationError;
use kct_sync::catalog::SyncOptions;
use kct_worker::jobs;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

struct UnauthorizedCatalog;

#[async_trait]
impl CatalogSource for UnauthorizedCatalog {
    async fn fetch_products_page(
        &self,
        _cursor: Option<&str>,
        _page_size: u32,
    ) -> Result<CatalogPage, IntegrationError> {
        Err(IntegrationError::Api {
            service: "Shopify",
            status: 401,
            body: "Invalid API key or access token".into(),
        })
    }

    async fn fetch_inventory_levels(
        &self,
        _inventory_item_ids: &[i64],
    ) -> Result<Vec<InventoryLevel>, IntegrationError> {
        Err(IntegrationError::Api {
            service: "Shopify",
            status: 401,
            body: "Invalid API key or access token".into(),
        })
    }
}

async fn seed_variant(pool: &PgPool, available: i32) -> DbId {
    let (product_id,): (DbId,) = sqlx::query_as(
        "INSERT INTO products (name, handle, base_price_cents) \
         VALUES ('Peak Lapel Tux', 'peak-lapel-tux', 39900) RETURNING id",
    )
    .fetch_one(pool)
    .await
    .unwrap();
    let (id,): (DbId,) = sqlx::query_as(
        "INSERT INTO product_variants (product_id, sku, price_cents, available_quantity) \
         VALUES ($1, 'TUX-PEAK-40R', 39900, $2) RETURNING id",
    )
    .bind(product_id)
    .bind(available)
    .fetch_one(pool)
    .await
    .unwrap();
    id
}

async fn count(pool: &PgPool, sql: &str) -> i64 {
    let (n,): (i64,) = sqlx::query_as(sql).fetch_one(pool).await.unwrap();
    n
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn reservation_sweep_removes_expired_holds(pool: PgPool) {
    let variant = seed_variant(&pool, 10).await;
    sqlx::query(
        "INSERT INTO inventory_reservations (variant_id, session_id, quantity, expires_at) \
         VALUES ($1, 'old', 1, NOW() - INTERVAL '1 minute'), \
                ($1, 'live', 1, NOW() + INTERVAL '10 minutes')",
    )
    .bind(variant)
    .execute(&pool)
    .await
    .unwrap();

    jobs::reservation_sweep::tick(&pool).await;

    assert_eq!(count(&pool, "SELECT COUNT(*) FROM inventory_reservations").await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn low_stock_tick_opens_one_alert(pool: PgPool) {
    seed_variant(&pool, 1).await;

    jobs::low_stock::tick(&pool).await;
    jobs::low_stock::tick(&pool).await;

    assert_eq!(count(&pool, "SELECT COUNT(*) FROM low_stock_alerts WHERE status = 'open'").await, 1);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM admin_notifications").await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failed_catalog_sync_raises_critical_notification(pool: PgPool) {
    jobs::catalog_sync::tick(&pool, &UnauthorizedCatalog, &SyncOptions::default()).await;

    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM vendor_sync_runs WHERE status = 'failed'").await,
        1
    );
    assert_eq!(
        count(
            &pool,
            "SELECT COUNT(*) FROM admin_notifications \
             WHERE kind = 'sync_failed' AND severity = 'critical'"
        )
        .await,
        1
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn catalog_sync_interrupted_by_shutdown_is_not_alerted(pool: PgPool) {
    let options = SyncOptions::default();
    options.cancel.cancel();

    jobs::catalog_sync::tick(&pool, &UnauthorizedCatalog, &options).await;

    // The run is closed rather than left running, but shutdown is no incident.
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM vendor_sync_runs WHERE status = 'failed'").await,
        1
    );
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM admin_notifications").await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn inventory_sync_without_items_completes(pool: PgPool) {
    jobs::inventory_sync::tick(&pool, &UnauthorizedCatalog, &SyncOptions::default()).await;

    // No mirrored items, so the vendor is never called.
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM vendor_sync_runs WHERE status = 'completed'").await,
        1
    );
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM admin_notifications").await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn cancelled_job_loop_returns(pool: PgPool) {
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(jobs::reservation_sweep::run(
        pool,
        Duration::from_secs(3600),
        cancel.clone(),
    ));

    cancel.cancel();

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("job should stop after cancellation")
        .unwrap();
}
