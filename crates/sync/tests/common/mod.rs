//! In-memory catalog source and fixtures for the sync integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use kct_integrations::catalog::{CatalogPage, InventoryLevel, ProductNode};
use kct_integrations::{CatalogSource, IntegrationError};
use kct_sync::catalog::SyncOptions;
use serde_json::json;
use sqlx::PgPool;

/// Serves scripted pages in order; `levels` answers inventory queries.
#[derive(Default)]
pub struct FakeCatalog {
    pages: Mutex<VecDeque<Result<CatalogPage, IntegrationError>>>,
    levels: HashMap<i64, i32>,
    pub page_calls: AtomicUsize,
}

impl FakeCatalog {
    pub fn with_pages(pages: Vec<Result<CatalogPage, IntegrationError>>) -> Self {
        Self {
            pages: Mutex::new(pages.into()),
            ..Self::default()
        }
    }

    pub fn with_levels(levels: &[(i64, i32)]) -> Self {
        Self {
            levels: levels.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn page_calls(&self) -> usize {
        self.page_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogSource for FakeCatalog {
    async fn fetch_products_page(
        &self,
        _cursor: Option<&str>,
        _page_size: u32,
    ) -> Result<CatalogPage, IntegrationError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(CatalogPage::default()))
    }

    async fn fetch_inventory_levels(
        &self,
        inventory_item_ids: &[i64],
    ) -> Result<Vec<InventoryLevel>, IntegrationError> {
        Ok(inventory_item_ids
            .iter()
            .filter_map(|id| {
                self.levels.get(id).map(|available| InventoryLevel {
                    inventory_item_id: *id,
                    available: *available,
                })
            })
            .collect())
    }
}

/// A product node with one variant per size, ids derived from `id`.
pub fn product_node(id: i64, title: &str, sizes: &[&str], quantity: i32) -> ProductNode {
    let variants: Vec<_> = sizes
        .iter()
        .enumerate()
        .map(|(i, size)| {
            let variant_id = id * 100 + i as i64;
            json!({
                "id": format!("gid://shopify/ProductVariant/{variant_id}"),
                "title": format!("{size} / Black"),
                "sku": format!("SKU-{variant_id}"),
                "price": "249.99",
                "inventoryQuantity": quantity,
                "selectedOptions": [
                    { "name": "Size", "value": size },
                    { "name": "Color", "value": "Black" }
                ],
                "inventoryItem": { "id": format!("gid://shopify/InventoryItem/{}", variant_id + 50_000) }
            })
        })
        .collect();
    serde_json::from_value(json!({
        "id": format!("gid://shopify/Product/{id}"),
        "title": title,
        "handle": format!("product-{id}"),
        "vendor": "KCT",
        "productType": "Tuxedo",
        "status": "ACTIVE",
        "tags": ["formal"],
        "variants": { "nodes": variants },
        "images": { "nodes": [
            { "id": format!("gid://shopify/ProductImage/{id}"), "url": format!("https://cdn/{id}.jpg") }
        ]}
    }))
    .unwrap()
}

pub fn page(products: Vec<ProductNode>, cursor: &str, has_next_page: bool) -> CatalogPage {
    CatalogPage {
        products,
        has_next_page,
        end_cursor: Some(cursor.to_string()),
    }
}

pub fn fast_options() -> SyncOptions {
    SyncOptions {
        page_delay: Duration::ZERO,
        retry_delays: vec![Duration::ZERO; 3],
        ..SyncOptions::default()
    }
}

pub async fn count(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}
