//! Vendor catalog source: the shape of the Shopify Admin GraphQL nodes the
//! sync job consumes, and the trait it reads them through.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::IntegrationError;

/// A GraphQL connection reduced to its `nodes` list.
#[derive(Debug, Clone, Deserialize)]
pub struct Connection<T> {
    #[serde(default = "Vec::new")]
    pub nodes: Vec<T>,
}

impl<T> Default for Connection<T> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductNode {
    pub id: String,
    pub title: String,
    pub handle: Option<String>,
    pub vendor: Option<String>,
    pub product_type: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub description_html: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub variants: Connection<VariantNode>,
    #[serde(default)]
    pub images: Connection<ImageNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantNode {
    pub id: String,
    pub title: Option<String>,
    pub sku: Option<String>,
    /// Decimal money string, e.g. `"129.99"`.
    pub price: Option<String>,
    pub inventory_quantity: Option<i32>,
    #[serde(default)]
    pub selected_options: Vec<SelectedOption>,
    pub inventory_item: Option<NodeRef>,
}

impl VariantNode {
    /// Value of a selected option by case-insensitive name (`Size`, `Color`).
    pub fn option(&self, name: &str) -> Option<&str> {
        self.selected_options
            .iter()
            .find(|o| o.name.eq_ignore_ascii_case(name))
            .map(|o| o.value.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectedOption {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeRef {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageNode {
    pub id: String,
    pub url: String,
    pub alt_text: Option<String>,
}

/// One page of the product listing.
#[derive(Debug, Clone, Default)]
pub struct CatalogPage {
    pub products: Vec<ProductNode>,
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// Available quantity of one inventory item, summed across locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InventoryLevel {
    pub inventory_item_id: i64,
    pub available: i32,
}

/// Read access to the vendor catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch up to `page_size` products after `cursor` (`None` for the first
    /// page).
    async fn fetch_products_page(
        &self,
        cursor: Option<&str>,
        page_size: u32,
    ) -> Result<CatalogPage, IntegrationError>;

    /// Current available quantity for each of the given inventory items.
    /// Unknown ids are omitted from the result.
    async fn fetch_inventory_levels(
        &self,
        inventory_item_ids: &[i64],
    ) -> Result<Vec<InventoryLevel>, IntegrationError>;
}
