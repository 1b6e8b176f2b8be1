//! Shopify Admin GraphQL client.

use async_trait::async_trait;
use kct_core::vendor::{format_gid, parse_gid};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::catalog::{CatalogPage, CatalogSource, Connection, InventoryLevel, ProductNode};
use crate::config::ShopifyConfig;
use crate::error::{ensure_success, IntegrationError};

const SERVICE: &str = "Shopify";

const PRODUCTS_QUERY: &str = r#"
query Products($first: Int!, $after: String) {
  products(first: $first, after: $after, sortKey: ID) {
    pageInfo { hasNextPage endCursor }
    nodes {
      id title handle vendor productType status tags descriptionHtml updatedAt
      variants(first: 100) {
        nodes {
          id title sku price inventoryQuantity
          selectedOptions { name value }
          inventoryItem { id }
        }
      }
      images(first: 20) { nodes { id url altText } }
    }
  }
}
"#;

const INVENTORY_QUERY: &str = r#"
query InventoryLevels($ids: [ID!]!) {
  nodes(ids: $ids) {
    ... on InventoryItem {
      id
      inventoryLevels(first: 50) {
        nodes { quantities(names: ["available"]) { name quantity } }
      }
    }
  }
}
"#;

/// HTTP client for the Shopify Admin GraphQL API.
pub struct ShopifyClient {
    client: reqwest::Client,
    config: ShopifyConfig,
}

impl ShopifyClient {
    pub fn new(config: ShopifyConfig) -> Result<Self, IntegrationError> {
        Ok(Self::with_client(crate::build_http_client()?, config))
    }

    /// Create a client reusing an existing `reqwest::Client`.
    pub fn with_client(client: reqwest::Client, config: ShopifyConfig) -> Self {
        Self { client, config }
    }

    /// POST a GraphQL document and return its `data` member.
    async fn graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<T, IntegrationError> {
        let response = self
            .client
            .post(self.config.graphql_url())
            .header("X-Shopify-Access-Token", &self.config.admin_token)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;
        let response = ensure_success(SERVICE, response).await?;
        let body: GraphQlResponse<T> = response.json().await?;
        body.into_data()
    }
}

#[async_trait]
impl CatalogSource for ShopifyClient {
    async fn fetch_products_page(
        &self,
        cursor: Option<&str>,
        page_size: u32,
    ) -> Result<CatalogPage, IntegrationError> {
        let data: ProductsData = self
            .graphql(
                PRODUCTS_QUERY,
                json!({ "first": page_size, "after": cursor }),
            )
            .await?;
        tracing::debug!(
            count = data.products.nodes.len(),
            has_next = data.products.page_info.has_next_page,
            "Fetched Shopify products page"
        );
        Ok(data.into())
    }

    async fn fetch_inventory_levels(
        &self,
        inventory_item_ids: &[i64],
    ) -> Result<Vec<InventoryLevel>, IntegrationError> {
        if inventory_item_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = inventory_item_ids
            .iter()
            .map(|id| format_gid("InventoryItem", *id))
            .collect();
        let data: InventoryData = self.graphql(INVENTORY_QUERY, json!({ "ids": ids })).await?;
        Ok(data.levels())
    }
}

// ---------------------------------------------------------------------------
// Response envelopes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
    #[serde(default)]
    extensions: Option<GraphQlErrorExtensions>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorExtensions {
    code: Option<String>,
}

impl<T> GraphQlResponse<T> {
    fn into_data(self) -> Result<T, IntegrationError> {
        if !self.errors.is_empty() {
            // Cost-based throttling arrives as a 200 with a THROTTLED error.
            let throttled = self.errors.iter().any(|e| {
                e.extensions
                    .as_ref()
                    .and_then(|x| x.code.as_deref())
                    .is_some_and(|c| c == "THROTTLED")
            });
            if throttled {
                return Err(IntegrationError::RateLimited {
                    service: SERVICE,
                    retry_after_secs: None,
                });
            }
            return Err(IntegrationError::GraphQl(format_graphql_errors(&self.errors)));
        }
        self.data.ok_or_else(|| IntegrationError::Decode {
            service: SERVICE,
            message: "response has neither data nor errors".into(),
        })
    }
}

fn format_graphql_errors(errors: &[GraphQlError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Deserialize)]
struct ProductsData {
    products: ProductConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductConnection {
    page_info: PageInfo,
    #[serde(default)]
    nodes: Vec<ProductNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

impl From<ProductsData> for CatalogPage {
    fn from(data: ProductsData) -> Self {
        Self {
            products: data.products.nodes,
            has_next_page: data.products.page_info.has_next_page,
            end_cursor: data.products.page_info.end_cursor,
        }
    }
}

#[derive(Debug, Deserialize)]
struct InventoryData {
    #[serde(default)]
    nodes: Vec<Option<InventoryItemNode>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InventoryItemNode {
    id: Option<String>,
    #[serde(default)]
    inventory_levels: Connection<LevelNode>,
}

#[derive(Debug, Deserialize)]
struct LevelNode {
    #[serde(default)]
    quantities: Vec<Quantity>,
}

#[derive(Debug, Deserialize)]
struct Quantity {
    name: String,
    quantity: i32,
}

impl InventoryData {
    /// Sum `available` across locations per item. Null nodes (deleted items)
    /// and unparseable ids are dropped.
    fn levels(self) -> Vec<InventoryLevel> {
        self.nodes
            .into_iter()
            .flatten()
            .filter_map(|node| {
                let inventory_item_id = parse_gid(node.id.as_deref()?, "InventoryItem")?;
                let available = node
                    .inventory_levels
                    .nodes
                    .iter()
                    .flat_map(|level| level.quantities.iter())
                    .filter(|q| q.name == "available")
                    .map(|q| q.quantity)
                    .sum();
                Some(InventoryLevel {
                    inventory_item_id,
                    available,
                })
            })
            .collect()
    }
}
