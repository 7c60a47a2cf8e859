//! Admin GraphQL API transport.

use super::models::{Cursor, Page, Product, Variant};
use super::source::{http_client, read_body, send, shop_url, CatalogSource, Credentials};
use crate::config::Config;
use crate::error::{ExportError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};
use wreq::Client;

/// Variants requested per product. Products with more are truncated.
pub const VARIANTS_PER_PRODUCT: u32 = 100;

/// Shopify rejects any single query whose requested cost is above this.
pub const MAX_QUERY_COST: u32 = 1000;

/// Largest product page that stays within [`MAX_QUERY_COST`].
///
/// A page costs 2 for the connection plus, per product, 1 for the node,
/// 2 for the variants connection and 1 per requested variant.
pub const MAX_PRODUCTS_PER_QUERY: u32 = (MAX_QUERY_COST - 2) / (3 + VARIANTS_PER_PRODUCT);

/// Products requested for a page of `page_size`, clamped to the query cost limit.
pub fn products_per_query(page_size: u32) -> u32 {
    page_size.clamp(1, MAX_PRODUCTS_PER_QUERY)
}

const PRODUCTS_QUERY: &str = r#"
query findProducts($first: Int!, $after: String, $variants: Int!) {
  products(first: $first, after: $after) {
    pageInfo {
      hasNextPage
      endCursor
    }
    edges {
      node {
        legacyResourceId
        handle
        productType
        title
        variants(first: $variants) {
          pageInfo {
            hasNextPage
          }
          edges {
            node {
              legacyResourceId
              title
              sku
              barcode
            }
          }
        }
      }
    }
  }
}
"#;

#[derive(Debug, Deserialize)]
struct Response {
    data: Option<ProductsData>,
    #[serde(default)]
    errors: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ProductsData {
    products: Connection<ProductNode>,
}

#[derive(Debug, Deserialize)]
struct Connection<T> {
    #[serde(default = "Vec::new")]
    edges: Vec<Edge<T>>,
    #[serde(rename = "pageInfo", default)]
    page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
struct Edge<T> {
    node: T,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    #[serde(default)]
    end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductNode {
    legacy_resource_id: String,
    title: String,
    handle: String,
    #[serde(default)]
    product_type: Option<String>,
    variants: Connection<VariantNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VariantNode {
    legacy_resource_id: String,
    title: String,
    #[serde(default)]
    sku: Option<String>,
    #[serde(default)]
    barcode: Option<String>,
}

impl ProductNode {
    fn into_product(self) -> Product {
        if self.variants.page_info.has_next_page {
            warn!(
                "Product {} has more than {} variants; the rest are not exported",
                self.legacy_resource_id, VARIANTS_PER_PRODUCT
            );
        }

        let product_id = self.legacy_resource_id;
        let variants = self
            .variants
            .edges
            .into_iter()
            .map(|edge| Variant {
                id: edge.node.legacy_resource_id,
                product_id: product_id.clone(),
                title: edge.node.title,
                sku: edge.node.sku,
                barcode: edge.node.barcode,
            })
            .collect();

        Product {
            id: product_id,
            title: self.title,
            product_type: self.product_type,
            handle: self.handle,
            variants,
        }
    }
}

/// Decodes a GraphQL products response into a page.
fn parse_page(body: &str) -> Result<Page> {
    let response: Response = serde_json::from_str(body)
        .map_err(|e| ExportError::transport(format!("Invalid GraphQL response: {}", e)))?;

    if let Some(errors) = response.errors.filter(|e| !e.is_null()) {
        return Err(ExportError::transport(format!("GraphQL errors: {}", errors)));
    }

    let products = response
        .data
        .ok_or_else(|| ExportError::transport("GraphQL response has no data"))?
        .products;

    let next = match (products.page_info.has_next_page, products.page_info.end_cursor) {
        (false, _) => None,
        (true, Some(cursor)) => Some(Cursor::After(cursor)),
        (true, None) => {
            return Err(ExportError::transport("GraphQL response has a next page but no end cursor"));
        }
    };

    let products = products.edges.into_iter().map(|edge| edge.node.into_product()).collect();

    Ok(Page { products, next })
}

/// Pages through products with the Admin GraphQL API.
pub struct GraphqlClient {
    client: Client,
    endpoint: String,
    credentials: Credentials,
}

impl GraphqlClient {
    /// Creates a client for the shop named in `config`.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_base_url(config, None)
    }

    /// Creates a client with an optional custom base URL (for testing).
    pub fn with_base_url(config: &Config, base_url: Option<String>) -> Result<Self> {
        let credentials = Credentials::from_config(config)?;
        let base_url = base_url.unwrap_or_else(|| shop_url(&config.shop));
        let endpoint = format!("{}/admin/api/{}/graphql.json", base_url, config.api_version);

        Ok(Self { client: http_client(config)?, endpoint, credentials })
    }

    /// GraphQL endpoint requests are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CatalogSource for GraphqlClient {
    async fn fetch_page(&self, cursor: &Cursor, page_size: u32) -> Result<Page> {
        let first = products_per_query(page_size);
        if first != page_size {
            debug!("Page size {} lowered to {} to stay within the query cost limit", page_size, first);
        }

        let body = json!({
            "query": PRODUCTS_QUERY,
            "variables": { "first": first, "after": cursor.token(), "variants": VARIANTS_PER_PRODUCT },
        });

        info!("Fetching products (first: {}, after: {:?})", first, cursor.token());
        debug!("POST {}", self.endpoint);

        let request = self
            .client
            .post(self.endpoint.as_str())
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .body(body.to_string());

        let response = send(self.credentials.apply(request)).await?;
        parse_page(&read_body(response).await?)
    }
}
