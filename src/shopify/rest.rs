//! Admin REST API transport, paginated through `Link` headers.

use super::models::{Cursor, Page, Product, Variant};
use super::source::{http_client, read_body, send, shop_url, CatalogSource, Credentials};
use crate::config::Config;
use crate::error::{ExportError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};
use wreq::Client;

/// Product fields requested from the REST endpoint.
pub const PRODUCT_FIELDS: &str = "id,title,product_type,handle,variants";

#[derive(Debug, Deserialize)]
struct ProductsResponse {
    products: Vec<RestProduct>,
}

#[derive(Debug, Deserialize)]
struct RestProduct {
    id: u64,
    title: String,
    #[serde(default)]
    product_type: Option<String>,
    handle: String,
    #[serde(default)]
    variants: Vec<RestVariant>,
}

#[derive(Debug, Deserialize)]
struct RestVariant {
    id: u64,
    #[serde(default)]
    product_id: Option<u64>,
    title: String,
    #[serde(default)]
    sku: Option<String>,
    #[serde(default)]
    barcode: Option<String>,
}

impl From<RestProduct> for Product {
    fn from(product: RestProduct) -> Self {
        let id = product.id.to_string();
        let variants = product
            .variants
            .into_iter()
            .map(|variant| Variant {
                id: variant.id.to_string(),
                product_id: variant.product_id.map(|p| p.to_string()).unwrap_or_else(|| id.clone()),
                title: variant.title,
                sku: variant.sku,
                barcode: variant.barcode,
            })
            .collect();

        Product {
            id,
            title: product.title,
            product_type: product.product_type,
            handle: product.handle,
            variants,
        }
    }
}

/// Extracts the `page_info` token of the `rel="next"` entry of a `Link` header.
pub fn next_page_info(link_header: Option<&str>) -> Option<String> {
    let header = link_header?;

    header.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let url = parts.next()?.trim().strip_prefix('<')?.strip_suffix('>')?;

        if !parts.any(|param| param.trim() == r#"rel="next""#) {
            return None;
        }

        let query = url.split_once('?')?.1;
        query.split('&').find_map(|pair| {
            let value = pair.strip_prefix("page_info=")?;
            urlencoding::decode(value).ok().map(|v| v.into_owned())
        })
    })
}

/// Pages through products with the Admin REST API.
pub struct RestClient {
    client: Client,
    products_url: String,
    credentials: Credentials,
}

impl RestClient {
    /// Creates a client for the shop named in `config`.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_base_url(config, None)
    }

    /// Creates a client with an optional custom base URL (for testing).
    pub fn with_base_url(config: &Config, base_url: Option<String>) -> Result<Self> {
        let credentials = Credentials::from_config(config)?;
        let base_url = base_url.unwrap_or_else(|| shop_url(&config.shop));
        let products_url = format!("{}/admin/api/{}/products.json", base_url, config.api_version);

        Ok(Self { client: http_client(config)?, products_url, credentials })
    }

    /// URL of the page at `cursor`.
    fn page_url(&self, cursor: &Cursor, page_size: u32) -> String {
        let mut url = format!(
            "{}?limit={}&fields={}",
            self.products_url,
            page_size,
            urlencoding::encode(PRODUCT_FIELDS)
        );

        if let Some(token) = cursor.token() {
            url.push_str("&page_info=");
            url.push_str(&urlencoding::encode(token));
        }

        url
    }
}

#[async_trait]
impl CatalogSource for RestClient {
    async fn fetch_page(&self, cursor: &Cursor, page_size: u32) -> Result<Page> {
        let url = self.page_url(cursor, page_size);

        info!("Fetching products (limit: {}, page_info: {:?})", page_size, cursor.token());
        debug!("GET {}", url);

        let request = self.client.get(url.as_str()).header("Accept", "application/json");
        let response = send(self.credentials.apply(request)).await?;

        let link = response.headers().get("link").and_then(|v| v.to_str().ok()).map(str::to_string);
        let body = read_body(response).await?;

        let parsed: ProductsResponse = serde_json::from_str(&body)
            .map_err(|e| ExportError::transport(format!("Invalid products response: {}", e)))?;

        Ok(Page {
            products: parsed.products.into_iter().map(Product::from).collect(),
            next: next_page_info(link.as_deref()).map(Cursor::After),
        })
    }
}
