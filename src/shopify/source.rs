//! Catalog page source trait and the HTTP plumbing shared by both Shopify transports.

use crate::config::Config;
use crate::error::{ExportError, Result};
use crate::shopify::models::{Cursor, Page};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};
use wreq::{Client, RequestBuilder, Response};

/// Source of catalog pages - enables mocking for tests.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetches the page at `cursor`, returning its products and the next cursor.
    async fn fetch_page(&self, cursor: &Cursor, page_size: u32) -> Result<Page>;
}

#[async_trait]
impl<T: CatalogSource + ?Sized> CatalogSource for Box<T> {
    async fn fetch_page(&self, cursor: &Cursor, page_size: u32) -> Result<Page> {
        (**self).fetch_page(cursor, page_size).await
    }
}

/// How requests authenticate against the Admin API.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Admin API access token
    AccessToken(String),
    /// Private app API key and password
    Basic { key: String, password: String },
}

impl Credentials {
    /// Picks credentials from the config: a token wins over key and password.
    pub fn from_config(config: &Config) -> Result<Self> {
        if let Some(token) = config.access_token.as_deref().filter(|t| !t.is_empty()) {
            return Ok(Credentials::AccessToken(token.to_string()));
        }

        match (config.api_key.as_deref(), config.api_password.as_deref()) {
            (Some(key), Some(password)) if !key.is_empty() && !password.is_empty() => {
                Ok(Credentials::Basic { key: key.to_string(), password: password.to_string() })
            }
            _ => Err(ExportError::MissingCredentials),
        }
    }

    /// Adds the authentication header to `request`.
    pub(crate) fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Credentials::AccessToken(token) => request.header("X-Shopify-Access-Token", token.as_str()),
            Credentials::Basic { key, password } => {
                let encoded = STANDARD.encode(format!("{}:{}", key, password));
                request.header("Authorization", format!("Basic {}", encoded))
            }
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::AccessToken(_) => f.write_str("AccessToken(..)"),
            Credentials::Basic { key, .. } => f.debug_struct("Basic").field("key", key).finish_non_exhaustive(),
        }
    }
}

/// Returns the store's base URL for a shop name or domain.
///
/// `acme` becomes `https://acme.myshopify.com`; anything with a dot is taken as
/// a domain; full URLs are kept as-is.
pub fn shop_url(shop: &str) -> String {
    let shop = shop.trim().trim_end_matches('/');

    if shop.starts_with("http://") || shop.starts_with("https://") {
        shop.to_string()
    } else if shop.contains('.') {
        format!("https://{}", shop)
    } else {
        format!("https://{}.myshopify.com", shop)
    }
}

/// Builds the HTTP client used by both transports.
pub(crate) fn http_client(config: &Config) -> Result<Client> {
    let mut builder = Client::builder().gzip(true).brotli(true).connect_timeout(Duration::from_secs(10));

    if let Some(secs) = config.timeout_secs.filter(|&secs| secs > 0) {
        debug!("Request timeout: {}s", secs);
        builder = builder.timeout(Duration::from_secs(secs));
    }

    if let Some(proxy_url) = &config.proxy {
        debug!("Configuring proxy: {}", proxy_url);
        let proxy = wreq::Proxy::all(proxy_url)
            .map_err(|e| ExportError::transport(format!("Failed to configure proxy: {}", e)))?;
        builder = builder.proxy(proxy);
    }

    builder.build().map_err(|e| ExportError::transport(format!("Failed to create HTTP client: {}", e)))
}

/// Sends `request`, rejecting error statuses.
pub(crate) async fn send(request: RequestBuilder) -> Result<Response> {
    let response = request
        .send()
        .await
        .map_err(|e| ExportError::transport(format!("Failed to send request: {}", e)))?;

    let status = response.status();
    debug!("Response status: {}", status);

    if status == 429 {
        warn!("Rate limited (429). Consider a smaller --size.");
        return Err(ExportError::transport("Rate limited by Shopify (429)"));
    }

    if status == 401 || status == 403 {
        return Err(ExportError::transport(format!(
            "Shopify rejected the credentials (status: {})",
            status
        )));
    }

    if !status.is_success() {
        return Err(ExportError::transport(format!("Request failed with status: {}", status)));
    }

    Ok(response)
}

/// Reads the body of a successful response.
pub(crate) async fn read_body(response: Response) -> Result<String> {
    response
        .text()
        .await
        .map_err(|e| ExportError::transport(format!("Failed to read response body: {}", e)))
}
