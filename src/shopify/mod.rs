//! Shopify catalog access: data model, page source trait, and the two API transports.

pub mod graphql;
pub mod models;
pub mod rest;
pub mod source;

pub use graphql::GraphqlClient;
pub use models::{Cursor, Page, Product, Variant};
pub use rest::RestClient;
pub use source::{shop_url, CatalogSource, Credentials};

use crate::config::{Api, Config};
use crate::error::Result;

/// Creates the page source selected by `config.api`.
pub fn connect(config: &Config) -> Result<Box<dyn CatalogSource>> {
    Ok(match config.api {
        Api::Graphql => Box::new(GraphqlClient::new(config)?),
        Api::Rest => Box::new(RestClient::new(config)?),
    })
}
