//! shopify-id-export - Export a Shopify store's product catalog to CSV or JSON
//!
//! Pages through the catalog with the Admin API and writes either one CSV row
//! per variant or a JSON document keyed by a chosen product or variant property.

pub mod commands;
pub mod config;
pub mod error;
pub mod export;
pub mod shopify;

pub use config::Config;
pub use error::ExportError;
pub use export::{ExportDriver, Exporter, RootProperty};
pub use shopify::{CatalogSource, Cursor, Page, Product, Variant};
