//! Export pipeline: the driver loop and the CSV and JSON exporters it feeds.

pub mod csv;
pub mod driver;
pub mod fields;
pub mod json;
pub mod sink;

use crate::error::Result;
use crate::shopify::models::Product;

pub use self::csv::RowExporter;
pub use driver::{ExportDriver, ExportSummary};
pub use fields::{ProductField, RootProperty, VariantField};
pub use json::DocumentExporter;
pub use sink::{AtomicFile, Sink};

/// Receives products one at a time and writes them to an output.
///
/// The driver calls `dump` for every product in catalog order and `close`
/// exactly once at the end of the run.
pub trait Exporter {
    /// Accepts the next product.
    fn dump(&mut self, product: Product) -> Result<()>;

    /// Finishes the output and flushes it to the sink.
    fn close(&mut self) -> Result<()>;
}

impl<E: Exporter + ?Sized> Exporter for Box<E> {
    fn dump(&mut self, product: Product) -> Result<()> {
        (**self).dump(product)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}
