//! CSV exporter: one row per variant, streamed as products arrive.

use super::sink::Sink;
use super::Exporter;
use crate::error::{ExportError, Result};
use crate::shopify::models::Product;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Column names, in output order.
pub const HEADER: [&str; 8] = [
    "Product ID",
    "Product Title",
    "Product Type",
    "Variant ID",
    "Variant Title",
    "SKU",
    "Barcode",
    "Handle",
];

/// Writes each product's variants as CSV rows.
pub struct RowExporter<W: Sink> {
    out: csv::Writer<W>,
    path: PathBuf,
    header_written: bool,
    closed: bool,
    rows: usize,
}

impl RowExporter<File> {
    /// Creates (or truncates) the CSV file at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| ExportError::sink(path, e))?;

        debug!("Created CSV writer for: {}", path.display());
        Ok(Self::new(file, path))
    }
}

impl<W: Sink> RowExporter<W> {
    /// Wraps an existing sink; `path` names it in error messages.
    pub fn new(sink: W, path: impl Into<PathBuf>) -> Self {
        Self {
            out: csv::Writer::from_writer(sink),
            path: path.into(),
            header_written: false,
            closed: false,
            rows: 0,
        }
    }

    /// Number of data rows written so far.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Returns the underlying sink.
    pub fn get_ref(&self) -> &W {
        self.out.get_ref()
    }

    fn fail(&self, err: impl Into<io::Error>) -> ExportError {
        ExportError::sink(&self.path, err.into())
    }

    fn write_header(&mut self) -> Result<()> {
        if self.header_written {
            return Ok(());
        }

        self.out.write_record(HEADER).map_err(|e| self.fail(e))?;
        self.header_written = true;
        Ok(())
    }
}

impl<W: Sink> Exporter for RowExporter<W> {
    fn dump(&mut self, product: Product) -> Result<()> {
        if self.closed {
            return Err(self.fail(io::Error::other("CSV exporter already closed")));
        }

        self.write_header()?;

        for variant in &product.variants {
            let row = [
                product.id.as_str(),
                product.title.as_str(),
                product.product_type.as_deref().unwrap_or_default(),
                variant.id.as_str(),
                variant.title.as_str(),
                variant.sku.as_deref().unwrap_or_default(),
                variant.barcode.as_deref().unwrap_or_default(),
                product.handle.as_str(),
            ];

            self.out.write_record(row).map_err(|e| self.fail(e))?;
            self.rows += 1;
        }

        // Rows must be on the sink once dump returns.
        self.out.flush().map_err(|e| self.fail(e))?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }

        self.write_header()?;
        self.out.flush().map_err(|e| self.fail(e))?;
        self.out.get_mut().commit().map_err(|e| self.fail(e))?;
        self.closed = true;

        debug!("Finalized CSV file: {} ({} rows)", self.path.display(), self.rows);
        Ok(())
    }
}
