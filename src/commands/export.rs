//! Export command: wires the configured source and exporter into the driver.

use crate::config::{Config, OutputFormat};
use crate::export::{DocumentExporter, ExportDriver, ExportSummary, Exporter, RowExporter};
use crate::shopify::{self, CatalogSource};
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

/// Outcome of a finished export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    /// File the catalog was written to
    pub path: PathBuf,
    /// Page and product counts
    pub summary: ExportSummary,
}

impl std::fmt::Display for ExportReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Exported {} to {}", self.summary, self.path.display())
    }
}

/// Exports a shop's catalog to a file.
pub struct ExportCommand {
    config: Config,
}

impl ExportCommand {
    /// Creates a new export command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Opens the exporter for the configured format.
    ///
    /// The JSON root property is validated before the output file is created.
    pub fn open_exporter(&self) -> Result<Box<dyn Exporter>> {
        let path = self.config.output_path();

        let exporter: Box<dyn Exporter> = match self.config.format {
            OutputFormat::Csv => Box::new(RowExporter::create(&path)?),
            OutputFormat::Json => Box::new(DocumentExporter::create(&path, &self.config.json_root)?),
        };

        Ok(exporter)
    }

    /// Runs the export against the live shop.
    pub async fn execute(&self) -> Result<ExportReport> {
        let source = shopify::connect(&self.config).context("Failed to create Shopify client")?;
        let mut exporter = self.open_exporter()?;

        self.run(&*source, &mut *exporter).await
    }

    /// Runs the export with a provided source (for testing).
    pub async fn execute_with_source(&self, source: &(impl CatalogSource + ?Sized)) -> Result<ExportReport> {
        let mut exporter = self.open_exporter()?;
        self.run(source, &mut *exporter).await
    }

    async fn run<S, E>(&self, source: &S, exporter: &mut E) -> Result<ExportReport>
    where
        S: CatalogSource + ?Sized,
        E: Exporter + ?Sized,
    {
        let path = self.config.output_path();
        info!("Exporting {} as {} to {}", self.config.shop, self.config.format, path.display());

        let summary = ExportDriver::new(self.config.page_size).run(source, exporter).await?;

        Ok(ExportReport { path, summary })
    }
}
