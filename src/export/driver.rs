//! Export driver: pages through the catalog and feeds every product to an exporter.

use super::Exporter;
use crate::error::{ExportError, Result};
use crate::shopify::models::Cursor;
use crate::shopify::source::CatalogSource;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info, warn};

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    /// Pages fetched
    pub pages: usize,
    /// Products handed to the exporter
    pub products: usize,
}

impl fmt::Display for ExportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} products in {} pages", self.products, self.pages)
    }
}

/// Sequential page-by-page export loop.
#[derive(Debug, Clone, Copy)]
pub struct ExportDriver {
    page_size: u32,
}

impl ExportDriver {
    /// Creates a driver requesting `page_size` products per page.
    pub fn new(page_size: u32) -> Self {
        Self { page_size }
    }

    /// Runs the export to completion, then closes the exporter.
    ///
    /// `close` runs even when fetching or dumping failed so rows already
    /// written stay flushed. The first error wins; a close error that follows
    /// an earlier failure is only logged.
    pub async fn run<S, E>(&self, source: &S, exporter: &mut E) -> Result<ExportSummary>
    where
        S: CatalogSource + ?Sized,
        E: Exporter + ?Sized,
    {
        let result = self.pump(source, exporter).await;
        let closed = exporter.close();

        match (result, closed) {
            (Ok(summary), Ok(())) => {
                info!("Exported {}", summary);
                Ok(summary)
            }
            (Ok(_), Err(err)) => Err(err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(close_err)) => {
                warn!("Failed to close output after error: {}", close_err);
                Err(err)
            }
        }
    }

    async fn pump<S, E>(&self, source: &S, exporter: &mut E) -> Result<ExportSummary>
    where
        S: CatalogSource + ?Sized,
        E: Exporter + ?Sized,
    {
        let mut summary = ExportSummary::default();
        let mut visited: HashSet<Cursor> = HashSet::new();
        let mut cursor = Cursor::Start;

        loop {
            debug!("Fetching page {} (cursor: {:?})", summary.pages + 1, cursor.token());
            visited.insert(cursor.clone());

            let page = source.fetch_page(&cursor, self.page_size).await?;
            summary.pages += 1;

            debug!("Page {} returned {} products", summary.pages, page.products.len());

            for product in page.products {
                exporter.dump(product)?;
                summary.products += 1;
            }

            match page.next {
                None => break,
                Some(next) if visited.contains(&next) => {
                    return Err(ExportError::transport(format!(
                        "catalog returned an already visited cursor {:?}",
                        next.token().unwrap_or("<start>")
                    )));
                }
                Some(next) => cursor = next,
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shopify::models::{Page, Product, Variant};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Serves a fixed list of pages keyed by the cursor they are requested with.
    struct ScriptedSource {
        pages: Vec<(Cursor, std::result::Result<Page, String>)>,
        calls: Mutex<Vec<Cursor>>,
    }

    impl ScriptedSource {
        fn new(pages: Vec<(Cursor, std::result::Result<Page, String>)>) -> Self {
            Self { pages, calls: Mutex::new(Vec::new()) }
        }

        fn calls(&self) -> Vec<Cursor> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CatalogSource for ScriptedSource {
        async fn fetch_page(&self, cursor: &Cursor, _page_size: u32) -> Result<Page> {
            self.calls.lock().unwrap().push(cursor.clone());
            let (_, page) = self
                .pages
                .iter()
                .find(|(c, _)| c == cursor)
                .unwrap_or_else(|| panic!("unexpected cursor {cursor:?}"));
            page.clone().map_err(ExportError::Transport)
        }
    }

    #[derive(Default)]
    struct RecordingExporter {
        dumped: Vec<String>,
        closes: usize,
        fail_on: Option<String>,
    }

    impl Exporter for RecordingExporter {
        fn dump(&mut self, product: Product) -> Result<()> {
            if self.fail_on.as_deref() == Some(product.id.as_str()) {
                return Err(ExportError::sink("test", std::io::Error::other("disk full")));
            }
            self.dumped.push(product.id);
            Ok(())
        }

        fn close(&mut self) -> Result<()> {
            self.closes += 1;
            Ok(())
        }
    }

    fn product(id: &str) -> Product {
        Product::new(id, id, id).with_variant(Variant::new(format!("{id}-v"), "Default"))
    }

    fn after(token: &str) -> Cursor {
        Cursor::After(token.to_string())
    }

    #[tokio::test]
    async fn test_fetches_each_page_once_in_order() {
        let source = ScriptedSource::new(vec![
            (Cursor::Start, Ok(Page::followed_by(vec![product("1"), product("2")], "a"))),
            (after("a"), Ok(Page::followed_by(vec![product("3")], "b"))),
            (after("b"), Ok(Page::last(vec![product("4")]))),
        ]);
        let mut exporter = RecordingExporter::default();

        let summary = ExportDriver::new(250).run(&source, &mut exporter).await.unwrap();

        assert_eq!(summary, ExportSummary { pages: 3, products: 4 });
        assert_eq!(source.calls(), vec![Cursor::Start, after("a"), after("b")]);
        assert_eq!(exporter.dumped, vec!["1", "2", "3", "4"]);
        assert_eq!(exporter.closes, 1);
    }

    #[tokio::test]
    async fn test_single_empty_page() {
        let source = ScriptedSource::new(vec![(Cursor::Start, Ok(Page::last(Vec::new())))]);
        let mut exporter = RecordingExporter::default();

        let summary = ExportDriver::new(10).run(&source, &mut exporter).await.unwrap();

        assert_eq!(summary, ExportSummary { pages: 1, products: 0 });
        assert_eq!(exporter.closes, 1);
    }

    #[tokio::test]
    async fn test_transport_error_aborts_and_still_closes() {
        let source = ScriptedSource::new(vec![
            (Cursor::Start, Ok(Page::followed_by(vec![product("1")], "a"))),
            (after("a"), Err("503 Service Unavailable".to_string())),
        ]);
        let mut exporter = RecordingExporter::default();

        let err = ExportDriver::new(10).run(&source, &mut exporter).await.unwrap_err();

        assert!(matches!(err, ExportError::Transport(_)));
        assert_eq!(source.calls().len(), 2);
        assert_eq!(exporter.dumped, vec!["1"]);
        assert_eq!(exporter.closes, 1);
    }

    #[tokio::test]
    async fn test_dump_error_stops_before_next_page() {
        let source = ScriptedSource::new(vec![
            (Cursor::Start, Ok(Page::followed_by(vec![product("1"), product("2"), product("3")], "a"))),
            (after("a"), Ok(Page::last(vec![product("4")]))),
        ]);
        let mut exporter = RecordingExporter { fail_on: Some("2".to_string()), ..Default::default() };

        let err = ExportDriver::new(10).run(&source, &mut exporter).await.unwrap_err();

        assert!(matches!(err, ExportError::SinkWrite { .. }));
        assert_eq!(source.calls(), vec![Cursor::Start]);
        assert_eq!(exporter.dumped, vec!["1"]);
        assert_eq!(exporter.closes, 1);
    }

    #[tokio::test]
    async fn test_revisited_cursor_is_rejected() {
        let source = ScriptedSource::new(vec![
            (Cursor::Start, Ok(Page::followed_by(vec![product("1")], "a"))),
            (after("a"), Ok(Page::followed_by(vec![product("2")], "a"))),
        ]);
        let mut exporter = RecordingExporter::default();

        let err = ExportDriver::new(10).run(&source, &mut exporter).await.unwrap_err();

        assert!(err.to_string().contains("already visited"));
        assert_eq!(source.calls(), vec![Cursor::Start, after("a")]);
        assert_eq!(exporter.dumped, vec!["1", "2"]);
    }

    #[test]
    fn test_summary_display() {
        let summary = ExportSummary { pages: 2, products: 5 };
        assert_eq!(summary.to_string(), "5 products in 2 pages");
    }
}
