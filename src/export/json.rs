//! JSON exporter: buffers the catalog, then reshapes it around an optional root property.
//!
//! Without a root the output is an array of product objects, each carrying its
//! variants. With a product-level root the same objects are keyed by that
//! property. With a variant-level root every variant becomes one object keyed
//! by its value, merged with its product's fields.
//!
//! Keys are not required to be unique; when two records share a key the one
//! dumped later replaces the earlier one.

use super::fields::{ProductField, RootProperty, VariantField};
use super::sink::{AtomicFile, Sink};
use super::Exporter;
use crate::error::{ExportError, Result};
use crate::shopify::models::{Product, Variant};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Scalar fields of one record, keyed by field name.
pub type Fields<'a> = BTreeMap<&'static str, &'a str>;

/// A product's scalar fields plus its variants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRecord<'a> {
    #[serde(flatten)]
    pub fields: Fields<'a>,
    pub variants: Vec<Fields<'a>>,
}

/// Reshaped catalog, ready to serialize.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Document<'a> {
    /// Products in catalog order
    List(Vec<ProductRecord<'a>>),
    /// Products keyed by a product property
    ByProduct(BTreeMap<&'a str, ProductRecord<'a>>),
    /// Merged variant and product fields keyed by a variant property
    ByVariant(BTreeMap<&'a str, Fields<'a>>),
}

impl Document<'_> {
    /// Number of top-level entries.
    pub fn len(&self) -> usize {
        match self {
            Document::List(records) => records.len(),
            Document::ByProduct(records) => records.len(),
            Document::ByVariant(records) => records.len(),
        }
    }

    /// Returns true if the document has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn product_fields(product: &Product) -> Fields<'_> {
    ProductField::all().iter().map(|f| (f.key(), f.get(product).unwrap_or_default())).collect()
}

fn variant_fields(variant: &Variant) -> Fields<'_> {
    VariantField::all().iter().map(|f| (f.key(), f.get(variant).unwrap_or_default())).collect()
}

fn product_record(product: &Product) -> ProductRecord<'_> {
    ProductRecord {
        fields: product_fields(product),
        variants: product.variants.iter().map(variant_fields).collect(),
    }
}

/// Reshapes `products` around `root`.
///
/// Variants with an empty or missing root value are skipped. A product whose
/// root value is missing cannot be keyed and fails with `TypeCoercion`.
pub fn reshape(products: &[Product], root: Option<RootProperty>) -> Result<Document<'_>> {
    match root {
        None => Ok(Document::List(products.iter().map(product_record).collect())),

        Some(RootProperty::Variant(field)) => {
            let mut output = BTreeMap::new();

            for product in products {
                for variant in &product.variants {
                    let key = match field.get(variant) {
                        Some(key) if !key.is_empty() => key,
                        _ => {
                            debug!("Skipping variant {} with no {}", variant.id, field.key());
                            continue;
                        }
                    };

                    let mut record = variant_fields(variant);
                    record.extend(product_fields(product));

                    if output.insert(key, record).is_some() {
                        debug!("Duplicate {} '{}', keeping variant {}", field.key(), key, variant.id);
                    }
                }
            }

            Ok(Document::ByVariant(output))
        }

        Some(RootProperty::Product(field)) => {
            let mut output = BTreeMap::new();

            for product in products {
                let key = field.get(product).ok_or_else(|| ExportError::TypeCoercion {
                    property: field.key().to_string(),
                    product: product.title.clone(),
                })?;

                if output.insert(key, product_record(product)).is_some() {
                    debug!("Duplicate {} '{}', keeping product {}", field.key(), key, product.id);
                }
            }

            Ok(Document::ByProduct(output))
        }
    }
}

/// Collects every product and writes a single JSON document on close.
pub struct DocumentExporter<S: Sink> {
    sink: S,
    path: PathBuf,
    root: Option<RootProperty>,
    products: Vec<Product>,
    closed: bool,
}

impl DocumentExporter<AtomicFile> {
    /// Validates `root` and then creates the output file at `path`.
    ///
    /// An invalid root fails before anything is created on disk.
    pub fn create(path: impl AsRef<Path>, root: &str) -> Result<Self> {
        let root = RootProperty::parse_optional(root)?;
        let path = path.as_ref();
        let sink = AtomicFile::create(path).map_err(|e| ExportError::sink(path, e))?;

        debug!("Created JSON writer for: {} (root: {:?})", path.display(), root.map(|r| r.key()));
        Ok(Self::with_root(sink, path, root))
    }
}

impl<S: Sink> DocumentExporter<S> {
    /// Wraps `sink`, validating the root property name (empty means no root).
    pub fn new(sink: S, path: impl Into<PathBuf>, root: &str) -> Result<Self> {
        let root = RootProperty::parse_optional(root)?;
        Ok(Self::with_root(sink, path, root))
    }

    /// Wraps `sink` with an already-parsed root property.
    pub fn with_root(sink: S, path: impl Into<PathBuf>, root: Option<RootProperty>) -> Self {
        Self { sink, path: path.into(), root, products: Vec::new(), closed: false }
    }

    /// Returns the underlying sink.
    pub fn get_ref(&self) -> &S {
        &self.sink
    }
}

impl<S: Sink> Exporter for DocumentExporter<S> {
    fn dump(&mut self, product: Product) -> Result<()> {
        self.products.push(product);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }

        let (bytes, entries) = {
            let document = reshape(&self.products, self.root)?;
            (serde_json::to_vec(&document)?, document.len())
        };

        let written = self.sink.write(&bytes).map_err(|e| ExportError::sink(&self.path, e))?;
        if written != bytes.len() {
            return Err(ExportError::ShortWrite {
                path: self.path.clone(),
                written,
                expected: bytes.len(),
            });
        }

        self.sink.commit().map_err(|e| ExportError::sink(&self.path, e))?;
        self.closed = true;

        info!(
            "Wrote {} entries from {} products to {}",
            entries,
            self.products.len(),
            self.path.display()
        );
        Ok(())
    }
}
