//! Catalog data model: products, variants, and pagination cursors.

use serde::{Deserialize, Serialize};

/// A product as returned by the platform, with its variants in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Platform-assigned identifier
    pub id: String,
    /// Product title
    pub title: String,
    /// Product type classification. The platform may omit it.
    pub product_type: Option<String>,
    /// Storefront URL handle
    pub handle: String,
    /// Variants, in the order the platform returned them
    pub variants: Vec<Variant>,
}

impl Product {
    /// Creates a product with no variants.
    pub fn new(id: impl Into<String>, title: impl Into<String>, handle: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            product_type: None,
            handle: handle.into(),
            variants: Vec::new(),
        }
    }

    /// Sets the product type.
    pub fn with_type(mut self, product_type: impl Into<String>) -> Self {
        self.product_type = Some(product_type.into());
        self
    }

    /// Appends a variant, pointing its back-reference at this product.
    pub fn with_variant(mut self, mut variant: Variant) -> Self {
        variant.product_id = self.id.clone();
        self.variants.push(variant);
        self
    }
}

/// A purchasable variant of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    /// Platform-assigned identifier
    pub id: String,
    /// Identifier of the owning product
    pub product_id: String,
    /// Variant title
    pub title: String,
    /// Stock keeping unit, may be absent or empty
    pub sku: Option<String>,
    /// Barcode (UPC, EAN, ...), may be absent or empty
    pub barcode: Option<String>,
}

impl Variant {
    /// Creates a variant with no SKU or barcode.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            product_id: String::new(),
            title: title.into(),
            sku: None,
            barcode: None,
        }
    }

    /// Sets the SKU.
    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    /// Sets the barcode.
    pub fn with_barcode(mut self, barcode: impl Into<String>) -> Self {
        self.barcode = Some(barcode.into());
        self
    }
}

/// Opaque pagination position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Cursor {
    /// Beginning of the catalog
    #[default]
    Start,
    /// Position after the page that produced this token
    After(String),
}

impl Cursor {
    /// Returns the token to send to the platform, if any.
    pub fn token(&self) -> Option<&str> {
        match self {
            Cursor::Start => None,
            Cursor::After(token) => Some(token),
        }
    }
}

/// One page of products plus the cursor of the following page.
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// Products in platform order
    pub products: Vec<Product>,
    /// Cursor for the next page; `None` once the catalog is exhausted
    pub next: Option<Cursor>,
}

impl Page {
    /// Creates the final page of a catalog.
    pub fn last(products: Vec<Product>) -> Self {
        Self { products, next: None }
    }

    /// Creates a page followed by another one at `token`.
    pub fn followed_by(products: Vec<Product>, token: impl Into<String>) -> Self {
        Self { products, next: Some(Cursor::After(token.into())) }
    }

    /// Returns true when no further page exists.
    pub fn is_last(&self) -> bool {
        self.next.is_none()
    }
}
