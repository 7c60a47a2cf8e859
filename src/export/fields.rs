//! Scalar fields of products and variants, and the JSON root property allow-list.

use crate::error::ExportError;
use crate::shopify::models::{Product, Variant};
use std::fmt;
use std::str::FromStr;

/// Scalar product attributes that appear in exported records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductField {
    Id,
    Title,
    ProductType,
    Handle,
}

impl ProductField {
    /// Record key for this field.
    pub fn key(&self) -> &'static str {
        match self {
            ProductField::Id => "product_id",
            ProductField::Title => "product_title",
            ProductField::ProductType => "product_type",
            ProductField::Handle => "handle",
        }
    }

    /// Reads the field from `product`. `None` means the platform sent no value.
    pub fn get<'a>(&self, product: &'a Product) -> Option<&'a str> {
        match self {
            ProductField::Id => Some(&product.id),
            ProductField::Title => Some(&product.title),
            ProductField::ProductType => product.product_type.as_deref(),
            ProductField::Handle => Some(&product.handle),
        }
    }

    /// Returns all product fields in record order.
    pub fn all() -> &'static [ProductField] {
        &[ProductField::Id, ProductField::Title, ProductField::ProductType, ProductField::Handle]
    }
}

/// Scalar variant attributes that appear in exported records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantField {
    Id,
    Title,
    Sku,
    Barcode,
}

impl VariantField {
    /// Record key for this field.
    pub fn key(&self) -> &'static str {
        match self {
            VariantField::Id => "variant_id",
            VariantField::Title => "variant_title",
            VariantField::Sku => "sku",
            VariantField::Barcode => "barcode",
        }
    }

    /// Reads the field from `variant`. `None` means the platform sent no value.
    pub fn get<'a>(&self, variant: &'a Variant) -> Option<&'a str> {
        match self {
            VariantField::Id => Some(&variant.id),
            VariantField::Title => Some(&variant.title),
            VariantField::Sku => variant.sku.as_deref(),
            VariantField::Barcode => variant.barcode.as_deref(),
        }
    }

    /// Returns all variant fields in record order.
    pub fn all() -> &'static [VariantField] {
        &[VariantField::Id, VariantField::Title, VariantField::Sku, VariantField::Barcode]
    }
}

/// Property used as the top-level key of each JSON record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RootProperty {
    Product(ProductField),
    Variant(VariantField),
}

impl RootProperty {
    /// Returns every accepted root property.
    pub fn all() -> &'static [RootProperty] {
        &[
            RootProperty::Product(ProductField::Id),
            RootProperty::Product(ProductField::Title),
            RootProperty::Product(ProductField::ProductType),
            RootProperty::Product(ProductField::Handle),
            RootProperty::Variant(VariantField::Id),
            RootProperty::Variant(VariantField::Sku),
            RootProperty::Variant(VariantField::Barcode),
        ]
    }

    /// Names of every accepted root property, for help text and validation.
    pub fn names() -> Vec<&'static str> {
        Self::all().iter().map(|r| r.key()).collect()
    }

    /// Record key of the selected property.
    pub fn key(&self) -> &'static str {
        match self {
            RootProperty::Product(field) => field.key(),
            RootProperty::Variant(field) => field.key(),
        }
    }

    /// Parses an optional root name; an empty string means no root.
    pub fn parse_optional(name: &str) -> Result<Option<Self>, ExportError> {
        if name.is_empty() {
            return Ok(None);
        }
        name.parse().map(Some)
    }
}

impl fmt::Display for RootProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for RootProperty {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all().iter().copied().find(|root| root.key() == s).ok_or_else(|| {
            ExportError::InvalidRootProperty { name: s.to_string(), allowed: Self::names().join(", ") }
        })
    }
}
