//! Export field allow-list.
//!
//! Callers name fields by key; anything outside [`ExportField::ALL`] is
//! dropped. Each field knows its CSV header label and the SQL expression that
//! renders it as text, so the export query never interpolates caller input.

use serde::{Deserialize, Serialize};

/// A column that may appear in a product export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportField {
    Id,
    Name,
    Sku,
    Barcode,
    ProductNumber,
    Description,
    Price,
    SalePrice,
    SaleStart,
    SaleEnd,
    Quantity,
    Status,
    Category,
    Brand,
    Supplier,
    TaxRate,
    Weight,
    Dimensions,
    CreatedAt,
    UpdatedAt,
}

impl ExportField {
    /// Every exportable field, in canonical column order.
    pub const ALL: &'static [ExportField] = &[
        Self::Id,
        Self::Name,
        Self::Sku,
        Self::Barcode,
        Self::ProductNumber,
        Self::Description,
        Self::Price,
        Self::SalePrice,
        Self::SaleStart,
        Self::SaleEnd,
        Self::Quantity,
        Self::Status,
        Self::Category,
        Self::Brand,
        Self::Supplier,
        Self::TaxRate,
        Self::Weight,
        Self::Dimensions,
        Self::CreatedAt,
        Self::UpdatedAt,
    ];

    /// Fields exported when the caller selects none.
    pub const DEFAULT: &'static [ExportField] = &[
        Self::Id,
        Self::Name,
        Self::Sku,
        Self::Barcode,
        Self::Price,
        Self::SalePrice,
        Self::Quantity,
        Self::Status,
        Self::Category,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Sku => "sku",
            Self::Barcode => "barcode",
            Self::ProductNumber => "product_number",
            Self::Description => "description",
            Self::Price => "price",
            Self::SalePrice => "sale_price",
            Self::SaleStart => "sale_start",
            Self::SaleEnd => "sale_end",
            Self::Quantity => "quantity",
            Self::Status => "status",
            Self::Category => "category",
            Self::Brand => "brand",
            Self::Supplier => "supplier",
            Self::TaxRate => "tax_rate",
            Self::Weight => "weight",
            Self::Dimensions => "dimensions",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }

    /// Human-readable CSV header label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Id => "Product ID",
            Self::Name => "Name",
            Self::Sku => "SKU",
            Self::Barcode => "Barcode",
            Self::ProductNumber => "Product Number",
            Self::Description => "Description",
            Self::Price => "Regular Price",
            Self::SalePrice => "Sale Price",
            Self::SaleStart => "Sale Start",
            Self::SaleEnd => "Sale End",
            Self::Quantity => "Quantity",
            Self::Status => "Status",
            Self::Category => "Category",
            Self::Brand => "Brand",
            Self::Supplier => "Supplier",
            Self::TaxRate => "Tax Rate",
            Self::Weight => "Weight",
            Self::Dimensions => "Dimensions",
            Self::CreatedAt => "Created At",
            Self::UpdatedAt => "Updated At",
        }
    }

    /// SQL expression yielding this field as nullable text.
    ///
    /// Assumes `products p` left-joined to `categories c`, `brands b`, and
    /// `suppliers s`.
    pub fn sql_expr(self) -> &'static str {
        match self {
            Self::Id => "p.id::TEXT",
            Self::Name => "p.name",
            Self::Sku => "p.sku",
            Self::Barcode => "p.barcode",
            Self::ProductNumber => "p.product_number",
            Self::Description => "p.description",
            Self::Price => "p.price::TEXT",
            Self::SalePrice => "p.sale_price::TEXT",
            Self::SaleStart => "to_char(p.sale_start AT TIME ZONE 'UTC', 'YYYY-MM-DD HH24:MI:SS')",
            Self::SaleEnd => "to_char(p.sale_end AT TIME ZONE 'UTC', 'YYYY-MM-DD HH24:MI:SS')",
            Self::Quantity => "p.quantity::TEXT",
            Self::Status => "p.status",
            Self::Category => "c.name",
            Self::Brand => "b.name",
            Self::Supplier => "s.name",
            Self::TaxRate => "p.tax_rate::TEXT",
            Self::Weight => "p.weight::TEXT",
            Self::Dimensions => "p.dimensions",
            Self::CreatedAt => "to_char(p.created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD HH24:MI:SS')",
            Self::UpdatedAt => "to_char(p.updated_at AT TIME ZONE 'UTC', 'YYYY-MM-DD HH24:MI:SS')",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim().to_lowercase();
        Self::ALL.iter().copied().find(|f| f.key() == key)
    }
}

/// Resolve caller-supplied field names against the allow-list.
///
/// Unknown names and repeats are dropped; caller order is kept. An empty
/// result falls back to [`ExportField::DEFAULT`].
pub fn resolve_fields(requested: &[String]) -> Vec<ExportField> {
    let mut fields: Vec<ExportField> = Vec::with_capacity(requested.len());
    for name in requested {
        if let Some(field) = ExportField::from_key(name) {
            if !fields.contains(&field) {
                fields.push(field);
            }
        }
    }
    if fields.is_empty() {
        fields.extend_from_slice(ExportField::DEFAULT);
    }
    fields
}

/// Header labels for the given fields.
pub fn header_labels(fields: &[ExportField]) -> Vec<&'static str> {
    fields.iter().map(|f| f.label()).collect()
}
