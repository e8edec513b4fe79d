//! Product entity model and DTOs.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use stockroom_core::types::{DbId, Timestamp};

/// A row from the `products` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Product {
    pub id: DbId,
    pub name: String,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub product_number: Option<String>,
    pub description: String,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub sale_start: Option<Timestamp>,
    pub sale_end: Option<Timestamp>,
    pub quantity: i32,
    pub status: String,
    pub category_id: Option<DbId>,
    pub brand_id: Option<DbId>,
    pub supplier_id: Option<DbId>,
    pub tax_rate: Option<Decimal>,
    pub weight: Option<Decimal>,
    pub dimensions: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// The columns a pricing pass reads from each locked row.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct PriceRow {
    pub id: DbId,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
}

/// DTO for inserting a product, or overwriting an existing one's mutable
/// fields. Lookup names are already resolved to ids.
#[derive(Debug, Clone, Default)]
pub struct NewProduct {
    pub name: String,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub product_number: Option<String>,
    pub description: String,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub sale_start: Option<Timestamp>,
    pub sale_end: Option<Timestamp>,
    pub quantity: i32,
    pub status: String,
    pub category_id: Option<DbId>,
    pub brand_id: Option<DbId>,
    pub supplier_id: Option<DbId>,
    pub tax_rate: Option<Decimal>,
    pub weight: Option<Decimal>,
    pub dimensions: Option<String>,
}

/// A product column with a uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierColumn {
    Sku,
    Barcode,
    ProductNumber,
}

impl IdentifierColumn {
    /// Column name. Static, never caller-supplied.
    pub fn column(self) -> &'static str {
        match self {
            Self::Sku => "sku",
            Self::Barcode => "barcode",
            Self::ProductNumber => "product_number",
        }
    }
}
