//! Product status and stock classification.
//!
//! Statuses are stored as text in `products.status`; the string forms below
//! must match the CHECK constraint in the products migration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_INACTIVE: &str = "inactive";
pub const STATUS_DISCONTINUED: &str = "discontinued";
pub const STATUS_BLOCKED: &str = "blocked";

/// All valid status strings.
pub const VALID_STATUSES: &[&str] = &[
    STATUS_ACTIVE,
    STATUS_INACTIVE,
    STATUS_DISCONTINUED,
    STATUS_BLOCKED,
];

/// Product lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    #[default]
    Active,
    Inactive,
    Discontinued,
    Blocked,
}

impl ProductStatus {
    /// Convert to the database string value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => STATUS_ACTIVE,
            Self::Inactive => STATUS_INACTIVE,
            Self::Discontinued => STATUS_DISCONTINUED,
            Self::Blocked => STATUS_BLOCKED,
        }
    }

    /// Parse a status string (case-insensitive, surrounding whitespace ignored).
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s.trim().to_lowercase().as_str() {
            STATUS_ACTIVE => Ok(Self::Active),
            STATUS_INACTIVE => Ok(Self::Inactive),
            STATUS_DISCONTINUED => Ok(Self::Discontinued),
            STATUS_BLOCKED => Ok(Self::Blocked),
            _ => Err(CoreError::unknown("status", s, VALID_STATUSES)),
        }
    }
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Stock condition
// ---------------------------------------------------------------------------

/// Quantity at or below which a product counts as low stock.
pub const LOW_STOCK_THRESHOLD: i32 = 10;

/// Quantity above which a product counts as high stock.
pub const HIGH_STOCK_THRESHOLD: i32 = 50;

/// Fixed-threshold classification of a product's quantity.
///
/// The thresholds are policy constants. The classes overlap (a quantity of 5
/// is both `InStock` and `LowStock`); a filter selects exactly one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockCondition {
    InStock,
    LowStock,
    OutOfStock,
    HighStock,
}

// ---------------------------------------------------------------------------
// Field limits
// ---------------------------------------------------------------------------

/// Maximum product name length in characters.
pub const MAX_NAME_LENGTH: usize = 255;

/// Maximum quantity accepted from any input path.
pub const MAX_QUANTITY: i64 = 1_000_000;

/// Maximum SKU / barcode length.
pub const MAX_IDENTIFIER_LENGTH: usize = 64;

/// Maximum price accepted from any input path.
pub fn max_price() -> Decimal {
    Decimal::new(99_999_999, 2)
}

/// Upper bound of the tax rate percentage.
pub fn max_tax_rate() -> Decimal {
    Decimal::ONE_HUNDRED
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_db_strings() {
        for s in VALID_STATUSES {
            assert_eq!(ProductStatus::from_str_value(s).unwrap().as_str(), *s);
        }
    }

    #[test]
    fn status_parse_is_case_insensitive() {
        assert_eq!(
            ProductStatus::from_str_value(" Discontinued ").unwrap(),
            ProductStatus::Discontinued
        );
    }

    #[test]
    fn unknown_status_lists_allowed_values() {
        let err = ProductStatus::from_str_value("archived").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("archived"));
        assert!(msg.contains("blocked"));
    }

    #[test]
    fn max_price_is_under_a_million() {
        assert_eq!(max_price().to_string(), "999999.99");
    }
}
