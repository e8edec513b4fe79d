//! Caller-supplied product selection criteria.
//!
//! A [`FilterCriteria`] is a conjunction of optional predicates. It is never
//! persisted; the `db` crate compiles it into a parameterised WHERE clause
//! that the mutation, preview, and export paths all share.

use chrono::{Days, NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::product::{ProductStatus, StockCondition};
use crate::types::{DbId, Timestamp};

/// Conjunction of optional product predicates. Every field defaults to "any".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    pub category_id: Option<DbId>,
    pub brand_id: Option<DbId>,
    pub supplier_id: Option<DbId>,
    pub status: Option<ProductStatus>,
    pub stock_condition: Option<StockCondition>,
    /// Inclusive lower price bound.
    pub price_min: Option<Decimal>,
    /// Inclusive upper price bound.
    pub price_max: Option<Decimal>,
    /// Products created on or after this day (UTC).
    pub created_from: Option<NaiveDate>,
    /// Products created on or before the end of this day (UTC).
    pub created_to: Option<NaiveDate>,
}

impl FilterCriteria {
    /// `true` when no predicate is set, i.e. the filter matches every product.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Start of `created_from` as a UTC timestamp.
    pub fn created_from_bound(&self) -> Option<Timestamp> {
        self.created_from
            .map(|d| d.and_time(NaiveTime::MIN).and_utc())
    }

    /// Exclusive upper bound for `created_at`: midnight after `created_to`.
    ///
    /// Dates at the very end of the calendar saturate to `created_to` itself.
    pub fn created_to_bound(&self) -> Option<Timestamp> {
        self.created_to.map(|d| {
            d.checked_add_days(Days::new(1))
                .unwrap_or(d)
                .and_time(NaiveTime::MIN)
                .and_utc()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty() {
        assert!(FilterCriteria::default().is_empty());
    }

    #[test]
    fn any_field_makes_it_non_empty() {
        let f = FilterCriteria {
            stock_condition: Some(StockCondition::LowStock),
            ..Default::default()
        };
        assert!(!f.is_empty());
    }

    #[test]
    fn created_to_is_inclusive_through_end_of_day() {
        let f = FilterCriteria {
            created_to: NaiveDate::from_ymd_opt(2024, 2, 28),
            ..Default::default()
        };
        let bound = f.created_to_bound().unwrap();
        assert_eq!(bound.to_rfc3339(), "2024-02-29T00:00:00+00:00");
    }

    #[test]
    fn created_from_starts_at_midnight() {
        let f = FilterCriteria {
            created_from: NaiveDate::from_ymd_opt(2024, 1, 5),
            ..Default::default()
        };
        assert_eq!(
            f.created_from_bound().unwrap().to_rfc3339(),
            "2024-01-05T00:00:00+00:00"
        );
    }

    #[test]
    fn deserializes_partial_json() {
        let f: FilterCriteria = serde_json::from_str(
            r#"{"category_id": 3, "stock_condition": "out_of_stock", "price_max": "19.99"}"#,
        )
        .unwrap();
        assert_eq!(f.category_id, Some(3));
        assert_eq!(f.stock_condition, Some(StockCondition::OutOfStock));
        assert_eq!(f.price_max.unwrap().to_string(), "19.99");
        assert!(f.status.is_none());
    }
}
