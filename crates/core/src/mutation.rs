//! Bulk mutation descriptors.
//!
//! A [`MutationDescriptor`] is deserialised once at the API boundary and
//! validated with [`MutationDescriptor::validate`]; downstream code matches on
//! the enum and never re-interprets raw JSON.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::pricing::{PriceRule, SaleRule};
use crate::product::{max_tax_rate, ProductStatus};
use crate::types::DbId;

/// Maximum length of a description fragment supplied through a bulk edit.
pub const MAX_DESCRIPTION_LENGTH: usize = 10_000;

/// Field rewrites applied to every matched product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldUpdate {
    pub category_id: Option<DbId>,
    pub brand_id: Option<DbId>,
    pub supplier_id: Option<DbId>,
    pub status: Option<ProductStatus>,
    pub tax_rate: Option<Decimal>,
    pub description_append: Option<String>,
    pub description_replace: Option<String>,
}

impl FieldUpdate {
    /// `true` when no instruction is present.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A typed bulk transformation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MutationDescriptor {
    SetStatus {
        status: ProductStatus,
    },
    SetFields(FieldUpdate),
    AdjustPricing {
        price_rule: PriceRule,
        #[serde(default)]
        sale_rule: Option<SaleRule>,
    },
}

impl MutationDescriptor {
    /// Audit action name for this descriptor.
    pub fn action_name(&self) -> &'static str {
        match self {
            Self::SetStatus { .. } => crate::audit::action_types::BULK_STATUS_UPDATE,
            Self::SetFields(_) => crate::audit::action_types::BULK_FIELD_UPDATE,
            Self::AdjustPricing { .. } => crate::audit::action_types::BULK_PRICE_UPDATE,
        }
    }

    /// Validate the descriptor. Called once, before any database work.
    pub fn validate(&self) -> Result<(), CoreError> {
        match self {
            Self::SetStatus { .. } => Ok(()),
            Self::SetFields(update) => validate_field_update(update),
            Self::AdjustPricing {
                price_rule,
                sale_rule,
            } => {
                price_rule.validate()?;
                if let Some(rule) = sale_rule {
                    rule.validate()?;
                }
                Ok(())
            }
        }
    }
}

fn validate_field_update(update: &FieldUpdate) -> Result<(), CoreError> {
    if update.is_empty() {
        return Err(CoreError::Validation(
            "At least one field must be supplied for a field update".to_string(),
        ));
    }
    if update.description_append.is_some() && update.description_replace.is_some() {
        return Err(CoreError::Validation(
            "description_append and description_replace are mutually exclusive".to_string(),
        ));
    }
    if let Some(rate) = update.tax_rate {
        if rate < Decimal::ZERO || rate > max_tax_rate() {
            return Err(CoreError::Validation(format!(
                "Tax rate must be between 0 and 100 (got {rate})"
            )));
        }
    }
    for text in [&update.description_append, &update.description_replace]
        .into_iter()
        .flatten()
    {
        if text.len() > MAX_DESCRIPTION_LENGTH {
            return Err(CoreError::Validation(format!(
                "Description exceeds maximum length of {MAX_DESCRIPTION_LENGTH} characters"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn empty_field_update_is_rejected() {
        let m = MutationDescriptor::SetFields(FieldUpdate::default());
        assert_matches!(m.validate(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn append_and_replace_are_mutually_exclusive() {
        let m = MutationDescriptor::SetFields(FieldUpdate {
            description_append: Some(" extra".into()),
            description_replace: Some("new".into()),
            ..Default::default()
        });
        let err = m.validate().unwrap_err();
        assert!(err.to_string().contains("mutually exclusive"));
    }

    #[test]
    fn tax_rate_out_of_range_is_rejected() {
        let m = MutationDescriptor::SetFields(FieldUpdate {
            tax_rate: Some("100.5".parse().unwrap()),
            ..Default::default()
        });
        assert_matches!(m.validate(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn pricing_rules_are_validated() {
        let m = MutationDescriptor::AdjustPricing {
            price_rule: PriceRule::FixedIncrease("1".parse().unwrap()),
            sale_rule: Some(SaleRule::PercentageOff("150".parse().unwrap())),
        };
        assert_matches!(m.validate(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn oversized_price_operand_is_rejected() {
        let m: MutationDescriptor = serde_json::from_str(
            r#"{"kind": "adjust_pricing",
                "price_rule": {"type": "percentage_increase", "value": "79228162514264337593543950335"}}"#,
        )
        .unwrap();
        assert_matches!(m.validate(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn deserializes_tagged_descriptors() {
        let m: MutationDescriptor =
            serde_json::from_str(r#"{"kind": "set_status", "status": "blocked"}"#).unwrap();
        assert_eq!(
            m,
            MutationDescriptor::SetStatus {
                status: ProductStatus::Blocked
            }
        );

        let m: MutationDescriptor = serde_json::from_str(
            r#"{"kind": "set_fields", "category_id": 7, "description_append": " (clearance)"}"#,
        )
        .unwrap();
        assert_matches!(m, MutationDescriptor::SetFields(ref u) if u.category_id == Some(7));

        let m: MutationDescriptor = serde_json::from_str(
            r#"{"kind": "adjust_pricing", "price_rule": {"type": "set_price", "value": "5"}}"#,
        )
        .unwrap();
        assert_matches!(m, MutationDescriptor::AdjustPricing { sale_rule: None, .. });
    }
}
