//! Pricing formulas applied by the bulk mutation engine.
//!
//! All arithmetic is exact decimal and checked. Results are clamped to a
//! floor of zero and rounded to two decimal places, midpoint away from zero.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::product::max_price;

/// Number of decimal places stored for monetary values.
pub const MONEY_SCALE: u32 = 2;

/// Largest percentage increase accepted in a single pricing pass.
pub const MAX_PERCENTAGE_INCREASE: i64 = 1_000;

/// Rule computing a new regular price from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PriceRule {
    PercentageIncrease(Decimal),
    PercentageDecrease(Decimal),
    FixedIncrease(Decimal),
    FixedDecrease(Decimal),
    SetPrice(Decimal),
}

/// Rule computing a sale price from the already adjusted regular price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SaleRule {
    PercentageOff(Decimal),
    FixedDiscount(Decimal),
    SetSalePrice(Decimal),
    ClearSale,
}

/// New monetary values for one product after a pricing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceAdjustment {
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
}

impl PriceAdjustment {
    /// `true` when a sale price is set but is not below the regular price.
    pub fn sale_price_lapsed(&self) -> bool {
        self.sale_price.is_some_and(|sale| sale >= self.price)
    }
}

/// Round to cents using midpoint-away-from-zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Clamp at zero, then round to cents.
fn settle(value: Decimal) -> Decimal {
    round_money(value.max(Decimal::ZERO))
}

fn percent_of(base: Decimal, pct: Decimal) -> Option<Decimal> {
    base.checked_mul(pct)?.checked_div(Decimal::ONE_HUNDRED)
}

fn out_of_range(base: Decimal) -> CoreError {
    CoreError::Validation(format!("Price adjustment of {base} is out of range"))
}

impl PriceRule {
    /// Apply the rule to `current`, returning the clamped and rounded result.
    ///
    /// Fails with [`CoreError::Validation`] if the arithmetic overflows.
    pub fn apply(self, current: Decimal) -> Result<Decimal, CoreError> {
        let raw = match self {
            Self::PercentageIncrease(p) => {
                percent_of(current, p).and_then(|delta| current.checked_add(delta))
            }
            Self::PercentageDecrease(p) => {
                percent_of(current, p).and_then(|delta| current.checked_sub(delta))
            }
            Self::FixedIncrease(a) => current.checked_add(a),
            Self::FixedDecrease(a) => current.checked_sub(a),
            Self::SetPrice(v) => Some(v),
        };
        raw.map(settle).ok_or_else(|| out_of_range(current))
    }

    /// Reject negative operands, decreases above 100%, increases above
    /// [`MAX_PERCENTAGE_INCREASE`], and amounts above [`max_price`].
    pub fn validate(self) -> Result<(), CoreError> {
        match self {
            Self::PercentageIncrease(p) => bounded(
                "Percentage increase",
                p,
                Decimal::from(MAX_PERCENTAGE_INCREASE),
            ),
            Self::PercentageDecrease(p) => bounded("Percentage decrease", p, Decimal::ONE_HUNDRED),
            Self::FixedIncrease(a) => bounded("Fixed increase", a, max_price()),
            Self::FixedDecrease(a) => bounded("Fixed decrease", a, max_price()),
            Self::SetPrice(v) => bounded("Price", v, max_price()),
        }
    }
}

impl SaleRule {
    /// Compute the sale price relative to `new_price`. `ClearSale` yields `None`.
    pub fn apply(self, new_price: Decimal) -> Result<Option<Decimal>, CoreError> {
        let raw = match self {
            Self::PercentageOff(p) => {
                percent_of(new_price, p).and_then(|delta| new_price.checked_sub(delta))
            }
            Self::FixedDiscount(a) => new_price.checked_sub(a),
            Self::SetSalePrice(v) => Some(v),
            Self::ClearSale => return Ok(None),
        };
        raw.map(|v| Some(settle(v)))
            .ok_or_else(|| out_of_range(new_price))
    }

    /// Reject negative operands, discounts above 100%, and amounts above
    /// [`max_price`].
    pub fn validate(self) -> Result<(), CoreError> {
        match self {
            Self::PercentageOff(p) => bounded("Percentage off", p, Decimal::ONE_HUNDRED),
            Self::FixedDiscount(a) => bounded("Fixed discount", a, max_price()),
            Self::SetSalePrice(v) => bounded("Sale price", v, max_price()),
            Self::ClearSale => Ok(()),
        }
    }
}

/// Run a full pricing pass for one product.
///
/// The sale rule, when present, is applied to the *adjusted* price. Without a
/// sale rule the existing sale price is carried over unchanged.
pub fn compute_adjustment(
    price: Decimal,
    sale_price: Option<Decimal>,
    price_rule: PriceRule,
    sale_rule: Option<SaleRule>,
) -> Result<PriceAdjustment, CoreError> {
    let new_price = price_rule.apply(price)?;
    let new_sale = match sale_rule {
        Some(rule) => rule.apply(new_price)?,
        None => sale_price,
    };
    Ok(PriceAdjustment {
        price: new_price,
        sale_price: new_sale,
    })
}

fn non_negative(label: &str, value: Decimal) -> Result<(), CoreError> {
    if value < Decimal::ZERO {
        return Err(CoreError::Validation(format!(
            "{label} must not be negative (got {value})"
        )));
    }
    Ok(())
}

fn bounded(label: &str, value: Decimal, max: Decimal) -> Result<(), CoreError> {
    non_negative(label, value)?;
    if value > max {
        return Err(CoreError::Validation(format!(
            "{label} must not exceed {max} (got {value})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn percentage_increase_of_ten() {
        let price = PriceRule::PercentageIncrease(d("10")).apply(d("100")).unwrap();
        assert_eq!(price, d("110.00"));
    }

    #[test]
    fn percentage_decrease_rounds_half_away_from_zero() {
        assert_eq!(PriceRule::SetPrice(d("0.125")).apply(d("5")).unwrap(), d("0.13"));
        // 10.05 - 50% = 5.025 -> 5.03
        let half = PriceRule::PercentageDecrease(d("50")).apply(d("10.05")).unwrap();
        assert_eq!(half, d("5.03"));
    }

    #[test]
    fn fixed_decrease_clamps_at_zero() {
        assert_eq!(PriceRule::FixedDecrease(d("25")).apply(d("10")).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn sale_rule_applies_to_adjusted_price() {
        let adj = compute_adjustment(
            d("100"),
            None,
            PriceRule::PercentageIncrease(d("10")),
            Some(SaleRule::PercentageOff(d("10"))),
        )
        .unwrap();
        assert_eq!(adj.price, d("110.00"));
        // 10% off 110, not 10% off 100.
        assert_eq!(adj.sale_price, Some(d("99.00")));
    }

    #[test]
    fn fixed_discount_clamps_at_zero() {
        let sale = SaleRule::FixedDiscount(d("500")).apply(d("20")).unwrap();
        assert_eq!(sale, Some(Decimal::ZERO));
    }

    #[test]
    fn clear_sale_sets_none() {
        let adj = compute_adjustment(
            d("20"),
            Some(d("15")),
            PriceRule::FixedIncrease(d("0")),
            Some(SaleRule::ClearSale),
        )
        .unwrap();
        assert_eq!(adj.sale_price, None);
    }

    #[test]
    fn missing_sale_rule_keeps_existing_sale_price() {
        let adj = compute_adjustment(d("20"), Some(d("15")), PriceRule::SetPrice(d("12")), None)
            .unwrap();
        assert_eq!(adj.price, d("12.00"));
        assert_eq!(adj.sale_price, Some(d("15")));
        assert!(adj.sale_price_lapsed());
    }

    #[test]
    fn rounding_is_idempotent() {
        for raw in ["0.005", "1.115", "2.499", "-3.335", "1234.5678", "7"] {
            let once = round_money(d(raw));
            assert_eq!(round_money(once), once, "raw: {raw}");
        }
    }

    #[test]
    fn results_are_never_negative() {
        let rules = [
            PriceRule::PercentageDecrease(d("100")),
            PriceRule::FixedDecrease(d("1000")),
            PriceRule::SetPrice(d("0")),
        ];
        for rule in rules {
            let adj = compute_adjustment(d("3.33"), None, rule, Some(SaleRule::FixedDiscount(d("9"))))
                .unwrap();
            assert!(adj.price >= Decimal::ZERO);
            assert!(adj.sale_price.unwrap() >= Decimal::ZERO);
        }
    }

    #[test]
    fn validation_rejects_negative_and_over_hundred() {
        assert!(PriceRule::FixedIncrease(d("-1")).validate().is_err());
        assert!(PriceRule::PercentageDecrease(d("101")).validate().is_err());
        assert!(SaleRule::PercentageOff(d("100.01")).validate().is_err());
        assert!(PriceRule::PercentageIncrease(d("250")).validate().is_ok());
        assert!(SaleRule::ClearSale.validate().is_ok());
    }

    #[test]
    fn validation_caps_operands() {
        assert!(PriceRule::PercentageIncrease(d("1000")).validate().is_ok());
        assert!(PriceRule::PercentageIncrease(d("1000.01")).validate().is_err());
        assert!(PriceRule::SetPrice(d("999999.99")).validate().is_ok());
        assert!(PriceRule::SetPrice(d("1000000")).validate().is_err());
        assert!(PriceRule::FixedIncrease(Decimal::MAX).validate().is_err());
        assert!(SaleRule::SetSalePrice(Decimal::MAX).validate().is_err());
    }

    #[test]
    fn overflowing_arithmetic_is_an_error() {
        let huge = PriceRule::PercentageIncrease(Decimal::MAX).apply(d("100"));
        assert!(matches!(huge, Err(CoreError::Validation(_))));

        let sum = PriceRule::FixedIncrease(Decimal::ONE).apply(Decimal::MAX);
        assert!(matches!(sum, Err(CoreError::Validation(_))));

        let off = SaleRule::PercentageOff(d("50")).apply(Decimal::MAX);
        assert!(matches!(off, Err(CoreError::Validation(_))));
    }

    #[test]
    fn deserializes_adjacently_tagged_rules() {
        let rule: PriceRule =
            serde_json::from_str(r#"{"type": "percentage_increase", "value": "10"}"#).unwrap();
        assert_eq!(rule, PriceRule::PercentageIncrease(d("10")));

        let clear: SaleRule = serde_json::from_str(r#"{"type": "clear_sale"}"#).unwrap();
        assert_eq!(clear, SaleRule::ClearSale);
    }
}
