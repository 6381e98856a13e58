//! Pricing parameter and result types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::bonification::BonificationChain;
use super::error::ParseError;
use super::parser::parse_decimal;
use super::rounding::RoundingPolicy;

/// A source amount, either already numeric or a raw cell to be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceAmount {
    /// Already a decimal.
    Numeric(Decimal),
    /// Raw text such as `"12.345,67"`.
    Raw(String),
}

impl SourceAmount {
    /// Resolves the amount to a decimal.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the raw text is not a number.
    pub fn resolve(&self) -> Result<Decimal, ParseError> {
        match self {
            Self::Numeric(value) => Ok(*value),
            Self::Raw(raw) => parse_decimal(raw),
        }
    }
}

impl From<Decimal> for SourceAmount {
    fn from(value: Decimal) -> Self {
        Self::Numeric(value)
    }
}

impl From<&str> for SourceAmount {
    fn from(raw: &str) -> Self {
        Self::Raw(raw.to_string())
    }
}

/// Inputs of a price derivation, tagged by what the source amount means.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source_kind", rename_all = "snake_case")]
pub enum PricingParameters {
    /// The source amount is a supplier cost.
    Cost {
        /// Supplier cost before bonifications.
        source_amount: SourceAmount,
        /// Successive discounts applied to the cost.
        #[serde(default)]
        bonifications: BonificationChain,
        /// Markup over net cost, in percent.
        #[serde(default)]
        markup_percent: Decimal,
        /// Rounding of the final price.
        #[serde(default)]
        rounding_policy: RoundingPolicy,
    },
    /// The source amount is already the selling price.
    FinalPrice {
        /// Selling price before rounding.
        source_amount: SourceAmount,
        /// Rounding of the final price.
        #[serde(default)]
        rounding_policy: RoundingPolicy,
    },
}

impl PricingParameters {
    /// Returns the rounding policy of either variant.
    #[must_use]
    pub const fn rounding_policy(&self) -> RoundingPolicy {
        match self {
            Self::Cost {
                rounding_policy, ..
            }
            | Self::FinalPrice {
                rounding_policy, ..
            } => *rounding_policy,
        }
    }
}

/// Result of a price derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedPrice {
    /// Cost after bonifications, 2 dp. `None` when the source was a final price.
    pub net_cost: Option<Decimal>,
    /// Rounded selling price.
    pub final_price: Decimal,
}

/// Parameters stored on a product together with the price they produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPricing {
    /// Inputs of the last derivation.
    pub parameters: PricingParameters,
    /// Output of the last derivation.
    pub derived: DerivedPrice,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_cost_parameters_from_json() {
        let params: PricingParameters = serde_json::from_str(
            r#"{
                "source_kind": "cost",
                "source_amount": "1.000,00",
                "bonifications": "20+10",
                "markup_percent": "18",
                "rounding_policy": "nearest10"
            }"#,
        )
        .unwrap();

        let PricingParameters::Cost {
            source_amount,
            bonifications,
            markup_percent,
            rounding_policy,
        } = params
        else {
            panic!("expected cost parameters");
        };
        assert_eq!(source_amount.resolve().unwrap(), dec!(1000));
        assert_eq!(bonifications.as_slice(), &[dec!(20), dec!(10)]);
        assert_eq!(markup_percent, dec!(18));
        assert_eq!(rounding_policy, RoundingPolicy::NearestTen);
    }

    #[test]
    fn test_final_price_defaults() {
        let params: PricingParameters =
            serde_json::from_str(r#"{"source_kind": "final_price", "source_amount": 99.5}"#)
                .unwrap();
        assert_eq!(params.rounding_policy(), RoundingPolicy::None);
        assert!(matches!(params, PricingParameters::FinalPrice { .. }));
    }

    #[test]
    fn test_unknown_source_kind_rejected() {
        let result = serde_json::from_str::<PricingParameters>(
            r#"{"source_kind": "list_price", "source_amount": 10}"#,
        );
        assert!(result.is_err());
    }
}
