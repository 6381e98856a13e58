//! Price derivation engine.

use arqon_shared::types::money::{markup_factor, round_money};
use rayon::prelude::*;
use rust_decimal::Decimal;

use super::error::DerivationError;
use super::types::{DerivedPrice, PricingParameters, SourceAmount};

/// Stateless price derivation.
pub struct PriceDerivationEngine;

impl PriceDerivationEngine {
    /// Derives net cost and final price from pricing parameters.
    ///
    /// `net_cost` is rounded to 2 decimals for storage, but the markup is
    /// applied to the unrounded value.
    ///
    /// # Errors
    ///
    /// Returns `DerivationError` on an unparseable or non-positive source
    /// amount, a negative markup, or a negative result.
    pub fn derive(params: &PricingParameters) -> Result<DerivedPrice, DerivationError> {
        match params {
            PricingParameters::FinalPrice {
                source_amount,
                rounding_policy,
            } => {
                let amount = resolve_source(source_amount)?;
                let final_price = rounding_policy.apply(amount);
                ensure_non_negative(final_price)?;
                Ok(DerivedPrice {
                    net_cost: None,
                    final_price,
                })
            }
            PricingParameters::Cost {
                source_amount,
                bonifications,
                markup_percent,
                rounding_policy,
            } => {
                let amount = resolve_source(source_amount)?;
                if *markup_percent < Decimal::ZERO {
                    return Err(DerivationError::InvalidMarkup(*markup_percent));
                }

                let net_cost = bonifications.apply(amount);
                ensure_non_negative(net_cost)?;

                let pre_round = net_cost
                    .checked_mul(markup_factor(*markup_percent))
                    .ok_or(DerivationError::Overflow)?;
                let final_price = rounding_policy.apply(pre_round);
                ensure_non_negative(final_price)?;

                Ok(DerivedPrice {
                    net_cost: Some(round_money(net_cost)),
                    final_price,
                })
            }
        }
    }

    /// Derives many rows independently in parallel. Results keep input order.
    #[must_use]
    pub fn derive_all(
        params: &[PricingParameters],
    ) -> Vec<Result<DerivedPrice, DerivationError>> {
        params.par_iter().map(Self::derive).collect()
    }
}

fn resolve_source(source: &SourceAmount) -> Result<Decimal, DerivationError> {
    let amount = source
        .resolve()
        .map_err(|e| DerivationError::InvalidAmount(e.to_string()))?;
    if amount <= Decimal::ZERO {
        return Err(DerivationError::InvalidAmount(format!(
            "{amount} is not positive"
        )));
    }
    Ok(amount)
}

fn ensure_non_negative(value: Decimal) -> Result<(), DerivationError> {
    if value < Decimal::ZERO {
        tracing::error!(%value, "price derivation produced a negative amount");
        return Err(DerivationError::NegativeResult(value));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::{BonificationChain, RoundingPolicy};
    use rust_decimal_macros::dec;

    fn cost(amount: &str, chain: &str, markup: Decimal, policy: RoundingPolicy) -> PricingParameters {
        PricingParameters::Cost {
            source_amount: SourceAmount::from(amount),
            bonifications: BonificationChain::parse(chain).unwrap(),
            markup_percent: markup,
            rounding_policy: policy,
        }
    }

    #[test]
    fn test_cost_with_chain_markup_and_rounding() {
        let derived = PriceDerivationEngine::derive(&cost(
            "1000",
            "20+10",
            dec!(18),
            RoundingPolicy::NearestTen,
        ))
        .unwrap();

        assert_eq!(derived.net_cost, Some(dec!(720.00)));
        assert_eq!(derived.final_price, dec!(850));
    }

    #[test]
    fn test_cost_without_rounding() {
        let derived =
            PriceDerivationEngine::derive(&cost("1000", "20+10", dec!(18), RoundingPolicy::None))
                .unwrap();
        assert_eq!(derived.final_price, dec!(849.60));
    }

    #[test]
    fn test_markup_uses_unrounded_net_cost() {
        // Rounding 0.125 to 0.13 first would give 0.26.
        let derived = PriceDerivationEngine::derive(&PricingParameters::Cost {
            source_amount: SourceAmount::Numeric(dec!(0.125)),
            bonifications: BonificationChain::default(),
            markup_percent: dec!(100),
            rounding_policy: RoundingPolicy::None,
        })
        .unwrap();
        assert_eq!(derived.net_cost, Some(dec!(0.13)));
        assert_eq!(derived.final_price, dec!(0.25));
    }

    #[test]
    fn test_final_price_still_rounds() {
        let derived = PriceDerivationEngine::derive(&PricingParameters::FinalPrice {
            source_amount: SourceAmount::from("1.234,56"),
            rounding_policy: RoundingPolicy::CeilTen,
        })
        .unwrap();
        assert_eq!(derived.net_cost, None);
        assert_eq!(derived.final_price, dec!(1240));
    }

    #[test]
    fn test_unparseable_amount_is_rejected() {
        let result = PriceDerivationEngine::derive(&cost("n/a", "", dec!(0), RoundingPolicy::None));
        assert!(matches!(result, Err(DerivationError::InvalidAmount(_))));
    }

    #[test]
    fn test_non_positive_amount_is_rejected() {
        for raw in ["0", "-10"] {
            let result =
                PriceDerivationEngine::derive(&cost(raw, "", dec!(0), RoundingPolicy::None));
            assert!(matches!(result, Err(DerivationError::InvalidAmount(_))));
        }
    }

    #[test]
    fn test_negative_markup_is_rejected() {
        let result =
            PriceDerivationEngine::derive(&cost("100", "", dec!(-5), RoundingPolicy::None));
        assert_eq!(result, Err(DerivationError::InvalidMarkup(dec!(-5))));
    }

    #[test]
    fn test_full_bonification_yields_zero_not_error() {
        let derived =
            PriceDerivationEngine::derive(&cost("100", "100", dec!(50), RoundingPolicy::None))
                .unwrap();
        assert_eq!(derived.net_cost, Some(dec!(0)));
        assert_eq!(derived.final_price, dec!(0));
    }

    #[test]
    fn test_derive_is_idempotent() {
        let params = cost("12.345,67", "15+5", dec!(35), RoundingPolicy::FloorTen);
        let first = PriceDerivationEngine::derive(&params).unwrap();
        let second = PriceDerivationEngine::derive(&params).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.final_price.to_string(), second.final_price.to_string());
    }

    #[test]
    fn test_derive_all_reports_per_row() {
        let rows = vec![
            cost("100", "", dec!(10), RoundingPolicy::None),
            cost("oops", "", dec!(10), RoundingPolicy::None),
            cost("200", "", dec!(10), RoundingPolicy::None),
        ];
        let results = PriceDerivationEngine::derive_all(&rows);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().final_price, dec!(110));
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap().final_price, dec!(220));
    }
}
