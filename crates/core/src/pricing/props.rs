//! Property-based tests for price derivation.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::bonification::{BonificationChain, apply_bonifications};
use super::engine::PriceDerivationEngine;
use super::parser::parse_decimal;
use super::rounding::RoundingPolicy;
use super::types::{PricingParameters, SourceAmount};

/// Amounts from 0.01 to 1,000,000.00.
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Percentages from 0.00 to 100.00.
fn percentage() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000i64).prop_map(|bp| Decimal::new(bp, 2))
}

fn rounding_policy() -> impl Strategy<Value = RoundingPolicy> {
    prop_oneof![
        Just(RoundingPolicy::None),
        Just(RoundingPolicy::NearestTen),
        Just(RoundingPolicy::CeilTen),
        Just(RoundingPolicy::FloorTen),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A single bonification is `base * (1 - b/100)`.
    #[test]
    fn prop_single_bonification(base in positive_amount(), pct in percentage()) {
        let expected = base * (Decimal::ONE - pct / Decimal::ONE_HUNDRED);
        prop_assert_eq!(apply_bonifications(base, &[pct]), expected);
    }

    /// Bonifications never increase the amount nor make it negative.
    #[test]
    fn prop_bonifications_stay_in_range(
        base in positive_amount(),
        chain in prop::collection::vec(percentage(), 0..5),
    ) {
        let net = apply_bonifications(base, &chain);
        prop_assert!(net >= Decimal::ZERO);
        prop_assert!(net <= base);
    }

    /// Rounding to tens lands on a multiple of ten within the expected bound.
    #[test]
    fn prop_rounding_bounds(amount in positive_amount()) {
        let ten = Decimal::TEN;

        let ceil = RoundingPolicy::CeilTen.apply(amount);
        prop_assert!(ceil >= amount && ceil - amount < ten);
        prop_assert!((ceil % ten).is_zero());

        let floor = RoundingPolicy::FloorTen.apply(amount);
        prop_assert!(floor <= amount && amount - floor < ten);
        prop_assert!((floor % ten).is_zero());

        let nearest = RoundingPolicy::NearestTen.apply(amount);
        prop_assert!((nearest - amount).abs() <= Decimal::new(5, 0));
        prop_assert!((nearest % ten).is_zero());
    }

    /// Plain integers and 2 dp values parse back to themselves in both locales.
    #[test]
    fn prop_parse_plain_amounts(amount in positive_amount()) {
        let dotted = amount.to_string();
        let comma = dotted.replace('.', ",");
        prop_assert_eq!(parse_decimal(&dotted).unwrap(), amount);
        prop_assert_eq!(parse_decimal(&comma).unwrap(), amount);
    }

    /// Derivation is deterministic and never yields a negative price.
    #[test]
    fn prop_derive_deterministic(
        amount in positive_amount(),
        chain in prop::collection::vec(percentage(), 0..4),
        markup in percentage(),
        policy in rounding_policy(),
    ) {
        let params = PricingParameters::Cost {
            source_amount: SourceAmount::Numeric(amount),
            bonifications: BonificationChain::new(chain).unwrap(),
            markup_percent: markup,
            rounding_policy: policy,
        };
        let first = PriceDerivationEngine::derive(&params).unwrap();
        let second = PriceDerivationEngine::derive(&params).unwrap();
        prop_assert_eq!(first, second);
        prop_assert!(first.final_price >= Decimal::ZERO);
        prop_assert!(first.final_price.scale() <= 2);
    }
}
