//! Successive supplier discounts ("bonificaciones").

use arqon_shared::types::money::{HUNDRED, discount_factor};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DerivationError;
use super::parser::parse_decimal;

/// Applies each bonification in order, compounding: `base * Π(1 - b/100)`.
///
/// ```
/// use rust_decimal_macros::dec;
/// use arqon_core::pricing::apply_bonifications;
///
/// assert_eq!(apply_bonifications(dec!(1000), &[dec!(20), dec!(10)]), dec!(720));
/// ```
#[must_use]
pub fn apply_bonifications(base: Decimal, bonifications: &[Decimal]) -> Decimal {
    bonifications
        .iter()
        .fold(base, |acc, pct| acc * discount_factor(*pct))
}

/// Ordered list of bonification percentages, each within `0..=100`.
///
/// Zero entries are the identity and are dropped on construction. Accepts
/// either a JSON array or a `"20+10"` string when deserialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ChainInput", into = "Vec<Decimal>")]
pub struct BonificationChain(Vec<Decimal>);

impl BonificationChain {
    /// Builds a chain, rejecting percentages outside `0..=100`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidBonification` for the first out-of-range value.
    pub fn new(percentages: Vec<Decimal>) -> Result<Self, DerivationError> {
        if let Some(bad) = percentages
            .iter()
            .find(|p| **p < Decimal::ZERO || **p > HUNDRED)
        {
            return Err(DerivationError::InvalidBonification(*bad));
        }
        Ok(Self(percentages.into_iter().filter(|p| !p.is_zero()).collect()))
    }

    /// Parses a `+`-joined chain such as `"20+10+5"`. Empty segments are
    /// ignored; each segment goes through the locale-aware parser.
    ///
    /// # Errors
    ///
    /// Returns `MalformedBonification` if a segment is not a number and
    /// `InvalidBonification` if it is out of range.
    pub fn parse(input: &str) -> Result<Self, DerivationError> {
        let percentages = input
            .split('+')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(|segment| parse_decimal(segment).map_err(DerivationError::MalformedBonification))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(percentages)
    }

    /// Returns the percentages in application order.
    #[must_use]
    pub fn as_slice(&self) -> &[Decimal] {
        &self.0
    }

    /// Returns true if no bonification applies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Applies the chain to `base`.
    #[must_use]
    pub fn apply(&self, base: Decimal) -> Decimal {
        apply_bonifications(base, &self.0)
    }
}

impl std::fmt::Display for BonificationChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|p| p.normalize().to_string())
            .collect::<Vec<_>>()
            .join("+");
        f.write_str(&joined)
    }
}

impl From<BonificationChain> for Vec<Decimal> {
    fn from(chain: BonificationChain) -> Self {
        chain.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ChainInput {
    List(Vec<Decimal>),
    Text(String),
}

impl TryFrom<ChainInput> for BonificationChain {
    type Error = DerivationError;

    fn try_from(input: ChainInput) -> Result<Self, Self::Error> {
        match input {
            ChainInput::List(values) => Self::new(values),
            ChainInput::Text(text) => Self::parse(&text),
        }
    }
}
