//! Final price rounding policies.

use arqon_shared::types::round_money;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// How a final selling price is rounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundingPolicy {
    /// Round to 2 decimal places only.
    #[default]
    #[serde(rename = "none")]
    None,
    /// Round to the nearest multiple of 10, halves away from zero.
    #[serde(rename = "nearest10")]
    NearestTen,
    /// Round up to the next multiple of 10.
    #[serde(rename = "ceil10")]
    CeilTen,
    /// Round down to the previous multiple of 10.
    #[serde(rename = "floor10")]
    FloorTen,
}

impl RoundingPolicy {
    /// Applies the policy. The result always has at most 2 decimal places.
    #[must_use]
    pub fn apply(self, amount: Decimal) -> Decimal {
        let tens = amount / Decimal::TEN;
        let rounded = match self {
            Self::None => return round_money(amount),
            Self::NearestTen => tens.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero),
            Self::CeilTen => tens.ceil(),
            Self::FloorTen => tens.floor(),
        };
        round_money(rounded.saturating_mul(Decimal::TEN))
    }

    /// Wire name of the policy.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::NearestTen => "nearest10",
            Self::CeilTen => "ceil10",
            Self::FloorTen => "floor10",
        }
    }
}

impl std::fmt::Display for RoundingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RoundingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "nearest10" => Ok(Self::NearestTen),
            "ceil10" => Ok(Self::CeilTen),
            "floor10" => Ok(Self::FloorTen),
            other => Err(format!("unknown rounding policy: {other}")),
        }
    }
}
