//! Money helpers for the single implicit currency.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Every amount is a `rust_decimal::Decimal`.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places stored for monetary amounts.
pub const MONEY_SCALE: u32 = 2;

/// One hundred, the percentage base.
pub const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Rounds an amount to [`MONEY_SCALE`] places, ties away from zero.
///
/// ```
/// use rust_decimal_macros::dec;
/// use arqon_shared::types::money::round_money;
///
/// assert_eq!(round_money(dec!(849.605)), dec!(849.61));
/// assert_eq!(round_money(dec!(-0.125)), dec!(-0.13));
/// ```
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns the multiplier that removes `percent` from an amount: `1 - percent/100`.
#[must_use]
pub fn discount_factor(percent: Decimal) -> Decimal {
    Decimal::ONE - percent / HUNDRED
}

/// Returns the multiplier that adds `percent` to an amount: `1 + percent/100`.
#[must_use]
pub fn markup_factor(percent: Decimal) -> Decimal {
    Decimal::ONE + percent / HUNDRED
}

/// Returns true if the amount is strictly greater than zero.
#[must_use]
pub fn is_positive(amount: Decimal) -> bool {
    amount > Decimal::ZERO
}

#[cfg(test)]
#[path = "money_tests.rs"]
mod tests;
