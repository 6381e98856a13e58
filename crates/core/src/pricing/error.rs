//! Pricing error types.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors produced by the locale-aware numeric parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Input was empty or whitespace only.
    #[error("Empty numeric input")]
    Empty,

    /// Input contained no digits after cleanup.
    #[error("No digits in numeric input: {0:?}")]
    NoDigits(String),

    /// Input could not be read as a number after separator normalization.
    #[error("Malformed numeric input: {0:?}")]
    Malformed(String),
}

/// Errors that can occur while deriving a price.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DerivationError {
    /// Source amount failed to parse or is not positive.
    #[error("Invalid source amount: {0}")]
    InvalidAmount(String),

    /// Bonification percentage outside 0..=100.
    #[error("Invalid bonification {0}%: must be between 0 and 100")]
    InvalidBonification(Decimal),

    /// A segment of a `20+10` style chain could not be parsed.
    #[error("Invalid bonification chain segment: {0}")]
    MalformedBonification(ParseError),

    /// Markup percentage is negative.
    #[error("Invalid markup {0}%: must not be negative")]
    InvalidMarkup(Decimal),

    /// Intermediate amount does not fit in a decimal.
    #[error("Amount overflow while deriving price")]
    Overflow,

    /// Derivation produced a negative amount.
    #[error("Derivation produced a negative amount: {0}")]
    NegativeResult(Decimal),
}

impl DerivationError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::InvalidBonification(_) => "INVALID_BONIFICATION",
            Self::MalformedBonification(_) => "MALFORMED_BONIFICATION",
            Self::InvalidMarkup(_) => "INVALID_MARKUP",
            Self::Overflow => "AMOUNT_OVERFLOW",
            Self::NegativeResult(_) => "NEGATIVE_RESULT",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidAmount(_)
            | Self::InvalidBonification(_)
            | Self::MalformedBonification(_)
            | Self::InvalidMarkup(_)
            | Self::Overflow => 400,
            // Invariant violation, not a user error.
            Self::NegativeResult(_) => 500,
        }
    }
}
