//! Price derivation.
//!
//! Turns a supplier cost or a final price, as typed by a user or read from a
//! spreadsheet, into a stored selling price:
//!
//! - `parser` - locale-ambiguous numeric parsing (`12.345,67`, `1,234.56`)
//! - `bonification` - ordered successive discounts
//! - `rounding` - multiple-of-ten rounding policies
//! - `engine` - the derivation itself

pub mod bonification;
pub mod engine;
pub mod error;
pub mod parser;
pub mod rounding;
pub mod types;

#[cfg(test)]
mod props;

pub use bonification::{BonificationChain, apply_bonifications};
pub use engine::PriceDerivationEngine;
pub use error::{DerivationError, ParseError};
pub use parser::parse_decimal;
pub use rounding::RoundingPolicy;
pub use types::{DerivedPrice, PricingParameters, ProductPricing, SourceAmount};
