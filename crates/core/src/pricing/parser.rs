//! Locale-ambiguous numeric parser.
//!
//! Spreadsheet cells and manual price edits arrive as `12.345,67`,
//! `1,234.56`, `1234,5` or `$ 1.500`. Either `.` or `,` may be the decimal
//! separator and the other the thousands separator:
//!
//! - both present: the one appearing last is the decimal separator;
//! - only `,`: decimal if there is a single comma followed by at most three
//!   digits, otherwise every comma is a thousands separator;
//! - only `.`: the last dot is the decimal point, earlier ones are dropped.

use std::str::FromStr;

use rust_decimal::Decimal;

use super::error::ParseError;

/// Parses a loosely formatted number.
///
/// ```
/// use rust_decimal_macros::dec;
/// use arqon_core::pricing::parse_decimal;
///
/// assert_eq!(parse_decimal("12.345,67").unwrap(), dec!(12345.67));
/// assert_eq!(parse_decimal("1,234.56").unwrap(), dec!(1234.56));
/// assert_eq!(parse_decimal("1234,5").unwrap(), dec!(1234.5));
/// assert!(parse_decimal("").is_err());
/// ```
pub fn parse_decimal(raw: &str) -> Result<Decimal, ParseError> {
    if raw.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();

    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return Err(ParseError::NoDigits(raw.to_string()));
    }

    let normalized = complete_fraction(&normalize_separators(&cleaned));
    Decimal::from_str(&normalized).map_err(|_| ParseError::Malformed(raw.to_string()))
}

/// Rewrites the input so that `.` is the only (decimal) separator.
fn normalize_separators(s: &str) -> String {
    match (s.rfind('.'), s.rfind(',')) {
        (Some(dot), Some(comma)) if comma > dot => s.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => keep_last_dot(&s.replace(',', "")),
        (None, Some(_)) => match s.split_once(',') {
            Some((int, frac)) if !frac.contains(',') && frac.len() <= 3 => format!("{int}.{frac}"),
            _ => s.replace(',', ""),
        },
        (Some(_), None) => keep_last_dot(s),
        (None, None) => s.to_string(),
    }
}

fn keep_last_dot(s: &str) -> String {
    match s.rfind('.') {
        Some(idx) => format!("{}.{}", s[..idx].replace('.', ""), &s[idx + 1..]),
        None => s.to_string(),
    }
}

/// Turns `12.` into `12` and `.5` into `0.5`.
fn complete_fraction(s: &str) -> String {
    let s = s.strip_suffix('.').unwrap_or(s);
    if let Some(rest) = s.strip_prefix("-.") {
        format!("-0.{rest}")
    } else if let Some(rest) = s.strip_prefix('.') {
        format!("0.{rest}")
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case("12.345,67", dec!(12345.67))]
    #[case("1,234.56", dec!(1234.56))]
    #[case("1234,5", dec!(1234.5))]
    #[case("1.234.567,89", dec!(1234567.89))]
    #[case("1,234,567.89", dec!(1234567.89))]
    #[case("1,234,567", dec!(1234567))]
    #[case("1.234.567", dec!(1234.567))]
    #[case("1,234", dec!(1.234))]
    #[case("1,2345", dec!(12345))]
    #[case("1.5", dec!(1.5))]
    #[case("42", dec!(42))]
    #[case("  $ 1.500,00 ", dec!(1500.00))]
    #[case("ARS 99,9", dec!(99.9))]
    #[case("-12,5", dec!(-12.5))]
    #[case("12,", dec!(12))]
    #[case(",5", dec!(0.5))]
    #[case("0", dec!(0))]
    fn test_parse_decimal(#[case] raw: &str, #[case] expected: Decimal) {
        assert_eq!(parse_decimal(raw).unwrap(), expected);
    }

    #[test]
    fn test_empty_input_fails() {
        assert_eq!(parse_decimal(""), Err(ParseError::Empty));
        assert_eq!(parse_decimal("   "), Err(ParseError::Empty));
    }

    #[test]
    fn test_no_digits_fails() {
        assert_eq!(
            parse_decimal("abc"),
            Err(ParseError::NoDigits("abc".to_string()))
        );
        assert!(matches!(parse_decimal("-.,"), Err(ParseError::NoDigits(_))));
    }

    #[test]
    fn test_misplaced_sign_is_malformed() {
        assert!(matches!(parse_decimal("12-3"), Err(ParseError::Malformed(_))));
        assert!(matches!(parse_decimal("--5"), Err(ParseError::Malformed(_))));
    }

    #[test]
    fn test_parse_is_deterministic() {
        let a = parse_decimal("7.654,321").unwrap();
        let b = parse_decimal("7.654,321").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), b.to_string());
    }
}
