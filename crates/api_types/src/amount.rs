//! Conversions between display amounts (decimal currency) and stored amounts
//! (integer minor units, i.e. cents).
//!
//! The stored value is authoritative. Display strings always carry exactly
//! two decimals, and converting back rounds to the nearest cent so that
//! floating-point drift never loses or invents a cent:
//!
//! ```rust
//! use api_types::amount::{parse_stored, to_display, to_stored};
//!
//! assert_eq!(to_display(1050), "10.50");
//! assert_eq!(to_stored(10.5), 1050);
//! assert_eq!(parse_stored("0.29").unwrap(), 29);
//! ```

use thiserror::Error;

/// Smallest amount a user may enter, in minor units.
pub const STORED_MIN: i64 = 1;
/// Largest amount a user may enter, in minor units (999999.99).
pub const STORED_MAX: i64 = 99_999_999;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("empty amount")]
    Empty,
    #[error("invalid amount: {0}")]
    Invalid(String),
}

/// Formats minor units as a decimal string with two fractional digits.
#[must_use]
pub fn to_display(stored: i64) -> String {
    let sign = if stored < 0 { "-" } else { "" };
    let abs = stored.unsigned_abs();
    let units = abs / 100;
    let cents = abs % 100;
    format!("{sign}{units}.{cents:02}")
}

/// Converts a display amount to minor units, rounding to the nearest unit.
#[must_use]
pub fn to_stored(display: f64) -> i64 {
    (display * 100.0).round() as i64
}

/// Parses a display string (e.g. `"123.45"`) into minor units.
///
/// Only plain decimals are accepted; surrounding whitespace is ignored.
/// Precision beyond cents is rounded, bounds are left to the caller.
pub fn parse_stored(display: &str) -> Result<i64, AmountError> {
    let trimmed = display.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }

    if !is_plain_decimal(trimmed) {
        return Err(AmountError::Invalid(trimmed.to_string()));
    }
    let value: f64 = trimmed
        .parse()
        .map_err(|_| AmountError::Invalid(trimmed.to_string()))?;

    Ok(to_stored(value))
}

/// Digits with an optional fractional part: no sign, exponent or separators.
fn is_plain_decimal(text: &str) -> bool {
    let (whole, frac) = match text.split_once('.') {
        Some((whole, frac)) => (whole, Some(frac)),
        None => (text, None),
    };
    let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    digits(whole) && frac.is_none_or(digits)
}

/// Number of fractional digits typed in a display string, if any.
pub fn fraction_digits(display: &str) -> usize {
    display
        .trim()
        .split_once('.')
        .map(|(_, frac)| frac.len())
        .unwrap_or(0)
}
