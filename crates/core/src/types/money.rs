//! Decimal money helpers.
//!
//! Shopify sends amounts as decimal strings (`"19.99"`). They are parsed into
//! [`Decimal`] so sums stay exact; rounding happens once, on the final value.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of fractional digits reported for money values.
pub const MONEY_SCALE: u32 = 2;

/// Parse a decimal amount string, coercing missing or malformed input to zero.
///
/// Surrounding whitespace is ignored. Scientific notation is accepted since
/// some webhook payloads carry floats serialized that way.
///
/// # Examples
///
/// ```
/// use rust_decimal::Decimal;
/// use storepulse_core::parse_amount;
///
/// assert_eq!(parse_amount(Some("19.99")), Decimal::new(1999, 2));
/// assert_eq!(parse_amount(Some("abc")), Decimal::ZERO);
/// assert_eq!(parse_amount(None), Decimal::ZERO);
/// ```
#[must_use]
pub fn parse_amount(raw: Option<&str>) -> Decimal {
    let Some(s) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Decimal::ZERO;
    };

    s.parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(s))
        .unwrap_or(Decimal::ZERO)
}

/// Round a money value to two decimal places, half away from zero.
#[must_use]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}
