use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::error::NegotiationError;
use crate::types::{Currency, Money};
use crate::NegotiationResult;

/// Equality tolerance for sums of cent-rounded values: one minor unit.
pub const CENT_TOLERANCE: Decimal = dec!(0.01);

/// Round to two decimal places, half away from zero.
///
/// The single rounding rule of the engine. Applied only at the boundary
/// where rate math produces a stored installment amount or a present
/// value, never mid-computation.
pub fn round_to_cents(value: Decimal) -> Money {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Truncate to two decimal places (toward zero). Used by the even split,
/// whose remainder is assigned to the last installment.
pub fn floor_to_cents(value: Decimal) -> Money {
    value.round_dp_with_strategy(2, RoundingStrategy::ToZero)
}

/// Equal within one cent.
pub fn approx_eq(a: Money, b: Money) -> bool {
    (a - b).abs() <= CENT_TOLERANCE
}

/// Division with an explicit divide-by-zero guard.
pub fn safe_div(numerator: Decimal, denominator: Decimal, context: &str) -> NegotiationResult<Decimal> {
    if denominator.is_zero() {
        return Err(NegotiationError::DivisionByZero {
            context: context.to_string(),
        });
    }
    Ok(numerator / denominator)
}

/// Locale-formatted display string: "R$ 1.234,56" for BRL, "$1,234.56"
/// for USD. The sign precedes the symbol.
pub fn to_display_string(value: Money, currency: &Currency) -> String {
    let (group_sep, decimal_sep) = currency.separators();
    let rounded = round_to_cents(value);
    let total_cents = (rounded.abs() * dec!(100)).trunc().to_i128().unwrap_or(0);
    let units = total_cents / 100;
    let cents = total_cents % 100;

    let grouped = group_digits(&units.to_string(), group_sep);
    let sign = if rounded < Decimal::ZERO { "-" } else { "" };
    let space = if matches!(currency, Currency::USD) { "" } else { " " };

    format!(
        "{sign}{}{space}{grouped}{decimal_sep}{cents:02}",
        currency.symbol()
    )
}

fn group_digits(digits: &str, sep: char) -> String {
    let chars: Vec<char> = digits.chars().collect();
    let mut out = String::with_capacity(chars.len() + chars.len() / 3);
    for (i, ch) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(*ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_to_cents(dec!(1.005)), dec!(1.01));
        assert_eq!(round_to_cents(dec!(1.004)), dec!(1.00));
        assert_eq!(round_to_cents(dec!(-1.005)), dec!(-1.01));
        assert_eq!(round_to_cents(dec!(3333.33333)), dec!(3333.33));
    }

    #[test]
    fn test_floor_to_cents() {
        assert_eq!(floor_to_cents(dec!(33.3399)), dec!(33.33));
        assert_eq!(floor_to_cents(dec!(33.3301)), dec!(33.33));
    }

    #[test]
    fn test_approx_eq_tolerance() {
        assert!(approx_eq(dec!(100.00), dec!(100.01)));
        assert!(approx_eq(dec!(100.01), dec!(100.00)));
        assert!(!approx_eq(dec!(100.00), dec!(100.02)));
    }

    #[test]
    fn test_safe_div_by_zero() {
        let result = safe_div(dec!(1), Decimal::ZERO, "test");
        assert!(matches!(
            result,
            Err(NegotiationError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn test_display_brl() {
        assert_eq!(to_display_string(dec!(1234.56), &Currency::BRL), "R$ 1.234,56");
        assert_eq!(to_display_string(dec!(0.5), &Currency::BRL), "R$ 0,50");
        assert_eq!(to_display_string(dec!(-10), &Currency::BRL), "-R$ 10,00");
        assert_eq!(
            to_display_string(dec!(1000000), &Currency::BRL),
            "R$ 1.000.000,00"
        );
    }

    #[test]
    fn test_display_usd() {
        assert_eq!(to_display_string(dec!(1234.56), &Currency::USD), "$1,234.56");
        assert_eq!(to_display_string(dec!(99.9), &Currency::USD), "$99.90");
    }
}
