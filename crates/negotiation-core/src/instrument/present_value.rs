use rust_decimal::Decimal;

use crate::error::NegotiationError;
use crate::money::{round_to_cents, safe_div};
use crate::types::{Money, Rate};
use crate::NegotiationResult;

use super::method::{PaymentKind, PaymentMethod};

/// Present value of an even schedule of `count` installments of
/// `amount / count` discounted at `monthly_rate` per month:
///
/// PV = sum over i = 1..count of (amount / count) / (1 + r)^i
///
/// Accumulated at full Decimal precision; a single cent rounding at the
/// end. `count = 1` degenerates to `amount / (1 + r)`; `r = 0` yields
/// exactly `amount`.
pub fn discounted_schedule_value(
    amount: Money,
    count: u32,
    monthly_rate: Rate,
) -> NegotiationResult<Money> {
    if count == 0 {
        return Err(NegotiationError::InvalidInput {
            field: "count".into(),
            reason: "Installment count must be at least 1".into(),
        });
    }
    if monthly_rate < Decimal::ZERO || monthly_rate >= Decimal::ONE {
        return Err(NegotiationError::InvalidInput {
            field: "monthly_rate".into(),
            reason: "Monthly rate must lie in [0, 1)".into(),
        });
    }
    if monthly_rate.is_zero() {
        return Ok(amount);
    }

    let installment = safe_div(amount, Decimal::from(count), "even installment")?;
    let one_plus_r = Decimal::ONE + monthly_rate;
    let mut discount = Decimal::ONE;
    let mut pv = Decimal::ZERO;

    for i in 1..=count {
        discount *= one_plus_r;
        if discount.is_zero() {
            return Err(NegotiationError::DivisionByZero {
                context: format!("discount factor at installment {i}"),
            });
        }
        pv += installment / discount;
    }

    Ok(round_to_cents(pv))
}

/// Present value per instrument kind. Cash is liquidity today and
/// boleto-style invoices carry no financial-cost discount; Card and
/// Financing discount their even schedule at the monthly rate.
pub fn present_value(method: &PaymentMethod) -> NegotiationResult<Money> {
    match &method.kind {
        PaymentKind::Cash { .. } | PaymentKind::Invoice { .. } => Ok(method.amount),
        PaymentKind::Card {
            installment_count,
            monthly_rate,
            ..
        }
        | PaymentKind::Financing {
            installment_count,
            monthly_rate,
            ..
        } => discounted_schedule_value(method.amount, *installment_count, *monthly_rate),
    }
}

/// Discount attributed to one instrument: declared amount minus present
/// value. Non-negative for any positive rate.
pub fn implied_discount(method: &PaymentMethod) -> Money {
    method.amount - method.present_value
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_zero_rate_equals_amount() {
        let pv = discounted_schedule_value(dec!(10000.00), 3, dec!(0)).unwrap();
        assert_eq!(pv, dec!(10000.00));
    }

    #[test]
    fn test_single_installment_degenerate() {
        // 1000 / 1.035 = 966.1835... -> 966.18
        let pv = discounted_schedule_value(dec!(1000.00), 1, dec!(0.035)).unwrap();
        assert_eq!(pv, dec!(966.18));
    }

    #[test]
    fn test_known_answer_three_installments() {
        // 10000 over 3 at 2%/month: annuity factor 2.8838833,
        // PV = 3333.3333 * 2.8838833 = 9612.9442
        let pv = discounted_schedule_value(dec!(10000.00), 3, dec!(0.02)).unwrap();
        assert_eq!(pv, dec!(9612.94));
    }

    #[test]
    fn test_monotonic_in_rate() {
        let amount = dec!(5000.00);
        let pv_low = discounted_schedule_value(amount, 6, dec!(0.01)).unwrap();
        let pv_mid = discounted_schedule_value(amount, 6, dec!(0.02)).unwrap();
        let pv_high = discounted_schedule_value(amount, 6, dec!(0.05)).unwrap();
        assert!(pv_low > pv_mid);
        assert!(pv_mid > pv_high);
        assert!(pv_high > Decimal::ZERO);
    }

    #[test]
    fn test_discount_non_negative() {
        let amount = dec!(750.00);
        let pv = discounted_schedule_value(amount, 10, dec!(0.015)).unwrap();
        assert!(amount - pv >= Decimal::ZERO);
    }

    #[test]
    fn test_rate_out_of_range_rejected() {
        assert!(discounted_schedule_value(dec!(100), 3, dec!(1)).is_err());
        assert!(discounted_schedule_value(dec!(100), 3, dec!(-0.01)).is_err());
    }

    #[test]
    fn test_zero_count_rejected() {
        let result = discounted_schedule_value(dec!(100), 0, dec!(0.02));
        assert!(matches!(
            result,
            Err(NegotiationError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_deterministic() {
        let a = discounted_schedule_value(dec!(8123.45), 9, dec!(0.0199)).unwrap();
        let b = discounted_schedule_value(dec!(8123.45), 9, dec!(0.0199)).unwrap();
        assert_eq!(a, b);
    }
}
