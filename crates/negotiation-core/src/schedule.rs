use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::NegotiationError;
use crate::money::{approx_eq, floor_to_cents, safe_div};
use crate::types::{MethodId, Money};
use crate::NegotiationResult;

/// A single dated installment of a payment schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    /// 1-based position within the schedule
    pub number: u32,
    pub due_date: NaiveDate,
    pub amount: Money,
}

/// An ordered, non-empty sequence of installments. Amounts sum exactly to
/// the total the schedule was generated from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub installments: Vec<Installment>,
}

impl Schedule {
    pub fn total(&self) -> Money {
        self.installments.iter().map(|i| i.amount).sum()
    }

    pub fn len(&self) -> usize {
        self.installments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.installments.is_empty()
    }
}

/// Generate an even-split schedule of `count` installments.
///
/// Each installment gets `floor(total / count)` at cent precision; the
/// last installment absorbs the whole division remainder, never spread
/// across the others. Pure and deterministic.
pub fn generate_schedule(
    total: Money,
    count: u32,
    first_due_date: NaiveDate,
) -> NegotiationResult<Schedule> {
    if count == 0 {
        return Err(NegotiationError::InvalidInput {
            field: "count".into(),
            reason: "Installment count must be at least 1".into(),
        });
    }
    if total < Decimal::ZERO {
        return Err(NegotiationError::InvalidInput {
            field: "total".into(),
            reason: "Schedule total must not be negative".into(),
        });
    }

    let base = floor_to_cents(safe_div(total, Decimal::from(count), "schedule even split")?);
    let mut installments = Vec::with_capacity(count as usize);

    for number in 1..=count {
        let amount = if number == count {
            total - base * Decimal::from(count - 1)
        } else {
            base
        };
        installments.push(Installment {
            number,
            due_date: due_date_for(first_due_date, number)?,
            amount,
        });
    }

    Ok(Schedule { installments })
}

/// Due date of installment `number`: the first due date advanced by whole
/// calendar months. Offsets are always taken from the first due date so
/// the day of month is preserved where possible and clamped to the end of
/// shorter months (Jan 31 -> Feb 28/29, but Mar 31 again).
pub fn due_date_for(first_due_date: NaiveDate, number: u32) -> NegotiationResult<NaiveDate> {
    first_due_date
        .checked_add_months(Months::new(number - 1))
        .ok_or_else(|| {
            NegotiationError::DateError(format!(
                "Due date out of range: {first_due_date} plus {} months",
                number - 1
            ))
        })
}

/// Check that a (possibly edited) schedule still sums to the declared
/// amount within one cent.
pub fn validate_schedule(
    schedule: &Schedule,
    declared: Money,
    method_id: &MethodId,
) -> NegotiationResult<()> {
    let scheduled = schedule.total();
    if approx_eq(scheduled, declared) {
        Ok(())
    } else {
        Err(NegotiationError::ScheduleMismatch {
            method_id: method_id.clone(),
            declared,
            scheduled,
        })
    }
}
