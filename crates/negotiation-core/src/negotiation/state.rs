use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::NegotiationError;
use crate::instrument::limits::InstrumentLimits;
use crate::instrument::method::{MethodRequest, PaymentMethod};
use crate::money::{round_to_cents, CENT_TOLERANCE};
use crate::schedule::validate_schedule;
use crate::types::{Currency, Money, Rate};
use crate::NegotiationResult;

use super::redistribute;

fn first_seq() -> u32 {
    1
}

/// The full negotiation: gross value, negotiated target, and the payment
/// methods allocated against it.
///
/// Owned by the caller, which serializes calls against it; every
/// transition is a pure function of `&self` returning the next state.
/// Method order is preserved for display only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationState {
    /// Sum of environment values, supplied by the quote layer.
    pub gross_value: Money,
    /// The negotiated total the allocations must sum to.
    pub target_negotiated_value: Money,
    #[serde(default)]
    pub currency: Currency,
    #[serde(default)]
    pub limits: InstrumentLimits,
    #[serde(default)]
    pub methods: Vec<PaymentMethod>,
    /// Feeds deterministic method ids (pm-1, pm-2, ...).
    #[serde(default = "first_seq")]
    next_method_seq: u32,
}

impl NegotiationState {
    /// New negotiation over an externally supplied gross value. The target
    /// starts at gross (no negotiated discount yet).
    pub fn new(gross_value: Money) -> NegotiationResult<Self> {
        if gross_value < Decimal::ZERO {
            return Err(NegotiationError::InvalidInput {
                field: "gross_value".into(),
                reason: "Gross value must not be negative".into(),
            });
        }
        Ok(NegotiationState {
            gross_value,
            target_negotiated_value: gross_value,
            currency: Currency::default(),
            limits: InstrumentLimits::default(),
            methods: Vec::new(),
            next_method_seq: 1,
        })
    }

    /// Nominal discount implied by the current target.
    pub fn discount_percent(&self) -> Rate {
        if self.gross_value.is_zero() {
            Decimal::ZERO
        } else {
            Decimal::ONE - self.target_negotiated_value / self.gross_value
        }
    }

    /// Set the target via a nominal discount percentage (0.10 = 10%).
    pub fn with_discount_percent(&self, percent: Rate) -> NegotiationResult<Self> {
        if percent < Decimal::ZERO || percent > Decimal::ONE {
            return Err(NegotiationError::InvalidInput {
                field: "discount_percent".into(),
                reason: "Discount percentage must lie in [0, 1]".into(),
            });
        }
        let mut next = self.clone();
        next.target_negotiated_value = round_to_cents(self.gross_value * (Decimal::ONE - percent));
        Ok(next)
    }

    /// Set the negotiated target directly.
    pub fn with_target(&self, target: Money) -> NegotiationResult<Self> {
        if target < Decimal::ZERO || target > self.gross_value {
            return Err(NegotiationError::InvalidInput {
                field: "target".into(),
                reason: "Target must lie between zero and the gross value".into(),
            });
        }
        let mut next = self.clone();
        next.target_negotiated_value = target;
        Ok(next)
    }

    pub fn method(&self, id: &str) -> Option<&PaymentMethod> {
        self.methods.iter().find(|m| m.id == id)
    }

    pub(crate) fn method_position(&self, id: &str) -> NegotiationResult<usize> {
        self.methods
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| NegotiationError::InvalidInput {
                field: "id".into(),
                reason: format!("Unknown payment method '{id}'"),
            })
    }

    /// Sum of amounts over locked instruments, excluding `except`.
    pub(crate) fn locked_sum_excluding(&self, except: &str) -> Money {
        self.methods
            .iter()
            .filter(|m| m.locked && m.id != except)
            .map(|m| m.amount)
            .sum()
    }

    /// Validate and append a new instrument. The amount is taken as the
    /// form sent it; balancing against the target is the redistribution
    /// engine's job.
    pub fn add_method(&self, request: &MethodRequest) -> NegotiationResult<Self> {
        let mut next = self.clone();
        while next
            .methods
            .iter()
            .any(|m| m.id == format!("pm-{}", next.next_method_seq))
        {
            next.next_method_seq += 1;
        }
        let id = format!("pm-{}", next.next_method_seq);
        let method = PaymentMethod::from_request(id, request, &next.limits)?;
        next.next_method_seq += 1;
        next.methods.push(method);
        Ok(next)
    }

    pub fn remove_method(&self, id: &str) -> NegotiationResult<Self> {
        let mut next = self.clone();
        let position = next.method_position(id)?;
        next.methods.remove(position);
        Ok(next)
    }

    /// Flip the redistribution lock. No recomputation; a locked instrument
    /// keeps its amount and schedule until explicitly edited.
    pub fn toggle_lock(&self, id: &str) -> NegotiationResult<Self> {
        let mut next = self.clone();
        let position = next.method_position(id)?;
        next.methods[position].locked = !next.methods[position].locked;
        Ok(next)
    }

    /// Edit one instrument's amount, redistributing the difference across
    /// the other unlocked instruments so allocations keep summing to the
    /// negotiated target.
    pub fn edit_amount(&self, id: &str, new_amount: Money) -> NegotiationResult<Self> {
        redistribute::edit_amount(self, id, new_amount)
    }

    /// Strict manual allocation: set the amount without redistribution.
    ///
    /// Over-allocation beyond the target is rejected; under-allocation is
    /// accepted and surfaced by the aggregator's consistency flag.
    pub fn set_amount(&self, id: &str, new_amount: Money) -> NegotiationResult<Self> {
        if new_amount < Decimal::ZERO {
            return Err(NegotiationError::InvalidInput {
                field: "new_amount".into(),
                reason: "Amount must not be negative".into(),
            });
        }
        let mut next = self.clone();
        let position = next.method_position(id)?;
        let others: Money = next
            .methods
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != position)
            .map(|(_, m)| m.amount)
            .sum();
        let overflow = others + new_amount - next.target_negotiated_value;
        if overflow > CENT_TOLERANCE {
            return Err(NegotiationError::InvalidInput {
                field: "new_amount".into(),
                reason: format!("Allocation would exceed the negotiated target by {overflow}"),
            });
        }
        next.methods[position].amount = new_amount;
        next.methods[position].refresh()?;
        Ok(next)
    }

    /// Edit one installment of an editable Invoice schedule.
    ///
    /// The instrument's declared amount is untouched; a schedule that no
    /// longer sums to it is reported by the aggregator as a warning,
    /// never silently corrected.
    pub fn edit_installment(
        &self,
        id: &str,
        number: u32,
        new_due_date: Option<NaiveDate>,
        new_amount: Option<Money>,
    ) -> NegotiationResult<Self> {
        let mut next = self.clone();
        let position = next.method_position(id)?;
        if !next.methods[position].is_editable_invoice() {
            return Err(NegotiationError::InvalidInput {
                field: "id".into(),
                reason: format!("Schedule of '{id}' is not editable per installment"),
            });
        }
        if let Some(amount) = new_amount {
            if amount < Decimal::ZERO {
                return Err(NegotiationError::InvalidInput {
                    field: "new_amount".into(),
                    reason: "Installment amount must not be negative".into(),
                });
            }
        }
        let schedule = next.methods[position]
            .schedule
            .as_mut()
            .ok_or_else(|| NegotiationError::InvalidInput {
                field: "id".into(),
                reason: format!("Payment method '{id}' has no schedule"),
            })?;
        let installment = schedule
            .installments
            .iter_mut()
            .find(|i| i.number == number)
            .ok_or_else(|| NegotiationError::InvalidInput {
                field: "number".into(),
                reason: format!("No installment {number} in the schedule of '{id}'"),
            })?;
        if let Some(due_date) = new_due_date {
            installment.due_date = due_date;
        }
        if let Some(amount) = new_amount {
            installment.amount = amount;
        }
        Ok(next)
    }

    /// Schedule mismatches across all methods. Non-blocking findings: the
    /// aggregator turns them into warnings and a false consistency flag.
    pub fn schedule_mismatches(&self) -> Vec<NegotiationError> {
        self.methods
            .iter()
            .filter_map(|m| {
                m.schedule
                    .as_ref()
                    .and_then(|s| validate_schedule(s, m.amount, &m.id).err())
            })
            .collect()
    }

    /// Plain-data snapshot for the session-cache collaborator.
    pub fn to_json(&self) -> NegotiationResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(data: &str) -> NegotiationResult<Self> {
        Ok(serde_json::from_str(data)?)
    }
}
