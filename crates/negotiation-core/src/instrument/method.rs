use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::NegotiationError;
use crate::schedule::{generate_schedule, Schedule};
use crate::types::{MethodId, Money, Rate};
use crate::NegotiationResult;

use super::limits::{check_count, check_rate, InstrumentLimits};
use super::present_value;

/// The payment instrument kinds a negotiation can allocate to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaymentKind {
    /// Immediate liquidity. No schedule, no rate.
    Cash { date: NaiveDate },
    /// Boleto-style dated invoices. The only kind whose individual
    /// installments may be edited away from the even split.
    Invoice {
        installment_count: u32,
        first_due_date: NaiveDate,
        editable: bool,
    },
    /// Card installments carrying the acquirer's monthly discount rate.
    /// Atomic for redistribution; the schedule is always the even split.
    Card {
        installment_count: u32,
        monthly_rate: Rate,
        first_due_date: NaiveDate,
    },
    /// Third-party financing. Same discount formula as Card; kept as a
    /// distinct kind because its rate and count ceilings are configured
    /// separately.
    Financing {
        installment_count: u32,
        monthly_rate: Rate,
        first_due_date: NaiveDate,
    },
}

impl PaymentKind {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentKind::Cash { .. } => "cash",
            PaymentKind::Invoice { .. } => "invoice",
            PaymentKind::Card { .. } => "card",
            PaymentKind::Financing { .. } => "financing",
        }
    }
}

/// Instrument kind selector used by creation requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KindTag {
    Cash,
    Invoice,
    Card,
    Financing,
}

/// A payment-method creation request as the form layer sends it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodRequest {
    pub kind: KindTag,
    pub amount: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installment_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_rate: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_due_date: Option<NaiveDate>,
    /// Settlement date for Cash.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// Whether an Invoice schedule may be edited per installment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editable: Option<bool>,
    /// Create the instrument already excluded from redistribution.
    #[serde(default)]
    pub locked: bool,
}

/// One typed allocation of part of the negotiated total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: MethodId,
    #[serde(flatten)]
    pub kind: PaymentKind,
    pub amount: Money,
    /// Excluded from automatic redistribution.
    pub locked: bool,
    /// None for Cash; generated from `amount` for the scheduled kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
    /// Derived; refreshed on every change.
    pub present_value: Money,
}

fn missing(field: &str, kind: &str) -> NegotiationError {
    NegotiationError::InvalidInput {
        field: field.into(),
        reason: format!("Required for {kind} payment methods"),
    }
}

impl PaymentMethod {
    /// Validate a creation request against the configured limits and build
    /// the instrument, including its schedule and present value.
    pub fn from_request(
        id: MethodId,
        request: &MethodRequest,
        limits: &InstrumentLimits,
    ) -> NegotiationResult<Self> {
        if request.amount < Decimal::ZERO {
            return Err(NegotiationError::InvalidInput {
                field: "amount".into(),
                reason: "Amount must not be negative".into(),
            });
        }

        let kind = match request.kind {
            KindTag::Cash => PaymentKind::Cash {
                date: request
                    .date
                    .or(request.first_due_date)
                    .ok_or_else(|| missing("date", "cash"))?,
            },
            KindTag::Invoice => {
                let count = request
                    .installment_count
                    .ok_or_else(|| missing("installment_count", "invoice"))?;
                check_count("installment_count", limits.invoice, count)?;
                PaymentKind::Invoice {
                    installment_count: count,
                    first_due_date: request
                        .first_due_date
                        .ok_or_else(|| missing("first_due_date", "invoice"))?,
                    editable: request.editable.unwrap_or(true),
                }
            }
            KindTag::Card => {
                let count = request
                    .installment_count
                    .ok_or_else(|| missing("installment_count", "card"))?;
                check_count("installment_count", limits.card, count)?;
                let rate = request
                    .monthly_rate
                    .ok_or_else(|| missing("monthly_rate", "card"))?;
                check_rate("monthly_rate", limits.max_monthly_rate, rate)?;
                PaymentKind::Card {
                    installment_count: count,
                    monthly_rate: rate,
                    first_due_date: request
                        .first_due_date
                        .ok_or_else(|| missing("first_due_date", "card"))?,
                }
            }
            KindTag::Financing => {
                let count = request
                    .installment_count
                    .ok_or_else(|| missing("installment_count", "financing"))?;
                check_count("installment_count", limits.financing, count)?;
                let rate = request
                    .monthly_rate
                    .ok_or_else(|| missing("monthly_rate", "financing"))?;
                check_rate("monthly_rate", limits.max_monthly_rate, rate)?;
                PaymentKind::Financing {
                    installment_count: count,
                    monthly_rate: rate,
                    first_due_date: request
                        .first_due_date
                        .ok_or_else(|| missing("first_due_date", "financing"))?,
                }
            }
        };

        let mut method = PaymentMethod {
            id,
            kind,
            amount: request.amount,
            locked: request.locked,
            schedule: None,
            present_value: Decimal::ZERO,
        };
        method.refresh()?;
        Ok(method)
    }

    /// Regenerate the schedule from the current amount and recompute the
    /// present value. Invoice schedules return to the even split here;
    /// manual installment edits only survive while the amount is
    /// untouched.
    pub fn refresh(&mut self) -> NegotiationResult<()> {
        self.schedule = match self.kind {
            PaymentKind::Cash { .. } => None,
            PaymentKind::Invoice {
                installment_count,
                first_due_date,
                ..
            }
            | PaymentKind::Card {
                installment_count,
                first_due_date,
                ..
            }
            | PaymentKind::Financing {
                installment_count,
                first_due_date,
                ..
            } => Some(generate_schedule(self.amount, installment_count, first_due_date)?),
        };
        self.present_value = present_value::present_value(self)?;
        Ok(())
    }

    pub fn is_editable_invoice(&self) -> bool {
        matches!(self.kind, PaymentKind::Invoice { editable: true, .. })
    }
}
