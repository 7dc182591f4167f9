use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::NegotiationError;
use crate::types::Rate;
use crate::NegotiationResult;

/// Inclusive installment-count range for one instrument kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CountRange {
    pub min: u32,
    pub max: u32,
}

impl CountRange {
    pub fn contains(&self, count: u32) -> bool {
        count >= self.min && count <= self.max
    }
}

/// Validated input ranges per instrument kind.
///
/// Plain serializable data so the host application can supply its own
/// table; the defaults mirror the usual commercial ceilings (cards cap
/// at 12 months, financing runs longer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentLimits {
    pub invoice: CountRange,
    pub card: CountRange,
    pub financing: CountRange,
    /// Monthly rates must lie in [0, max_monthly_rate).
    pub max_monthly_rate: Rate,
}

impl Default for InstrumentLimits {
    fn default() -> Self {
        InstrumentLimits {
            invoice: CountRange { min: 1, max: 48 },
            card: CountRange { min: 1, max: 12 },
            financing: CountRange { min: 1, max: 60 },
            max_monthly_rate: Decimal::ONE,
        }
    }
}

/// Range check for an installment count.
pub fn check_count(field: &str, range: CountRange, count: u32) -> NegotiationResult<()> {
    if range.contains(count) {
        Ok(())
    } else {
        Err(NegotiationError::InvalidInput {
            field: field.into(),
            reason: format!(
                "Installment count {count} outside allowed range {}..={}",
                range.min, range.max
            ),
        })
    }
}

/// Range check for a monthly rate: [0, max).
pub fn check_rate(field: &str, max: Rate, rate: Rate) -> NegotiationResult<()> {
    if rate < Decimal::ZERO || rate >= max {
        Err(NegotiationError::InvalidInput {
            field: field.into(),
            reason: format!("Monthly rate {rate} outside allowed range [0, {max})"),
        })
    } else {
        Ok(())
    }
}
