use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::instrument::present_value::implied_discount;
use crate::money::approx_eq;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::NegotiationResult;

use super::state::NegotiationState;

/// Derived totals over the whole negotiation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegotiationSummary {
    pub total_allocated: Money,
    pub total_present_value: Money,
    /// Sum of per-instrument financial-cost discounts (amount minus PV).
    pub total_implied_discount: Money,
    /// Effective discount versus gross once instrument carrying costs are
    /// priced in; distinct from the nominal negotiated percentage.
    pub real_discount_percent: Rate,
    pub nominal_discount_percent: Rate,
    /// Allocations match the target within one cent and every schedule
    /// sums to its declared amount.
    pub consistent: bool,
}

/// Refresh the derived totals for display and for the redistribution
/// engine's convergence check. Pure; called after every mutation.
pub fn aggregate(
    state: &NegotiationState,
) -> NegotiationResult<ComputationOutput<NegotiationSummary>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let total_allocated: Money = state.methods.iter().map(|m| m.amount).sum();
    let total_present_value: Money = state.methods.iter().map(|m| m.present_value).sum();
    let total_implied_discount: Money = state.methods.iter().map(implied_discount).sum();

    let real_discount_percent = if state.gross_value.is_zero() {
        Decimal::ZERO
    } else {
        Decimal::ONE - total_present_value / state.gross_value
    };

    let mismatches = state.schedule_mismatches();
    for mismatch in &mismatches {
        warnings.push(mismatch.to_string());
    }

    let consistent =
        approx_eq(total_allocated, state.target_negotiated_value) && mismatches.is_empty();

    let summary = NegotiationSummary {
        total_allocated,
        total_present_value,
        total_implied_discount,
        real_discount_percent,
        nominal_discount_percent: state.discount_percent(),
        consistent,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Payment-allocation aggregate (monthly DCF present value)",
        warnings,
        elapsed,
        summary,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::method::{KindTag, MethodRequest};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn card_request(amount: Decimal, count: u32, rate: Decimal) -> MethodRequest {
        MethodRequest {
            kind: KindTag::Card,
            amount,
            installment_count: Some(count),
            monthly_rate: Some(rate),
            first_due_date: Some(date(2025, 6, 5)),
            date: None,
            editable: None,
            locked: false,
        }
    }

    #[test]
    fn test_single_card_scenario() {
        // Gross 10000, fully allocated to one card at 3 x 2%/month.
        let state = NegotiationState::new(dec!(10000.00)).unwrap();
        let state = state
            .add_method(&card_request(dec!(10000.00), 3, dec!(0.02)))
            .unwrap();

        let output = aggregate(&state).unwrap();
        let summary = &output.result;

        assert_eq!(summary.total_allocated, dec!(10000.00));
        assert_eq!(summary.total_present_value, dec!(9612.94));
        assert_eq!(summary.total_implied_discount, dec!(387.06));
        // 1 - 9612.94 / 10000 = 0.038706
        assert_eq!(summary.real_discount_percent, dec!(0.038706));
        assert_eq!(summary.nominal_discount_percent, Decimal::ZERO);
        assert!(summary.consistent);
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn test_under_allocation_is_inconsistent() {
        let state = NegotiationState::new(dec!(10000.00)).unwrap();
        let state = state
            .add_method(&card_request(dec!(4000.00), 3, dec!(0.02)))
            .unwrap();

        let summary = aggregate(&state).unwrap().result;
        assert_eq!(summary.total_allocated, dec!(4000.00));
        assert!(!summary.consistent);
    }

    #[test]
    fn test_schedule_mismatch_blocks_consistency() {
        let state = NegotiationState::new(dec!(1200.00)).unwrap();
        let state = state
            .add_method(&MethodRequest {
                kind: KindTag::Invoice,
                amount: dec!(1200.00),
                installment_count: Some(3),
                monthly_rate: None,
                first_due_date: Some(date(2025, 6, 5)),
                date: None,
                editable: None,
                locked: false,
            })
            .unwrap();

        let consistent = aggregate(&state).unwrap().result;
        assert!(consistent.consistent);

        let edited = state
            .edit_installment("pm-1", 1, None, Some(dec!(900.00)))
            .unwrap();
        let output = aggregate(&edited).unwrap();
        assert!(!output.result.consistent);
        assert_eq!(output.warnings.len(), 1);
        // The declared amount itself never moved.
        assert_eq!(output.result.total_allocated, dec!(1200.00));
    }

    #[test]
    fn test_empty_state_aggregates_to_zero() {
        let state = NegotiationState::new(dec!(0.00)).unwrap();
        let summary = aggregate(&state).unwrap().result;
        assert_eq!(summary.total_allocated, Decimal::ZERO);
        assert_eq!(summary.real_discount_percent, Decimal::ZERO);
        assert!(summary.consistent);
    }
}
