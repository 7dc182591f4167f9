use chrono::NaiveDate;
use negotiation_core::instrument::method::{KindTag, MethodRequest};
use negotiation_core::negotiation::aggregate::aggregate;
use negotiation_core::negotiation::state::NegotiationState;
use negotiation_core::NegotiationError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn cash(amount: Decimal, locked: bool) -> MethodRequest {
    MethodRequest {
        kind: KindTag::Cash,
        amount,
        installment_count: None,
        monthly_rate: None,
        first_due_date: None,
        date: Some(date(2025, 9, 1)),
        editable: None,
        locked,
    }
}

fn invoice(amount: Decimal, count: u32) -> MethodRequest {
    MethodRequest {
        kind: KindTag::Invoice,
        amount,
        installment_count: Some(count),
        monthly_rate: None,
        first_due_date: Some(date(2025, 10, 10)),
        date: None,
        editable: None,
        locked: false,
    }
}

fn card(amount: Decimal, count: u32, rate: Decimal) -> MethodRequest {
    MethodRequest {
        kind: KindTag::Card,
        amount,
        installment_count: Some(count),
        monthly_rate: Some(rate),
        first_due_date: Some(date(2025, 10, 5)),
        date: None,
        editable: None,
        locked: false,
    }
}

fn financing(amount: Decimal, count: u32, rate: Decimal) -> MethodRequest {
    MethodRequest {
        kind: KindTag::Financing,
        amount,
        installment_count: Some(count),
        monthly_rate: Some(rate),
        first_due_date: Some(date(2025, 11, 1)),
        date: None,
        editable: None,
        locked: false,
    }
}

fn total(state: &NegotiationState) -> Decimal {
    state.methods.iter().map(|m| m.amount).sum()
}

// ===========================================================================
// End-to-end negotiation scenarios
// ===========================================================================

#[test]
fn test_locked_cash_edit_pushes_delta_onto_invoice() {
    // Target 5000 split as locked Cash 3000 plus unlocked Invoice 2000.
    // Raising Cash to 3500 takes the 500 from the Invoice alone.
    let state = NegotiationState::new(dec!(5000.00)).unwrap();
    let state = state.add_method(&cash(dec!(3000.00), true)).unwrap();
    let state = state.add_method(&invoice(dec!(2000.00), 4)).unwrap();

    let next = state.edit_amount("pm-1", dec!(3500.00)).unwrap();
    assert_eq!(next.methods[0].amount, dec!(3500.00));
    assert_eq!(next.methods[1].amount, dec!(1500.00));

    let summary = aggregate(&next).unwrap().result;
    assert!(summary.consistent);
    assert_eq!(summary.total_allocated, dec!(5000.00));
}

#[test]
fn test_growth_with_no_unlocked_partner_is_rejected() {
    let state = NegotiationState::new(dec!(5000.00)).unwrap();
    let state = state.add_method(&cash(dec!(3000.00), true)).unwrap();
    let state = state.add_method(&invoice(dec!(2000.00), 4)).unwrap();
    let state = state.toggle_lock("pm-2").unwrap();

    let result = state.edit_amount("pm-1", dec!(3500.00));
    assert!(matches!(
        result,
        Err(NegotiationError::NoRedistributionTarget { .. })
    ));
}

#[test]
fn test_mixed_instruments_conserve_target_across_edits() {
    let state = NegotiationState::new(dec!(20000.00)).unwrap();
    let state = state.with_discount_percent(dec!(0.05)).unwrap();
    let state = state.add_method(&cash(dec!(4000.00), false)).unwrap();
    let state = state.add_method(&invoice(dec!(6000.00), 6)).unwrap();
    let state = state.add_method(&card(dec!(5000.00), 10, dec!(0.025))).unwrap();
    let state = state.add_method(&financing(dec!(4000.00), 24, dec!(0.018))).unwrap();
    assert_eq!(state.target_negotiated_value, dec!(19000.00));
    assert_eq!(total(&state), dec!(19000.00));

    let edits: [(&str, Decimal); 4] = [
        ("pm-1", dec!(7000.00)),
        ("pm-3", dec!(1234.56)),
        ("pm-2", dec!(0.00)),
        ("pm-4", dec!(12000.00)),
    ];
    let mut current = state;
    for (id, amount) in edits {
        current = current.edit_amount(id, amount).unwrap();
        assert_eq!(total(&current), dec!(19000.00), "drift after editing {id}");
        assert!(current.methods.iter().all(|m| m.amount >= Decimal::ZERO));
        let summary = aggregate(&current).unwrap().result;
        assert!(summary.consistent);
    }
}

#[test]
fn test_locked_instruments_survive_every_edit_untouched() {
    let state = NegotiationState::new(dec!(10000.00)).unwrap();
    let state = state.add_method(&card(dec!(3000.00), 6, dec!(0.02))).unwrap();
    let state = state.add_method(&cash(dec!(3000.00), false)).unwrap();
    let state = state.add_method(&invoice(dec!(4000.00), 8)).unwrap();
    let state = state.toggle_lock("pm-1").unwrap();

    let frozen = state.method("pm-1").unwrap().clone();
    let next = state.edit_amount("pm-2", dec!(6000.00)).unwrap();
    assert_eq!(next.method("pm-1").unwrap(), &frozen);
    let next = next.edit_amount("pm-3", dec!(4000.00)).unwrap();
    assert_eq!(next.method("pm-1").unwrap(), &frozen);
}

#[test]
fn test_present_values_refresh_after_redistribution() {
    let state = NegotiationState::new(dec!(10000.00)).unwrap();
    let state = state.add_method(&cash(dec!(5000.00), false)).unwrap();
    let state = state.add_method(&card(dec!(5000.00), 3, dec!(0.02))).unwrap();

    let next = state.edit_amount("pm-1", dec!(8000.00)).unwrap();
    let card_method = next.method("pm-2").unwrap();
    assert_eq!(card_method.amount, dec!(2000.00));
    // PV of 2000 over 3 at 2%: 666.6667 * 2.8838833 = 1922.59
    assert_eq!(card_method.present_value, dec!(1922.59));
    assert_eq!(card_method.schedule.as_ref().unwrap().total(), dec!(2000.00));
}

#[test]
fn test_real_discount_tracks_carrying_cost() {
    let state = NegotiationState::new(dec!(10000.00)).unwrap();
    let cash_only = state.add_method(&cash(dec!(10000.00), false)).unwrap();
    let cash_summary = aggregate(&cash_only).unwrap().result;
    assert_eq!(cash_summary.real_discount_percent, Decimal::ZERO);

    let card_only = state.add_method(&card(dec!(10000.00), 3, dec!(0.02))).unwrap();
    let card_summary = aggregate(&card_only).unwrap().result;
    assert!(card_summary.real_discount_percent > Decimal::ZERO);
    assert_eq!(
        card_summary.total_implied_discount,
        dec!(10000.00) - card_summary.total_present_value
    );
}

#[test]
fn test_installment_edit_flow_surfaces_mismatch_then_recovers() {
    let state = NegotiationState::new(dec!(3000.00)).unwrap();
    let state = state.add_method(&invoice(dec!(3000.00), 3)).unwrap();

    // Push the second installment off the even split: 1000 -> 1300.
    let edited = state
        .edit_installment("pm-1", 2, None, Some(dec!(1300.00)))
        .unwrap();
    let output = aggregate(&edited).unwrap();
    assert!(!output.result.consistent);
    assert_eq!(output.warnings.len(), 1);

    // Compensating on the third installment restores consistency.
    let balanced = edited
        .edit_installment("pm-1", 3, None, Some(dec!(700.00)))
        .unwrap();
    let output = aggregate(&balanced).unwrap();
    assert!(output.result.consistent);
    assert!(output.warnings.is_empty());
}

#[test]
fn test_manual_mode_leaves_gap_visible() {
    let state = NegotiationState::new(dec!(5000.00)).unwrap();
    let state = state.add_method(&cash(dec!(3000.00), false)).unwrap();
    let state = state.add_method(&invoice(dec!(2000.00), 4)).unwrap();

    let next = state.set_amount("pm-1", dec!(2500.00)).unwrap();
    // No redistribution: the invoice stays put and the gap shows up.
    assert_eq!(next.methods[1].amount, dec!(2000.00));
    let summary = aggregate(&next).unwrap().result;
    assert!(!summary.consistent);
    assert_eq!(summary.total_allocated, dec!(4500.00));
}

#[test]
fn test_session_cache_round_trip_preserves_everything() {
    let state = NegotiationState::new(dec!(20000.00)).unwrap();
    let state = state.with_discount_percent(dec!(0.05)).unwrap();
    let state = state.add_method(&cash(dec!(4000.00), true)).unwrap();
    let state = state.add_method(&financing(dec!(15000.00), 36, dec!(0.019))).unwrap();

    let json = state.to_json().unwrap();
    let restored = NegotiationState::from_json(&json).unwrap();
    assert_eq!(restored, state);

    // A restored state keeps working: ids continue from the stored sequence.
    let extended = restored.add_method(&invoice(dec!(0.00), 2)).unwrap();
    assert_eq!(extended.methods.last().unwrap().id, "pm-3");
}

#[test]
fn test_reject_paths_leave_state_untouched() {
    let state = NegotiationState::new(dec!(5000.00)).unwrap();
    let state = state.add_method(&cash(dec!(5000.00), false)).unwrap();
    let before = state.clone();

    assert!(state.edit_amount("pm-1", dec!(-1.00)).is_err());
    assert!(state.edit_amount("missing", dec!(1.00)).is_err());
    assert!(state.set_amount("pm-1", dec!(5000.02)).is_err());
    assert_eq!(state, before);
}
