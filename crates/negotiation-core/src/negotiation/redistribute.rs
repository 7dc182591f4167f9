use rust_decimal::Decimal;

use crate::error::NegotiationError;
use crate::money::{round_to_cents, CENT_TOLERANCE};
use crate::types::Money;
use crate::NegotiationResult;

use super::state::NegotiationState;

/// Apply a user edit of one instrument's amount and rebalance the other
/// unlocked instruments so allocations keep summing to the negotiated
/// target.
///
/// The edited amount is clamped to `[0, target - locked allocations]`.
/// Locked instruments are never touched, under any input; errors leave
/// the caller's state unmodified.
pub fn edit_amount(
    state: &NegotiationState,
    id: &str,
    new_amount: Money,
) -> NegotiationResult<NegotiationState> {
    if new_amount < Decimal::ZERO {
        return Err(NegotiationError::InvalidInput {
            field: "new_amount".into(),
            reason: "Amount must not be negative".into(),
        });
    }

    let mut next = state.clone();
    let edited = next.method_position(id)?;

    // Headroom: whatever the locked instruments have not already claimed.
    let locked_sum = next.locked_sum_excluding(id);
    let headroom = (next.target_negotiated_value - locked_sum).max(Decimal::ZERO);
    let clamped = new_amount.min(headroom);

    let delta = clamped - next.methods[edited].amount;

    let absorbers: Vec<usize> = next
        .methods
        .iter()
        .enumerate()
        .filter(|(i, m)| *i != edited && !m.locked)
        .map(|(i, _)| i)
        .collect();

    if absorbers.is_empty() {
        if delta > CENT_TOLERANCE {
            return Err(NegotiationError::NoRedistributionTarget { excess: delta });
        }
        // Shrinking with nobody to absorb leaves the target under-allocated;
        // the aggregator reports consistent = false until the user fills it.
        next.methods[edited].amount = clamped;
        next.methods[edited].refresh()?;
        return Ok(next);
    }

    let adjusted = distribute(&next, &absorbers, delta)?;

    next.methods[edited].amount = clamped;
    next.methods[edited].refresh()?;
    for (position, amount) in adjusted {
        if next.methods[position].amount != amount {
            next.methods[position].amount = amount;
            next.methods[position].refresh()?;
        }
    }
    Ok(next)
}

/// Clamp-and-redistribute: spread `-delta` across the absorbers in
/// proportion to their current amounts.
///
/// Every share is rounded to cents with the last active instrument
/// absorbing the rounding remainder, so conservation is exact. An
/// instrument driven below zero is clamped to zero and its shortfall
/// rejoins the delta for another pass over the survivors; each pass
/// either finishes or removes at least one instrument, so the loop runs
/// at most once per absorber. A growth edit into an all-zero pool splits
/// equally, proportionality being undefined there.
fn distribute(
    state: &NegotiationState,
    absorbers: &[usize],
    delta: Money,
) -> NegotiationResult<Vec<(usize, Money)>> {
    let mut amounts: Vec<Money> = absorbers
        .iter()
        .map(|&position| state.methods[position].amount)
        .collect();
    let mut active: Vec<usize> = (0..amounts.len()).collect();
    let mut remaining = delta;

    while !remaining.is_zero() && !active.is_empty() {
        let pool: Money = active.iter().map(|&k| amounts[k]).sum();

        if remaining > Decimal::ZERO && pool <= remaining {
            // Even taking everything is not enough.
            for &k in &active {
                remaining -= amounts[k];
                amounts[k] = Decimal::ZERO;
            }
            active.clear();
            break;
        }

        let mut spread = Decimal::ZERO;
        let mut overdrawn: Vec<usize> = Vec::new();
        let active_count = Decimal::from(active.len() as u32);
        for (slot, &k) in active.iter().enumerate() {
            let share = if slot + 1 == active.len() {
                remaining - spread
            } else if pool.is_zero() {
                round_to_cents(remaining / active_count)
            } else {
                round_to_cents(remaining * amounts[k] / pool)
            };
            spread += share;
            amounts[k] -= share;
            if amounts[k] < Decimal::ZERO {
                overdrawn.push(slot);
            }
        }
        remaining = Decimal::ZERO;

        // Anything pushed below zero is clamped; the uncollected part goes
        // back around over the survivors.
        for &slot in overdrawn.iter().rev() {
            let k = active[slot];
            remaining += -amounts[k];
            amounts[k] = Decimal::ZERO;
            active.remove(slot);
        }
    }

    if remaining.abs() > CENT_TOLERANCE {
        return Err(NegotiationError::UnallocatedBalance { residual: remaining });
    }

    Ok(absorbers
        .iter()
        .enumerate()
        .map(|(k, &position)| (position, amounts[k]))
        .collect())
}
