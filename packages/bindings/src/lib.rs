use std::str::FromStr;

use chrono::NaiveDate;
use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;

use negotiation_core::instrument::method::MethodRequest;
use negotiation_core::instrument::present_value::discounted_schedule_value;
use negotiation_core::negotiation::aggregate;
use negotiation_core::negotiation::state::NegotiationState;
use negotiation_core::schedule;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_decimal(field: &str, value: &str) -> NapiResult<Decimal> {
    Decimal::from_str(value).map_err(|e| to_napi_error(format!("{field}: {e}")))
}

fn parse_date(field: &str, value: &str) -> NapiResult<NaiveDate> {
    NaiveDate::from_str(value).map_err(|e| to_napi_error(format!("{field}: {e}")))
}

fn parse_state(state_json: &str) -> NapiResult<NegotiationState> {
    NegotiationState::from_json(state_json).map_err(to_napi_error)
}

fn state_to_json(state: &NegotiationState) -> NapiResult<String> {
    state.to_json().map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Calculators
// ---------------------------------------------------------------------------

#[napi]
pub fn generate_schedule(total: String, count: u32, first_due_date: String) -> NapiResult<String> {
    let total = parse_decimal("total", &total)?;
    let first_due_date = parse_date("first_due_date", &first_due_date)?;
    let output =
        schedule::generate_schedule(total, count, first_due_date).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn present_value(amount: String, count: u32, monthly_rate: String) -> NapiResult<String> {
    let amount = parse_decimal("amount", &amount)?;
    let monthly_rate = parse_decimal("monthly_rate", &monthly_rate)?;
    let pv = discounted_schedule_value(amount, count, monthly_rate).map_err(to_napi_error)?;
    serde_json::to_string(&serde_json::json!({
        "present_value": pv,
        "implied_discount": amount - pv,
    }))
    .map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Negotiation transitions
// ---------------------------------------------------------------------------

#[napi]
pub fn new_negotiation(gross_value: String) -> NapiResult<String> {
    let gross_value = parse_decimal("gross_value", &gross_value)?;
    let state = NegotiationState::new(gross_value).map_err(to_napi_error)?;
    state_to_json(&state)
}

#[napi]
pub fn with_discount_percent(state_json: String, percent: String) -> NapiResult<String> {
    let state = parse_state(&state_json)?;
    let percent = parse_decimal("percent", &percent)?;
    let next = state.with_discount_percent(percent).map_err(to_napi_error)?;
    state_to_json(&next)
}

#[napi]
pub fn with_target(state_json: String, target: String) -> NapiResult<String> {
    let state = parse_state(&state_json)?;
    let target = parse_decimal("target", &target)?;
    let next = state.with_target(target).map_err(to_napi_error)?;
    state_to_json(&next)
}

#[napi]
pub fn add_method(state_json: String, request_json: String) -> NapiResult<String> {
    let state = parse_state(&state_json)?;
    let request: MethodRequest = serde_json::from_str(&request_json).map_err(to_napi_error)?;
    let next = state.add_method(&request).map_err(to_napi_error)?;
    state_to_json(&next)
}

#[napi]
pub fn remove_method(state_json: String, id: String) -> NapiResult<String> {
    let state = parse_state(&state_json)?;
    let next = state.remove_method(&id).map_err(to_napi_error)?;
    state_to_json(&next)
}

#[napi]
pub fn edit_amount(state_json: String, id: String, new_amount: String) -> NapiResult<String> {
    let state = parse_state(&state_json)?;
    let new_amount = parse_decimal("new_amount", &new_amount)?;
    let next = state.edit_amount(&id, new_amount).map_err(to_napi_error)?;
    state_to_json(&next)
}

#[napi]
pub fn set_amount(state_json: String, id: String, new_amount: String) -> NapiResult<String> {
    let state = parse_state(&state_json)?;
    let new_amount = parse_decimal("new_amount", &new_amount)?;
    let next = state.set_amount(&id, new_amount).map_err(to_napi_error)?;
    state_to_json(&next)
}

#[napi]
pub fn toggle_lock(state_json: String, id: String) -> NapiResult<String> {
    let state = parse_state(&state_json)?;
    let next = state.toggle_lock(&id).map_err(to_napi_error)?;
    state_to_json(&next)
}

#[napi]
pub fn edit_installment(
    state_json: String,
    id: String,
    number: u32,
    new_due_date: Option<String>,
    new_amount: Option<String>,
) -> NapiResult<String> {
    let state = parse_state(&state_json)?;
    let new_due_date = match new_due_date {
        Some(value) => Some(parse_date("new_due_date", &value)?),
        None => None,
    };
    let new_amount = match new_amount {
        Some(value) => Some(parse_decimal("new_amount", &value)?),
        None => None,
    };
    let next = state
        .edit_installment(&id, number, new_due_date, new_amount)
        .map_err(to_napi_error)?;
    state_to_json(&next)
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

#[napi]
pub fn aggregate_state(state_json: String) -> NapiResult<String> {
    let state = parse_state(&state_json)?;
    let output = aggregate::aggregate(&state).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
