use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use negotiation_core::instrument::method::{KindTag, MethodRequest};
use negotiation_core::negotiation::aggregate;
use negotiation_core::negotiation::state::NegotiationState;

use crate::input;

fn load_state(path: &Option<String>) -> Result<NegotiationState, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        Ok(input::file::read_json(path)?)
    } else if let Some(data) = input::stdin::read_stdin()? {
        Ok(serde_json::from_value(data)?)
    } else {
        Err("--state file is required (or pipe a state JSON via stdin)".into())
    }
}

/// Arguments for creating a negotiation state
#[derive(Args)]
pub struct NewArgs {
    /// Gross value of the quote
    #[arg(long)]
    pub gross: Decimal,

    /// Nominal discount percentage as a decimal (0.10 = 10%)
    #[arg(long)]
    pub discount_percent: Option<Decimal>,

    /// Negotiated target value (overrides --discount-percent)
    #[arg(long)]
    pub target: Option<Decimal>,
}

pub fn run_new(args: NewArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut state = NegotiationState::new(args.gross)?;
    if let Some(target) = args.target {
        state = state.with_target(target)?;
    } else if let Some(percent) = args.discount_percent {
        state = state.with_discount_percent(percent)?;
    }
    Ok(serde_json::to_value(state)?)
}

/// Arguments for adding a payment method
#[derive(Args)]
pub struct AddMethodArgs {
    /// Path to the negotiation state JSON (or pipe it via stdin)
    #[arg(long)]
    pub state: Option<String>,

    /// Path to a method request JSON file (overrides individual flags)
    #[arg(long)]
    pub request: Option<String>,

    /// Instrument kind (cash, invoice, card, financing)
    #[arg(long)]
    pub kind: Option<String>,

    /// Allocated amount
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// Number of installments
    #[arg(long)]
    pub installment_count: Option<u32>,

    /// Monthly discount rate as a decimal
    #[arg(long)]
    pub monthly_rate: Option<Decimal>,

    /// Due date of the first installment (YYYY-MM-DD)
    #[arg(long)]
    pub first_due_date: Option<NaiveDate>,

    /// Settlement date for cash (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Whether an invoice schedule may be edited per installment
    #[arg(long)]
    pub editable: Option<bool>,

    /// Create the instrument locked (excluded from redistribution)
    #[arg(long, default_value_t = false)]
    pub locked: bool,
}

pub fn run_add_method(args: AddMethodArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let state = load_state(&args.state)?;
    let request: MethodRequest = if let Some(ref path) = args.request {
        input::file::read_json(path)?
    } else {
        let kind = match args.kind.as_deref() {
            Some("cash") => KindTag::Cash,
            Some("invoice") => KindTag::Invoice,
            Some("card") => KindTag::Card,
            Some("financing") => KindTag::Financing,
            Some(other) => {
                return Err(format!(
                    "Unknown kind '{other}' (expected cash, invoice, card or financing)"
                )
                .into())
            }
            None => return Err("--kind is required (or provide --request)".into()),
        };
        MethodRequest {
            kind,
            amount: args.amount.ok_or("--amount is required (or provide --request)")?,
            installment_count: args.installment_count,
            monthly_rate: args.monthly_rate,
            first_due_date: args.first_due_date,
            date: args.date,
            editable: args.editable,
            locked: args.locked,
        }
    };

    let next = state.add_method(&request)?;
    Ok(serde_json::to_value(next)?)
}

/// Arguments for editing an instrument's amount
#[derive(Args)]
pub struct EditAmountArgs {
    /// Path to the negotiation state JSON (or pipe it via stdin)
    #[arg(long)]
    pub state: Option<String>,

    /// Payment method id
    #[arg(long)]
    pub id: String,

    /// New allocated amount
    #[arg(long)]
    pub amount: Decimal,

    /// Strict manual allocation: set the amount without redistribution
    #[arg(long, default_value_t = false)]
    pub no_redistribute: bool,
}

pub fn run_edit_amount(args: EditAmountArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let state = load_state(&args.state)?;
    let next = if args.no_redistribute {
        state.set_amount(&args.id, args.amount)?
    } else {
        state.edit_amount(&args.id, args.amount)?
    };
    Ok(serde_json::to_value(next)?)
}

/// Arguments for toggling an instrument's redistribution lock
#[derive(Args)]
pub struct ToggleLockArgs {
    /// Path to the negotiation state JSON (or pipe it via stdin)
    #[arg(long)]
    pub state: Option<String>,

    /// Payment method id
    #[arg(long)]
    pub id: String,
}

pub fn run_toggle_lock(args: ToggleLockArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let state = load_state(&args.state)?;
    let next = state.toggle_lock(&args.id)?;
    Ok(serde_json::to_value(next)?)
}

/// Arguments for removing a payment method
#[derive(Args)]
pub struct RemoveMethodArgs {
    /// Path to the negotiation state JSON (or pipe it via stdin)
    #[arg(long)]
    pub state: Option<String>,

    /// Payment method id
    #[arg(long)]
    pub id: String,
}

pub fn run_remove_method(args: RemoveMethodArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let state = load_state(&args.state)?;
    let next = state.remove_method(&args.id)?;
    Ok(serde_json::to_value(next)?)
}

/// Arguments for editing one installment of an invoice schedule
#[derive(Args)]
pub struct EditInstallmentArgs {
    /// Path to the negotiation state JSON (or pipe it via stdin)
    #[arg(long)]
    pub state: Option<String>,

    /// Payment method id
    #[arg(long)]
    pub id: String,

    /// 1-based installment number
    #[arg(long)]
    pub number: u32,

    /// New due date (YYYY-MM-DD)
    #[arg(long)]
    pub new_due_date: Option<NaiveDate>,

    /// New installment amount
    #[arg(long)]
    pub new_amount: Option<Decimal>,
}

pub fn run_edit_installment(args: EditInstallmentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let state = load_state(&args.state)?;
    let next = state.edit_installment(&args.id, args.number, args.new_due_date, args.new_amount)?;
    Ok(serde_json::to_value(next)?)
}

/// Arguments for aggregating a negotiation state
#[derive(Args)]
pub struct AggregateArgs {
    /// Path to the negotiation state JSON (or pipe it via stdin)
    #[arg(long)]
    pub state: Option<String>,
}

pub fn run_aggregate(args: AggregateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let state = load_state(&args.state)?;
    let output = aggregate::aggregate(&state)?;
    Ok(serde_json::to_value(output)?)
}
