use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use negotiation_core::instrument::present_value;

/// Arguments for present-value calculation
#[derive(Args)]
pub struct PresentValueArgs {
    /// Declared amount of the instrument
    #[arg(long)]
    pub amount: Decimal,

    /// Number of installments
    #[arg(long)]
    pub count: u32,

    /// Monthly discount rate as a decimal (0.035 = 3.5%/month)
    #[arg(long)]
    pub monthly_rate: Decimal,
}

pub fn run_present_value(args: PresentValueArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let pv = present_value::discounted_schedule_value(args.amount, args.count, args.monthly_rate)?;
    Ok(json!({
        "amount": args.amount,
        "count": args.count,
        "monthly_rate": args.monthly_rate,
        "present_value": pv,
        "implied_discount": args.amount - pv,
    }))
}
