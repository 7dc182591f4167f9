use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use negotiation_core::schedule;

/// Arguments for schedule generation
#[derive(Args)]
pub struct ScheduleArgs {
    /// Total amount to split across the installments
    #[arg(long)]
    pub total: Decimal,

    /// Number of installments
    #[arg(long)]
    pub count: u32,

    /// Due date of the first installment (YYYY-MM-DD)
    #[arg(long)]
    pub first_due_date: NaiveDate,
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let schedule = schedule::generate_schedule(args.total, args.count, args.first_due_date)?;
    Ok(serde_json::to_value(schedule)?)
}
