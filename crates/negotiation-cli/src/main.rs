mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::instrument::PresentValueArgs;
use commands::negotiation::{
    AddMethodArgs, AggregateArgs, EditAmountArgs, EditInstallmentArgs, NewArgs, RemoveMethodArgs,
    ToggleLockArgs,
};
use commands::schedule::ScheduleArgs;

/// Negotiation and payment-allocation calculations
#[derive(Parser)]
#[command(
    name = "nego",
    version,
    about = "Negotiation and payment-allocation engine",
    long_about = "A CLI over the negotiation engine: installment schedules, \
                  discounted present values, allocation totals, and the \
                  redistribution transitions, all with decimal precision."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an installment schedule
    Schedule(ScheduleArgs),
    /// Present value and implied discount of a rated instrument
    PresentValue(PresentValueArgs),
    /// Create an empty negotiation state
    New(NewArgs),
    /// Add a payment method to a negotiation state
    AddMethod(AddMethodArgs),
    /// Edit an instrument's amount, redistributing across unlocked methods
    EditAmount(EditAmountArgs),
    /// Lock or unlock an instrument for redistribution
    ToggleLock(ToggleLockArgs),
    /// Remove a payment method
    RemoveMethod(RemoveMethodArgs),
    /// Edit one installment of an editable invoice schedule
    EditInstallment(EditInstallmentArgs),
    /// Derived totals and consistency check for a negotiation state
    Aggregate(AggregateArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Schedule(args) => commands::schedule::run_schedule(args),
        Commands::PresentValue(args) => commands::instrument::run_present_value(args),
        Commands::New(args) => commands::negotiation::run_new(args),
        Commands::AddMethod(args) => commands::negotiation::run_add_method(args),
        Commands::EditAmount(args) => commands::negotiation::run_edit_amount(args),
        Commands::ToggleLock(args) => commands::negotiation::run_toggle_lock(args),
        Commands::RemoveMethod(args) => commands::negotiation::run_remove_method(args),
        Commands::EditInstallment(args) => commands::negotiation::run_edit_installment(args),
        Commands::Aggregate(args) => commands::negotiation::run_aggregate(args),
        Commands::Version => {
            println!("nego {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
