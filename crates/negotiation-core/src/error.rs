use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Schedule mismatch on {method_id}: installments sum to {scheduled}, declared amount is {declared}")]
    ScheduleMismatch {
        method_id: String,
        declared: Decimal,
        scheduled: Decimal,
    },

    #[error("No redistribution target: {excess} cannot be absorbed by any unlocked instrument")]
    NoRedistributionTarget { excess: Decimal },

    #[error("Unallocated balance: {residual} left after the unlocked instruments were exhausted")]
    UnallocatedBalance { residual: Decimal },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for NegotiationError {
    fn from(e: serde_json::Error) -> Self {
        NegotiationError::SerializationError(e.to_string())
    }
}
