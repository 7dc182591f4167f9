pub mod error;
pub mod money;
pub mod schedule;
pub mod types;

pub mod instrument;
pub mod negotiation;

pub use error::NegotiationError;
pub use types::*;

/// Standard result type for all engine operations
pub type NegotiationResult<T> = Result<T, NegotiationError>;
