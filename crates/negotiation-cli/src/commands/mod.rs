pub mod instrument;
pub mod negotiation;
pub mod schedule;
