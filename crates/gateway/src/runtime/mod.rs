//! Core runtime: the task agent, its turn loop, the system prompt and
//! credit metering.

pub mod agent;
pub mod credits;
pub mod prompt;
pub mod turn;

pub use agent::TaskAgent;
pub use credits::{credits_for_tokens, CreditLedger};
pub use turn::{TurnInput, TurnOutcome};
