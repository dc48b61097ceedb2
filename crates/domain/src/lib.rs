//! Shared types for the Weave task agent: messages, tasks, configuration,
//! errors and the tool-call pairing repair pass.

pub mod config;
pub mod error;
pub mod message;
pub mod repair;
pub mod task;
pub mod tool;
pub mod trace;
