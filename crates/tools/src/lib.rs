//! Task tools for the Weave agent.
//!
//! The agent works against a snapshot of the user's tasks handed in by the
//! caller. Tools never write to storage; every mutation is recorded as an
//! [`ActionResult`](wv_domain::task::ActionResult) for the caller to apply.
//!
//! - `definitions`: JSON schemas for the five tools offered to the model
//! - `executor`: dispatches a model tool call against the snapshot
//! - `search`: term scoring and the weekday filter used by `searchTasks`

pub mod definitions;
pub mod executor;
pub mod search;

pub use definitions::{task_tool_definitions, TaskTool};
pub use executor::{TaskToolExecutor, ToolError};
