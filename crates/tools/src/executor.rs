//! Tool-call execution against the turn's task snapshot.
//!
//! One executor lives for one agent turn. It reads the cached tasks and
//! categories the caller supplied, answers every tool call with a JSON
//! value, and collects the [`ActionResult`]s describing what the caller
//! must apply to storage afterwards. The snapshot is never modified, so a
//! task created earlier in the turn is not visible to a later search.

use chrono_tz::Tz;
use serde_json::{json, Map, Value};

use wv_domain::message::now_millis;
use wv_domain::task::{ActionKind, ActionResult, Priority, Task};
use wv_domain::tool::ToolCall;
use wv_domain::trace::TraceEvent;

use crate::definitions::TaskTool;
use crate::search;

/// Placeholder error handed to a tool when its arguments are not valid JSON.
pub const PARSE_FAILURE: &str = "Failed to parse arguments";

pub const DEFAULT_CATEGORY: &str = "Inbox";
pub const DEFAULT_SEARCH_LIMIT: usize = 5;
pub const DEFAULT_RECENT_LIMIT: usize = 20;

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("{0}")]
    MissingArgument(String),
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
}

/// Parse raw tool arguments; anything but a JSON object becomes the
/// `{"error": "Failed to parse arguments"}` placeholder.
pub fn parse_arguments(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(v @ Value::Object(_)) => v,
        Ok(_) | Err(_) => {
            tracing::warn!(arguments = %raw, "unparseable tool arguments");
            json!({ "error": PARSE_FAILURE })
        }
    }
}

fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    match args.get(key) {
        Some(Value::String(s)) => Ok(s),
        Some(other) if !other.is_null() => Err(ToolError::InvalidArguments(format!(
            "'{key}' must be a string"
        ))),
        _ => Err(ToolError::MissingArgument(match args.get("error").and_then(Value::as_str) {
            Some(placeholder) => placeholder.to_string(),
            None => format!("missing required argument '{key}'"),
        })),
    }
}

fn non_empty_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// A positive integer limit, else `default`.
fn limit_arg(args: &Value, default: usize) -> usize {
    args.get("limit")
        .and_then(|v| v.as_u64().or_else(|| v.as_f64().filter(|f| *f >= 1.0).map(|f| f as u64)))
        .filter(|n| *n > 0)
        .map_or(default, |n| n as usize)
}

fn tasks_json(tasks: &[Task]) -> Value {
    serde_json::to_value(tasks).unwrap_or_else(|_| Value::Array(Vec::new()))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TaskToolExecutor
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct TaskToolExecutor {
    user_input: String,
    cached_tasks: Vec<Task>,
    existing_categories: Vec<String>,
    tz: Tz,
    actions: Vec<ActionResult>,
}

impl TaskToolExecutor {
    pub fn new(
        user_input: impl Into<String>,
        cached_tasks: Vec<Task>,
        existing_categories: Vec<String>,
    ) -> Self {
        Self {
            user_input: user_input.into(),
            cached_tasks,
            existing_categories,
            tz: Tz::UTC,
            actions: Vec::new(),
        }
    }

    /// Zone used to decide which weekday an offset timestamp falls on.
    pub fn with_timezone(mut self, tz: Tz) -> Self {
        self.tz = tz;
        self
    }

    /// Actions recorded so far, in execution order.
    pub fn actions(&self) -> &[ActionResult] {
        &self.actions
    }

    pub fn into_actions(self) -> Vec<ActionResult> {
        self.actions
    }

    /// Answer one model tool call. Never fails: errors become
    /// `{"success": false, "error": ...}`.
    pub fn execute(&mut self, call: &ToolCall) -> Value {
        let args = parse_arguments(&call.arguments);
        let result = match self.dispatch(&call.tool_name, &args) {
            Ok(v) => v,
            Err(e) => json!({ "success": false, "error": e.to_string() }),
        };

        TraceEvent::ToolExecuted {
            tool_name: call.tool_name.clone(),
            call_id: call.call_id.clone(),
            success: result.get("success").and_then(Value::as_bool).unwrap_or(false),
        }
        .emit();

        result
    }

    /// Run a tool by name with already-parsed arguments.
    pub fn dispatch(&mut self, name: &str, args: &Value) -> Result<Value, ToolError> {
        let Some(tool) = TaskTool::from_name(name) else {
            tracing::warn!(tool = %name, "model called an unknown tool");
            return Ok(json!({ "success": false, "error": "Unknown function" }));
        };

        match tool {
            TaskTool::CreateTask => Ok(self.create_task(args)),
            TaskTool::UpdateTask => self.update_task(args),
            TaskTool::DeleteTask => self.delete_task(args),
            TaskTool::SearchTasks => self.search_tasks(args),
            TaskTool::GetRecentTasks => Ok(self.recent_tasks(args)),
        }
    }

    fn record(&mut self, action: ActionKind, data: Value) {
        self.actions.push(ActionResult::new(action, data));
    }

    fn create_task(&mut self, args: &Value) -> Value {
        let category = non_empty_str(args, "category")
            .map(str::to_string)
            .or_else(|| self.existing_categories.first().cloned())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

        let owned = |key: &str| non_empty_str(args, key).map(str::to_string);

        let task = Task {
            id: None,
            content: owned("content").unwrap_or_else(|| self.user_input.clone()),
            category,
            timestamp: Some(now_millis()),
            is_task: args.get("isTask").and_then(Value::as_bool).unwrap_or(true),
            priority: Some(
                non_empty_str(args, "priority")
                    .and_then(Priority::parse)
                    .unwrap_or_default(),
            ),
            due_date: owned("dueDate"),
            start_time: owned("startTime"),
            end_time: owned("endTime"),
            completed: args.get("completed").and_then(Value::as_bool).unwrap_or(false),
            labels: args
                .get("labels")
                .and_then(Value::as_array)
                .map(|a| a.iter().filter_map(Value::as_str).map(str::to_string).collect())
                .unwrap_or_default(),
            color: owned("color"),
            extra: Map::new(),
        };

        let data = serde_json::to_value(&task).unwrap_or(Value::Null);
        tracing::debug!(content = %task.content, category = %task.category, "createTask");
        self.record(ActionKind::Create, data.clone());

        json!({
            "success": true,
            "taskId": format!("temp-{}", now_millis()),
            "task": data,
        })
    }

    fn update_task(&mut self, args: &Value) -> Result<Value, ToolError> {
        let id = required_str(args, "id")?.to_string();

        let mut updates = args.as_object().cloned().unwrap_or_default();
        updates.remove("id");

        let mut data = Map::with_capacity(updates.len() + 1);
        data.insert("id".into(), Value::String(id.clone()));
        data.extend(updates.clone());

        tracing::debug!(task_id = %id, fields = updates.len(), "updateTask");
        self.record(ActionKind::Update, Value::Object(data));

        Ok(json!({ "success": true, "taskId": id, "updates": updates }))
    }

    fn delete_task(&mut self, args: &Value) -> Result<Value, ToolError> {
        let id = required_str(args, "id")?.to_string();

        tracing::debug!(task_id = %id, "deleteTask");
        self.record(ActionKind::Delete, json!({ "id": id }));

        Ok(json!({ "success": true, "taskId": id, "message": "Task deleted successfully" }))
    }

    fn search_tasks(&mut self, args: &Value) -> Result<Value, ToolError> {
        let query = required_str(args, "query")?.to_lowercase();
        let limit = limit_arg(args, DEFAULT_SEARCH_LIMIT);

        let (pool, rest) = match search::extract_weekday(&query) {
            Some(day) => {
                let on_day = search::filter_by_weekday(&self.cached_tasks, day.weekday, self.tz);
                if day.rest.is_empty() {
                    let mut matches = on_day;
                    matches.truncate(limit);
                    return Ok(self.finish_search(&query, matches));
                }
                (on_day, day.rest)
            }
            None => (self.cached_tasks.clone(), query.clone()),
        };

        let mut terms = search::search_terms(&rest);
        if terms.is_empty() {
            terms = search::search_terms(&query);
        }

        let matches = search::score(&pool, &terms, limit);
        Ok(self.finish_search(&query, matches))
    }

    fn finish_search(&mut self, query: &str, matches: Vec<Task>) -> Value {
        tracing::debug!(query = %query, hits = matches.len(), "searchTasks");
        let tasks = tasks_json(&matches);
        self.record(ActionKind::Search, tasks.clone());
        json!({ "success": true, "tasks": tasks })
    }

    fn recent_tasks(&mut self, args: &Value) -> Value {
        let limit = limit_arg(args, DEFAULT_RECENT_LIMIT);
        let tasks = tasks_json(&self.cached_tasks[..limit.min(self.cached_tasks.len())]);
        self.record(ActionKind::GetRecent, tasks.clone());
        json!({ "success": true, "tasks": tasks })
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
