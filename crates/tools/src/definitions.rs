//! Tool schemas offered to the model on every round.

use serde_json::{json, Value};

use wv_domain::tool::ToolDefinition;

/// The five task tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskTool {
    CreateTask,
    UpdateTask,
    DeleteTask,
    SearchTasks,
    GetRecentTasks,
}

impl TaskTool {
    pub const ALL: [TaskTool; 5] = [
        TaskTool::CreateTask,
        TaskTool::UpdateTask,
        TaskTool::DeleteTask,
        TaskTool::SearchTasks,
        TaskTool::GetRecentTasks,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TaskTool::CreateTask => "createTask",
            TaskTool::UpdateTask => "updateTask",
            TaskTool::DeleteTask => "deleteTask",
            TaskTool::SearchTasks => "searchTasks",
            TaskTool::GetRecentTasks => "getRecentTasks",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    pub fn definition(self) -> ToolDefinition {
        let (description, parameters) = match self {
            TaskTool::CreateTask => (
                "Create a task or note. Fill in every attribute the user mentioned.",
                json!({
                    "type": "object",
                    "properties": task_properties(true),
                    "required": ["content", "category", "isTask"]
                }),
            ),
            TaskTool::UpdateTask => {
                let mut props = task_properties(false);
                props.insert("id".into(), json!({
                    "type": "string",
                    "description": "Id of the task to change. Look it up with searchTasks first."
                }));
                (
                    "Change attributes of an existing task. Only send the fields that change.",
                    json!({ "type": "object", "properties": props, "required": ["id"] }),
                )
            }
            TaskTool::DeleteTask => (
                "Delete a task by id. Look the id up with searchTasks first.",
                json!({
                    "type": "object",
                    "properties": {
                        "id": { "type": "string", "description": "Id of the task to delete" }
                    },
                    "required": ["id"]
                }),
            ),
            TaskTool::SearchTasks => (
                "Find tasks in the user's list by content, category or label. \
                 A weekday name (e.g. \"friday\") restricts results to tasks starting on that day.",
                json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "Words to look for. A single word works best."
                        },
                        "limit": {
                            "type": "number",
                            "description": "Maximum number of results (default 5)"
                        }
                    },
                    "required": ["query"]
                }),
            ),
            TaskTool::GetRecentTasks => (
                "List the user's most recent tasks for context.",
                json!({
                    "type": "object",
                    "properties": {
                        "limit": {
                            "type": "number",
                            "description": "Number of tasks to return (default 20)"
                        }
                    }
                }),
            ),
        };

        ToolDefinition {
            name: self.name().to_string(),
            description: description.to_string(),
            parameters,
        }
    }
}

fn task_properties(with_is_task: bool) -> serde_json::Map<String, Value> {
    let iso_time = "Local date and time, YYYY-MM-DDThh:mm:ss";
    let mut props = serde_json::Map::new();
    props.insert("content".into(), json!({ "type": "string", "description": "What the task is about" }));
    props.insert("category".into(), json!({
        "type": "string",
        "description": "Category name. Reuse an existing one when it fits."
    }));
    props.insert("priority".into(), json!({
        "type": "string",
        "enum": ["optional", "low", "medium", "high", "critical"]
    }));
    props.insert("dueDate".into(), json!({ "type": "string", "description": "Due date, YYYY-MM-DD" }));
    props.insert("startTime".into(), json!({ "type": "string", "description": iso_time }));
    props.insert("endTime".into(), json!({ "type": "string", "description": iso_time }));
    if with_is_task {
        props.insert("isTask".into(), json!({
            "type": "boolean",
            "description": "true for an actionable task, false for a note"
        }));
    }
    props.insert("completed".into(), json!({ "type": "boolean" }));
    props.insert("labels".into(), json!({
        "type": "array",
        "items": { "type": "string" },
        "description": "Free-form tags"
    }));
    props.insert("color".into(), json!({
        "type": "string",
        "description": "Calendar color: blue, green, purple, pink, orange, yellow, red, indigo, teal or gray"
    }));
    props
}

/// Definitions for all task tools, in a fixed order.
pub fn task_tool_definitions() -> Vec<ToolDefinition> {
    TaskTool::ALL.into_iter().map(TaskTool::definition).collect()
}
