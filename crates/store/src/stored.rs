//! Persisted message shape.
//!
//! Conversations are stored in the chat-completions layout the web client
//! already reads: tool results use the `function` role and carry the id of
//! the call they answer in `name`. Optional fields are always written, as
//! explicit `null` when absent, so every stored message has the same keys.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use wv_domain::message::{now_millis, Message};
use wv_domain::tool::ToolCall;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<StoredToolCall>>,
    #[serde(default)]
    pub function_call: Option<Value>,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredToolCall {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default = "d_function")]
    pub kind: String,
    pub function: StoredFunction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFunction {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

fn d_function() -> String {
    "function".into()
}

impl From<&ToolCall> for StoredToolCall {
    fn from(call: &ToolCall) -> Self {
        Self {
            id: call.call_id.clone(),
            kind: d_function(),
            function: StoredFunction {
                name: call.tool_name.clone(),
                arguments: call.arguments.clone(),
            },
        }
    }
}

impl From<&Message> for StoredMessage {
    fn from(msg: &Message) -> Self {
        let (name, tool_calls) = match msg {
            Message::Assistant { tool_calls, .. } if !tool_calls.is_empty() => {
                (None, Some(tool_calls.iter().map(StoredToolCall::from).collect()))
            }
            Message::ToolResult { tool_call_id, .. } => (Some(tool_call_id.clone()), None),
            _ => (None, None),
        };

        Self {
            role: msg.role().as_str().to_string(),
            content: Some(msg.content().to_string()),
            name,
            tool_calls,
            function_call: None,
            timestamp: Some(msg.timestamp()),
        }
    }
}

impl StoredMessage {
    /// Decode back into a [`Message`].
    ///
    /// Returns `None` for unknown roles and for `function` messages that do
    /// not say which call they answer.
    pub fn into_message(self) -> Option<Message> {
        let content = self.content.unwrap_or_default();
        let timestamp = self.timestamp.unwrap_or_else(now_millis);

        let msg = match self.role.as_str() {
            "system" => Message::System { content, timestamp },
            "user" => Message::User { content, timestamp },
            "assistant" => Message::Assistant {
                content,
                tool_calls: self
                    .tool_calls
                    .unwrap_or_default()
                    .into_iter()
                    .map(|c| ToolCall::new(c.id, c.function.name, c.function.arguments))
                    .collect(),
                timestamp,
            },
            "function" | "tool" => Message::ToolResult {
                tool_call_id: self.name.filter(|n| !n.is_empty())?,
                content,
                timestamp,
            },
            _ => return None,
        };
        Some(msg)
    }
}

/// Decode a persisted `messages` array, skipping entries that do not parse.
pub fn decode_messages(raw: &[Value]) -> Vec<Message> {
    raw.iter()
        .filter_map(|v| match serde_json::from_value::<StoredMessage>(v.clone()) {
            Ok(stored) => stored.into_message(),
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable stored message");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_fields_are_written_as_null() {
        let stored = StoredMessage::from(&Message::user("hi"));
        let value = serde_json::to_value(&stored).unwrap();
        assert_eq!(value["role"], "user");
        assert_eq!(value["content"], "hi");
        assert!(value.get("name").unwrap().is_null());
        assert!(value.get("tool_calls").unwrap().is_null());
        assert!(value.get("function_call").unwrap().is_null());
    }

    #[test]
    fn tool_result_keeps_call_id_under_name() {
        let stored = StoredMessage::from(&Message::tool_result("call_1", "{\"success\":true}"));
        assert_eq!(stored.role, "function");
        assert_eq!(stored.name.as_deref(), Some("call_1"));

        let back = stored.into_message().unwrap();
        assert_eq!(back.tool_call_id(), Some("call_1"));
    }

    #[test]
    fn assistant_tool_calls_use_function_layout() {
        let msg = Message::assistant(
            "",
            vec![ToolCall::new("c1", "searchTasks", "{\"query\":\"gym\"}")],
        );
        let value = serde_json::to_value(StoredMessage::from(&msg)).unwrap();
        assert_eq!(value["tool_calls"][0]["type"], "function");
        assert_eq!(value["tool_calls"][0]["function"]["name"], "searchTasks");
        assert_eq!(
            value["tool_calls"][0]["function"]["arguments"],
            "{\"query\":\"gym\"}"
        );
    }

    #[test]
    fn unreadable_entries_are_skipped() {
        let raw = vec![
            json!({"role": "user", "content": "hello", "timestamp": 1}),
            json!({"role": "function", "content": "orphan"}),
            json!({"role": "moderator", "content": "?"}),
            json!("not an object"),
            json!({"role": "assistant", "content": null, "tool_calls": null}),
        ];
        let messages = decode_messages(&raw);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content(), "hello");
        assert_eq!(messages[1].content(), "");
    }
}
