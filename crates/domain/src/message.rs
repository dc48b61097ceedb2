//! Conversation message model.
//!
//! A [`Message`] is one turn in a conversation. Tool results carry the id of
//! the call they answer in a dedicated `tool_call_id` field; the persisted
//! form still stores it under `name` (see `wv_store::stored`).

use serde::{Deserialize, Serialize};

use crate::tool::ToolCall;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    /// Tool result.
    Function,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Function => "function",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    System {
        content: String,
        timestamp: i64,
    },
    User {
        content: String,
        timestamp: i64,
    },
    Assistant {
        content: String,
        tool_calls: Vec<ToolCall>,
        timestamp: i64,
    },
    ToolResult {
        tool_call_id: String,
        content: String,
        timestamp: i64,
    },
}

/// Token usage reported by a provider for one completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

// ── Convenience constructors ───────────────────────────────────────

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Self::System { content: text.into(), timestamp: now_millis() }
    }
    pub fn user(text: impl Into<String>) -> Self {
        Self::User { content: text.into(), timestamp: now_millis() }
    }
    pub fn assistant(text: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self::Assistant {
            content: text.into(),
            tool_calls,
            timestamp: now_millis(),
        }
    }
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::ToolResult {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
            timestamp: now_millis(),
        }
    }
}

// ── Accessors ──────────────────────────────────────────────────────

impl Message {
    pub fn role(&self) -> Role {
        match self {
            Message::System { .. } => Role::System,
            Message::User { .. } => Role::User,
            Message::Assistant { .. } => Role::Assistant,
            Message::ToolResult { .. } => Role::Function,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Message::System { content, .. }
            | Message::User { content, .. }
            | Message::Assistant { content, .. }
            | Message::ToolResult { content, .. } => content,
        }
    }

    pub fn timestamp(&self) -> i64 {
        match self {
            Message::System { timestamp, .. }
            | Message::User { timestamp, .. }
            | Message::Assistant { timestamp, .. }
            | Message::ToolResult { timestamp, .. } => *timestamp,
        }
    }

    /// Tool calls on an assistant message; empty for every other role.
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Message::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }

    /// The call id a tool result answers.
    pub fn tool_call_id(&self) -> Option<&str> {
        match self {
            Message::ToolResult { tool_call_id, .. } => Some(tool_call_id),
            _ => None,
        }
    }

    pub fn is_system(&self) -> bool {
        matches!(self, Message::System { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_strings_match_persisted_names() {
        assert_eq!(Role::System.as_str(), "system");
        assert_eq!(Role::Function.as_str(), "function");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    #[test]
    fn tool_calls_empty_for_non_assistant() {
        let msg = Message::user("hello");
        assert!(msg.tool_calls().is_empty());
        assert_eq!(msg.role(), Role::User);
        assert_eq!(msg.content(), "hello");
    }

    #[test]
    fn tool_result_exposes_call_id() {
        let msg = Message::tool_result("call_1", "{\"success\":true}");
        assert_eq!(msg.tool_call_id(), Some("call_1"));
        assert_eq!(msg.role(), Role::Function);
    }
}
