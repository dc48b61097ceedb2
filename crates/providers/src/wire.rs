//! Conversion from the internal message list to the chat-completions wire
//! format.
//!
//! The wire format requires every assistant `tool_calls` entry to be
//! answered by a `tool` message placed directly after the assistant message.
//! Results are therefore never emitted where they sit in the input; they are
//! looked up by call id and re-emitted right after the call that produced
//! them.

use std::collections::HashMap;

use serde_json::Value;
use wv_domain::message::Message;
use wv_domain::repair::MISSING_RESPONSE_ERROR;
use wv_domain::tool::ToolCall;

/// Convert messages to the OpenAI chat-completions `messages` array.
///
/// Never fails: calls without a result get a synthesized failure result,
/// stray results are skipped and entries without a call id are dropped.
pub fn convert_to_wire_format(messages: &[Message]) -> Vec<Value> {
    // First result per call id wins; it is removed once emitted.
    let mut responses: HashMap<&str, &str> = HashMap::new();
    for msg in messages {
        if let Message::ToolResult { tool_call_id, content, .. } = msg {
            if !tool_call_id.is_empty() {
                responses.entry(tool_call_id.as_str()).or_insert(content.as_str());
            }
        }
    }

    let mut wire = Vec::with_capacity(messages.len());

    for msg in messages {
        match msg {
            Message::System { content, .. } => {
                wire.push(serde_json::json!({"role": "system", "content": content}));
            }
            Message::User { content, .. } => {
                wire.push(serde_json::json!({"role": "user", "content": content}));
            }
            Message::Assistant { content, tool_calls, .. } => {
                let calls: Vec<&ToolCall> =
                    tool_calls.iter().filter(|c| !c.call_id.is_empty()).collect();
                wire.push(assistant_to_wire(content, &calls));

                for call in calls {
                    let id = call.call_id.as_str();
                    match responses.remove(id) {
                        Some(content) => wire.push(tool_result_to_wire(id, content)),
                        None => {
                            let body = serde_json::json!({
                                "success": false,
                                "error": MISSING_RESPONSE_ERROR,
                            })
                            .to_string();
                            wire.push(tool_result_to_wire(id, &body));
                        }
                    }
                }
            }
            // Only emitted through the pairing step above.
            Message::ToolResult { .. } => {}
        }
    }

    wire
}

fn assistant_to_wire(content: &str, calls: &[&ToolCall]) -> Value {
    let mut obj = serde_json::json!({"role": "assistant", "content": content});
    if !calls.is_empty() {
        let tool_calls: Vec<Value> = calls
            .iter()
            .map(|c| {
                serde_json::json!({
                    "id": c.call_id,
                    "type": "function",
                    "function": {
                        "name": c.tool_name,
                        "arguments": c.arguments,
                    }
                })
            })
            .collect();
        obj["tool_calls"] = Value::Array(tool_calls);
    }
    obj
}

fn tool_result_to_wire(call_id: &str, content: &str) -> Value {
    serde_json::json!({
        "role": "tool",
        "tool_call_id": call_id,
        "content": content,
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
