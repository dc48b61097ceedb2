//! Tool-call pairing repair.
//!
//! Chat completion APIs reject a request when an assistant message carries a
//! tool call that is not immediately followed by its result. [`repair`]
//! rewrites a message list so that every assistant message with tool calls
//! is followed by exactly one result per call, in call order.

use std::collections::{HashMap, HashSet};

use crate::message::Message;

/// Content of the result synthesized for a call that never got one.
pub const MISSING_RESPONSE_ERROR: &str = "No response was provided for this tool call";

/// Bookkeeping for one tool-call id within a message list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolCallRecord {
    pub has_response: bool,
    /// Index of the assistant message that issued the call.
    pub tool_call_index: usize,
    /// Index of the first result message answering the call.
    pub response_index: Option<usize>,
}

/// Map every tool-call id to where it was issued and (first) answered.
pub fn index_tool_calls(messages: &[Message]) -> HashMap<String, ToolCallRecord> {
    let mut records: HashMap<String, ToolCallRecord> = HashMap::new();

    for (idx, msg) in messages.iter().enumerate() {
        for call in msg.tool_calls() {
            records.entry(call.call_id.clone()).or_insert(ToolCallRecord {
                has_response: false,
                tool_call_index: idx,
                response_index: None,
            });
        }
    }

    for (idx, msg) in messages.iter().enumerate() {
        if let Some(id) = msg.tool_call_id() {
            if let Some(record) = records.get_mut(id) {
                if record.response_index.is_none() {
                    record.has_response = true;
                    record.response_index = Some(idx);
                }
            }
        }
    }

    records
}

/// The failure result used when a call has no recorded response.
pub fn default_tool_response(call_id: &str) -> Message {
    let body = serde_json::json!({
        "success": false,
        "error": MISSING_RESPONSE_ERROR,
    });
    Message::tool_result(call_id, body.to_string())
}

/// True when every assistant message with tool calls is immediately followed
/// by one result per call (same order) and no result appears anywhere else.
pub fn is_well_formed(messages: &[Message]) -> bool {
    let mut i = 0;
    while i < messages.len() {
        match &messages[i] {
            Message::Assistant { tool_calls, .. } if !tool_calls.is_empty() => {
                for (k, call) in tool_calls.iter().enumerate() {
                    match messages.get(i + 1 + k).and_then(Message::tool_call_id) {
                        Some(id) if id == call.call_id => {}
                        _ => return false,
                    }
                }
                i += 1 + tool_calls.len();
            }
            Message::ToolResult { .. } => return false,
            _ => i += 1,
        }
    }
    true
}

/// Guarantee tool-call/result pairing.
///
/// Well-formed input is returned unchanged. Otherwise the list is rebuilt:
/// each assistant message with tool calls is followed by a result for each
/// of its calls, taken from anywhere in the input when one exists and
/// synthesized with [`default_tool_response`] when not. Results whose call
/// was never issued, or that duplicate an already-paired result, are
/// dropped. Everything else keeps its relative order.
pub fn repair(messages: &[Message]) -> Vec<Message> {
    if is_well_formed(messages) {
        return messages.to_vec();
    }

    // call id -> indices of every result message answering it, in order.
    let mut responses: HashMap<&str, Vec<usize>> = HashMap::new();
    for (idx, msg) in messages.iter().enumerate() {
        if let Some(id) = msg.tool_call_id() {
            responses.entry(id).or_default().push(idx);
        }
    }

    let mut consumed: HashSet<usize> = HashSet::new();
    let mut answered: HashSet<&str> = HashSet::new();
    let mut issued: HashSet<&str> = HashSet::new();
    let mut out: Vec<Message> = Vec::with_capacity(messages.len());

    for msg in messages {
        match msg {
            Message::Assistant { tool_calls, .. } if !tool_calls.is_empty() => {
                out.push(msg.clone());
                for call in tool_calls {
                    let id = call.call_id.as_str();
                    issued.insert(id);
                    let real = responses
                        .get(id)
                        .and_then(|idxs| idxs.iter().copied().find(|i| !consumed.contains(i)));
                    match real {
                        Some(resp_idx) => {
                            consumed.insert(resp_idx);
                            out.push(messages[resp_idx].clone());
                        }
                        None => out.push(default_tool_response(id)),
                    }
                    answered.insert(id);
                }
            }
            Message::ToolResult { tool_call_id, .. } => {
                // Results are normally emitted right after their assistant
                // message above; a direct one survives only if its call was
                // issued already and is still unanswered.
                let id = tool_call_id.as_str();
                if issued.contains(id) && !answered.contains(id) {
                    answered.insert(id);
                    out.push(msg.clone());
                }
            }
            other => out.push(other.clone()),
        }
    }

    out
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
