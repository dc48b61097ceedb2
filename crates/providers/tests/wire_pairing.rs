//! Integration tests for the repair + wire conversion path used before every
//! model call.

use wv_domain::message::Message;
use wv_domain::repair::repair;
use wv_domain::tool::ToolCall;
use wv_providers::convert_to_wire_format;

fn call(id: &str, name: &str) -> ToolCall {
    ToolCall::new(id, name, "{}")
}

#[test]
fn repaired_history_converts_to_strictly_paired_wire_messages() {
    let history = vec![
        Message::system("rules"),
        Message::user("delete the dentist task"),
        Message::assistant("", vec![call("s1", "searchTasks")]),
        Message::tool_result("s1", "{\"success\":true,\"tasks\":[]}"),
        Message::assistant("", vec![call("d1", "deleteTask"), call("d2", "deleteTask")]),
        Message::tool_result("d1", "{\"success\":true}"),
        Message::user("and the gym one"),
    ];

    let wire = convert_to_wire_format(&repair(&history));

    let roles: Vec<&str> = wire.iter().map(|w| w["role"].as_str().unwrap()).collect();
    assert_eq!(
        roles,
        ["system", "user", "assistant", "tool", "assistant", "tool", "tool", "user"]
    );
    assert_eq!(wire[5]["tool_call_id"], "d1");
    assert_eq!(wire[6]["tool_call_id"], "d2");
    assert!(wire[6]["content"]
        .as_str()
        .unwrap()
        .contains("No response was provided for this tool call"));
}

#[test]
fn every_tool_entry_directly_follows_its_assistant_block() {
    let history = vec![
        Message::tool_result("x", "stray"),
        Message::assistant("", vec![call("a", "getRecentTasks"), call("b", "searchTasks")]),
        Message::user("interrupt"),
        Message::tool_result("b", "B"),
        Message::tool_result("a", "A"),
    ];

    let wire = convert_to_wire_format(&repair(&history));

    let mut i = 0;
    while i < wire.len() {
        let calls = wire[i]
            .get("tool_calls")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();
        for (k, c) in calls.iter().enumerate() {
            assert_eq!(wire[i + 1 + k]["role"], "tool");
            assert_eq!(wire[i + 1 + k]["tool_call_id"], c["id"]);
        }
        if calls.is_empty() {
            assert_ne!(wire[i]["role"], "tool", "unpaired tool entry at {i}");
        }
        i += 1 + calls.len();
    }
}
