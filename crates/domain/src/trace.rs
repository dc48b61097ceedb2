use serde::Serialize;

/// Structured trace events emitted across all Weave crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    ConversationLoaded {
        conversation_id: String,
        messages: usize,
        is_new: bool,
    },
    ConversationSaved {
        conversation_id: String,
        messages: usize,
        trimmed: usize,
    },
    ConversationRepaired {
        before: usize,
        after: usize,
    },
    LlmRequest {
        provider: String,
        model: String,
        round: usize,
        duration_ms: u64,
        total_tokens: Option<u32>,
        tool_calls: usize,
    },
    ToolExecuted {
        tool_name: String,
        call_id: String,
        success: bool,
    },
    TurnCompleted {
        conversation_id: String,
        rounds: usize,
        actions: usize,
        tokens_used: u64,
        hit_round_limit: bool,
    },
    CreditsDeducted {
        user_id: String,
        tokens: u64,
        credits: u64,
        balance: i64,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "wv_event");
    }
}
