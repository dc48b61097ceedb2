#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use wv_domain::config::Config;
use wv_domain::error::{Error, Result};
use wv_domain::message::Usage;
use wv_domain::tool::ToolCall;
use wv_gateway::bootstrap::build_app_state_with;
use wv_gateway::state::AppState;
use wv_providers::{ChatRequest, ChatResponse, LlmProvider};
use wv_store::{DocumentStore, MemoryDocumentStore};

/// Provider that replays canned responses and records every request.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<ChatResponse>>>,
    pub requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Result<ChatResponse>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl LlmProvider for ScriptedProvider {
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse> {
        self.requests.lock().unwrap().push(req.clone());
        self.replies.lock().unwrap().pop_front().unwrap_or_else(|| {
            Err(Error::Provider {
                provider: "scripted".into(),
                message: "script exhausted".into(),
            })
        })
    }

    fn provider_id(&self) -> &str {
        "scripted"
    }
}

pub fn text_reply(text: &str, tokens: u32) -> Result<ChatResponse> {
    Ok(ChatResponse {
        content: text.into(),
        usage: Some(Usage {
            prompt_tokens: tokens,
            completion_tokens: 0,
            total_tokens: tokens,
        }),
        model: "scripted-model".into(),
        finish_reason: Some("stop".into()),
        ..Default::default()
    })
}

pub fn tool_reply(calls: &[(&str, &str, &str)], tokens: u32) -> Result<ChatResponse> {
    Ok(ChatResponse {
        content: String::new(),
        tool_calls: calls
            .iter()
            .map(|(id, name, args)| ToolCall::new(*id, *name, *args))
            .collect(),
        usage: Some(Usage {
            prompt_tokens: tokens,
            completion_tokens: 0,
            total_tokens: tokens,
        }),
        model: "scripted-model".into(),
        finish_reason: Some("tool_calls".into()),
    })
}

pub fn provider_error(message: &str) -> Result<ChatResponse> {
    Err(Error::Provider {
        provider: "scripted".into(),
        message: message.into(),
    })
}

/// In-memory app state wired to `provider`.
pub fn test_state(
    config: Config,
    provider: Option<Arc<ScriptedProvider>>,
) -> (AppState, Arc<MemoryDocumentStore>) {
    let docs = Arc::new(MemoryDocumentStore::new());
    let state = build_app_state_with(
        Arc::new(config),
        docs.clone() as Arc<dyn DocumentStore>,
        provider.map(|p| p as Arc<dyn LlmProvider>),
    );
    (state, docs)
}
