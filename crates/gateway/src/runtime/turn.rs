//! Turn execution loop.
//!
//! One call to [`TaskAgent::run_turn`] handles one user request: hydrate the
//! conversation, call the model with the task tools, execute the tool calls
//! it asks for, and repeat until the model narrates or the round limit is
//! hit. The updated conversation is saved once at the end.

use std::time::Instant;

use serde::Serialize;
use tracing::Instrument;

use wv_domain::error::{Error, Result};
use wv_domain::message::Message;
use wv_domain::repair::repair;
use wv_domain::task::{ActionKind, ActionResult, Task};
use wv_domain::trace::TraceEvent;
use wv_providers::ChatRequest;
use wv_tools::{task_tool_definitions, TaskToolExecutor};

use super::agent::TaskAgent;
use super::prompt::build_system_prompt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Input / output
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Default)]
pub struct TurnInput {
    pub user_id: String,
    pub input: String,
    pub existing_categories: Vec<String>,
    /// Snapshot of the user's tasks, most recent first.
    pub cached_tasks: Vec<Task>,
    pub conversation_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnOutcome {
    pub actions: Vec<ActionResult>,
    /// Narration text from the model, in order.
    pub messages: Vec<String>,
    pub tokens_used: u64,
    pub conversation_id: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Loop
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

impl TaskAgent {
    /// Run one agent turn.
    ///
    /// Provider failures are returned as errors and leave the stored
    /// conversation untouched. Tool failures never abort the turn.
    pub async fn run_turn(&self, input: TurnInput) -> Result<TurnOutcome> {
        let turn_span = tracing::info_span!(
            "turn",
            user_id = %input.user_id,
            "otel.kind" = "SERVER",
        );
        self.run_turn_inner(input).instrument(turn_span).await
    }

    async fn run_turn_inner(&self, input: TurnInput) -> Result<TurnOutcome> {
        let provider = self
            .provider
            .clone()
            .ok_or_else(|| Error::Config("no LLM provider configured".into()))?;

        let mut conversation = self
            .conversations
            .load(&input.user_id, input.conversation_id.as_deref())
            .await;

        let now = chrono::Utc::now().with_timezone(&self.tz);
        let system = build_system_prompt(now, &input.input, &input.existing_categories);

        let mut working = Vec::with_capacity(self.config.history_window + 2);
        working.push(Message::system(system));
        working.extend(recent_history(&conversation.messages, self.config.history_window));

        let user_message = Message::user(input.input.clone());
        working.push(user_message.clone());
        conversation.messages.push(user_message);

        let mut executor =
            TaskToolExecutor::new(input.input, input.cached_tasks, input.existing_categories)
                .with_timezone(self.tz);
        let tools = task_tool_definitions();

        let mut texts: Vec<String> = Vec::new();
        let mut tokens_used: u64 = 0;
        let mut rounds = 0;
        let mut finished = false;

        while rounds < self.config.max_rounds {
            rounds += 1;

            let repaired = repair(&working);
            if repaired != working {
                TraceEvent::ConversationRepaired {
                    before: working.len(),
                    after: repaired.len(),
                }
                .emit();
            }

            let req = ChatRequest {
                messages: repaired,
                tools: tools.clone(),
                temperature: Some(self.config.temperature),
                max_tokens: None,
                model: Some(self.config.model.clone()),
            };

            let llm_span = tracing::info_span!(
                "llm.call",
                "otel.kind" = "CLIENT",
                model = %self.config.model,
                round = rounds,
                total_tokens = tracing::field::Empty,
            );
            let started = Instant::now();
            let resp = provider.chat(&req).instrument(llm_span.clone()).await?;

            let round_tokens = resp.usage.map(|u| u.total_tokens);
            if let Some(t) = round_tokens {
                llm_span.record("total_tokens", t);
                tokens_used += u64::from(t);
            }
            TraceEvent::LlmRequest {
                provider: provider.provider_id().to_string(),
                model: reported_model(&resp.model, &self.config.model),
                round: rounds,
                duration_ms: started.elapsed().as_millis() as u64,
                total_tokens: round_tokens,
                tool_calls: resp.tool_calls.len(),
            }
            .emit();

            let narrated = !resp.content.trim().is_empty();
            if narrated {
                texts.push(resp.content.clone());
            }

            let assistant = Message::assistant(resp.content, resp.tool_calls.clone());
            working.push(assistant.clone());
            conversation.messages.push(assistant);

            if resp.tool_calls.is_empty() {
                finished = true;
                break;
            }

            for call in &resp.tool_calls {
                let tool_span = tracing::info_span!(
                    "tool.call",
                    tool_name = %call.tool_name,
                    call_id = %call.call_id,
                );
                let result = tool_span.in_scope(|| executor.execute(call));
                let reply = Message::tool_result(call.call_id.clone(), result.to_string());
                working.push(reply.clone());
                conversation.messages.push(reply);
            }

            // Narration alongside tool calls is the final word for this turn.
            if narrated {
                finished = true;
                break;
            }
        }

        if !finished {
            tracing::warn!(
                rounds,
                actions = executor.actions().len(),
                "round limit reached, ending turn"
            );
            let narration = round_limit_narration(executor.actions());
            texts.push(narration.clone());
            conversation.messages.push(Message::assistant(narration, Vec::new()));
        }

        self.conversations.save(&conversation).await;

        let actions = executor.into_actions();
        TraceEvent::TurnCompleted {
            conversation_id: conversation.id.clone(),
            rounds,
            actions: actions.len(),
            tokens_used,
            hit_round_limit: !finished,
        }
        .emit();

        Ok(TurnOutcome {
            actions,
            messages: texts,
            tokens_used,
            conversation_id: conversation.id,
        })
    }
}

/// The model name a provider reported, or the configured one when the
/// response did not carry it.
fn reported_model(reported: &str, configured: &str) -> String {
    if reported.is_empty() { configured } else { reported }.to_string()
}

/// The last `window` user, assistant and tool-result messages.
fn recent_history(messages: &[Message], window: usize) -> Vec<Message> {
    let relevant: Vec<&Message> = messages.iter().filter(|m| !m.is_system()).collect();
    let skip = relevant.len().saturating_sub(window);
    relevant.into_iter().skip(skip).cloned().collect()
}

/// Closing message used when the model is still calling tools after the
/// last allowed round.
fn round_limit_narration(actions: &[ActionResult]) -> String {
    let mut done = Vec::new();
    for (kind, verb) in [
        (ActionKind::Create, "created"),
        (ActionKind::Update, "updated"),
        (ActionKind::Delete, "deleted"),
    ] {
        let n = actions.iter().filter(|a| a.action == kind).count();
        if n > 0 {
            done.push(format!("{verb} {n} task{}", if n == 1 { "" } else { "s" }));
        }
    }

    if done.is_empty() {
        "I wasn't able to finish working on that request. Could you try rephrasing it?".to_string()
    } else {
        format!(
            "I ran out of steps before I could finish. So far I {}.",
            done.join(" and ")
        )
    }
}
