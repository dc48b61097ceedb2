//! `weave run`: one agent turn from the command line.
//!
//! Uses the configured stores, so the conversation id printed at the end can
//! be passed back with `--conversation` to continue. Credits are not charged.

use std::sync::Arc;

use wv_domain::config::Config;
use wv_store::notes::RECENT_CONTEXT_LIMIT;

use crate::bootstrap;
use crate::runtime::TurnInput;

pub async fn run(
    config: Arc<Config>,
    message: String,
    user_id: String,
    conversation_id: Option<String>,
    categories: Vec<String>,
    json_output: bool,
) -> anyhow::Result<()> {
    let state = bootstrap::build_app_state(config).await?;

    let cached_tasks = state.notes.recent(&user_id, RECENT_CONTEXT_LIMIT).await?;

    let outcome = state
        .agent
        .run_turn(TurnInput {
            user_id,
            input: message,
            existing_categories: categories,
            cached_tasks,
            conversation_id,
        })
        .await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    for text in &outcome.messages {
        println!("{text}");
    }
    if !outcome.actions.is_empty() {
        eprintln!();
        for action in &outcome.actions {
            eprintln!(
                "[{}] {}",
                serde_json::to_value(action.action)?.as_str().unwrap_or("?"),
                action.data
            );
        }
    }
    eprintln!(
        "\n[conversation {} | {} tokens]",
        outcome.conversation_id, outcome.tokens_used
    );

    Ok(())
}
