//! AppState construction shared by `serve` and `run`.

use std::sync::Arc;

use anyhow::Context;
use sha2::{Digest, Sha256};

use wv_domain::config::{AuthConfig, Config, ConfigSeverity, StorageBackend};
use wv_providers::{LlmProvider, ProviderRegistry};
use wv_store::{ConversationStore, DocumentStore, JsonFileDocumentStore, MemoryDocumentStore, NoteStore};

use crate::runtime::{CreditLedger, TaskAgent};
use crate::state::{AppState, UserToken};

/// Validate config, open storage, build the LLM provider and return a
/// fully-wired [`AppState`].
pub async fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    let errors = issues
        .iter()
        .filter(|i| i.severity == ConfigSeverity::Error)
        .count();
    if errors > 0 {
        anyhow::bail!("config validation failed with {errors} error(s)");
    }

    // ── Document store ───────────────────────────────────────────────
    let docs: Arc<dyn DocumentStore> = match config.storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("using in-memory document store; data is lost on exit");
            Arc::new(MemoryDocumentStore::new())
        }
        StorageBackend::File => Arc::new(
            JsonFileDocumentStore::open(&config.storage.path).with_context(|| {
                format!("opening document store {}", config.storage.path.display())
            })?,
        ),
    };

    // ── LLM provider ─────────────────────────────────────────────────
    let registry = ProviderRegistry::from_config(&config.llm);
    let provider = registry.default_provider();
    match &provider {
        Some(p) => tracing::info!(provider_id = %p.provider_id(), "default LLM provider selected"),
        None => tracing::warn!("no default LLM provider; AI requests will return an apology"),
    }

    Ok(build_app_state_with(config, docs, provider))
}

/// Wire an [`AppState`] from already-built parts.
pub fn build_app_state_with(
    config: Arc<Config>,
    docs: Arc<dyn DocumentStore>,
    provider: Option<Arc<dyn LlmProvider>>,
) -> AppState {
    let conversations = Arc::new(ConversationStore::new(
        docs.clone(),
        config.storage.conversation_window,
    ));
    let agent = Arc::new(TaskAgent::new(provider, conversations, config.agent.clone()));
    let notes = Arc::new(NoteStore::new(docs.clone()));
    let credits = Arc::new(CreditLedger::new(docs.clone(), config.credits.clone()));

    let user_tokens = Arc::new(load_user_tokens(&config.auth));
    if let Some(dev) = &config.auth.dev_user {
        tracing::warn!(
            dev_user = %dev,
            "unauthenticated requests are attributed to the dev user"
        );
    }

    AppState {
        dev_user: config.auth.dev_user.clone(),
        config,
        docs,
        agent,
        notes,
        credits,
        user_tokens,
    }
}

/// Read each user's token from its env var once and keep only the digest.
fn load_user_tokens(auth: &AuthConfig) -> Vec<UserToken> {
    auth.users
        .iter()
        .filter_map(|u| match std::env::var(&u.token_env) {
            Ok(token) if !token.is_empty() => Some(UserToken {
                user_id: u.id.clone(),
                token_hash: Sha256::digest(token.as_bytes()).to_vec(),
            }),
            _ => {
                tracing::warn!(
                    user_id = %u.id,
                    env = %u.token_env,
                    "token env var unset or empty; user cannot authenticate"
                );
                None
            }
        })
        .collect()
}
