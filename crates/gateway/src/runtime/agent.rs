//! The task agent: an LLM provider, conversation storage and agent settings
//! wired together once at startup and shared by every request.

use std::sync::Arc;

use chrono_tz::Tz;

use wv_domain::config::AgentConfig;
use wv_providers::LlmProvider;
use wv_store::ConversationStore;

pub struct TaskAgent {
    pub(super) provider: Option<Arc<dyn LlmProvider>>,
    pub(super) conversations: Arc<ConversationStore>,
    pub(super) config: AgentConfig,
    pub(super) tz: Tz,
}

impl TaskAgent {
    /// An agent without a provider still loads and saves conversations but
    /// fails every turn with a configuration error.
    pub fn new(
        provider: Option<Arc<dyn LlmProvider>>,
        conversations: Arc<ConversationStore>,
        config: AgentConfig,
    ) -> Self {
        let tz = config.tz().unwrap_or_else(|| {
            tracing::warn!(timezone = %config.timezone, "unknown timezone, using UTC");
            Tz::UTC
        });
        Self {
            provider,
            conversations,
            config,
            tz,
        }
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    pub fn conversations(&self) -> &Arc<ConversationStore> {
        &self.conversations
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }
}
