//! Provider registry.
//!
//! Constructs and holds all configured LLM provider instances. At startup the
//! registry reads the [`LlmConfig`], resolves authentication and instantiates
//! the adapter for each configured provider.

use crate::openai_compat::OpenAiCompatProvider;
use crate::traits::LlmProvider;
use std::collections::HashMap;
use std::sync::Arc;
use wv_domain::config::{LlmConfig, ProviderKind};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ProviderRegistry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn LlmProvider>>,
    /// Config order, used to pick a fallback default.
    order: Vec<String>,
    default_id: Option<String>,
}

impl ProviderRegistry {
    /// Build the registry from the application's [`LlmConfig`].
    ///
    /// Providers that fail to initialize are logged and skipped rather than
    /// aborting startup; the agent reports the failure per turn instead.
    pub fn from_config(config: &LlmConfig) -> Self {
        let mut registry = Self {
            default_id: config.default_provider.clone(),
            ..Default::default()
        };

        for pc in &config.providers {
            let result = match pc.kind {
                ProviderKind::OpenaiCompat => OpenAiCompatProvider::from_config(pc)
                    .map(|p| Arc::new(p) as Arc<dyn LlmProvider>),
            };

            match result {
                Ok(provider) => {
                    tracing::info!(
                        provider_id = %pc.id,
                        kind = ?pc.kind,
                        "registered LLM provider"
                    );
                    registry.insert(provider);
                }
                Err(e) => {
                    tracing::warn!(
                        provider_id = %pc.id,
                        kind = ?pc.kind,
                        error = %e,
                        "failed to initialize LLM provider, skipping"
                    );
                }
            }
        }

        if registry.providers.is_empty() {
            tracing::warn!("no LLM providers initialized; /ai will fail until auth is configured");
        }

        registry
    }

    /// Register an already-built provider under its own id.
    pub fn insert(&mut self, provider: Arc<dyn LlmProvider>) {
        let id = provider.provider_id().to_string();
        if !self.providers.contains_key(&id) {
            self.order.push(id.clone());
        }
        self.providers.insert(id, provider);
    }

    /// Look up a provider by its config id.
    pub fn get(&self, provider_id: &str) -> Option<Arc<dyn LlmProvider>> {
        self.providers.get(provider_id).cloned()
    }

    /// The configured default provider, else the first one registered.
    pub fn default_provider(&self) -> Option<Arc<dyn LlmProvider>> {
        if let Some(ref id) = self.default_id {
            return self.get(id);
        }
        self.order.first().and_then(|id| self.get(id))
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{ChatRequest, ChatResponse};
    use wv_domain::config::{ProviderAuthConfig, ProviderConfig};
    use wv_domain::error::Result;

    struct Named(&'static str);

    #[async_trait::async_trait]
    impl LlmProvider for Named {
        async fn chat(&self, _req: &ChatRequest) -> Result<ChatResponse> {
            Ok(ChatResponse::default())
        }
        fn provider_id(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn provider_without_key_is_skipped() {
        let config = LlmConfig {
            default_provider: None,
            providers: vec![ProviderConfig {
                id: "nokey".into(),
                kind: ProviderKind::OpenaiCompat,
                base_url: "http://localhost:11434/v1".into(),
                default_model: None,
                auth: ProviderAuthConfig {
                    env: Some("WV_TEST_REGISTRY_MISSING_KEY".into()),
                    ..Default::default()
                },
            }],
        };
        let registry = ProviderRegistry::from_config(&config);
        assert!(registry.is_empty());
        assert!(registry.default_provider().is_none());
    }

    #[test]
    fn default_falls_back_to_first_registered() {
        let mut registry = ProviderRegistry::default();
        registry.insert(Arc::new(Named("first")));
        registry.insert(Arc::new(Named("second")));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.default_provider().unwrap().provider_id(), "first");
    }

    #[test]
    fn explicit_default_wins() {
        let mut registry = ProviderRegistry {
            default_id: Some("second".into()),
            ..Default::default()
        };
        registry.insert(Arc::new(Named("first")));
        registry.insert(Arc::new(Named("second")));
        assert_eq!(registry.default_provider().unwrap().provider_id(), "second");
    }
}
