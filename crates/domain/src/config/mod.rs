mod agent;
mod auth;
mod credits;
mod llm;
mod observability;
mod server;
mod storage;

pub use agent::*;
pub use auth::*;
pub use credits::*;
pub use llm::*;
pub use observability::*;
pub use server::*;
pub use storage::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub credits: CreditsConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl ConfigError {
    fn error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Error,
            field: field.into(),
            message: message.into(),
        }
    }

    fn warning(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Warning,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push(ConfigError::error("server.port", "port must be greater than 0"));
        }
        if self.server.host.is_empty() {
            errors.push(ConfigError::error("server.host", "host must not be empty"));
        }
        if self.server.cors.allowed_origins.len() == 1
            && self.server.cors.allowed_origins[0] == "*"
        {
            errors.push(ConfigError::warning(
                "server.cors.allowed_origins",
                "wildcard \"*\" allows all origins (not recommended for production)",
            ));
        }

        if self.llm.providers.is_empty() {
            errors.push(ConfigError::warning(
                "llm.providers",
                "no LLM providers configured; /ai will answer with an apology",
            ));
        }
        for (i, provider) in self.llm.providers.iter().enumerate() {
            if provider.id.is_empty() {
                errors.push(ConfigError::error(
                    format!("llm.providers[{i}].id"),
                    "provider id must not be empty",
                ));
            }
            if provider.base_url.is_empty() {
                errors.push(ConfigError::error(
                    format!("llm.providers[{i}].base_url"),
                    "provider base_url must not be empty",
                ));
            }
        }
        if let Some(ref id) = self.llm.default_provider {
            if !self.llm.providers.iter().any(|p| &p.id == id) {
                errors.push(ConfigError::error(
                    "llm.default_provider",
                    format!("no provider with id '{id}'"),
                ));
            }
        }

        if self.agent.max_rounds == 0 {
            errors.push(ConfigError::error("agent.max_rounds", "must be at least 1"));
        }
        if !(0.0..=2.0).contains(&self.agent.temperature) {
            errors.push(ConfigError::error(
                "agent.temperature",
                "temperature must be between 0.0 and 2.0",
            ));
        }
        if self.agent.tz().is_none() {
            errors.push(ConfigError::error(
                "agent.timezone",
                format!("unknown IANA timezone '{}'", self.agent.timezone),
            ));
        }

        if self.storage.backend == StorageBackend::File && self.storage.path.as_os_str().is_empty() {
            errors.push(ConfigError::error(
                "storage.path",
                "path must not be empty for the file backend",
            ));
        }
        if self.storage.conversation_window == 0 {
            errors.push(ConfigError::error(
                "storage.conversation_window",
                "must keep at least one message",
            ));
        }

        if self.auth.users.is_empty() && self.auth.dev_user.is_none() {
            errors.push(ConfigError::warning(
                "auth.users",
                "no users configured and no dev_user; every protected request will be rejected",
            ));
        }
        for (i, user) in self.auth.users.iter().enumerate() {
            if user.id.is_empty() || user.token_env.is_empty() {
                errors.push(ConfigError::error(
                    format!("auth.users[{i}]"),
                    "id and token_env must not be empty",
                ));
            }
        }

        errors
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    fn has_error(issues: &[ConfigError], field: &str) -> bool {
        issues
            .iter()
            .any(|e| e.severity == ConfigSeverity::Error && e.field == field)
    }

    #[test]
    fn default_config_has_no_errors() {
        let issues = Config::default().validate();
        assert!(issues.iter().all(|e| e.severity == ConfigSeverity::Warning));
    }

    #[test]
    fn zero_rounds_is_rejected() {
        let mut config = Config::default();
        config.agent.max_rounds = 0;
        assert!(has_error(&config.validate(), "agent.max_rounds"));
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let mut config = Config::default();
        config.agent.timezone = "Mars/Olympus_Mons".into();
        assert!(has_error(&config.validate(), "agent.timezone"));
    }

    #[test]
    fn dangling_default_provider_is_rejected() {
        let mut config = Config::default();
        config.llm.default_provider = Some("missing".into());
        assert!(has_error(&config.validate(), "llm.default_provider"));
    }

    #[test]
    fn display_includes_severity_tag() {
        let e = ConfigError::error("server.port", "bad");
        assert_eq!(e.to_string(), "[ERROR] server.port: bad");
    }
}
