use wv_domain::config::{Config, StorageBackend};

#[test]
fn default_host_is_localhost() {
    let config = Config::default();
    assert_eq!(config.server.host, "127.0.0.1");
}

#[test]
fn default_cors_allows_only_localhost() {
    let config = Config::default();
    assert!(config.server.cors.allowed_origins.contains(&"http://localhost:*".to_string()));
    assert!(config.server.cors.allowed_origins.contains(&"http://127.0.0.1:*".to_string()));
}

#[test]
fn full_config_parses() {
    let toml_str = r#"
[server]
host = "0.0.0.0"
port = 8080

[llm]
default_provider = "openai"

[[llm.providers]]
id = "openai"
kind = "openai_compat"
base_url = "https://api.openai.com/v1"
default_model = "gpt-4o-mini"

[llm.providers.auth]
env = "OPENAI_API_KEY"

[agent]
max_rounds = 4
timezone = "America/New_York"

[storage]
backend = "memory"

[[auth.users]]
id = "alice"
token_env = "WV_TOKEN_ALICE"

[credits]
min_balance = 5
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.llm.default_provider.as_deref(), Some("openai"));
    assert_eq!(config.agent.max_rounds, 4);
    assert_eq!(config.agent.history_window, 10);
    assert_eq!(config.storage.backend, StorageBackend::Memory);
    assert_eq!(config.auth.users[0].token_env, "WV_TOKEN_ALICE");
    assert_eq!(config.credits.min_balance, 5);
    assert_eq!(config.credits.failure_charge, 1);
    assert!(config.validate().is_empty());
}

#[test]
fn empty_file_falls_back_to_defaults() {
    let config: Config = toml::from_str("").unwrap();
    assert_eq!(config.agent.model, "gpt-4o-mini");
    assert_eq!(config.storage.conversation_window, 20);
    assert_eq!(config.credits.min_balance, 10);
    assert!(config.auth.dev_user.is_none());
}

#[test]
fn config_survives_toml_serialization() {
    let config = Config::default();
    let rendered = toml::to_string_pretty(&config).unwrap();
    let reparsed: Config = toml::from_str(&rendered).unwrap();
    assert_eq!(reparsed.server.port, config.server.port);
    assert_eq!(reparsed.agent.timezone, config.agent.timezone);
}
