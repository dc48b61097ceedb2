use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Caller authentication
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    /// Requests without a matching token are attributed to this user.
    /// Local development only.
    #[serde(default)]
    pub dev_user: Option<String>,
    /// Known users. Each user's token is read from `token_env` once at
    /// startup and only its SHA-256 digest is kept.
    #[serde(default)]
    pub users: Vec<UserTokenConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserTokenConfig {
    pub id: String,
    pub token_env: String,
}
