use std::sync::Arc;

use wv_domain::config::Config;
use wv_store::{DocumentStore, NoteStore};

use crate::runtime::{CreditLedger, TaskAgent};

/// A configured API user and the SHA-256 digest of their bearer token.
#[derive(Clone)]
pub struct UserToken {
    pub user_id: String,
    pub token_hash: Vec<u8>,
}

/// Shared application state passed to all API handlers.
#[derive(Clone)]
pub struct AppState {
    // ── Core services ─────────────────────────────────────────────────
    pub config: Arc<Config>,
    pub docs: Arc<dyn DocumentStore>,
    pub agent: Arc<TaskAgent>,
    pub notes: Arc<NoteStore>,
    pub credits: Arc<CreditLedger>,

    // ── Auth ──────────────────────────────────────────────────────────
    pub user_tokens: Arc<Vec<UserToken>>,
    /// Identity used for requests that carry no recognized token.
    pub dev_user: Option<String>,
}
