//! Credit metering.
//!
//! Balances live on the user document (`users/{uid}.credits`); each charge
//! also accumulates into a per-day usage document at
//! `users/{uid}/usage/{YYYY-MM-DD}` (UTC date).

use std::sync::Arc;

use serde_json::{json, Value};

use wv_domain::config::CreditsConfig;
use wv_domain::error::{Error, Result};
use wv_domain::message::now_millis;
use wv_domain::trace::TraceEvent;
use wv_store::DocumentStore;

const TOKENS_PER_CREDIT: u64 = 10;

/// Credits charged for a completed turn: one per started block of ten
/// tokens, never less than one.
pub fn credits_for_tokens(tokens: u64) -> u64 {
    tokens.div_ceil(TOKENS_PER_CREDIT).max(1)
}

fn user_path(user_id: &str) -> String {
    format!("users/{user_id}")
}

fn usage_path(user_id: &str, day: &str) -> String {
    format!("users/{user_id}/usage/{day}")
}

pub struct CreditLedger {
    docs: Arc<dyn DocumentStore>,
    config: CreditsConfig,
    /// Read-modify-write of balances and usage is serialized in-process.
    lock: tokio::sync::Mutex<()>,
}

impl CreditLedger {
    pub fn new(docs: Arc<dyn DocumentStore>, config: CreditsConfig) -> Self {
        Self {
            docs,
            config,
            lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn config(&self) -> &CreditsConfig {
        &self.config
    }

    /// Current balance; `None` when the user has no account.
    pub async fn balance(&self, user_id: &str) -> Result<Option<i64>> {
        Ok(self
            .docs
            .get(&user_path(user_id))
            .await?
            .and_then(|doc| doc.get("credits").and_then(Value::as_i64)))
    }

    /// Balance of the user, creating the account with the configured
    /// initial balance when it does not exist yet.
    pub async fn ensure_account(&self, user_id: &str) -> Result<i64> {
        let _guard = self.lock.lock().await;
        if let Some(balance) = self.balance(user_id).await? {
            return Ok(balance);
        }
        let initial = self.config.initial_balance;
        self.docs
            .set(
                &user_path(user_id),
                json!({ "credits": initial, "createdAt": now_millis() }),
                true,
            )
            .await?;
        tracing::info!(user_id = %user_id, credits = initial, "created credit account");
        Ok(initial)
    }

    /// Charge for a completed turn and return the credits deducted.
    pub async fn deduct(&self, user_id: &str, tokens: u64) -> Result<u64> {
        let credits = credits_for_tokens(tokens);
        self.charge(user_id, credits, tokens).await?;
        Ok(credits)
    }

    /// Subtract `credits` from the balance and record usage. Returns the
    /// remaining balance. A user without a balance is an error.
    pub async fn charge(&self, user_id: &str, credits: u64, tokens: u64) -> Result<i64> {
        let _guard = self.lock.lock().await;

        let balance = self
            .balance(user_id)
            .await?
            .ok_or_else(|| Error::Credits(format!("no credits found for user {user_id}")))?;
        let remaining = balance - credits as i64;
        self.docs
            .set(&user_path(user_id), json!({ "credits": remaining }), true)
            .await?;

        let day = chrono::Utc::now().format("%Y-%m-%d").to_string();
        let path = usage_path(user_id, &day);
        let usage = self.docs.get(&path).await?.unwrap_or_else(|| json!({}));
        let field = |key: &str| usage.get(key).and_then(Value::as_u64).unwrap_or(0);
        self.docs
            .set(
                &path,
                json!({
                    "date": day,
                    "tokens": field("tokens") + tokens,
                    "credits": field("credits") + credits,
                    "requests": field("requests") + 1,
                    "lastUpdated": now_millis(),
                }),
                true,
            )
            .await?;

        TraceEvent::CreditsDeducted {
            user_id: user_id.to_string(),
            tokens,
            credits,
            balance: remaining,
        }
        .emit();

        Ok(remaining)
    }
}
