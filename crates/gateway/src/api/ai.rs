//! `POST /ai`: run one agent turn for the authenticated user.
//!
//! Validation, auth and credit checks reject fast, before any model call.
//! Once the turn starts, a failure inside the agent still answers 200 with
//! an apology in `messages` and a flat failure charge.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::Extension;
use serde::Deserialize;
use serde_json::json;

use wv_domain::task::Task;
use wv_store::notes::RECENT_CONTEXT_LIMIT;

use super::auth::AuthUser;
use super::error::{bad_request, ApiError};
use crate::runtime::TurnInput;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiRequest {
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub existing_categories: Vec<String>,
    #[serde(default)]
    pub cached_tasks: Vec<Task>,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

pub async fn process(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    body: Result<Json<AiRequest>, JsonRejection>,
) -> Response {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "rejected /ai body");
            return bad_request("Invalid request format");
        }
    };
    if req.input.trim().is_empty() {
        return bad_request("Invalid input. Expected a non-empty string.");
    }

    match handle(&state, &user_id, req).await {
        Ok(resp) => resp,
        Err(e) => e.into_response(),
    }
}

async fn handle(state: &AppState, user_id: &str, req: AiRequest) -> Result<Response, ApiError> {
    let balance = state.credits.balance(user_id).await?.unwrap_or(0);
    if balance < state.config.credits.min_balance {
        tracing::info!(user_id = %user_id, balance, "insufficient credits");
        return Ok((
            StatusCode::PAYMENT_REQUIRED,
            Json(json!({ "error": "Insufficient credits" })),
        )
            .into_response());
    }

    let cached_tasks = if req.cached_tasks.is_empty() {
        state
            .notes
            .recent(user_id, RECENT_CONTEXT_LIMIT)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(user_id = %user_id, error = %e, "could not load recent notes");
                Vec::new()
            })
    } else {
        req.cached_tasks
    };

    let input = TurnInput {
        user_id: user_id.to_string(),
        input: req.input,
        existing_categories: req.existing_categories,
        cached_tasks,
        conversation_id: req.conversation_id.clone(),
    };

    match state.agent.run_turn(input).await {
        Ok(outcome) => {
            let credits_used = state.credits.deduct(user_id, outcome.tokens_used).await?;
            tracing::info!(
                user_id = %user_id,
                actions = outcome.actions.len(),
                tokens = outcome.tokens_used,
                credits = credits_used,
                "AI request completed"
            );
            Ok(Json(json!({
                "data": {
                    "actions": outcome.actions,
                    "messages": outcome.messages,
                    "tokensUsed": outcome.tokens_used,
                    "creditsUsed": credits_used,
                    "conversationId": outcome.conversation_id,
                }
            }))
            .into_response())
        }
        Err(e) => {
            tracing::error!(user_id = %user_id, error = %e, "AI processing failed");
            let charge = state.config.credits.failure_charge;
            if let Err(charge_err) = state.credits.charge(user_id, charge, 0).await {
                tracing::warn!(user_id = %user_id, error = %charge_err, "failure charge not applied");
            }
            Ok(Json(json!({
                "error": format!("AI processing error: {e}"),
                "data": {
                    "actions": [],
                    "messages": [format!("I'm sorry, I encountered an error: {e}. Please try again.")],
                    "tokensUsed": 0,
                    "creditsUsed": charge,
                    "conversationId": req.conversation_id,
                }
            }))
            .into_response())
        }
    }
}
