//! `GET /credits`: the caller's balance. The account is created with the
//! configured initial balance on first access.

use axum::extract::State;
use axum::response::{IntoResponse, Json, Response};
use axum::Extension;

use super::auth::AuthUser;
use super::error::ApiError;
use crate::state::AppState;

pub async fn get_credits(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Response, ApiError> {
    let credits = state.credits.ensure_account(&user_id).await?;
    Ok(Json(serde_json::json!({ "credits": credits })).into_response())
}
