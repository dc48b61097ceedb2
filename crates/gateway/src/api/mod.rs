pub mod ai;
pub mod auth;
pub mod credits;
pub mod error;
pub mod notes;

use axum::middleware;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the full API router.
///
/// Routes are split into **public** (no auth required) and **protected**
/// (caller resolved to a user by [`auth::require_user`]).
///
/// `state` is needed to wire up the auth middleware at build time.
pub fn router(state: AppState) -> Router<AppState> {
    let public = Router::new().route("/health", get(health));

    let protected = Router::new()
        .route("/ai", post(ai::process))
        .route("/credits", get(credits::get_credits))
        .route(
            "/notes",
            get(notes::list).post(notes::create).patch(notes::update),
        )
        .route("/notes/search", get(notes::search))
        .route("/categories/rename", post(notes::rename_category))
        .layer(middleware::from_fn_with_state(state, auth::require_user));

    public.merge(protected)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
