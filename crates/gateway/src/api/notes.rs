//! Notes endpoints.
//!
//! - `GET   /notes`               newest first, `limit` + `startAfter` cursor
//! - `POST  /notes`               create a note
//! - `PATCH /notes`               merge `updates` into note `id`
//! - `GET   /notes/search?q=`     content prefix search
//! - `POST  /categories/rename`   move notes between categories

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Json, Response};
use axum::Extension;
use serde::Deserialize;
use serde_json::{json, Value};

use wv_domain::task::Task;
use wv_store::notes::DEFAULT_PAGE_SIZE;

use super::auth::AuthUser;
use super::error::{bad_request, ApiError};
use crate::state::AppState;

const MAX_PAGE_SIZE: usize = 200;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /notes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotesQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub start_after: Option<i64>,
}

fn default_limit() -> usize {
    DEFAULT_PAGE_SIZE
}

pub async fn list(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Query(q): Query<ListNotesQuery>,
) -> Result<Response, ApiError> {
    let limit = q.limit.clamp(1, MAX_PAGE_SIZE);
    let notes = state.notes.list(&user_id, limit, q.start_after).await?;
    let next_cursor = if notes.len() == limit {
        notes.last().and_then(|n| n.timestamp)
    } else {
        None
    };
    Ok(Json(json!({ "data": { "notes": notes, "nextCursor": next_cursor } })).into_response())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /notes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn create(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    body: Result<Json<Task>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Ok(Json(note)) = body else {
        return Ok(bad_request("Invalid note"));
    };
    let note = state.notes.create(&user_id, note).await?;
    Ok(Json(json!({ "data": { "note": note } })).into_response())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// PATCH /notes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub struct UpdateNoteRequest {
    pub id: String,
    pub updates: Value,
}

pub async fn update(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    body: Result<Json<UpdateNoteRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Ok(Json(req)) = body else {
        return Ok(bad_request("Expected {id, updates}"));
    };
    if req.id.is_empty() || !req.updates.is_object() {
        return Ok(bad_request("Expected {id, updates}"));
    }
    state.notes.update(&user_id, &req.id, req.updates).await?;
    Ok(Json(json!({ "success": true })).into_response())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /notes/search
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

pub async fn search(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Query(q): Query<SearchQuery>,
) -> Result<Response, ApiError> {
    let notes = state
        .notes
        .search_prefix(&user_id, &q.q, DEFAULT_PAGE_SIZE)
        .await?;
    Ok(Json(json!({ "data": notes })).into_response())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /categories/rename
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameCategoryRequest {
    pub old_name: String,
    pub new_name: String,
}

pub async fn rename_category(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    body: Result<Json<RenameCategoryRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Ok(Json(req)) = body else {
        return Ok(bad_request("Expected {oldName, newName}"));
    };
    if req.old_name.is_empty() || req.new_name.is_empty() {
        return Ok(bad_request("Category names must be non-empty"));
    }
    let updated = state
        .notes
        .rename_category(&user_id, &req.old_name, &req.new_name)
        .await?;
    Ok(Json(json!({ "success": true, "updated": updated })).into_response())
}
