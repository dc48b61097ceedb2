//! Request authentication.
//!
//! A caller presents a token as `Authorization: Bearer <token>` or in the
//! `idToken` cookie. The token is hashed and compared in constant time
//! against the digests of the configured users. When nothing matches and
//! `auth.dev_user` is set, the request runs as the dev user; otherwise it
//! is rejected with 401.

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::state::AppState;

/// The authenticated user id, inserted as a request extension.
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

const TOKEN_COOKIE: &str = "idToken";

fn presented_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == TOKEN_COOKIE && !value.is_empty()).then_some(value)
        })
}

fn resolve_user(state: &AppState, token: Option<&str>) -> Option<String> {
    if let Some(token) = token {
        let digest = Sha256::digest(token.as_bytes());
        let matched = state
            .user_tokens
            .iter()
            .find(|u| bool::from(digest.as_slice().ct_eq(u.token_hash.as_slice())));
        if let Some(user) = matched {
            return Some(user.user_id.clone());
        }
    }
    state.dev_user.clone()
}

/// Axum middleware for protected routes. Attach via
/// `axum::middleware::from_fn_with_state`.
pub async fn require_user(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    match resolve_user(&state, presented_token(req.headers())) {
        Some(user_id) => {
            req.extensions_mut().insert(AuthUser(user_id));
            next.run(req).await
        }
        None => (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": "Unauthorized" })),
        )
            .into_response(),
    }
}
