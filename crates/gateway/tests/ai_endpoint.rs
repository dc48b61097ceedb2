mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tower::ServiceExt;

use common::{provider_error, test_state, text_reply, tool_reply, ScriptedProvider};
use wv_domain::config::Config;
use wv_gateway::api;
use wv_gateway::state::{AppState, UserToken};
use wv_store::{DocumentStore, MemoryDocumentStore};

const TOKEN: &str = "token-u1";

fn app(mut state: AppState) -> Router {
    state.user_tokens = Arc::new(vec![UserToken {
        user_id: "u1".into(),
        token_hash: Sha256::digest(TOKEN.as_bytes()).to_vec(),
    }]);
    api::router(state.clone()).with_state(state)
}

async fn fund(docs: &MemoryDocumentStore, credits: i64) {
    docs.set("users/u1", json!({ "credits": credits }), true)
        .await
        .unwrap();
}

async fn balance(docs: &MemoryDocumentStore) -> i64 {
    docs.get("users/u1").await.unwrap().unwrap()["credits"]
        .as_i64()
        .unwrap()
}

fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"));
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// /ai
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn health_needs_no_token() {
    let (state, _docs) = test_state(Config::default(), None);
    let app = app(state);
    let req = Request::get("/health").body(Body::empty()).unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn unknown_token_is_rejected() {
    let (state, _docs) = test_state(Config::default(), None);
    let app = app(state);
    let req = Request::post("/ai")
        .header(header::AUTHORIZATION, "Bearer wrong")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"input":"hi"}"#))
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn cookie_token_is_accepted() {
    let (state, docs) = test_state(Config::default(), None);
    fund(&docs, 42).await;
    let app = app(state);
    let req = Request::get("/credits")
        .header(header::COOKIE, format!("idToken={TOKEN}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["credits"], 42);
}

#[tokio::test]
async fn malformed_and_empty_input_are_bad_requests() {
    let provider = ScriptedProvider::new(vec![]);
    let (state, docs) = test_state(Config::default(), Some(provider.clone()));
    fund(&docs, 100).await;
    let app = app(state);

    let (status, body) = send(&app, request(Method::POST, "/ai", Some(json!({"input": 5})))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request format");

    let (status, _) = send(&app, request(Method::POST, "/ai", Some(json!({"input": "   "})))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(provider.request_count(), 0);
    assert_eq!(balance(&docs).await, 100);
}

#[tokio::test]
async fn low_balance_is_payment_required() {
    let provider = ScriptedProvider::new(vec![text_reply("hi", 5)]);
    let (state, docs) = test_state(Config::default(), Some(provider.clone()));
    fund(&docs, 9).await;
    let app = app(state);

    let (status, body) = send(&app, request(Method::POST, "/ai", Some(json!({"input": "hi"})))).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body, json!({"error": "Insufficient credits"}));
    assert_eq!(provider.request_count(), 0);
}

#[tokio::test]
async fn missing_account_counts_as_zero_balance() {
    let (state, _docs) = test_state(Config::default(), Some(ScriptedProvider::new(vec![])));
    let app = app(state);
    let (status, _) = send(&app, request(Method::POST, "/ai", Some(json!({"input": "hi"})))).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
}

#[tokio::test]
async fn successful_turn_charges_by_tokens() {
    let provider = ScriptedProvider::new(vec![
        tool_reply(
            &[("c1", "createTask", r#"{"content":"call mom","category":"Family","isTask":true,"dueDate":"2026-10-20"}"#)],
            60,
        ),
        text_reply("Added a task to call mom tomorrow.", 35),
    ]);
    let (state, docs) = test_state(Config::default(), Some(provider));
    fund(&docs, 100).await;
    let app = app(state);

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/ai",
            Some(json!({
                "input": "create a task to call mom tomorrow",
                "existingCategories": ["Family"],
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["tokensUsed"], 95);
    assert_eq!(data["creditsUsed"], 10);
    assert_eq!(data["messages"], json!(["Added a task to call mom tomorrow."]));
    assert_eq!(data["actions"][0]["action"], "create");
    assert_eq!(data["actions"][0]["data"]["dueDate"], "2026-10-20");
    assert!(!data["conversationId"].as_str().unwrap().is_empty());
    assert!(body.get("error").is_none());

    assert_eq!(balance(&docs).await, 90);
    let usage = docs.list("users/u1/usage").await.unwrap();
    assert_eq!(usage.len(), 1);
    assert_eq!(usage[0].data["requests"], 1);
    assert_eq!(usage[0].data["tokens"], 95);
}

#[tokio::test]
async fn model_failure_answers_with_apology_and_flat_charge() {
    let provider = ScriptedProvider::new(vec![provider_error("rate limited")]);
    let (state, docs) = test_state(Config::default(), Some(provider));
    fund(&docs, 50).await;
    let app = app(state);

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/ai",
            Some(json!({"input": "hi", "conversationId": "conv-9"})),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("AI processing error:"));
    let data = &body["data"];
    assert_eq!(data["actions"], json!([]));
    assert_eq!(data["tokensUsed"], 0);
    assert_eq!(data["creditsUsed"], 1);
    assert_eq!(data["conversationId"], "conv-9");
    assert!(data["messages"][0]
        .as_str()
        .unwrap()
        .starts_with("I'm sorry, I encountered an error:"));
    assert_eq!(balance(&docs).await, 49);
}

#[tokio::test]
async fn stored_notes_fill_in_missing_task_snapshot() {
    let provider = ScriptedProvider::new(vec![
        tool_reply(&[("c1", "getRecentTasks", "{}")], 10),
        text_reply("You have one task.", 10),
    ]);
    let (state, docs) = test_state(Config::default(), Some(provider));
    fund(&docs, 100).await;
    let app = app(state);

    let (status, _) = send(
        &app,
        request(
            Method::POST,
            "/notes",
            Some(json!({"content": "buy milk", "category": "Errands", "isTask": true})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        request(Method::POST, "/ai", Some(json!({"input": "what's on my list?"}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let recent = &body["data"]["actions"][0];
    assert_eq!(recent["action"], "getRecent");
    assert_eq!(recent["data"][0]["content"], "buy milk");
}

#[tokio::test]
async fn cached_tasks_with_foreign_values_are_accepted() {
    let provider = ScriptedProvider::new(vec![
        tool_reply(&[("c1", "getRecentTasks", "{}")], 10),
        text_reply("You have a dentist appointment.", 10),
    ]);
    let (state, docs) = test_state(Config::default(), Some(provider));
    fund(&docs, 100).await;
    let app = app(state);

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/ai",
            Some(json!({
                "input": "what's on my list?",
                "cachedTasks": [
                    {"id": "t1", "content": "dentist", "priority": "urgent", "isTask": null},
                ],
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let recent = &body["data"]["actions"][0];
    assert_eq!(recent["action"], "getRecent");
    assert_eq!(recent["data"][0]["content"], "dentist");
    assert_eq!(recent["data"][0]["isTask"], false);
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// /notes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn notes_crud_and_category_rename() {
    let (state, _docs) = test_state(Config::default(), None);
    let app = app(state);

    for content in ["dentist appointment", "dinner reservation", "gym"] {
        let (status, _) = send(
            &app,
            request(
                Method::POST,
                "/notes",
                Some(json!({"content": content, "category": "Personal"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(&app, request(Method::GET, "/notes/search?q=d", None)).await;
    assert_eq!(status, StatusCode::OK);
    let hits: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["content"].as_str().unwrap())
        .collect();
    assert_eq!(hits, ["dentist appointment", "dinner reservation"]);

    let (_, body) = send(&app, request(Method::GET, "/notes?limit=2", None)).await;
    let notes = body["data"]["notes"].as_array().unwrap().clone();
    assert_eq!(notes.len(), 2);
    assert!(body["data"]["nextCursor"].is_i64());

    let id = notes[0]["id"].as_str().unwrap().to_string();
    let (status, body) = send(
        &app,
        request(
            Method::PATCH,
            "/notes",
            Some(json!({"id": id, "updates": {"completed": true}})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));

    let (status, _) = send(
        &app,
        request(
            Method::PATCH,
            "/notes",
            Some(json!({"id": "missing", "updates": {"completed": true}})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/categories/rename",
            Some(json!({"oldName": "Personal", "newName": "Home"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "updated": 3}));
}

#[tokio::test]
async fn patched_note_with_unknown_priority_stays_listed() {
    let (state, _docs) = test_state(Config::default(), None);
    let app = app(state);

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/notes",
            Some(json!({"content": "renew passport", "category": "Admin", "isTask": true})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = body["data"]["note"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        request(
            Method::PATCH,
            "/notes",
            Some(json!({"id": id, "updates": {"priority": "urgent"}})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, request(Method::GET, "/notes", None)).await;
    assert_eq!(status, StatusCode::OK);
    let notes = body["data"]["notes"].as_array().unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0]["id"], id.as_str());
    assert_eq!(notes[0]["content"], "renew passport");
    assert!(notes[0]["priority"].is_null());
}

#[tokio::test]
async fn dev_user_handles_unauthenticated_requests() {
    let mut config = Config::default();
    config.auth.dev_user = Some("dev".into());
    config.credits.initial_balance = 25;
    let (state, docs) = test_state(config, None);
    let app = api::router(state.clone()).with_state(state);

    let req = Request::get("/credits").body(Body::empty()).unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["credits"], 25);
    assert!(docs.get("users/dev").await.unwrap().is_some());
}
