//! Router smoke tests: a handful of real requests through the full axum
//! stack (router + middleware), no mocked handlers.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use pax_domain::config::Config;
use pax_gateway::api;
use pax_gateway::state::AppState;

fn test_state() -> AppState {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.storage.state_path = dir.path().display().to_string();
    std::mem::forget(dir); // keep the directory alive for the test's duration
    AppState::new(Arc::new(config)).unwrap()
}

#[tokio::test]
async fn healthz_is_public_and_reports_ok() {
    let state = test_state();
    let app = api::router(state.clone()).with_state(state);

    let response = app
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["ok"], true);
}

#[tokio::test]
async fn unknown_conversation_is_404() {
    let state = test_state();
    let app = api::router(state.clone()).with_state(state);

    let id = uuid::Uuid::new_v4();
    let response = app
        .oneshot(Request::builder().uri(format!("/conversations/{id}")).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_tool_is_404() {
    let state = test_state();
    let app = api::router(state.clone()).with_state(state);

    let response = app
        .oneshot(Request::builder().uri("/tools/does-not-exist").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_tools_reflects_the_seeded_registry() {
    let state = test_state();
    let expected = state.tool_registry.list_names().len();
    let app = api::router(state.clone()).with_state(state);

    let response = app
        .oneshot(Request::builder().uri("/tools").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let schemas: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
    assert_eq!(schemas.len(), expected);
}

#[tokio::test]
async fn create_conversation_then_fetch_it() {
    let state = test_state();
    let app = api::router(state.clone()).with_state(state);

    let create_body = serde_json::json!({ "user_id": "u1", "title": "first chat" }).to_string();
    let create_response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/conversations")
                .header("content-type", "application/json")
                .body(Body::from(create_body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(create_response.status(), StatusCode::CREATED);

    let body = create_response.into_body().collect().await.unwrap().to_bytes();
    let created: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let id = created["id"].as_str().unwrap();

    let get_response = app
        .oneshot(Request::builder().uri(format!("/conversations/{id}")).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(get_response.status(), StatusCode::OK);
}
