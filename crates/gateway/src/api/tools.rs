//! `GET /tools`, `GET /tools/:name` — registry surface for clients.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Json};

use crate::state::AppState;

pub async fn list_tools(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.tool_registry.list_schemas())
}

pub async fn get_tool(State(state): State<AppState>, Path(name): Path<String>) -> impl IntoResponse {
    match state.tool_registry.get(&name) {
        Some((schema, _invoker)) => Json(schema).into_response(),
        None => (
            axum::http::StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": { "code": "tool_not_found", "message": format!("tool not found: {name}") } })),
        )
            .into_response(),
    }
}
