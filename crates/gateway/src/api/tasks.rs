//! `POST /tasks`, `GET /tasks/:id`, `POST /tasks/resume`.
//!
//! Creating a task only records it — the Workflow Engine loop runs under a
//! subscription (the WebSocket `start_task`/`resume_task` messages) or an
//! explicit call to [`pax_engine::Workflow::start`]; `POST /tasks` alone does
//! not start it.

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Json};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use pax_store::Task;

use crate::api::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub conversation_id: Uuid,
    pub user_id: String,
    pub user_input: String,
}

pub async fn create_task(State(state): State<AppState>, Json(body): Json<CreateTaskRequest>) -> impl IntoResponse {
    let task = Task::new(body.conversation_id, body.user_id, body.user_input);
    state.repositories.tasks.insert(task.clone());
    (axum::http::StatusCode::CREATED, Json(task))
}

pub async fn get_task(State(state): State<AppState>, Path(id): Path<Uuid>) -> impl IntoResponse {
    if let Some(cached) = state.checkpoint_store.get_task_state(&id.to_string()) {
        return Json(serde_json::json!({ "task_id": id, "state": cached })).into_response();
    }
    match state.repositories.tasks.get(&id) {
        Some(task) => Json(task).into_response(),
        None => (
            axum::http::StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": { "code": "not_found", "message": "task not found" } })),
        )
            .into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct ResumeTaskRequest {
    pub task_id: Uuid,
    pub thread_id: String,
    #[serde(default)]
    pub user_provided_config: BTreeMap<String, Value>,
}

pub async fn resume_task(
    State(state): State<AppState>,
    Json(body): Json<ResumeTaskRequest>,
) -> Result<Json<pax_domain::state::AgentState>, ApiError> {
    let resumed = state
        .workflow
        .resume(&body.thread_id, body.task_id, body.user_provided_config)
        .await?;
    Ok(Json(resumed))
}
