//! `POST/GET /conversations`, `GET /users/:user_id/conversations`, `DELETE /conversations/:id`.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Json};
use serde::Deserialize;
use uuid::Uuid;

use pax_store::Conversation;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateConversationRequest {
    pub user_id: String,
    #[serde(default)]
    pub title: Option<String>,
}

pub async fn create_conversation(
    State(state): State<AppState>,
    Json(body): Json<CreateConversationRequest>,
) -> impl IntoResponse {
    let conversation = Conversation::new(body.user_id, body.title.unwrap_or_else(|| "untitled".to_string()));
    state.repositories.conversations.insert(conversation.clone());
    (axum::http::StatusCode::CREATED, Json(conversation))
}

pub async fn get_conversation(State(state): State<AppState>, Path(id): Path<Uuid>) -> impl IntoResponse {
    match state.repositories.conversations.get(&id) {
        Some(c) => Json(c).into_response(),
        None => (
            axum::http::StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": { "code": "not_found", "message": "conversation not found" } })),
        )
            .into_response(),
    }
}

pub async fn list_conversations_for_user(State(state): State<AppState>, Path(user_id): Path<String>) -> impl IntoResponse {
    let conversations: Vec<Conversation> = state
        .repositories
        .conversations
        .list_recent(usize::MAX)
        .into_iter()
        .filter(|c| c.user_id == user_id)
        .collect();
    Json(conversations)
}

pub async fn delete_conversation(State(state): State<AppState>, Path(id): Path<Uuid>) -> impl IntoResponse {
    state.dispatcher.cleanup(&id.to_string());
    axum::http::StatusCode::NO_CONTENT
}
