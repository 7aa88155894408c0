//! Durable record types written by the Repositories layer.
//!
//! These are the client-facing records (conversations, tasks, messages);
//! distinct from [`pax_domain::state::AgentState`], which is the engine's
//! internal checkpoint and is never exposed directly over the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(user_id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            title: title.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

/// The durable, queryable shadow of an `AgentState` run. Updated after every
/// node transition so `GET /tasks/{id}` never needs to touch the checkpoint
/// store's primary file on the happy path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub user_id: String,
    pub user_input: String,
    #[serde(default)]
    pub parsed_intent: Option<Value>,
    #[serde(default)]
    pub todo_list: Value,
    #[serde(default)]
    pub current_step_index: usize,
    #[serde(default)]
    pub context: Value,
    #[serde(default)]
    pub step_results: Value,
    pub status: TaskStatus,
    #[serde(default)]
    pub error_info: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(conversation_id: Uuid, user_id: impl Into<String>, user_input: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            conversation_id,
            user_id: user_id.into(),
            user_input: user_input.into(),
            parsed_intent: None,
            todo_list: Value::Array(Vec::new()),
            current_step_index: 0,
            context: Value::Object(Default::default()),
            step_results: Value::Array(Vec::new()),
            status: TaskStatus::Pending,
            error_info: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    #[serde(default)]
    pub task_id: Option<Uuid>,
    pub role: MessageRole,
    pub content: String,
    #[serde(default)]
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(conversation_id: Uuid, role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            conversation_id,
            task_id: None,
            role,
            content: content.into(),
            metadata: Value::Object(Default::default()),
            created_at: Utc::now(),
        }
    }
}
