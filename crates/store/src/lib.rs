//! Durable storage for the workflow engine: the State Store (checkpointed
//! `AgentState`) and the Repositories layer (Conversation/Task/Message
//! records).

pub mod checkpoint;
pub mod models;
pub mod repository;

pub use checkpoint::CheckpointStore;
pub use models::{Conversation, Message, MessageRole, Task, TaskStatus};
pub use repository::{JsonlRepository, Record};

impl Record for models::Conversation {
    fn id(&self) -> uuid::Uuid {
        self.id
    }
}

impl Record for models::Task {
    fn id(&self) -> uuid::Uuid {
        self.id
    }
}

impl Record for models::Message {
    fn id(&self) -> uuid::Uuid {
        self.id
    }
}

/// The three repositories bundled together, as gateway state will hold them.
pub struct Repositories {
    pub conversations: JsonlRepository<models::Conversation>,
    pub tasks: JsonlRepository<models::Task>,
    pub messages: JsonlRepository<models::Message>,
}

impl Repositories {
    pub fn new(state_path: &std::path::Path) -> Self {
        Self {
            conversations: JsonlRepository::new(state_path, "conversations.jsonl"),
            tasks: JsonlRepository::new(state_path, "tasks.jsonl"),
            messages: JsonlRepository::new(state_path, "messages.jsonl"),
        }
    }
}
