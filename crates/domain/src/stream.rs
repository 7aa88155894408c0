//! Events emitted by the Stream Dispatcher to conversation subscribers.
//!
//! The tag/variant vocabulary mirrors the client-facing message set: a
//! client sees exactly these kinds over the WebSocket, regardless of how
//! many internal node transitions produced them.

use serde::{Deserialize, Serialize};

use crate::state::AgentState;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WorkflowEvent {
    #[serde(rename = "task_created")]
    TaskCreated { task_id: String, status: String },

    /// Emitted once per Workflow Engine loop iteration after a node runs and
    /// the new state has been checkpointed.
    #[serde(rename = "state_update")]
    StateUpdate { node: String, state: Box<AgentState> },

    #[serde(rename = "task_resumed")]
    TaskResumed { state: Box<AgentState> },

    #[serde(rename = "task_error")]
    TaskError { message: String },

    #[serde(rename = "ping")]
    Ping,

    #[serde(rename = "pong")]
    Pong,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_update_serializes_with_type_tag() {
        let event = WorkflowEvent::StateUpdate {
            node: "executor".into(),
            state: Box::new(AgentState::new("hi", "conv-1", "user-1")),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "state_update");
        assert_eq!(json["node"], "executor");
    }

    #[test]
    fn ping_pong_round_trip() {
        let ping = serde_json::to_string(&WorkflowEvent::Ping).unwrap();
        assert!(ping.contains("\"ping\""));
        let parsed: WorkflowEvent = serde_json::from_str(&ping).unwrap();
        assert!(matches!(parsed, WorkflowEvent::Ping));
    }
}
