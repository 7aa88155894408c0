//! `GET /ws/:conversation_id` — the streaming entry point.
//!
//! The only place a workflow actually runs: `start_task`/`resume_task`
//! messages launch [`pax_engine::Workflow::start`]/`resume`, whose
//! `state_update` events arrive via the conversation's Stream Dispatcher
//! channel and are forwarded to the socket as they're emitted.

use std::collections::BTreeMap;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use pax_domain::stream::WorkflowEvent;

use crate::state::AppState;

pub async fn ws_upgrade(
    ws: WebSocketUpgrade,
    Path(conversation_id): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, conversation_id, state))
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ClientMessage {
    #[serde(rename = "start_task")]
    StartTask { task_id: Uuid, user_input: String, user_id: String },
    #[serde(rename = "resume_task")]
    ResumeTask {
        task_id: Uuid,
        #[serde(default)]
        user_provided_config: BTreeMap<String, Value>,
    },
    #[serde(rename = "ping")]
    Ping,
}

async fn handle_socket(socket: WebSocket, conversation_id: String, state: AppState) {
    let (mut sink, mut stream) = socket.split();

    let mut events = state.dispatcher.subscribe(&conversation_id);
    let forward_task = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            let Ok(text) = serde_json::to_string(&event) else { continue };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = stream.next().await {
        let Message::Text(text) = msg else { continue };
        let Ok(client_msg) = serde_json::from_str::<ClientMessage>(&text) else {
            continue;
        };

        match client_msg {
            ClientMessage::StartTask { task_id, user_input, user_id } => {
                state.dispatcher.emit(
                    &conversation_id,
                    WorkflowEvent::TaskCreated {
                        task_id: task_id.to_string(),
                        status: "running".to_string(),
                    },
                );
                let workflow = state.workflow.clone();
                let conversation_id = conversation_id.clone();
                tokio::spawn(async move {
                    workflow.start(task_id, &user_input, &conversation_id, &user_id).await;
                });
            }
            ClientMessage::ResumeTask { task_id, user_provided_config } => {
                let workflow = state.workflow.clone();
                let dispatcher = state.dispatcher.clone();
                let conversation_id = conversation_id.clone();
                tokio::spawn(async move {
                    if let Err(e) = workflow.resume(&conversation_id, task_id, user_provided_config).await {
                        dispatcher.emit(&conversation_id, WorkflowEvent::TaskError { message: e.to_string() });
                    }
                });
            }
            ClientMessage::Ping => {
                state.dispatcher.emit(&conversation_id, WorkflowEvent::Pong);
            }
        }
    }

    forward_task.abort();
    state.dispatcher.cleanup(&conversation_id);
}
