//! The Stream Dispatcher: per-conversation fan-out of `WorkflowEvent`s.
//!
//! Backed by a `tokio::broadcast` channel per conversation. A send with no
//! live receivers, or a receiver lagging behind the channel's capacity, is
//! swallowed rather than propagated — the engine loop never blocks on a
//! slow subscriber.

use std::collections::HashMap;

use parking_lot::RwLock;
use pax_domain::stream::WorkflowEvent;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

pub struct StreamDispatcher {
    channels: RwLock<HashMap<String, broadcast::Sender<WorkflowEvent>>>,
}

impl Default for StreamDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamDispatcher {
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
        }
    }

    pub fn subscribe(&self, conversation_id: &str) -> broadcast::Receiver<WorkflowEvent> {
        if let Some(sender) = self.channels.read().get(conversation_id) {
            return sender.subscribe();
        }
        let mut channels = self.channels.write();
        let sender = channels
            .entry(conversation_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        sender.subscribe()
    }

    /// Delivers to every current subscriber of `conversation_id`. A missing
    /// channel (nobody has ever subscribed) or a send with zero receivers is
    /// a silent no-op.
    pub fn emit(&self, conversation_id: &str, event: WorkflowEvent) {
        if let Some(sender) = self.channels.read().get(conversation_id) {
            let _ = sender.send(event);
        }
    }

    /// Drops the channel once nobody is subscribed, so a long-lived
    /// dispatcher doesn't accumulate an entry per conversation forever.
    pub fn cleanup(&self, conversation_id: &str) {
        let mut channels = self.channels.write();
        if channels
            .get(conversation_id)
            .map(|s| s.receiver_count() == 0)
            .unwrap_or(false)
        {
            channels.remove(conversation_id);
        }
    }
}
