//! The line-oriented prompt convention [`crate::local::LocalChatGenerator`]
//! recognizes. A real vendor-backed `ChatGenerator` is free to ignore this
//! shape entirely — it exists only so a network-free default can drive the
//! full workflow end-to-end. Consumers in `pax-engine` render prompts using
//! these markers so the local default can route each call.

pub const PLANNER_MARKER: &str = "[ROLE:PLANNER]";
pub const EXECUTOR_PARAMS_MARKER: &str = "[ROLE:EXECUTOR_PARAMS]";
pub const VALIDATOR_MARKER: &str = "[ROLE:VALIDATOR]";

/// Pulls the value after `"{key}: "` on its own line, trimmed.
pub fn field(prompt: &str, key: &str) -> Option<String> {
    let prefix = format!("{key}: ");
    prompt
        .lines()
        .find_map(|line| line.strip_prefix(&prefix))
        .map(|s| s.trim().to_string())
}
