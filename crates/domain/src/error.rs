/// Shared error type used across all workflow-engine crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("config: {0}")]
    Config(String),

    #[error("duplicate tool: {0}")]
    DuplicateTool(String),

    #[error("tool not found: {0}")]
    ToolNotFound(String),

    #[error("tool timed out after {timeout_seconds}s: {tool_name}")]
    ToolTimeout {
        tool_name: String,
        timeout_seconds: u64,
    },

    #[error("tool {tool_name} failed: {message}")]
    ToolFailed { tool_name: String, message: String },

    #[error("planning error: {0}")]
    PlanningError(String),

    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("thread not found: {0}")]
    ThreadNotFound(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
