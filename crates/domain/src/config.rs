//! Process configuration: compiled-in defaults, optionally overridden by a
//! TOML file, with a `validate()` pass that a process refuses to start past
//! if it returns any `Error`-severity issue.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::state::{MAX_RETRY_COUNT, MAX_TASK_STEPS};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "d_host")]
    pub host: String,
    #[serde(default = "d_port")]
    pub port: u16,
    #[serde(default = "d_cors")]
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: d_host(),
            port: d_port(),
            cors_allowed_origins: d_cors(),
        }
    }
}

fn d_host() -> String {
    "127.0.0.1".into()
}
fn d_port() -> u16 {
    8080
}
fn d_cors() -> Vec<String> {
    vec!["http://localhost:*".into()]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    #[serde(default = "d_max_task_steps")]
    pub max_task_steps: usize,
    #[serde(default = "d_max_retry_count")]
    pub max_retry_count: u32,
    #[serde(default = "d_tool_timeout_seconds")]
    pub tool_timeout_seconds: u64,
    #[serde(default = "d_max_context_tokens")]
    pub max_context_tokens: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_task_steps: d_max_task_steps(),
            max_retry_count: d_max_retry_count(),
            tool_timeout_seconds: d_tool_timeout_seconds(),
            max_context_tokens: d_max_context_tokens(),
        }
    }
}

fn d_max_task_steps() -> usize {
    MAX_TASK_STEPS
}
fn d_max_retry_count() -> u32 {
    MAX_RETRY_COUNT
}
fn d_tool_timeout_seconds() -> u64 {
    60
}
fn d_max_context_tokens() -> u64 {
    8000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "d_state_path")]
    pub state_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_path: d_state_path(),
        }
    }
}

fn d_state_path() -> String {
    "./data/state".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Environment variable holding the API bearer token. If unset, bearer
    /// auth is disabled and the gateway serves unauthenticated.
    #[serde(default = "d_api_token_env")]
    pub api_token_env: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_token_env: d_api_token_env(),
        }
    }
}

fn d_api_token_env() -> String {
    "PAX_API_TOKEN".into()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    pub fn load(path: Option<&std::path::Path>) -> crate::Result<Self> {
        let mut config = Config::default();
        if let Some(path) = path {
            if path.exists() {
                let raw = std::fs::read_to_string(path)?;
                config = toml::from_str(&raw)
                    .map_err(|e| crate::Error::Config(format!("parsing {}: {e}", path.display())))?;
            }
        }
        Ok(config)
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.server.port == 0 {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "server.port".into(),
                message: "port must be greater than 0".into(),
            });
        }
        if self.server.host.is_empty() {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "server.host".into(),
                message: "host must not be empty".into(),
            });
        }
        if self.server.cors_allowed_origins.len() == 1 && self.server.cors_allowed_origins[0] == "*" {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Warning,
                field: "server.cors_allowed_origins".into(),
                message: "wildcard \"*\" allows all origins (not recommended for production)".into(),
            });
        }
        if self.workflow.max_task_steps == 0 {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "workflow.max_task_steps".into(),
                message: "max_task_steps must be greater than 0".into(),
            });
        }
        if self.workflow.tool_timeout_seconds == 0 {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "workflow.tool_timeout_seconds".into(),
                message: "tool_timeout_seconds must be greater than 0".into(),
            });
        }
        if self.storage.state_path.is_empty() {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "storage.state_path".into(),
                message: "state_path must not be empty".into(),
            });
        }

        issues
    }
}
