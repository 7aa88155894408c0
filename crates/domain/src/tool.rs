//! Tool schema types shared between the registry, the executor node, and the
//! HTTP surface. The invoker itself (the callable side of a registered tool)
//! lives in `pax-tools`, which depends on this crate for the schema shape.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

fn default_timeout_seconds() -> u64 {
    60
}

/// Registry record describing one callable tool.
///
/// The schema is authoritative for the argument shape; an invoker accepts
/// whatever argument mapping the Executor synthesises against it rather than
/// deriving its shape from a function signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    /// JSON-Schema-shaped description of the argument mapping.
    pub parameters: Value,
    /// JSON-Schema-shaped description of the return value.
    #[serde(default)]
    pub returns: Value,
    #[serde(default)]
    pub requires_auth: bool,
    #[serde(default)]
    pub requires_user_config: bool,
    #[serde(default)]
    pub config_schema: Option<Value>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl ToolSchema {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            returns: Value::Null,
            requires_auth: false,
            requires_user_config: false,
            config_schema: None,
            timeout_seconds: default_timeout_seconds(),
            tags: BTreeSet::new(),
        }
    }

    pub fn with_timeout_seconds(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    pub fn with_requires_user_config(mut self, requires: bool) -> Self {
        self.requires_user_config = requires;
        self
    }

    pub fn with_config_schema(mut self, config_schema: Value) -> Self {
        self.config_schema = Some(config_schema);
        self
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeout_is_sixty_seconds() {
        let schema = ToolSchema::new("echo", "echoes input", serde_json::json!({}));
        assert_eq!(schema.timeout_seconds, 60);
        assert!(!schema.requires_user_config);
    }

    #[test]
    fn builder_methods_compose() {
        let schema = ToolSchema::new("slow", "sleeps", serde_json::json!({}))
            .with_timeout_seconds(1)
            .with_requires_user_config(true)
            .with_tags(["debug", "test"]);
        assert_eq!(schema.timeout_seconds, 1);
        assert!(schema.requires_user_config);
        assert!(schema.tags.contains("debug"));
    }
}
