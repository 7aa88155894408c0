//! Process-wide catalog of callable tools: schema + invoker pairs.
//!
//! Concurrent-read, infrequent-write, guarded by a single `RwLock`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use pax_domain::tool::ToolSchema;
use pax_domain::{Error, Result};
use serde_json::Value;
use std::collections::BTreeMap;

/// The callable side of a registered tool.
///
/// Accepts a single argument mapping and returns either a value or an error
/// message; the schema, not the invoker's signature, is authoritative for
/// the argument shape.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    async fn invoke(&self, args: BTreeMap<String, Value>) -> std::result::Result<Value, String>;
}

struct ToolEntry {
    schema: ToolSchema,
    invoker: Arc<dyn ToolInvoker>,
}

pub struct ToolRegistry {
    entries: RwLock<HashMap<String, ToolEntry>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Adds the pair; fails with `DuplicateTool` when the name is already present.
    pub fn register(&self, schema: ToolSchema, invoker: Arc<dyn ToolInvoker>) -> Result<()> {
        let mut entries = self.entries.write();
        if entries.contains_key(&schema.name) {
            return Err(Error::DuplicateTool(schema.name));
        }
        tracing::info!(tool = %schema.name, "tool registered");
        entries.insert(schema.name.clone(), ToolEntry { schema, invoker });
        Ok(())
    }

    /// Removes a tool; no-op (returns `false`) if absent.
    pub fn unregister(&self, name: &str) -> bool {
        let removed = self.entries.write().remove(name).is_some();
        if removed {
            tracing::info!(tool = %name, "tool unregistered");
        }
        removed
    }

    pub fn get(&self, name: &str) -> Option<(ToolSchema, Arc<dyn ToolInvoker>)> {
        self.entries
            .read()
            .get(name)
            .map(|e| (e.schema.clone(), e.invoker.clone()))
    }

    pub fn list_names(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    pub fn list_schemas(&self) -> Vec<ToolSchema> {
        self.entries.read().values().map(|e| e.schema.clone()).collect()
    }

    pub fn search_by_tag(&self, tag: &str) -> Vec<String> {
        self.entries
            .read()
            .values()
            .filter(|e| e.schema.tags.contains(tag))
            .map(|e| e.schema.name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::EchoTool;

    fn echo_schema() -> ToolSchema {
        ToolSchema::new("echo", "echoes input", serde_json::json!({}))
    }

    #[test]
    fn register_then_get_round_trips() {
        let registry = ToolRegistry::new();
        registry.register(echo_schema(), Arc::new(EchoTool)).unwrap();
        let (schema, _invoker) = registry.get("echo").expect("tool present");
        assert_eq!(schema.name, "echo");
    }

    #[test]
    fn duplicate_register_fails() {
        let registry = ToolRegistry::new();
        registry.register(echo_schema(), Arc::new(EchoTool)).unwrap();
        let err = registry.register(echo_schema(), Arc::new(EchoTool)).unwrap_err();
        assert!(matches!(err, Error::DuplicateTool(name) if name == "echo"));
    }

    #[test]
    fn unregister_missing_is_noop() {
        let registry = ToolRegistry::new();
        assert!(!registry.unregister("nonexistent"));
    }

    #[test]
    fn search_by_tag_filters() {
        let registry = ToolRegistry::new();
        registry
            .register(echo_schema().with_tags(["debug"]), Arc::new(EchoTool))
            .unwrap();
        assert_eq!(registry.search_by_tag("debug"), vec!["echo".to_string()]);
        assert!(registry.search_by_tag("nonexistent-tag").is_empty());
    }
}
