pub mod builtin;
pub mod registry;

pub use builtin::register_builtin_tools;
pub use registry::{ToolInvoker, ToolRegistry};

/// A registry pre-populated with the built-in tools.
pub fn seeded_registry() -> ToolRegistry {
    let registry = ToolRegistry::new();
    register_builtin_tools(&registry);
    registry
}
