//! The two trait seams through which the engine talks to the outside world.
//!
//! Both are intentionally narrow — one method each — so a real vendor
//! integration (an LLM API client, a vector database) can be dropped in
//! without touching the Planner/Executor/Validator nodes that call them.

use async_trait::async_trait;
use pax_domain::Result;

/// Generates text completions from a fully-rendered prompt.
///
/// The prompt already contains any system instructions, few-shot examples,
/// and JSON-envelope formatting directions the caller needs; the generator
/// is not expected to know about Planner/Executor/Validator semantics beyond
/// whatever shared convention its implementation chooses to recognize.
#[async_trait]
pub trait ChatGenerator: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Retrieves the `k` most relevant documents for a query.
#[async_trait]
pub trait KnowledgeSearch: Send + Sync {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<String>>;
}
