use std::sync::Arc;

use pax_chatgen::{ChatGenerator, InMemoryKnowledgeSearch, KnowledgeSearch, LocalChatGenerator};
use pax_domain::config::Config;
use pax_engine::{ExecutorDeps, PlannerDeps, StreamDispatcher, ValidatorDeps, Workflow};
use pax_store::{CheckpointStore, Repositories};
use pax_tools::ToolRegistry;

/// Shared application state passed to every API handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub tool_registry: Arc<ToolRegistry>,
    pub checkpoint_store: Arc<CheckpointStore>,
    pub repositories: Arc<Repositories>,
    pub dispatcher: Arc<StreamDispatcher>,
    pub workflow: Arc<Workflow>,
    /// SHA-256 hash of the API bearer token, read once at startup.
    /// `None` = dev mode (no auth enforced).
    pub api_token_hash: Option<Vec<u8>>,
}

impl AppState {
    pub fn new(config: Arc<Config>) -> anyhow::Result<Self> {
        let state_path = std::path::Path::new(&config.storage.state_path);
        std::fs::create_dir_all(state_path)?;

        let tool_registry = Arc::new(pax_tools::seeded_registry());
        let checkpoint_store = Arc::new(CheckpointStore::new(state_path)?);
        let repositories = Arc::new(Repositories::new(state_path));
        let dispatcher = Arc::new(StreamDispatcher::new());

        let chat_generator: Arc<dyn ChatGenerator> = Arc::new(LocalChatGenerator);
        let knowledge_search: Arc<dyn KnowledgeSearch> = Arc::new(InMemoryKnowledgeSearch::default());

        let workflow = Arc::new(Workflow::new(
            checkpoint_store.clone(),
            repositories.clone(),
            dispatcher.clone(),
            PlannerDeps {
                chat_generator: chat_generator.clone(),
                knowledge_search,
                tool_registry: tool_registry.clone(),
            },
            ExecutorDeps {
                chat_generator: chat_generator.clone(),
                tool_registry: tool_registry.clone(),
            },
            ValidatorDeps { chat_generator },
        ));

        let api_token_hash = {
            use sha2::{Digest, Sha256};
            match std::env::var(&config.auth.api_token_env) {
                Ok(token) if !token.is_empty() => {
                    tracing::info!(env_var = %config.auth.api_token_env, "API bearer-token auth enabled");
                    Some(Sha256::digest(token.as_bytes()).to_vec())
                }
                _ => {
                    tracing::warn!(
                        env_var = %config.auth.api_token_env,
                        "API bearer-token auth DISABLED — set {} to enable",
                        config.auth.api_token_env,
                    );
                    None
                }
            }
        };

        Ok(Self {
            config,
            tool_registry,
            checkpoint_store,
            repositories,
            dispatcher,
            workflow,
            api_token_hash,
        })
    }
}
