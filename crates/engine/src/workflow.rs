//! The Workflow Engine: the loop that drives a thread through
//! Supervisor → {Planner, Executor, Validator} → Supervisor until the
//! Supervisor routes to `End`.
//!
//! At most one loop runs per `thread_id` at a time — `run` and `resume`
//! both acquire a per-thread `tokio::sync::Mutex` before touching state, so
//! concurrent calls for the same conversation serialize instead of racing
//! on the checkpoint file.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::Mutex as SyncMutex;
use pax_domain::state::{AgentState, FinalStatus};
use pax_domain::stream::WorkflowEvent;
use pax_domain::Result;
use pax_store::{CheckpointStore, Repositories, TaskStatus};
use serde_json::Value;
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

use crate::dispatcher::StreamDispatcher;
use crate::executor::{self, ExecutorDeps};
use crate::planner::{self, PlannerDeps};
use crate::supervisor::{self, Node};
use crate::validator::{self, ValidatorDeps};

pub struct Workflow {
    pub checkpoint_store: Arc<CheckpointStore>,
    pub repositories: Arc<Repositories>,
    pub dispatcher: Arc<StreamDispatcher>,
    pub planner_deps: PlannerDeps,
    pub executor_deps: ExecutorDeps,
    pub validator_deps: ValidatorDeps,
    thread_locks: SyncMutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl Workflow {
    pub fn new(
        checkpoint_store: Arc<CheckpointStore>,
        repositories: Arc<Repositories>,
        dispatcher: Arc<StreamDispatcher>,
        planner_deps: PlannerDeps,
        executor_deps: ExecutorDeps,
        validator_deps: ValidatorDeps,
    ) -> Self {
        Self {
            checkpoint_store,
            repositories,
            dispatcher,
            planner_deps,
            executor_deps,
            validator_deps,
            thread_locks: SyncMutex::new(HashMap::new()),
        }
    }

    fn thread_lock(&self, thread_id: &str) -> Arc<AsyncMutex<()>> {
        self.thread_locks
            .lock()
            .entry(thread_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Runs a brand-new thread to completion or suspension.
    pub async fn start(&self, task_id: Uuid, user_input: &str, conversation_id: &str, user_id: &str) -> AgentState {
        let state = AgentState::new(user_input, conversation_id, user_id);
        self.run(state, task_id).await
    }

    /// Loads the checkpointed state, clears any suspension, merges newly
    /// supplied configuration, and re-enters the loop. Errors with
    /// `ThreadNotFound` if the thread has no checkpoint.
    pub async fn resume(
        &self,
        thread_id: &str,
        task_id: Uuid,
        user_provided_config: BTreeMap<String, Value>,
    ) -> Result<AgentState> {
        let mut state = self.checkpoint_store.load_required(thread_id)?;
        state.pending_user_input = None;
        if !user_provided_config.is_empty() {
            let merged = state.user_provided_config.get_or_insert_with(BTreeMap::new);
            merged.extend(user_provided_config.clone());

            // Merge into the suspended step's `tool_input` too (user fields
            // override any already-synthesised ones) so the Executor finds
            // `tool_input` populated and skips re-running parameter synthesis.
            if let Some(step) = state.todo_list.get_mut(state.current_step_index) {
                let tool_input = step.tool_input.get_or_insert_with(BTreeMap::new);
                tool_input.extend(user_provided_config);
            }
        }
        if !matches!(state.final_status, FinalStatus::Success | FinalStatus::Failed) {
            state.final_status = FinalStatus::Pending;
        }

        self.dispatcher.emit(
            thread_id,
            WorkflowEvent::TaskResumed {
                state: Box::new(state.clone()),
            },
        );

        Ok(self.run(state, task_id).await)
    }

    pub fn get_state(&self, thread_id: &str) -> Result<Option<AgentState>> {
        self.checkpoint_store.load(thread_id)
    }

    async fn run(&self, mut state: AgentState, task_id: Uuid) -> AgentState {
        let lock = self.thread_lock(state.thread_id());
        let _guard = lock.lock().await;

        loop {
            let node = supervisor::route(&state);
            let label = match node {
                Node::Planner => {
                    state = planner::plan(state, &self.planner_deps).await;
                    "planner"
                }
                Node::Executor => {
                    state = executor::execute(state, &self.executor_deps).await;
                    "executor"
                }
                Node::Validator => {
                    state = validator::validate(state, &self.validator_deps).await;
                    "validator"
                }
                Node::End => break,
            };

            if let Err(e) = self.checkpoint_store.save(&state) {
                tracing::warn!(thread_id = %state.thread_id(), error = %e, "checkpoint write failed");
            }
            self.checkpoint_store.cache_task_state(&task_id.to_string(), state.clone());
            self.sync_task_record(task_id, &state);
            self.dispatcher.emit(
                state.thread_id(),
                WorkflowEvent::StateUpdate {
                    node: label.to_string(),
                    state: Box::new(state.clone()),
                },
            );
        }

        self.sync_task_record(task_id, &state);
        self.dispatcher.cleanup(state.thread_id());
        state
    }

    fn sync_task_record(&self, task_id: Uuid, state: &AgentState) {
        let status = match state.final_status {
            FinalStatus::Pending if state.pending_user_input.is_some() => TaskStatus::Pending,
            FinalStatus::Pending => TaskStatus::Running,
            FinalStatus::Success => TaskStatus::Succeeded,
            FinalStatus::Failed => TaskStatus::Failed,
        };
        self.repositories.tasks.update(&task_id, |task| {
            task.parsed_intent = state.parsed_intent.as_ref().and_then(|i| serde_json::to_value(i).ok());
            task.todo_list = serde_json::to_value(&state.todo_list).unwrap_or(Value::Array(Vec::new()));
            task.current_step_index = state.current_step_index;
            task.context = serde_json::to_value(&state.context).unwrap_or(Value::Object(Default::default()));
            task.step_results = serde_json::to_value(&state.step_results).unwrap_or(Value::Array(Vec::new()));
            task.status = status;
            task.error_info = state.error_info.clone();
            task.updated_at = chrono::Utc::now();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pax_chatgen::{InMemoryKnowledgeSearch, LocalChatGenerator};
    use pax_store::Task;
    use pax_tools::seeded_registry;

    fn workflow(dir: &std::path::Path) -> Workflow {
        let checkpoint_store = Arc::new(CheckpointStore::new(dir).unwrap());
        let repositories = Arc::new(Repositories::new(dir));
        let dispatcher = Arc::new(StreamDispatcher::new());
        let tool_registry = Arc::new(seeded_registry());
        let chat_generator = Arc::new(LocalChatGenerator);
        Workflow::new(
            checkpoint_store,
            repositories,
            dispatcher,
            PlannerDeps {
                chat_generator: chat_generator.clone(),
                knowledge_search: Arc::new(InMemoryKnowledgeSearch::default()),
                tool_registry: tool_registry.clone(),
            },
            ExecutorDeps {
                chat_generator: chat_generator.clone(),
                tool_registry,
            },
            ValidatorDeps { chat_generator },
        )
    }

    #[tokio::test]
    async fn happy_path_runs_to_success() {
        let dir = tempfile::tempdir().unwrap();
        let workflow = workflow(dir.path());
        let task_id = Uuid::new_v4();
        workflow.repositories.tasks.insert(Task::new(Uuid::new_v4(), "user-1", "greet"));

        let state = workflow.start(task_id, "greet", "conv-1", "user-1").await;
        assert_eq!(state.final_status, FinalStatus::Success);
        assert_eq!(state.current_step_index, 1);

        let checkpointed = workflow.get_state("conv-1").unwrap().expect("checkpoint present");
        assert_eq!(checkpointed.final_status, FinalStatus::Success);
    }

    #[tokio::test]
    async fn suspends_then_resumes_to_success() {
        let dir = tempfile::tempdir().unwrap();
        let workflow = workflow(dir.path());
        let task_id = Uuid::new_v4();
        workflow
            .repositories
            .tasks
            .insert(Task::new(Uuid::new_v4(), "user-1", "please email the report"));

        let state = workflow.start(task_id, "please email the report", "conv-2", "user-1").await;
        assert_eq!(state.final_status, FinalStatus::Pending);
        assert!(state.pending_user_input.is_some());

        let mut config = BTreeMap::new();
        config.insert("smtp_server".to_string(), Value::String("smtp.example.com".into()));
        let resumed = workflow.resume("conv-2", task_id, config).await.unwrap();
        assert_eq!(resumed.final_status, FinalStatus::Success);
        assert!(resumed.pending_user_input.is_none());

        // The resumed step's tool_input carries both the parameters
        // synthesized before suspension ("to") and the user-supplied config
        // merged on top ("smtp_server") — synthesis was not re-run.
        let tool_input = resumed.todo_list[0].tool_input.as_ref().expect("tool_input populated");
        assert!(tool_input.contains_key("to"));
        assert_eq!(tool_input.get("smtp_server"), Some(&Value::String("smtp.example.com".into())));
    }

    #[tokio::test]
    async fn resume_on_unknown_thread_errors() {
        let dir = tempfile::tempdir().unwrap();
        let workflow = workflow(dir.path());
        let err = workflow.resume("nonexistent", Uuid::new_v4(), BTreeMap::new()).await.unwrap_err();
        assert!(matches!(err, pax_domain::Error::ThreadNotFound(_)));
    }

    #[tokio::test]
    async fn resume_with_empty_config_after_already_resolved_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let workflow = workflow(dir.path());
        let task_id = Uuid::new_v4();
        workflow.repositories.tasks.insert(Task::new(Uuid::new_v4(), "user-1", "greet"));
        let state = workflow.start(task_id, "greet", "conv-3", "user-1").await;
        assert_eq!(state.final_status, FinalStatus::Success);

        let resumed = workflow.resume("conv-3", task_id, BTreeMap::new()).await.unwrap();
        assert_eq!(resumed.final_status, FinalStatus::Success);
        assert_eq!(resumed.current_step_index, state.current_step_index);
    }
}
