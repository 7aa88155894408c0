//! The checkpointed workflow state and its constituent types.
//!
//! `AgentState` is the single value threaded through the Supervisor/Planner/
//! Executor/Validator loop. It is cheap to clone and fully `Serialize` so the
//! State Store can write it as an opaque JSON blob per thread.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub const MAX_TASK_STEPS: usize = 20;
pub const MAX_RETRY_COUNT: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// One atomic unit of planned work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStep {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_pending")]
    pub status: StepStatus,
    #[serde(default)]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub tool_input: Option<BTreeMap<String, Value>>,
    #[serde(default)]
    pub tool_output: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

fn default_pending() -> StepStatus {
    StepStatus::Pending
}

impl TaskStep {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: format!("step_{}", &Uuid::new_v4().simple().to_string()[..8]),
            title: title.into(),
            description: None,
            status: StepStatus::Pending,
            tool_name: None,
            tool_input: None,
            tool_output: None,
            error: None,
            retry_count: 0,
            started_at: None,
            completed_at: None,
        }
    }

    pub fn with_tool(mut self, tool_name: impl Into<String>) -> Self {
        self.tool_name = Some(tool_name.into());
        self
    }
}

/// Planner's understanding of what the user wants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedIntent {
    pub goal: String,
    #[serde(default)]
    pub required_tools: Vec<String>,
    #[serde(default)]
    pub required_info: BTreeMap<String, Value>,
    #[serde(default)]
    pub confidence: f64,
}

/// One entry in `AgentState::step_results`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step_id: String,
    pub step_title: String,
    pub result: Option<Value>,
}

/// Recorded when a step's parameter synthesis asked for information the
/// caller must supply before the workflow can continue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingUserInput {
    pub step_id: String,
    pub tool_name: String,
    pub missing_params: Vec<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Supervisor,
    Planner,
    Executor,
    Validator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalStatus {
    Pending,
    Success,
    Failed,
}

/// The single value threaded through the workflow; the checkpointed unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentState {
    // Inputs
    pub user_input: String,
    pub conversation_id: String,
    pub user_id: String,

    // Plan
    #[serde(default)]
    pub parsed_intent: Option<ParsedIntent>,
    #[serde(default)]
    pub todo_list: Vec<TaskStep>,
    #[serde(default)]
    pub current_step_index: usize,

    // Execution
    #[serde(default)]
    pub step_results: Vec<StepResult>,
    #[serde(default)]
    pub context: BTreeMap<String, Value>,
    #[serde(default)]
    pub retrieved_docs: Vec<String>,

    // HITL
    #[serde(default)]
    pub pending_user_input: Option<PendingUserInput>,
    #[serde(default)]
    pub user_provided_config: Option<BTreeMap<String, Value>>,

    // Status
    pub current_agent: AgentRole,
    pub final_status: FinalStatus,
    #[serde(default)]
    pub error_info: Option<String>,

    // Metadata
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub token_count: u64,
    /// Reserved for a future history-compaction pass; never populated.
    #[serde(default)]
    pub compressed_history: Vec<String>,
}

impl AgentState {
    pub fn new(user_input: impl Into<String>, conversation_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            user_input: user_input.into(),
            conversation_id: conversation_id.into(),
            user_id: user_id.into(),
            parsed_intent: None,
            todo_list: Vec::new(),
            current_step_index: 0,
            step_results: Vec::new(),
            context: BTreeMap::new(),
            retrieved_docs: Vec::new(),
            pending_user_input: None,
            user_provided_config: None,
            current_agent: AgentRole::Supervisor,
            final_status: FinalStatus::Pending,
            error_info: None,
            created_at: now,
            updated_at: now,
            token_count: 0,
            compressed_history: Vec::new(),
        }
    }

    pub fn thread_id(&self) -> &str {
        &self.conversation_id
    }

    /// Checks the invariants that are cheap to verify against a single
    /// state value (as opposed to ones spanning the whole run).
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.current_step_index > self.todo_list.len() {
            return Err(format!(
                "current_step_index {} exceeds todo_list length {}",
                self.current_step_index,
                self.todo_list.len()
            ));
        }
        if self.todo_list.len() > MAX_TASK_STEPS {
            return Err(format!(
                "todo_list length {} exceeds MAX_TASK_STEPS {}",
                self.todo_list.len(),
                MAX_TASK_STEPS
            ));
        }
        let running_count = self
            .todo_list
            .iter()
            .filter(|s| s.status == StepStatus::Running)
            .count();
        if running_count > 1 {
            return Err(format!("{running_count} steps are running at once"));
        }
        for step in &self.todo_list {
            if step.retry_count > MAX_RETRY_COUNT {
                return Err(format!(
                    "step {} retry_count {} exceeds MAX_RETRY_COUNT {}",
                    step.id, step.retry_count, MAX_RETRY_COUNT
                ));
            }
        }
        if self.final_status == FinalStatus::Success
            && !self.todo_list.iter().all(|s| s.status == StepStatus::Completed)
        {
            return Err("final_status success but not all steps completed".into());
        }
        Ok(())
    }
}
