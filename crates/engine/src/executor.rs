//! The Executor node: advances exactly one step of `todo_list`.
//!
//! A step with no `tool_name` completes immediately. A step with a
//! `tool_name` looks the tool up in the registry (missing → `ToolNotFound`),
//! synthesizes arguments via the Chat Generator when `tool_input` is absent
//! (a synthesis parse failure yields empty args, not a hard failure; a
//! sentinel response suspends the loop for user input), then invokes the
//! tool under its schema's timeout. Failure increments `retry_count`; below
//! `MAX_RETRY_COUNT` the step resets to `pending` for another pass, at the
//! bound the whole task terminates `failed`.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use pax_chatgen::ChatGenerator;
use pax_domain::state::{
    AgentRole, AgentState, FinalStatus, PendingUserInput, StepResult, StepStatus, MAX_RETRY_COUNT,
};
use pax_tools::ToolRegistry;
use serde_json::{json, Value};

pub struct ExecutorDeps {
    pub chat_generator: Arc<dyn ChatGenerator>,
    pub tool_registry: Arc<ToolRegistry>,
}

enum StepOutcome {
    Completed(Option<Value>),
    PendingUserInput(PendingUserInput),
    Failed(String),
}

pub async fn execute(mut state: AgentState, deps: &ExecutorDeps) -> AgentState {
    let idx = state.current_step_index;
    if idx >= state.todo_list.len() {
        return state;
    }

    state.todo_list[idx].status = StepStatus::Running;
    state.todo_list[idx].started_at = Some(Utc::now());

    let tool_name = state.todo_list[idx].tool_name.clone();
    let outcome = match tool_name {
        Some(tool_name) => run_tool_step(&mut state, idx, &tool_name, deps).await,
        None => StepOutcome::Completed(None),
    };

    apply_outcome(&mut state, idx, outcome);
    state.current_agent = AgentRole::Executor;
    state.updated_at = Utc::now();
    state
}

fn apply_outcome(state: &mut AgentState, idx: usize, outcome: StepOutcome) {
    match outcome {
        StepOutcome::Completed(result) => {
            let step = &mut state.todo_list[idx];
            step.status = StepStatus::Completed;
            step.completed_at = Some(Utc::now());
            let step_id = step.id.clone();
            let step_title = step.title.clone();
            state.step_results.push(StepResult {
                step_id,
                step_title,
                result,
            });
            state.current_step_index += 1;
        }
        StepOutcome::PendingUserInput(pending) => {
            state.todo_list[idx].status = StepStatus::Pending;
            state.pending_user_input = Some(pending);
            state.final_status = FinalStatus::Pending;
        }
        StepOutcome::Failed(message) => {
            let step = &mut state.todo_list[idx];
            step.retry_count += 1;
            step.error = Some(message.clone());
            if step.retry_count < MAX_RETRY_COUNT {
                step.status = StepStatus::Pending;
                step.started_at = None;
            } else {
                step.status = StepStatus::Failed;
                state.final_status = FinalStatus::Failed;
                state.error_info = Some(format!(
                    "Step failed after {} retries: {message}",
                    step.retry_count
                ));
            }
        }
    }
}

async fn run_tool_step(
    state: &mut AgentState,
    idx: usize,
    tool_name: &str,
    deps: &ExecutorDeps,
) -> StepOutcome {
    let Some((schema, invoker)) = deps.tool_registry.get(tool_name) else {
        return StepOutcome::Failed(format!("Tool not found: {tool_name}"));
    };

    let args = match state.todo_list[idx].tool_input.clone() {
        Some(args) => args,
        None => match synthesize_args(state, idx, &schema, deps).await {
            Ok(args) => {
                state.todo_list[idx].tool_input = Some(args.clone());
                args
            }
            Err((partial_args, pending)) => {
                // Persist whatever the Chat Generator could already work out
                // (e.g. parameters unrelated to the missing config) so that
                // `resume` only has to layer the user-supplied config on top
                // instead of re-running synthesis from scratch.
                if !partial_args.is_empty() {
                    state.todo_list[idx].tool_input = Some(partial_args);
                }
                return StepOutcome::PendingUserInput(pending);
            }
        },
    };

    let timeout = Duration::from_secs(schema.timeout_seconds);
    match tokio::time::timeout(timeout, invoker.invoke(args)).await {
        Err(_elapsed) => StepOutcome::Failed(format!(
            "tool timed out after {}s: {tool_name}",
            schema.timeout_seconds
        )),
        Ok(Err(message)) => StepOutcome::Failed(format!("tool {tool_name} failed: {message}")),
        Ok(Ok(result)) => {
            let wrapped = json!({ "success": true, "data": result });
            state.todo_list[idx].tool_output = Some(wrapped.clone());
            StepOutcome::Completed(Some(wrapped))
        }
    }
}

/// Asks the Chat Generator to synthesize arguments for a step's tool call.
/// `Err` carries the best-effort argument mapping alongside the suspension
/// sentinel (the mapping may be incomplete — only the fields unrelated to
/// the missing config, if any); any other parse problem (including a Chat
/// Generator error) degrades to empty args rather than failing the step
/// outright.
async fn synthesize_args(
    state: &AgentState,
    idx: usize,
    schema: &pax_domain::tool::ToolSchema,
    deps: &ExecutorDeps,
) -> Result<BTreeMap<String, Value>, (BTreeMap<String, Value>, PendingUserInput)> {
    let prompt = render_prompt(state, idx, schema);
    let raw = match deps.chat_generator.complete(&prompt).await {
        Ok(raw) => raw,
        Err(_) => return Ok(BTreeMap::new()),
    };
    let Ok(value) = serde_json::from_str::<Value>(&raw) else {
        return Ok(BTreeMap::new());
    };

    if value.get("requires_user_input").and_then(Value::as_bool) == Some(true) {
        let missing_params = value
            .get("missing_params")
            .and_then(Value::as_array)
            .map(|v| v.iter().filter_map(|p| p.as_str().map(String::from)).collect())
            .unwrap_or_default();
        let reason = value
            .get("reason")
            .and_then(Value::as_str)
            .unwrap_or("missing required configuration")
            .to_string();
        let partial_args = value
            .get("args")
            .and_then(Value::as_object)
            .map(|obj| obj.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();
        return Err((
            partial_args,
            PendingUserInput {
                step_id: state.todo_list[idx].id.clone(),
                tool_name: schema.name.clone(),
                missing_params,
                reason,
            },
        ));
    }

    let args = value
        .as_object()
        .map(|obj| obj.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default();
    Ok(args)
}

fn render_prompt(state: &AgentState, idx: usize, schema: &pax_domain::tool::ToolSchema) -> String {
    let step_title = &state.todo_list[idx].title;
    let user_provided_config = state
        .user_provided_config
        .as_ref()
        .map(|m| Value::Object(m.iter().map(|(k, v)| (k.clone(), v.clone())).collect()))
        .unwrap_or_else(|| json!({}));
    format!(
        "{}\nTOOL_NAME: {}\nSTEP_TITLE: {}\nTOOL_PARAMETERS_SCHEMA: {}\nTOOL_REQUIRES_USER_CONFIG: {}\nTOOL_CONFIG_SCHEMA: {}\nUSER_PROVIDED_CONFIG: {}\nUSER_INPUT: {}\n",
        pax_chatgen::prompts::EXECUTOR_PARAMS_MARKER,
        schema.name,
        step_title,
        schema.parameters,
        schema.requires_user_config,
        schema.config_schema.clone().unwrap_or(Value::Null),
        user_provided_config,
        state.user_input,
    )
}
