//! The Validator node: judges the run's outcome once every step has
//! completed (or a step is already marked failed).
//!
//! If any step is `Failed`, the task terminates `failed` without asking the
//! Chat Generator anything. Otherwise the Chat Generator is asked to judge
//! the overall result; a parse failure defaults to success, so a network
//! hiccup in an optional quality gate never blocks an otherwise-successful
//! task.

use std::sync::Arc;

use chrono::Utc;
use pax_chatgen::ChatGenerator;
use pax_domain::state::{AgentRole, AgentState, FinalStatus, StepStatus};
use serde_json::Value;

pub struct ValidatorDeps {
    pub chat_generator: Arc<dyn ChatGenerator>,
}

pub async fn validate(mut state: AgentState, deps: &ValidatorDeps) -> AgentState {
    if let Some(failed_step) = state.todo_list.iter().find(|s| s.status == StepStatus::Failed) {
        state.final_status = FinalStatus::Failed;
        state.error_info = Some(format!(
            "step failed: {} — {}",
            failed_step.title,
            failed_step.error.as_deref().unwrap_or("unknown error")
        ));
        state.current_agent = AgentRole::Validator;
        state.updated_at = Utc::now();
        return state;
    }

    let prompt = render_prompt(&state);
    let judgment = match deps.chat_generator.complete(&prompt).await {
        Ok(raw) => serde_json::from_str::<Value>(&raw).ok(),
        Err(_) => None,
    };

    match judgment {
        Some(value) if value.get("is_successful").and_then(Value::as_bool) == Some(false) => {
            state.final_status = FinalStatus::Failed;
            state.error_info = value
                .get("failure_reason")
                .and_then(Value::as_str)
                .map(String::from)
                .or_else(|| Some("validation failed".to_string()));
        }
        _ => {
            state.final_status = FinalStatus::Success;
        }
    }

    state.current_agent = AgentRole::Validator;
    state.updated_at = Utc::now();
    state
}

fn render_prompt(state: &AgentState) -> String {
    let step_results = serde_json::to_string(&state.step_results).unwrap_or_else(|_| "[]".to_string());
    format!(
        "{}\nSTEP_RESULTS: {}\nUSER_INPUT: {}\nJudge whether the task succeeded. Respond with {{\"is_successful\", \"failed_step_id\", \"failure_reason\", \"status_message\", \"suggestions\"}}.\n",
        pax_chatgen::prompts::VALIDATOR_MARKER,
        step_results,
        state.user_input,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pax_chatgen::LocalChatGenerator;
    use pax_domain::state::TaskStep;

    fn deps() -> ValidatorDeps {
        ValidatorDeps {
            chat_generator: Arc::new(LocalChatGenerator),
        }
    }

    #[tokio::test]
    async fn all_steps_completed_defaults_to_success() {
        let mut state = AgentState::new("greet", "conv-1", "user-1");
        let mut step = TaskStep::new("say hi");
        step.status = StepStatus::Completed;
        state.todo_list = vec![step];
        state.current_step_index = 1;
        let state = validate(state, &deps()).await;
        assert_eq!(state.final_status, FinalStatus::Success);
    }

    #[tokio::test]
    async fn any_failed_step_terminates_failed_without_asking_generator() {
        let mut state = AgentState::new("greet", "conv-1", "user-1");
        let mut step = TaskStep::new("say hi");
        step.status = StepStatus::Failed;
        step.error = Some("boom".to_string());
        state.todo_list = vec![step];
        let state = validate(state, &deps()).await;
        assert_eq!(state.final_status, FinalStatus::Failed);
        assert_eq!(state.error_info.unwrap(), "step failed: say hi — boom");
    }

    #[tokio::test]
    async fn downgrade_via_custom_generator() {
        struct Downgrading;
        #[async_trait::async_trait]
        impl ChatGenerator for Downgrading {
            async fn complete(&self, _prompt: &str) -> pax_domain::Result<String> {
                Ok(serde_json::json!({
                    "is_successful": false,
                    "failure_reason": "output mismatch",
                })
                .to_string())
            }
        }
        let mut state = AgentState::new("greet", "conv-1", "user-1");
        let mut step = TaskStep::new("say hi");
        step.status = StepStatus::Completed;
        state.todo_list = vec![step];
        state.current_step_index = 1;
        let deps = ValidatorDeps {
            chat_generator: Arc::new(Downgrading),
        };
        let state = validate(state, &deps).await;
        assert_eq!(state.final_status, FinalStatus::Failed);
        assert_eq!(state.error_info.unwrap(), "output mismatch");
    }
}
