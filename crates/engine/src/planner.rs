//! The Planner node: turns `user_input` into a `todo_list`.
//!
//! Retrieves up to 3 supporting documents, asks the Chat Generator for a
//! `{intent, steps[]}` envelope enumerating the available tools and a
//! `MAX_TASK_STEPS` cap, and assigns each returned step a fresh id and
//! `pending` status. A parse failure (or a Chat Generator error) is not
//! propagated as a `Result::Err` — it is folded into `final_status = failed`
//! so the loop terminates cleanly.

use std::sync::Arc;

use pax_chatgen::{ChatGenerator, KnowledgeSearch};
use pax_domain::state::{AgentRole, AgentState, FinalStatus, ParsedIntent, TaskStep, MAX_TASK_STEPS};
use pax_tools::ToolRegistry;
use serde_json::Value;

pub struct PlannerDeps {
    pub chat_generator: Arc<dyn ChatGenerator>,
    pub knowledge_search: Arc<dyn KnowledgeSearch>,
    pub tool_registry: Arc<ToolRegistry>,
}

pub async fn plan(mut state: AgentState, deps: &PlannerDeps) -> AgentState {
    let retrieved = deps
        .knowledge_search
        .search(&state.user_input, 3)
        .await
        .unwrap_or_default();
    state.retrieved_docs = retrieved.clone();

    let tool_names = deps.tool_registry.list_names();
    let prompt = render_prompt(&state.user_input, &tool_names, &retrieved);

    let raw = match deps.chat_generator.complete(&prompt).await {
        Ok(raw) => raw,
        Err(e) => return fail(state, format!("Planning error: {e}")),
    };

    let envelope: Value = match serde_json::from_str(&raw) {
        Ok(v) => v,
        Err(e) => return fail(state, format!("Planning error: {e}")),
    };

    let Some(intent) = parse_intent(&envelope) else {
        return fail(state, "Planning error: missing or malformed intent".to_string());
    };
    let Some(steps) = envelope.get("steps").and_then(Value::as_array) else {
        return fail(state, "Planning error: missing or malformed steps".to_string());
    };

    let todo_list: Vec<TaskStep> = steps
        .iter()
        .take(MAX_TASK_STEPS)
        .filter_map(|step| {
            let title = step.get("title")?.as_str()?.to_string();
            let mut task_step = TaskStep::new(title);
            if let Some(tool_name) = step.get("tool_name").and_then(Value::as_str) {
                task_step = task_step.with_tool(tool_name);
            }
            Some(task_step)
        })
        .collect();

    state.parsed_intent = Some(intent);
    state.todo_list = todo_list;
    state.current_agent = AgentRole::Planner;
    state.updated_at = chrono::Utc::now();
    state
}

fn fail(mut state: AgentState, message: String) -> AgentState {
    state.final_status = FinalStatus::Failed;
    state.error_info = Some(message);
    state.current_agent = AgentRole::Planner;
    state.updated_at = chrono::Utc::now();
    state
}

fn parse_intent(envelope: &Value) -> Option<ParsedIntent> {
    let intent = envelope.get("intent")?;
    Some(ParsedIntent {
        goal: intent.get("goal")?.as_str()?.to_string(),
        required_tools: intent
            .get("required_tools")
            .and_then(Value::as_array)
            .map(|v| v.iter().filter_map(|t| t.as_str().map(String::from)).collect())
            .unwrap_or_default(),
        required_info: intent
            .get("required_info")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default(),
        confidence: intent.get("confidence").and_then(Value::as_f64).unwrap_or(0.0),
    })
}

fn render_prompt(user_input: &str, tool_names: &[String], retrieved_docs: &[String]) -> String {
    let tools_json = serde_json::to_string(tool_names).unwrap_or_else(|_| "[]".to_string());
    let context = retrieved_docs.join("\n");
    format!(
        "{}\nUSER_INPUT: {}\nAVAILABLE_TOOLS: {}\nCONTEXT:\n{}\nRespond with a JSON object {{\"intent\": {{\"goal\", \"required_tools\", \"required_info\", \"confidence\"}}, \"steps\": [{{\"title\", \"tool_name\"}}]}} with at most {} steps.\n",
        pax_chatgen::prompts::PLANNER_MARKER,
        user_input,
        tools_json,
        context,
        MAX_TASK_STEPS,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pax_chatgen::{InMemoryKnowledgeSearch, LocalChatGenerator};
    use pax_tools::seeded_registry;

    fn deps() -> PlannerDeps {
        PlannerDeps {
            chat_generator: Arc::new(LocalChatGenerator),
            knowledge_search: Arc::new(InMemoryKnowledgeSearch::default()),
            tool_registry: Arc::new(seeded_registry()),
        }
    }

    #[tokio::test]
    async fn happy_path_no_tools_yields_single_step() {
        let state = AgentState::new("greet", "conv-1", "user-1");
        let state = plan(state, &deps()).await;
        assert_eq!(state.todo_list.len(), 1);
        assert_eq!(state.todo_list[0].tool_name, None);
        assert!(state.parsed_intent.is_some());
    }

    #[tokio::test]
    async fn detects_calculator_tool() {
        let state = AgentState::new("use calculator for 2 + 2", "conv-1", "user-1");
        let state = plan(state, &deps()).await;
        assert_eq!(state.todo_list[0].tool_name.as_deref(), Some("calculator"));
    }

    #[tokio::test]
    async fn parse_failure_folds_into_failed_status() {
        struct BrokenGenerator;
        #[async_trait::async_trait]
        impl ChatGenerator for BrokenGenerator {
            async fn complete(&self, _prompt: &str) -> pax_domain::Result<String> {
                Ok("not json".to_string())
            }
        }
        let mut deps = deps();
        deps.chat_generator = Arc::new(BrokenGenerator);
        let state = AgentState::new("greet", "conv-1", "user-1");
        let state = plan(state, &deps).await;
        assert_eq!(state.final_status, FinalStatus::Failed);
        assert!(state.error_info.unwrap().starts_with("Planning error"));
    }
}
