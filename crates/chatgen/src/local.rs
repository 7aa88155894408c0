//! Deterministic, network-free defaults for [`crate::traits`].
//!
//! [`LocalChatGenerator`] recognizes the Planner/Executor/Validator prompt
//! shapes (see [`crate::prompts`]) and returns a syntactically valid JSON
//! envelope built from the prompt's own content, enough to drive the
//! workflow end-to-end without a vendor LLM.

use async_trait::async_trait;
use pax_domain::Result;
use serde_json::{json, Value};

use crate::prompts::{field, EXECUTOR_PARAMS_MARKER, PLANNER_MARKER, VALIDATOR_MARKER};
use crate::traits::{ChatGenerator, KnowledgeSearch};

const KNOWN_TOOLS: &[&str] = &["calculator", "send_email", "slow", "echo"];

pub struct LocalChatGenerator;

#[async_trait]
impl ChatGenerator for LocalChatGenerator {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let response = if prompt.contains(PLANNER_MARKER) {
            plan(prompt)
        } else if prompt.contains(EXECUTOR_PARAMS_MARKER) {
            synthesize_params(prompt)
        } else if prompt.contains(VALIDATOR_MARKER) {
            validate()
        } else {
            json!({ "raw": prompt })
        };
        Ok(response.to_string())
    }
}

fn detect_tool(clause: &str) -> Option<&'static str> {
    let lower = clause.to_lowercase();
    KNOWN_TOOLS
        .iter()
        .copied()
        .find(|tool| lower.contains(tool) && *tool != "echo")
}

fn plan(prompt: &str) -> Value {
    let user_input = field(prompt, "USER_INPUT").unwrap_or_default();
    let clauses: Vec<&str> = user_input
        .split([',', ';'])
        .flat_map(|s| s.split(" and "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    let clauses: Vec<&str> = if clauses.is_empty() {
        vec![user_input.as_str()]
    } else {
        clauses
    };

    let mut required_tools = Vec::new();
    let steps: Vec<Value> = clauses
        .into_iter()
        .take(pax_domain::state::MAX_TASK_STEPS)
        .map(|clause| {
            let tool_name = detect_tool(clause);
            if let Some(tool) = tool_name {
                if !required_tools.contains(&tool) {
                    required_tools.push(tool);
                }
            }
            json!({ "title": clause, "tool_name": tool_name })
        })
        .collect();

    json!({
        "intent": {
            "goal": user_input,
            "required_tools": required_tools,
            "required_info": {},
            "confidence": 0.8,
        },
        "steps": steps,
    })
}

fn synthesize_params(prompt: &str) -> Value {
    let tool_name = field(prompt, "TOOL_NAME").unwrap_or_default();
    let step_title = field(prompt, "STEP_TITLE").unwrap_or_default();
    let requires_user_config = field(prompt, "TOOL_REQUIRES_USER_CONFIG").as_deref() == Some("true");
    let config_schema: Value = field(prompt, "TOOL_CONFIG_SCHEMA")
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or(Value::Null);
    let user_provided_config: Value = field(prompt, "USER_PROVIDED_CONFIG")
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_else(|| json!({}));

    let args = match tool_name.as_str() {
        "calculator" => json!({ "expression": extract_expression(&step_title) }),
        "send_email" => json!({
            "to": user_provided_config.get("to").cloned().unwrap_or_else(|| json!("user@example.com")),
            "subject": step_title,
        }),
        "slow" => json!({ "sleep_seconds": extract_int(&step_title).unwrap_or(5) }),
        _ => json!({ "message": step_title }),
    };

    if requires_user_config {
        let required = config_schema["required"]
            .as_array()
            .cloned()
            .unwrap_or_default();
        let missing: Vec<Value> = required
            .into_iter()
            .filter(|key| {
                let key = key.as_str().unwrap_or_default();
                user_provided_config.get(key).is_none()
            })
            .collect();
        if !missing.is_empty() {
            let names: Vec<String> = missing
                .iter()
                .map(|v| v.as_str().unwrap_or_default().to_string())
                .collect();
            // `args` is the best-effort argument mapping computed so far (it
            // may already satisfy the tool's *parameter* schema even though
            // required *config* keys are still missing); the Executor
            // persists it as `tool_input` so a subsequent resume only needs
            // to layer the user-supplied config on top instead of
            // re-synthesizing from scratch.
            return json!({
                "requires_user_input": true,
                "missing_params": missing,
                "reason": format!("missing required configuration: {}", names.join(", ")),
                "args": args,
            });
        }
    }
    args
}

fn validate() -> Value {
    json!({
        "is_successful": true,
        "status_message": "all steps completed",
        "suggestions": [],
    })
}

/// Pulls the longest run of digits/operators/parens/spaces out of `text`,
/// e.g. `"compute 2 + 3 * 4 please"` → `"2 + 3 * 4"`.
fn extract_expression(text: &str) -> String {
    let mut best = String::new();
    let mut current = String::new();
    for c in text.chars() {
        if c.is_ascii_digit() || "+-*/(). ".contains(c) {
            current.push(c);
        } else {
            if current.trim().len() > best.trim().len() {
                best = current.clone();
            }
            current.clear();
        }
    }
    if current.trim().len() > best.trim().len() {
        best = current;
    }
    best.trim().to_string()
}

fn extract_int(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// A small seeded document set ranked by keyword-overlap against the query.
pub struct InMemoryKnowledgeSearch {
    documents: Vec<String>,
}

impl Default for InMemoryKnowledgeSearch {
    fn default() -> Self {
        Self {
            documents: vec![
                "The calculator tool evaluates arithmetic expressions with + - * / and parentheses.".into(),
                "The send_email tool requires SMTP configuration before it can be used.".into(),
                "The slow tool sleeps for a configurable duration; useful for timeout testing.".into(),
                "Steps in a plan run in order; a step may or may not invoke a tool.".into(),
                "A task suspends when a tool needs configuration the user has not yet supplied.".into(),
            ],
        }
    }
}

impl InMemoryKnowledgeSearch {
    pub fn new(documents: Vec<String>) -> Self {
        Self { documents }
    }

    fn score(document: &str, query_words: &[&str]) -> usize {
        let lower = document.to_lowercase();
        query_words.iter().filter(|w| lower.contains(*w)).count()
    }
}

#[async_trait]
impl KnowledgeSearch for InMemoryKnowledgeSearch {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<String>> {
        let query = query.to_lowercase();
        let query_words: Vec<&str> = query.split_whitespace().collect();
        let mut scored: Vec<(usize, &String)> = self
            .documents
            .iter()
            .map(|doc| (Self::score(doc, &query_words), doc))
            .filter(|(score, _)| *score > 0)
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(scored.into_iter().take(k).map(|(_, doc)| doc.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planner_prompt(user_input: &str) -> String {
        format!("{PLANNER_MARKER}\nUSER_INPUT: {user_input}\nAVAILABLE_TOOLS: [\"calculator\",\"send_email\",\"slow\",\"echo\"]\n")
    }

    #[tokio::test]
    async fn planner_no_tool_clause_yields_single_step() {
        let generator = LocalChatGenerator;
        let raw = generator.complete(&planner_prompt("greet")).await.unwrap();
        let parsed: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed["steps"].as_array().unwrap().len(), 1);
        assert_eq!(parsed["steps"][0]["tool_name"], Value::Null);
    }

    #[tokio::test]
    async fn planner_detects_calculator_clause() {
        let generator = LocalChatGenerator;
        let raw = generator
            .complete(&planner_prompt("use the calculator to compute 2 + 2"))
            .await
            .unwrap();
        let parsed: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed["steps"][0]["tool_name"], "calculator");
        assert_eq!(parsed["intent"]["required_tools"][0], "calculator");
    }

    #[tokio::test]
    async fn planner_splits_multiple_clauses() {
        let generator = LocalChatGenerator;
        let raw = generator
            .complete(&planner_prompt("say hi and use calculator for 1 + 1"))
            .await
            .unwrap();
        let parsed: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed["steps"].as_array().unwrap().len(), 2);
    }

    fn params_prompt(tool_name: &str, step_title: &str, requires_config: bool, config_schema: Value, provided: Value) -> String {
        format!(
            "{EXECUTOR_PARAMS_MARKER}\nTOOL_NAME: {tool_name}\nSTEP_TITLE: {step_title}\nTOOL_REQUIRES_USER_CONFIG: {requires_config}\nTOOL_CONFIG_SCHEMA: {config_schema}\nUSER_PROVIDED_CONFIG: {provided}\n"
        )
    }

    #[tokio::test]
    async fn calculator_params_extract_expression() {
        let generator = LocalChatGenerator;
        let raw = generator
            .complete(&params_prompt("calculator", "compute 2 + 3 * 4 now", false, json!(null), json!({})))
            .await
            .unwrap();
        let parsed: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed["expression"], "2 + 3 * 4");
    }

    #[tokio::test]
    async fn send_email_without_config_returns_sentinel() {
        let generator = LocalChatGenerator;
        let raw = generator
            .complete(&params_prompt(
                "send_email",
                "email the report",
                true,
                json!({ "required": ["smtp_server"] }),
                json!({}),
            ))
            .await
            .unwrap();
        let parsed: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed["requires_user_input"], true);
        assert_eq!(parsed["missing_params"], json!(["smtp_server"]));
        assert!(parsed["args"]["to"].is_string());
    }

    #[tokio::test]
    async fn send_email_with_config_returns_args() {
        let generator = LocalChatGenerator;
        let raw = generator
            .complete(&params_prompt(
                "send_email",
                "email the report",
                true,
                json!({ "required": ["smtp_server"] }),
                json!({ "smtp_server": "smtp.example.com" }),
            ))
            .await
            .unwrap();
        let parsed: Value = serde_json::from_str(&raw).unwrap();
        assert!(parsed.get("requires_user_input").is_none());
        assert!(parsed["to"].is_string());
    }

    #[tokio::test]
    async fn validator_default_reports_success() {
        let generator = LocalChatGenerator;
        let raw = generator.complete(VALIDATOR_MARKER).await.unwrap();
        let parsed: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed["is_successful"], true);
    }

    #[tokio::test]
    async fn knowledge_search_ranks_by_overlap() {
        let search = InMemoryKnowledgeSearch::default();
        let hits = search.search("calculator arithmetic expressions", 2).await.unwrap();
        assert!(!hits.is_empty());
        assert!(hits[0].contains("calculator"));
    }

    #[tokio::test]
    async fn knowledge_search_empty_for_no_match() {
        let search = InMemoryKnowledgeSearch::default();
        let hits = search.search("zzzznonexistentword", 3).await.unwrap();
        assert!(hits.is_empty());
    }
}
