//! Tools seeded into every `ToolRegistry` by [`crate::seeded_registry`].
//!
//! Four tools, matching the end-to-end scenarios: a no-op (`echo`) for
//! smoke-testing the Executor's happy path, an arithmetic tool
//! (`calculator`) for exercising argument synthesis, an auth-style tool
//! (`send_email`) that requires user-supplied configuration, and a
//! deliberately slow tool (`slow`) for exercising the timeout path.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pax_domain::tool::ToolSchema;
use serde_json::{json, Value};

use crate::registry::{ToolInvoker, ToolRegistry};

pub struct EchoTool;

#[async_trait]
impl ToolInvoker for EchoTool {
    async fn invoke(&self, args: BTreeMap<String, Value>) -> Result<Value, String> {
        let message = args
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default();
        Ok(json!({ "echoed": message }))
    }
}

fn echo_schema() -> ToolSchema {
    ToolSchema::new(
        "echo",
        "Returns the given message unchanged.",
        json!({
            "type": "object",
            "properties": { "message": { "type": "string" } },
            "required": ["message"],
        }),
    )
    .with_tags(["debug"])
}

pub struct CalculatorTool;

#[async_trait]
impl ToolInvoker for CalculatorTool {
    async fn invoke(&self, args: BTreeMap<String, Value>) -> Result<Value, String> {
        let expression = args
            .get("expression")
            .and_then(Value::as_str)
            .ok_or_else(|| "missing required parameter: expression".to_string())?;
        let value = eval_arithmetic(expression)?;
        Ok(json!({ "result": value }))
    }
}

fn calculator_schema() -> ToolSchema {
    ToolSchema::new(
        "calculator",
        "Evaluates a simple arithmetic expression (+ - * / and parentheses).",
        json!({
            "type": "object",
            "properties": { "expression": { "type": "string" } },
            "required": ["expression"],
        }),
    )
    .with_tags(["math"])
}

pub struct SendEmailTool;

#[async_trait]
impl ToolInvoker for SendEmailTool {
    async fn invoke(&self, args: BTreeMap<String, Value>) -> Result<Value, String> {
        let to = args
            .get("to")
            .and_then(Value::as_str)
            .ok_or_else(|| "missing required parameter: to".to_string())?;
        let subject = args
            .get("subject")
            .and_then(Value::as_str)
            .unwrap_or("(no subject)");
        Ok(json!({ "sent_to": to, "subject": subject, "status": "queued" }))
    }
}

fn send_email_schema() -> ToolSchema {
    ToolSchema::new(
        "send_email",
        "Sends an email on the user's behalf. Requires the user's SMTP configuration.",
        json!({
            "type": "object",
            "properties": {
                "to": { "type": "string" },
                "subject": { "type": "string" },
                "body": { "type": "string" },
            },
            "required": ["to"],
        }),
    )
    .with_requires_user_config(true)
    .with_config_schema(json!({
        "type": "object",
        "properties": {
            "smtp_server": { "type": "string" },
            "smtp_port": { "type": "integer" },
        },
        "required": ["smtp_server"],
    }))
    .with_tags(["communication"])
}

/// Sleeps for the configured duration before returning. Exists so the
/// Executor's timeout handling can be exercised deterministically: register
/// with a `timeout_seconds` shorter than `sleep_seconds`.
pub struct SlowTool;

#[async_trait]
impl ToolInvoker for SlowTool {
    async fn invoke(&self, args: BTreeMap<String, Value>) -> Result<Value, String> {
        let sleep_seconds = args
            .get("sleep_seconds")
            .and_then(Value::as_u64)
            .unwrap_or(5);
        tokio::time::sleep(Duration::from_secs(sleep_seconds)).await;
        Ok(json!({ "slept_seconds": sleep_seconds }))
    }
}

fn slow_schema() -> ToolSchema {
    ToolSchema::new(
        "slow",
        "Sleeps for sleep_seconds before returning; used to exercise timeouts.",
        json!({
            "type": "object",
            "properties": { "sleep_seconds": { "type": "integer" } },
        }),
    )
    .with_timeout_seconds(1)
    .with_tags(["debug"])
}

pub fn register_builtin_tools(registry: &ToolRegistry) {
    let pairs: [(ToolSchema, Arc<dyn ToolInvoker>); 4] = [
        (echo_schema(), Arc::new(EchoTool)),
        (calculator_schema(), Arc::new(CalculatorTool)),
        (send_email_schema(), Arc::new(SendEmailTool)),
        (slow_schema(), Arc::new(SlowTool)),
    ];
    for (schema, invoker) in pairs {
        registry
            .register(schema, invoker)
            .expect("builtin tool names are unique");
    }
}

/// Minimal recursive-descent evaluator for `+ - * /` and parentheses over
/// `f64` literals. No variables, no unary minus beyond a leading sign.
fn eval_arithmetic(expression: &str) -> Result<f64, String> {
    let tokens = tokenize(expression)?;
    let mut pos = 0;
    let value = parse_expr(&tokens, &mut pos)?;
    if pos != tokens.len() {
        return Err(format!("unexpected trailing input in expression: {expression}"));
    }
    Ok(value)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(expression: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = expression.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let number = text
                    .parse::<f64>()
                    .map_err(|_| format!("invalid number literal: {text}"))?;
                tokens.push(Token::Number(number));
            }
            other => return Err(format!("unexpected character in expression: {other}")),
        }
    }
    Ok(tokens)
}

fn parse_expr(tokens: &[Token], pos: &mut usize) -> Result<f64, String> {
    let mut value = parse_term(tokens, pos)?;
    loop {
        match tokens.get(*pos) {
            Some(Token::Plus) => {
                *pos += 1;
                value += parse_term(tokens, pos)?;
            }
            Some(Token::Minus) => {
                *pos += 1;
                value -= parse_term(tokens, pos)?;
            }
            _ => break,
        }
    }
    Ok(value)
}

fn parse_term(tokens: &[Token], pos: &mut usize) -> Result<f64, String> {
    let mut value = parse_factor(tokens, pos)?;
    loop {
        match tokens.get(*pos) {
            Some(Token::Star) => {
                *pos += 1;
                value *= parse_factor(tokens, pos)?;
            }
            Some(Token::Slash) => {
                *pos += 1;
                let divisor = parse_factor(tokens, pos)?;
                if divisor == 0.0 {
                    return Err("division by zero".to_string());
                }
                value /= divisor;
            }
            _ => break,
        }
    }
    Ok(value)
}

fn parse_factor(tokens: &[Token], pos: &mut usize) -> Result<f64, String> {
    match tokens.get(*pos) {
        Some(Token::Minus) => {
            *pos += 1;
            Ok(-parse_factor(tokens, pos)?)
        }
        Some(Token::Number(n)) => {
            *pos += 1;
            Ok(*n)
        }
        Some(Token::LParen) => {
            *pos += 1;
            let value = parse_expr(tokens, pos)?;
            match tokens.get(*pos) {
                Some(Token::RParen) => {
                    *pos += 1;
                    Ok(value)
                }
                _ => Err("expected closing parenthesis".to_string()),
            }
        }
        other => Err(format!("expected a number or '(', found {other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echo_returns_message_unchanged() {
        let mut args = BTreeMap::new();
        args.insert("message".to_string(), json!("hi"));
        let out = EchoTool.invoke(args).await.unwrap();
        assert_eq!(out["echoed"], "hi");
    }

    #[tokio::test]
    async fn calculator_evaluates_precedence_and_parens() {
        let mut args = BTreeMap::new();
        args.insert("expression".to_string(), json!("2 + 3 * (4 - 1)"));
        let out = CalculatorTool.invoke(args).await.unwrap();
        assert_eq!(out["result"], 11.0);
    }

    #[tokio::test]
    async fn calculator_rejects_division_by_zero() {
        let mut args = BTreeMap::new();
        args.insert("expression".to_string(), json!("1 / 0"));
        let err = CalculatorTool.invoke(args).await.unwrap_err();
        assert!(err.contains("division by zero"));
    }

    #[tokio::test]
    async fn send_email_requires_recipient() {
        let err = SendEmailTool.invoke(BTreeMap::new()).await.unwrap_err();
        assert!(err.contains("to"));
    }

    #[tokio::test]
    async fn slow_tool_sleeps_then_returns() {
        let mut args = BTreeMap::new();
        args.insert("sleep_seconds".to_string(), json!(0));
        let out = SlowTool.invoke(args).await.unwrap();
        assert_eq!(out["slept_seconds"], 0);
    }

    #[test]
    fn seeded_registry_contains_all_builtins() {
        let registry = ToolRegistry::new();
        register_builtin_tools(&registry);
        let mut names = registry.list_names();
        names.sort();
        assert_eq!(names, vec!["calculator", "echo", "send_email", "slow"]);
    }
}
