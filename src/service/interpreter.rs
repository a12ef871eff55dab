use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::clients::openai_client;

pub const INTERPRETER_TIMEOUT_SECS: u64 = 25;

/// What the language service made of the user's text: either a tool to run,
/// or a question to echo back verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum Interpretation {
    ToolCall { tool_name: String, parameters: Value },
    Clarification(String),
}

#[async_trait]
pub trait Interpreter: Send + Sync {
    async fn interpret(&self, text: &str) -> Result<Interpretation, String>;
}

pub struct OpenAIInterpreter {
    api_key: String,
}

impl OpenAIInterpreter {
    pub fn new(api_key: String) -> Self {
        Self { api_key }
    }
}

#[async_trait]
impl Interpreter for OpenAIInterpreter {
    async fn interpret(&self, text: &str) -> Result<Interpretation, String> {
        let api_key = self.api_key.clone();
        let text = text.to_string();

        // Only the wait is bounded; a call that outlives the deadline keeps
        // running in its spawned task and is never awaited again.
        let call =
            tokio::spawn(async move { openai_client::interpret_request(&text, &api_key).await });
        let payload = match tokio::time::timeout(
            Duration::from_secs(INTERPRETER_TIMEOUT_SECS),
            call,
        )
        .await
        {
            Err(_) => {
                return Err(format!(
                    "Language service timed out after {} seconds",
                    INTERPRETER_TIMEOUT_SECS
                ));
            }
            Ok(Err(join_err)) => return Err(format!("Language service task failed: {}", join_err)),
            Ok(Ok(Err(err))) => return Err(err.to_string()),
            Ok(Ok(Ok(payload))) => payload,
        };

        parse_interpreter_payload(&payload)
            .ok_or_else(|| format!("Unrecognized language service reply: {}", payload))
    }
}

#[derive(Debug, Deserialize)]
struct InterpreterPayload {
    #[serde(default)]
    tool_name: Option<String>,
    #[serde(default)]
    parameters: Option<Value>,
    #[serde(default)]
    clarification: Option<String>,
}

pub fn parse_interpreter_payload(payload: &str) -> Option<Interpretation> {
    let parsed: InterpreterPayload = serde_json::from_str(payload.trim()).ok()?;
    if let Some(question) = parsed.clarification {
        return Some(Interpretation::Clarification(question));
    }
    let tool_name = parsed.tool_name?;
    Some(Interpretation::ToolCall {
        tool_name,
        parameters: parsed.parameters.unwrap_or(Value::Null),
    })
}
