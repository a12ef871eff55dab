use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clients::ClientError;

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: String,
}

/// Catalog shown to the model; the names must match the dispatch table.
pub const TOOL_CATALOG: &str = "\
- create_calendar_event(title, start_time, end_time, description?, attendees?): create an event\n\
- list_calendar_events(max_results?): list upcoming events\n\
- update_calendar_event(event_id, title?, start_time?, end_time?, description?): change fields on an event\n\
- delete_calendar_event(event_id): remove an event\n\
- confirm_calendar_event(title, start_time, end_time, description?, attendees?): preview an event without creating it";

/// Asks the model to map free text onto one tool call, or to ask a single
/// clarifying question. Replies with the model's raw JSON payload.
pub async fn interpret_request(text: &str, api_key: &str) -> Result<String, ClientError> {
    let now: DateTime<Utc> = Utc::now();

    let full_prompt = format!(
        "You are a calendar assistant request interpreter.\n\
         Current date and time (UTC): {now}\n\
         User timezone: America/Los_Angeles\n\
         Available tools:\n\
         {catalog}\n\
         Task: Map the user message below onto exactly one tool call, or ask one clarifying question.\n\
         Rules:\n\
         - Datetimes must be RFC3339 strings in the user's timezone.\n\
         - Relative expressions (e.g. \"tomorrow at 3pm\", \"next Friday\") are resolved against the current date/time.\n\
         - If the message does not contain enough information to fill a tool's required parameters, ask for the missing piece instead of guessing.\n\
         - Output ONLY raw JSON, no prose, markdown, or code fences.\n\
         - For a tool call the JSON shape must be exactly:\n\
         {{\"tool_name\":\"<name>\",\"parameters\":{{...}}}}\n\
         - For a clarifying question the JSON shape must be exactly:\n\
         {{\"clarification\":\"<question>\"}}\n\
         User message: \"{text}\"",
        now = now.to_rfc3339(),
        catalog = TOOL_CATALOG,
        text = text,
    );

    query_openai(full_prompt, api_key).await
}

async fn query_openai(prompt: String, api_key: &str) -> Result<String, ClientError> {
    let system_message = "You are a strict JSON calendar request interpreter. You read instructions \
         and a user message and reply ONLY with a single JSON object, with no markdown, no backticks, \
         and no extra text.";

    let request: OpenAIRequest = OpenAIRequest {
        model: "gpt-4o-mini".to_string(),
        messages: vec![
            OpenAIMessage {
                role: "system".to_string(),
                content: system_message.to_string(),
            },
            OpenAIMessage {
                role: "user".to_string(),
                content: prompt,
            },
        ],
        max_tokens: 500,
        temperature: 0.2,
    };

    let client = reqwest::Client::new();
    let response = client
        .post("https://api.openai.com/v1/chat/completions")
        .header("Authorization", format!("Bearer {}", api_key))
        .header("Content-Type", "application/json")
        .json(&request)
        .send()
        .await?;

    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        tracing::warn!(%status, "language service error: {}", text);
        return Err(format!("Language service request failed with status {}", status).into());
    }

    let parsed: OpenAIResponse = serde_json::from_str(&text)
        .map_err(|e| format!("Failed to parse language service JSON: {}", e))?;

    match parsed.choices.first() {
        Some(choice) => Ok(choice.message.content.clone()),
        None => Err("No response from language service".to_string().into()),
    }
}
