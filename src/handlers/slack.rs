use std::collections::HashMap;
use std::time::Duration;

use serde_json::{Value, json};
use warp::{Rejection, Reply};

use crate::clients::slack_client;
use crate::handlers::http::ServerState;
use crate::service::dispatch;

const DEFERRED_REPLY_DELAY_MS: u64 = 500;
pub const NOT_CONFIGURED_REPLY: &str =
    "Natural-language requests are not configured on this server (missing OPENAI_API_KEY).";

/// Slash-command surface: ack right away, answer later through the
/// `response_url` Slack supplied with the request.
pub async fn handle_slash_command(
    form: HashMap<String, String>,
    state: ServerState,
) -> Result<impl Reply, Rejection> {
    let text = form.get("text").cloned().unwrap_or_default();
    let Some(response_url) = form.get("response_url").cloned().filter(|u| !u.is_empty()) else {
        return Ok(warp::reply::json(&json!({
            "response_type": "ephemeral",
            "text": "Missing response_url.",
        })));
    };
    let Some(interpreter) = state.interpreter.clone() else {
        return Ok(warp::reply::json(&json!({
            "response_type": "ephemeral",
            "text": NOT_CONFIGURED_REPLY,
        })));
    };

    let calendar = state.calendar.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(DEFERRED_REPLY_DELAY_MS)).await;
        let answer = dispatch::answer_text_request(interpreter.as_ref(), &calendar, &text).await;
        deliver_deferred_reply(&response_url, &answer).await;
    });

    Ok(warp::reply::json(&json!({
        "response_type": "ephemeral",
        "text": "Working on it...",
    })))
}

/// Best-effort delivery: one retry, then log the terminal failure and stop.
async fn deliver_deferred_reply(response_url: &str, text: &str) {
    for attempt in 1..=2u8 {
        match slack_client::post_to_response_url(response_url, text).await {
            Ok(()) => return,
            Err(err) if attempt == 1 => {
                tracing::warn!(error = %err, "deferred reply failed, retrying once");
            }
            Err(err) => {
                tracing::error!(error = %err, "deferred reply failed permanently");
            }
        }
    }
}

/// Events surface. Verification handshakes are answered inline with the
/// challenge echoed verbatim; app mentions are acked immediately and handled
/// in a spawned task.
pub async fn handle_event(body: Value, state: ServerState) -> Result<impl Reply, Rejection> {
    if body.get("type").and_then(Value::as_str) == Some("url_verification") {
        let challenge = body
            .get("challenge")
            .and_then(Value::as_str)
            .unwrap_or_default();
        return Ok(warp::reply::json(&json!({ "challenge": challenge })));
    }

    if let Some(event) = body.get("event") {
        if event.get("type").and_then(Value::as_str) == Some("app_mention") {
            let text = strip_mention(event.get("text").and_then(Value::as_str).unwrap_or_default());
            let channel = event
                .get("channel")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            spawn_mention_reply(state, channel, text);
        }
    }

    Ok(warp::reply::json(&json!({ "ok": true })))
}

fn spawn_mention_reply(state: ServerState, channel: String, text: String) {
    if channel.is_empty() {
        return;
    }
    let Some(bot_token) = state.slack_bot_token.clone() else {
        tracing::warn!("app_mention received but SLACK_BOT_TOKEN is not configured");
        return;
    };

    tokio::spawn(async move {
        let answer = match state.interpreter.clone() {
            Some(interpreter) => {
                dispatch::answer_text_request(interpreter.as_ref(), &state.calendar, &text).await
            }
            None => NOT_CONFIGURED_REPLY.to_string(),
        };
        if let Err(err) = slack_client::post_message(&bot_token, &channel, &answer).await {
            tracing::error!(error = %err, "failed to post app_mention reply");
        }
    });
}

/// Drops the leading `<@U...>` token an app mention carries.
pub fn strip_mention(text: &str) -> String {
    let trimmed = text.trim_start();
    if let Some(rest) = trimmed.strip_prefix("<@") {
        if let Some(end) = rest.find('>') {
            return rest[end + 1..].trim_start().to_string();
        }
    }
    trimmed.to_string()
}
