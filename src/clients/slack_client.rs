use serde_json::{Value, json};

use crate::clients::ClientError;

const POST_MESSAGE_ENDPOINT: &str = "https://slack.com/api/chat.postMessage";

/// Posts the deferred slash-command answer back to the `response_url` Slack
/// supplied with the slash command.
pub async fn post_to_response_url(response_url: &str, text: &str) -> Result<(), ClientError> {
    let body = json!({
        "response_type": "in_channel",
        "text": text,
    });
    let response = reqwest::Client::new()
        .post(response_url)
        .json(&body)
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(format!(
            "response_url post failed with status {}",
            response.status()
        )
        .into());
    }
    Ok(())
}

/// Sends a message to a channel with the bot token.
pub async fn post_message(bot_token: &str, channel: &str, text: &str) -> Result<(), ClientError> {
    let body = json!({
        "channel": channel,
        "text": text,
    });
    let response = reqwest::Client::new()
        .post(POST_MESSAGE_ENDPOINT)
        .bearer_auth(bot_token)
        .json(&body)
        .send()
        .await?;

    // Slack reports failures in-band with ok=false and a 200 status.
    let payload: Value = response.json().await?;
    if payload.get("ok").and_then(Value::as_bool) != Some(true) {
        let error = payload
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return Err(format!("chat.postMessage failed: {}", error).into());
    }
    Ok(())
}
