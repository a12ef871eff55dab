use serde_json::Value;

use crate::clients::ClientError;
use crate::models::token::TokenSet;

const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const EVENTS_ENDPOINT: &str = "https://www.googleapis.com/calendar/v3/calendars/primary/events";
const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";

/// Consent-screen URL the user is redirected to from `/auth`.
pub fn auth_url(client_id: &str, redirect_uri: &str) -> String {
    format!(
        "{AUTH_ENDPOINT}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent",
        urlencoding::encode(client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(CALENDAR_SCOPE),
    )
}

/// Exchanges the callback authorization code for a token set.
pub async fn exchange_code(
    client_id: &str,
    client_secret: &str,
    redirect_uri: &str,
    code: &str,
) -> Result<TokenSet, ClientError> {
    let client = reqwest::Client::new();
    let response = client
        .post(TOKEN_ENDPOINT)
        .form(&[
            ("code", code),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await?;

    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        tracing::warn!(%status, "token exchange rejected: {}", text);
        return Err(format!("Token exchange failed with status {}", status).into());
    }
    let tokens: TokenSet = serde_json::from_str(&text)
        .map_err(|e| format!("Failed to parse token response: {}", e))?;
    Ok(tokens)
}

pub async fn insert_event(access_token: &str, body: &Value) -> Result<Value, ClientError> {
    let request = reqwest::Client::new()
        .post(EVENTS_ENDPOINT)
        .bearer_auth(access_token)
        .json(body);
    api_call(request).await
}

pub async fn list_events(
    access_token: &str,
    time_min: &str,
    max_results: u32,
) -> Result<Value, ClientError> {
    let url = format!(
        "{EVENTS_ENDPOINT}?maxResults={}&orderBy=startTime&singleEvents=true&timeMin={}",
        max_results,
        urlencoding::encode(time_min),
    );
    api_call(reqwest::Client::new().get(&url).bearer_auth(access_token)).await
}

pub async fn get_event(access_token: &str, event_id: &str) -> Result<Value, ClientError> {
    let url = format!("{EVENTS_ENDPOINT}/{}", urlencoding::encode(event_id));
    api_call(reqwest::Client::new().get(&url).bearer_auth(access_token)).await
}

pub async fn update_event(
    access_token: &str,
    event_id: &str,
    body: &Value,
) -> Result<Value, ClientError> {
    let url = format!("{EVENTS_ENDPOINT}/{}", urlencoding::encode(event_id));
    let request = reqwest::Client::new()
        .put(&url)
        .bearer_auth(access_token)
        .json(body);
    api_call(request).await
}

pub async fn delete_event(access_token: &str, event_id: &str) -> Result<(), ClientError> {
    let url = format!("{EVENTS_ENDPOINT}/{}", urlencoding::encode(event_id));
    api_call(reqwest::Client::new().delete(&url).bearer_auth(access_token)).await?;
    Ok(())
}

async fn api_call(request: reqwest::RequestBuilder) -> Result<Value, ClientError> {
    let response = request.send().await?;
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        return Err(api_error_message(status, &text).into());
    }
    // Delete replies with an empty 204 body.
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    let parsed: Value = serde_json::from_str(&text)
        .map_err(|e| format!("Failed to parse calendar response: {}", e))?;
    Ok(parsed)
}

fn api_error_message(status: reqwest::StatusCode, body: &str) -> String {
    // Google wraps failures as {"error":{"message":...}}; surface that text
    // when present, otherwise fall back to the status line.
    if let Ok(parsed) = serde_json::from_str::<Value>(body) {
        if let Some(message) = parsed.pointer("/error/message").and_then(Value::as_str) {
            return message.to_string();
        }
    }
    format!("Calendar API request failed with status {}", status)
}
