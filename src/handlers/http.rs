use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Value, json};
use warp::http::{StatusCode, Uri};
use warp::{Filter, Rejection, Reply};

use crate::clients::google_calendar;
use crate::handlers::slack;
use crate::service::calendar_service::{CalendarService, NOT_AUTHENTICATED};
use crate::service::dispatch;
use crate::service::interpreter::Interpreter;
use crate::service::session::SessionStore;

/// Request-scoped state shared by every route.
#[derive(Clone)]
pub struct ServerState {
    pub session: SessionStore,
    pub calendar: CalendarService,
    pub interpreter: Option<Arc<dyn Interpreter>>,
    pub slack_bot_token: Option<String>,
    pub google_client_id: String,
    pub google_client_secret: String,
    pub redirect_uri: String,
}

pub fn routes(
    state: ServerState,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let with_state = {
        let state = state.clone();
        warp::any().map(move || state.clone())
    };

    let auth = warp::path("auth")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state.clone())
        .and_then(handle_auth);

    let callback = warp::path("callback")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<HashMap<String, String>>())
        .and(with_state.clone())
        .and_then(handle_callback);

    let webhook = warp::path("webhook")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state.clone())
        .and_then(handle_webhook);

    let slack_webhook = warp::path("slack-webhook")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::form::<HashMap<String, String>>())
        .and(with_state.clone())
        .and_then(slack::handle_slash_command);

    let slack_events = warp::path("slack-events")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state.clone())
        .and_then(slack::handle_event);

    let debug = warp::path("debug")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state.clone())
        .and_then(handle_debug);

    let status = warp::path::end()
        .and(warp::get())
        .and(with_state)
        .and_then(handle_status);

    auth.or(callback)
        .or(webhook)
        .or(slack_webhook)
        .or(slack_events)
        .or(debug)
        .or(status)
}

async fn handle_auth(state: ServerState) -> Result<warp::reply::Response, Rejection> {
    let url = google_calendar::auth_url(&state.google_client_id, &state.redirect_uri);
    tracing::debug!("redirecting to consent screen");
    match url.parse::<Uri>() {
        Ok(uri) => Ok(warp::redirect::found(uri).into_response()),
        Err(_) => Ok(warp::reply::with_status(
            "Invalid authorization URL".to_string(),
            StatusCode::INTERNAL_SERVER_ERROR,
        )
        .into_response()),
    }
}

async fn handle_callback(
    query: HashMap<String, String>,
    state: ServerState,
) -> Result<warp::reply::Response, Rejection> {
    if let Some(error) = query.get("error") {
        return Ok(warp::reply::with_status(
            format!("OAuth error: {}", error),
            StatusCode::BAD_REQUEST,
        )
        .into_response());
    }
    let Some(code) = query.get("code") else {
        return Ok(warp::reply::with_status(
            "No authorization code received.".to_string(),
            StatusCode::BAD_REQUEST,
        )
        .into_response());
    };

    match google_calendar::exchange_code(
        &state.google_client_id,
        &state.google_client_secret,
        &state.redirect_uri,
        code,
    )
    .await
    {
        Ok(tokens) => {
            state.session.set_token(tokens).await;
            tracing::info!("authorization complete, token set stored");
            Ok(
                "Authorization successful! You can now use the calendar agent."
                    .to_string()
                    .into_response(),
            )
        }
        Err(err) => {
            tracing::error!(error = %err, "token exchange failed");
            Ok(warp::reply::with_status(
                format!("Authorization failed: {}", err),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
            .into_response())
        }
    }
}

async fn handle_webhook(
    body: Value,
    state: ServerState,
) -> Result<warp::reply::Response, Rejection> {
    let tool_name = body
        .get("tool_name")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let parameters = body.get("parameters").cloned().unwrap_or(Value::Null);
    tracing::info!(tool_name, "webhook tool call received");

    if !state.session.has_token().await {
        let unauthorized = json!({ "success": false, "error": NOT_AUTHENTICATED });
        return Ok(warp::reply::with_status(
            warp::reply::json(&unauthorized),
            StatusCode::UNAUTHORIZED,
        )
        .into_response());
    }

    let result = dispatch::dispatch_tool(&state.calendar, tool_name, &parameters).await;
    Ok(warp::reply::json(&result).into_response())
}

async fn handle_status(state: ServerState) -> Result<warp::reply::Response, Rejection> {
    let authenticated = state.session.has_token().await;
    let auth_url = if authenticated {
        Value::Null
    } else {
        json!("/auth")
    };
    let status = json!({
        "status": "Calendar Agent Server Running",
        "authenticated": authenticated,
        "auth_url": auth_url,
    });
    Ok(warp::reply::json(&status).into_response())
}

/// Reports which secrets are configured, never their values.
async fn handle_debug(state: ServerState) -> Result<warp::reply::Response, Rejection> {
    let report = json!({
        "google_client_id": !state.google_client_id.is_empty(),
        "google_client_secret": !state.google_client_secret.is_empty(),
        "openai_api_key": state.interpreter.is_some(),
        "slack_bot_token": state.slack_bot_token.is_some(),
    });
    Ok(warp::reply::json(&report).into_response())
}
