use std::sync::Arc;

use crate::config::AppConfig;
use crate::handlers::http::{ServerState, routes};
use crate::service::calendar_service::{CalendarService, GoogleCalendarApi};
use crate::service::interpreter::{Interpreter, OpenAIInterpreter};
use crate::service::session::SessionStore;

pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:3000/callback";
pub const DEFAULT_PORT: u16 = 3000;

pub fn build_state(
    config: &AppConfig,
    google_client_id: String,
    google_client_secret: String,
) -> ServerState {
    let session = SessionStore::new();
    let calendar = CalendarService::new(Arc::new(GoogleCalendarApi), session.clone());
    let interpreter: Option<Arc<dyn Interpreter>> = config
        .prop("OPENAI_API_KEY")
        .map(|key| Arc::new(OpenAIInterpreter::new(key)) as Arc<dyn Interpreter>);
    let slack_bot_token = config.prop("SLACK_BOT_TOKEN");
    let redirect_uri = config
        .prop("GOOGLE_REDIRECT_URI")
        .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string());

    ServerState {
        session,
        calendar,
        interpreter,
        slack_bot_token,
        google_client_id,
        google_client_secret,
        redirect_uri,
    }
}

pub async fn run_server(config: AppConfig, google_client_id: String, google_client_secret: String) {
    let state = build_state(&config, google_client_id, google_client_secret);
    let port: u16 = config
        .prop("PORT")
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    tracing::info!(
        port,
        openai_configured = state.interpreter.is_some(),
        slack_configured = state.slack_bot_token.is_some(),
        "starting calendar agent server"
    );

    warp::serve(routes(state)).run(([0, 0, 0, 0], port)).await;
}
