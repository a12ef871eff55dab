#![allow(non_snake_case)]

use calendarAgent::config::AppConfig;
use calendarAgent::runtime;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "calendarAgent=info,warp=info".into()),
        )
        .init();

    let config = AppConfig::load();

    let google_client_id = config
        .prop("GOOGLE_CLIENT_ID")
        .expect("GOOGLE_CLIENT_ID must be set");
    let google_client_secret = config
        .prop("GOOGLE_CLIENT_SECRET")
        .expect("GOOGLE_CLIENT_SECRET must be set");

    runtime::run_server(config, google_client_id, google_client_secret).await;
}
