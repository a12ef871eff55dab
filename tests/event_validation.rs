use std::sync::Arc;

use calendarAgent::clients::ClientError;
use calendarAgent::models::event::{EventDescriptor, validate_times};
use calendarAgent::models::token::TokenSet;
use calendarAgent::service::calendar_service::{CalendarApi, CalendarService};
use serde_json::{Value, json};

struct StubApi;

#[async_trait::async_trait]
impl CalendarApi for StubApi {
    async fn insert_event(&self, _access_token: &str, _body: &Value) -> Result<Value, ClientError> {
        Ok(json!({ "id": "evt-created", "htmlLink": "https://calendar.example/e" }))
    }

    async fn list_events(
        &self,
        _access_token: &str,
        _time_min: &str,
        _max_results: u32,
    ) -> Result<Value, ClientError> {
        Ok(json!({ "items": [] }))
    }

    async fn get_event(&self, _access_token: &str, _event_id: &str) -> Result<Value, ClientError> {
        Ok(json!({ "id": "evt" }))
    }

    async fn update_event(
        &self,
        _access_token: &str,
        _event_id: &str,
        _body: &Value,
    ) -> Result<Value, ClientError> {
        Ok(json!({ "id": "evt" }))
    }

    async fn delete_event(&self, _access_token: &str, _event_id: &str) -> Result<(), ClientError> {
        Ok(())
    }
}

async fn authed_service() -> CalendarService {
    let session = calendarAgent::service::session::SessionStore::new();
    session
        .set_token(TokenSet {
            access_token: "token".to_string(),
            refresh_token: None,
            expires_in: None,
            token_type: None,
            scope: None,
        })
        .await;
    CalendarService::new(Arc::new(StubApi), session)
}

fn descriptor(start: &str, end: &str) -> EventDescriptor {
    EventDescriptor {
        title: "Meeting".to_string(),
        start_time: start.to_string(),
        end_time: end.to_string(),
        description: None,
        attendees: vec![],
    }
}

#[tokio::test]
async fn well_formed_descriptor_creates_with_nonempty_id() {
    let calendar = authed_service().await;

    let result = calendar
        .create_event(&descriptor(
            "2030-06-01T10:00:00-07:00",
            "2030-06-01T11:00:00-07:00",
        ))
        .await;

    assert_eq!(result["success"], json!(true));
    assert!(!result["event_id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn unparseable_start_names_the_field() {
    let calendar = authed_service().await;

    let result = calendar
        .create_event(&descriptor("next tuesday-ish", "2030-06-01T11:00:00-07:00"))
        .await;

    assert_eq!(result["success"], json!(false));
    let error = result["error"].as_str().unwrap();
    assert!(error.contains("Invalid start time"));
    assert!(error.contains("next tuesday-ish"));
}

#[tokio::test]
async fn unparseable_end_names_the_field() {
    let calendar = authed_service().await;

    let result = calendar
        .create_event(&descriptor("2030-06-01T10:00:00-07:00", "whenever"))
        .await;

    assert_eq!(result["success"], json!(false));
    let error = result["error"].as_str().unwrap();
    assert!(error.contains("Invalid end time"));
    assert!(error.contains("whenever"));
}

#[test]
fn validate_times_accepts_naive_and_date_only_formats() {
    assert!(validate_times("2030-06-01T10:00:00", "2030-06-01 11:00").is_ok());
    assert!(validate_times("2030-06-01", "2030-06-02").is_ok());
    assert!(validate_times("", "2030-06-02").is_err());
}
