use std::sync::Arc;

use calendarAgent::clients::ClientError;
use calendarAgent::models::token::TokenSet;
use calendarAgent::service::calendar_service::{CalendarApi, CalendarService};
use calendarAgent::service::session::SessionStore;
use serde_json::{Value, json};

/// Replies with items out of order and with one event already in the past,
/// regardless of what the query asked for.
struct MessyProviderApi;

#[async_trait::async_trait]
impl CalendarApi for MessyProviderApi {
    async fn insert_event(&self, _access_token: &str, _body: &Value) -> Result<Value, ClientError> {
        unreachable!()
    }

    async fn list_events(
        &self,
        _access_token: &str,
        _time_min: &str,
        _max_results: u32,
    ) -> Result<Value, ClientError> {
        Ok(json!({
            "items": [
                {
                    "id": "late",
                    "summary": "Latest",
                    "start": { "dateTime": "2031-01-03T10:00:00Z" },
                    "end": { "dateTime": "2031-01-03T11:00:00Z" },
                },
                {
                    "id": "past",
                    "summary": "Already happened",
                    "start": { "dateTime": "2000-01-01T10:00:00Z" },
                    "end": { "dateTime": "2000-01-01T11:00:00Z" },
                },
                {
                    "id": "allday",
                    "summary": "Offsite",
                    "start": { "date": "2031-01-02" },
                    "end": { "date": "2031-01-03" },
                },
                {
                    "id": "soon",
                    "summary": "Soonest",
                    "start": { "dateTime": "2031-01-01T09:00:00Z" },
                    "end": { "dateTime": "2031-01-01T09:30:00Z" },
                    "description": "first up",
                    "htmlLink": "https://calendar.example/soon",
                },
            ]
        }))
    }

    async fn get_event(&self, _access_token: &str, _event_id: &str) -> Result<Value, ClientError> {
        unreachable!()
    }

    async fn update_event(
        &self,
        _access_token: &str,
        _event_id: &str,
        _body: &Value,
    ) -> Result<Value, ClientError> {
        unreachable!()
    }

    async fn delete_event(&self, _access_token: &str, _event_id: &str) -> Result<(), ClientError> {
        unreachable!()
    }
}

async fn calendar() -> CalendarService {
    let session = SessionStore::new();
    session
        .set_token(TokenSet {
            access_token: "token".to_string(),
            refresh_token: None,
            expires_in: None,
            token_type: None,
            scope: None,
        })
        .await;
    CalendarService::new(Arc::new(MessyProviderApi), session)
}

#[tokio::test]
async fn list_filters_past_events_and_sorts_ascending() {
    let calendar = calendar().await;

    let result = calendar.list_events(10).await;

    assert_eq!(result["success"], json!(true));
    let events = result["events"].as_array().unwrap();
    let ids: Vec<&str> = events
        .iter()
        .map(|e| e["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["soon", "allday", "late"]);
    assert_eq!(events[0]["title"], json!("Soonest"));
    assert_eq!(events[0]["description"], json!("first up"));
    assert_eq!(events[0]["html_link"], json!("https://calendar.example/soon"));
    assert_eq!(result["message"], json!("Found 3 upcoming events"));
}

#[tokio::test]
async fn list_caps_at_max_results() {
    let calendar = calendar().await;

    let result = calendar.list_events(2).await;

    let events = result["events"].as_array().unwrap();
    assert_eq!(events.len(), 2);
    let ids: Vec<&str> = events
        .iter()
        .map(|e| e["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["soon", "allday"]);
}

#[tokio::test]
async fn all_day_events_keep_their_bare_date() {
    let calendar = calendar().await;

    let result = calendar.list_events(10).await;

    let events = result["events"].as_array().unwrap();
    let offsite = events.iter().find(|e| e["id"] == json!("allday")).unwrap();
    assert_eq!(offsite["start"], json!("2031-01-02"));
    assert_eq!(offsite["end"], json!("2031-01-03"));
}
