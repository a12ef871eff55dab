use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::America::Los_Angeles;
use serde_json::{Map, Value, json};

use crate::clients::ClientError;
use crate::clients::google_calendar;
use crate::models::event::{
    EVENT_TIME_ZONE, EventDescriptor, EventUpdates, parse_event_time, validate_times,
};
use crate::service::session::SessionStore;

pub const NOT_AUTHENTICATED: &str = "Not authenticated. Please visit /auth first.";
pub const CONFIRMATION_PROMPT: &str =
    "Reply \"yes\" to create this event or \"no\" to cancel.";

/// Raw provider seam: one method per REST call on the primary calendar.
#[async_trait]
pub trait CalendarApi: Send + Sync {
    async fn insert_event(&self, access_token: &str, body: &Value) -> Result<Value, ClientError>;
    async fn list_events(
        &self,
        access_token: &str,
        time_min: &str,
        max_results: u32,
    ) -> Result<Value, ClientError>;
    async fn get_event(&self, access_token: &str, event_id: &str) -> Result<Value, ClientError>;
    async fn update_event(
        &self,
        access_token: &str,
        event_id: &str,
        body: &Value,
    ) -> Result<Value, ClientError>;
    async fn delete_event(&self, access_token: &str, event_id: &str) -> Result<(), ClientError>;
}

pub struct GoogleCalendarApi;

#[async_trait]
impl CalendarApi for GoogleCalendarApi {
    async fn insert_event(&self, access_token: &str, body: &Value) -> Result<Value, ClientError> {
        google_calendar::insert_event(access_token, body).await
    }

    async fn list_events(
        &self,
        access_token: &str,
        time_min: &str,
        max_results: u32,
    ) -> Result<Value, ClientError> {
        google_calendar::list_events(access_token, time_min, max_results).await
    }

    async fn get_event(&self, access_token: &str, event_id: &str) -> Result<Value, ClientError> {
        google_calendar::get_event(access_token, event_id).await
    }

    async fn update_event(
        &self,
        access_token: &str,
        event_id: &str,
        body: &Value,
    ) -> Result<Value, ClientError> {
        google_calendar::update_event(access_token, event_id, body).await
    }

    async fn delete_event(&self, access_token: &str, event_id: &str) -> Result<(), ClientError> {
        google_calendar::delete_event(access_token, event_id).await
    }
}

pub fn error_envelope(message: &str) -> Value {
    json!({ "success": false, "error": message })
}

/// Calendar adapter. Every operation resolves to the uniform
/// `{"success": ...}` envelope so callers never branch on error types.
#[derive(Clone)]
pub struct CalendarService {
    api: Arc<dyn CalendarApi>,
    session: SessionStore,
}

impl CalendarService {
    pub fn new(api: Arc<dyn CalendarApi>, session: SessionStore) -> Self {
        Self { api, session }
    }

    async fn token(&self) -> Result<String, Value> {
        match self.session.access_token().await {
            Some(token) => Ok(token),
            None => Err(error_envelope(NOT_AUTHENTICATED)),
        }
    }

    pub async fn create_event(&self, descriptor: &EventDescriptor) -> Value {
        let token = match self.token().await {
            Ok(t) => t,
            Err(envelope) => return envelope,
        };
        let times = match validate_times(&descriptor.start_time, &descriptor.end_time) {
            Ok(t) => t,
            Err(message) => return error_envelope(&message),
        };

        let attendees: Vec<Value> = descriptor
            .attendees
            .iter()
            .map(|email| json!({ "email": email }))
            .collect();
        let body = json!({
            "summary": descriptor.title,
            "description": descriptor.description,
            "start": { "dateTime": times.start.to_rfc3339(), "timeZone": EVENT_TIME_ZONE },
            "end": { "dateTime": times.end.to_rfc3339(), "timeZone": EVENT_TIME_ZONE },
            "attendees": attendees,
        });

        match self.api.insert_event(&token, &body).await {
            Ok(created) => {
                let event_id = created.get("id").and_then(Value::as_str).unwrap_or_default();
                let html_link = created
                    .get("htmlLink")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                json!({
                    "success": true,
                    "event_id": event_id,
                    "html_link": html_link,
                    "message": format!("Event \"{}\" created successfully", descriptor.title),
                })
            }
            Err(err) => error_envelope(&err.to_string()),
        }
    }

    /// Upcoming events only, ascending by start, capped at `max_results`.
    /// The provider is asked for that ordering too, but the reply is filtered
    /// and sorted again here so the contract holds regardless.
    pub async fn list_events(&self, max_results: u32) -> Value {
        let token = match self.token().await {
            Ok(t) => t,
            Err(envelope) => return envelope,
        };
        let now = Utc::now();

        let listed = match self
            .api
            .list_events(&token, &now.to_rfc3339(), max_results)
            .await
        {
            Ok(v) => v,
            Err(err) => return error_envelope(&err.to_string()),
        };

        let items = listed
            .get("items")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut upcoming: Vec<(DateTime<Utc>, Value)> = Vec::new();
        for item in items {
            let start_raw = event_time_field(&item, "start");
            let Some(start) = parse_event_time(&start_raw) else {
                continue;
            };
            if start < now {
                continue;
            }
            upcoming.push((
                start,
                json!({
                    "id": item.get("id").cloned().unwrap_or(Value::Null),
                    "title": item.get("summary").cloned().unwrap_or(Value::Null),
                    "start": start_raw,
                    "end": event_time_field(&item, "end"),
                    "description": item.get("description").cloned().unwrap_or(Value::Null),
                    "html_link": item.get("htmlLink").cloned().unwrap_or(Value::Null),
                }),
            ));
        }
        upcoming.sort_by_key(|(start, _)| *start);
        upcoming.truncate(max_results as usize);

        let events: Vec<Value> = upcoming.into_iter().map(|(_, event)| event).collect();
        let count = events.len();
        json!({
            "success": true,
            "events": events,
            "message": format!("Found {} upcoming events", count),
        })
    }

    /// Fetch, overlay only the supplied fields, write the merged event back.
    pub async fn update_event(&self, event_id: &str, updates: &EventUpdates) -> Value {
        let token = match self.token().await {
            Ok(t) => t,
            Err(envelope) => return envelope,
        };
        let existing = match self.api.get_event(&token, event_id).await {
            Ok(v) => v,
            Err(err) => return error_envelope(&err.to_string()),
        };

        let mut merged = existing.as_object().cloned().unwrap_or_else(Map::new);
        if let Some(title) = &updates.title {
            merged.insert("summary".to_string(), json!(title));
        }
        if let Some(description) = &updates.description {
            merged.insert("description".to_string(), json!(description));
        }
        if let Some(start_time) = &updates.start_time {
            let Some(start) = parse_event_time(start_time) else {
                return error_envelope(&format!("Invalid start time: {start_time}"));
            };
            merged.insert(
                "start".to_string(),
                json!({ "dateTime": start.to_rfc3339(), "timeZone": EVENT_TIME_ZONE }),
            );
        }
        if let Some(end_time) = &updates.end_time {
            let Some(end) = parse_event_time(end_time) else {
                return error_envelope(&format!("Invalid end time: {end_time}"));
            };
            merged.insert(
                "end".to_string(),
                json!({ "dateTime": end.to_rfc3339(), "timeZone": EVENT_TIME_ZONE }),
            );
        }

        match self
            .api
            .update_event(&token, event_id, &Value::Object(merged))
            .await
        {
            Ok(updated) => json!({
                "success": true,
                "event_id": updated.get("id").and_then(Value::as_str).unwrap_or(event_id),
                "message": "Event updated successfully",
            }),
            Err(err) => error_envelope(&err.to_string()),
        }
    }

    pub async fn delete_event(&self, event_id: &str) -> Value {
        let token = match self.token().await {
            Ok(t) => t,
            Err(envelope) => return envelope,
        };
        match self.api.delete_event(&token, event_id).await {
            Ok(()) => json!({ "success": true, "message": "Event deleted successfully" }),
            Err(err) => error_envelope(&err.to_string()),
        }
    }

    /// Preview only. No provider call, no token needed, same input gives the
    /// same preview.
    pub fn confirm_event(&self, descriptor: &EventDescriptor) -> Value {
        let times = match validate_times(&descriptor.start_time, &descriptor.end_time) {
            Ok(t) => t,
            Err(message) => return error_envelope(&message),
        };

        let duration_minutes =
            ((times.end - times.start).num_milliseconds() as f64 / 60000.0).round() as i64;
        let attendees = if descriptor.attendees.is_empty() {
            "no attendees".to_string()
        } else {
            descriptor.attendees.join(", ")
        };
        let format = "%Y-%m-%d %H:%M %Z";
        let time_range = format!(
            "{} to {}",
            times.start.with_timezone(&Los_Angeles).format(format),
            times.end.with_timezone(&Los_Angeles).format(format),
        );

        json!({
            "success": true,
            "preview": {
                "title": descriptor.title,
                "time_range": time_range,
                "duration_minutes": duration_minutes,
                "attendees": attendees,
            },
            "message": CONFIRMATION_PROMPT,
        })
    }
}

/// Google nests times as {"dateTime": ...} for timed events and {"date": ...}
/// for all-day ones.
fn event_time_field(item: &Value, field: &str) -> String {
    item.get(field)
        .and_then(|slot| slot.get("dateTime").or_else(|| slot.get("date")))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
