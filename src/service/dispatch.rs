use serde_json::Value;

use crate::models::event::{EventDescriptor, EventUpdates};
use crate::service::calendar_service::{CalendarService, error_envelope};
use crate::service::interpreter::{Interpretation, Interpreter};

pub const DEFAULT_LIST_MAX_RESULTS: u32 = 10;

/// Structured-mode entry point: fixed table of five tool names, external
/// snake_case fields mapped onto adapter inputs. Unknown names come back as
/// an error envelope, never a panic.
pub async fn dispatch_tool(calendar: &CalendarService, tool_name: &str, parameters: &Value) -> Value {
    match tool_name {
        "create_calendar_event" => match descriptor_from_params(parameters) {
            Ok(descriptor) => calendar.create_event(&descriptor).await,
            Err(envelope) => envelope,
        },
        "list_calendar_events" => {
            let max_results = parameters
                .get("max_results")
                .and_then(Value::as_u64)
                .unwrap_or(DEFAULT_LIST_MAX_RESULTS as u64) as u32;
            calendar.list_events(max_results).await
        }
        "update_calendar_event" => {
            let Some(event_id) = param_str(parameters, "event_id") else {
                return error_envelope("Missing required field: event_id");
            };
            let updates = EventUpdates {
                title: param_str(parameters, "title"),
                start_time: param_str(parameters, "start_time"),
                end_time: param_str(parameters, "end_time"),
                description: param_str(parameters, "description"),
            };
            calendar.update_event(&event_id, &updates).await
        }
        "delete_calendar_event" => {
            let Some(event_id) = param_str(parameters, "event_id") else {
                return error_envelope("Missing required field: event_id");
            };
            calendar.delete_event(&event_id).await
        }
        "confirm_calendar_event" => match descriptor_from_params(parameters) {
            Ok(descriptor) => calendar.confirm_event(&descriptor),
            Err(envelope) => envelope,
        },
        _ => error_envelope(&format!("Unknown tool: {}", tool_name)),
    }
}

/// Natural-language pipeline: interpret, dispatch, render a chat string.
/// Clarifying questions are echoed back as-is.
pub async fn answer_text_request(
    interpreter: &dyn Interpreter,
    calendar: &CalendarService,
    text: &str,
) -> String {
    match interpreter.interpret(text).await {
        Ok(Interpretation::Clarification(question)) => question,
        Ok(Interpretation::ToolCall {
            tool_name,
            parameters,
        }) => {
            let result = dispatch_tool(calendar, &tool_name, &parameters).await;
            format_for_chat(&result)
        }
        Err(message) => format!("❌ {}", message),
    }
}

/// Human-readable rendering of an envelope for chat surfaces, prefixed with
/// a success or failure marker.
pub fn format_for_chat(result: &Value) -> String {
    let success = result
        .get("success")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if !success {
        let error = result
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("Something went wrong");
        return format!("❌ {}", error);
    }

    if let Some(events) = result.get("events").and_then(Value::as_array) {
        if events.is_empty() {
            return "✅ No upcoming events found.".to_string();
        }
        let mut lines = vec![format!("✅ Found {} upcoming events:", events.len())];
        for event in events {
            let title = event
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or("(no title)");
            let start = event.get("start").and_then(Value::as_str).unwrap_or("?");
            lines.push(format!("• {} at {}", title, start));
        }
        return lines.join("\n");
    }

    if let Some(preview) = result.get("preview") {
        let title = preview
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or("(no title)");
        let time_range = preview
            .get("time_range")
            .and_then(Value::as_str)
            .unwrap_or("?");
        let duration = preview
            .get("duration_minutes")
            .and_then(Value::as_i64)
            .unwrap_or(0);
        let attendees = preview
            .get("attendees")
            .and_then(Value::as_str)
            .unwrap_or("no attendees");
        let prompt = result.get("message").and_then(Value::as_str).unwrap_or("");
        return format!(
            "✅ {}: {} ({} minutes) with {}.\n{}",
            title, time_range, duration, attendees, prompt
        );
    }

    let message = result
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("Done");
    format!("✅ {}", message)
}

fn param_str(parameters: &Value, key: &str) -> Option<String> {
    parameters
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .filter(|s| !s.is_empty())
}

fn descriptor_from_params(parameters: &Value) -> Result<EventDescriptor, Value> {
    let title =
        param_str(parameters, "title").ok_or_else(|| error_envelope("Missing required field: title"))?;
    let start_time = param_str(parameters, "start_time")
        .ok_or_else(|| error_envelope("Missing required field: start_time"))?;
    let end_time = param_str(parameters, "end_time")
        .ok_or_else(|| error_envelope("Missing required field: end_time"))?;
    let attendees = parameters
        .get("attendees")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(EventDescriptor {
        title,
        start_time,
        end_time,
        description: param_str(parameters, "description"),
        attendees,
    })
}
