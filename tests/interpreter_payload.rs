use std::sync::Arc;

use calendarAgent::clients::ClientError;
use calendarAgent::models::token::TokenSet;
use calendarAgent::service::calendar_service::{CalendarApi, CalendarService};
use calendarAgent::service::dispatch::answer_text_request;
use calendarAgent::service::interpreter::{
    Interpretation, Interpreter, parse_interpreter_payload,
};
use calendarAgent::service::session::SessionStore;
use serde_json::{Value, json};

#[test]
fn payload_with_tool_name_parses_as_tool_call() {
    let payload = r#"{"tool_name":"list_calendar_events","parameters":{"max_results":5}}"#;
    let parsed = parse_interpreter_payload(payload).unwrap();
    match parsed {
        Interpretation::ToolCall {
            tool_name,
            parameters,
        } => {
            assert_eq!(tool_name, "list_calendar_events");
            assert_eq!(parameters["max_results"], json!(5));
        }
        other => panic!("expected tool call, got {:?}", other),
    }
}

#[test]
fn payload_with_clarification_wins_over_tool_name() {
    let payload = r#"{"clarification":"Which day did you mean?"}"#;
    assert_eq!(
        parse_interpreter_payload(payload),
        Some(Interpretation::Clarification(
            "Which day did you mean?".to_string()
        ))
    );
}

#[test]
fn non_json_payload_parses_as_none() {
    assert_eq!(parse_interpreter_payload("sure, done!"), None);
    assert_eq!(parse_interpreter_payload("{}"), None);
}

struct ScriptedInterpreter {
    reply: Result<Interpretation, String>,
}

#[async_trait::async_trait]
impl Interpreter for ScriptedInterpreter {
    async fn interpret(&self, _text: &str) -> Result<Interpretation, String> {
        self.reply.clone()
    }
}

struct EmptyApi;

#[async_trait::async_trait]
impl CalendarApi for EmptyApi {
    async fn insert_event(&self, _access_token: &str, _body: &Value) -> Result<Value, ClientError> {
        Ok(json!({ "id": "evt", "htmlLink": "" }))
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
        Ok(json!({}))
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
    CalendarService::new(Arc::new(EmptyApi), session)
}

#[tokio::test]
async fn clarifying_question_is_echoed_verbatim() {
    let interpreter = ScriptedInterpreter {
        reply: Ok(Interpretation::Clarification(
            "What time should the meeting start?".to_string(),
        )),
    };
    let calendar = calendar().await;

    let answer = answer_text_request(&interpreter, &calendar, "schedule a meeting").await;

    assert_eq!(answer, "What time should the meeting start?");
}

#[tokio::test]
async fn interpreter_failure_renders_as_failure_message() {
    let interpreter = ScriptedInterpreter {
        reply: Err("Language service timed out after 25 seconds".to_string()),
    };
    let calendar = calendar().await;

    let answer = answer_text_request(&interpreter, &calendar, "book something").await;

    assert_eq!(answer, "❌ Language service timed out after 25 seconds");
}

#[tokio::test]
async fn tool_call_result_is_rendered_for_chat() {
    let interpreter = ScriptedInterpreter {
        reply: Ok(Interpretation::ToolCall {
            tool_name: "list_calendar_events".to_string(),
            parameters: json!({}),
        }),
    };
    let calendar = calendar().await;

    let answer = answer_text_request(&interpreter, &calendar, "what's coming up?").await;

    assert_eq!(answer, "✅ No upcoming events found.");
}

#[tokio::test]
async fn unknown_tool_from_model_is_reported_not_thrown() {
    let interpreter = ScriptedInterpreter {
        reply: Ok(Interpretation::ToolCall {
            tool_name: "summon_meeting".to_string(),
            parameters: json!({}),
        }),
    };
    let calendar = calendar().await;

    let answer = answer_text_request(&interpreter, &calendar, "summon it").await;

    assert_eq!(answer, "❌ Unknown tool: summon_meeting");
}
