//! Test utilities for integration tests
#![allow(dead_code)]

use chrono::NaiveDate;
use serde_json::{Value, json};

use smart_scheduler::ai::chat::Session;
use smart_scheduler::core::AppConfig;
use smart_scheduler::core::config::DEFAULT_SYSTEM_MESSAGE;
use smart_scheduler::google::Credentials;

/// Config with every external API pointed at `server_url`.
pub fn test_config(server_url: &str) -> AppConfig {
    AppConfig {
        openai_model: String::from("gpt-4o"),
        openai_api_hostname: server_url.to_string(),
        openai_api_key: String::from("test-api-key"),
        system_message: String::from(DEFAULT_SYSTEM_MESSAGE),
        google_client_id: String::from("test_client_id"),
        google_client_secret: String::from("test_client_secret"),
        google_redirect_uri: String::from("urn:ietf:wg:oauth:2.0:oob"),
        google_refresh_token: None,
        google_oauth_hostname: server_url.to_string(),
        calendar_api_hostname: server_url.to_string(),
        gmail_api_hostname: server_url.to_string(),
        calendar_id: String::from("primary"),
        timezone: String::from("Asia/Karachi"),
    }
}

/// Monday, June 10, 2024
pub fn test_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
}

/// A session that is already logged in and pinned to `test_today`.
pub fn test_session(server_url: &str) -> Session {
    let mut session = Session::builder(&test_config(server_url))
        .today(test_today())
        .build()
        .expect("Failed to build session");
    session.login(Credentials::new("test-access-token", Some("test-refresh-token")));
    session
}

/// Chat completion body with a plain assistant reply.
pub fn text_completion(content: &str) -> String {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
    .to_string()
}

/// Chat completion body calling `create_event` with raw `arguments`.
pub fn raw_tool_call_completion(arguments: &str) -> String {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_test",
                    "type": "function",
                    "function": {"name": "create_event", "arguments": arguments}
                }]
            },
            "finish_reason": "tool_calls"
        }]
    })
    .to_string()
}

pub fn tool_call_completion(arguments: Value) -> String {
    raw_tool_call_completion(&arguments.to_string())
}

pub fn event_response(id: &str) -> String {
    json!({
        "id": id,
        "status": "confirmed",
        "htmlLink": format!("https://www.google.com/calendar/event?eid={}", id),
        "hangoutLink": "https://meet.google.com/abc-defg-hij",
        "conferenceData": {
            "entryPoints": [{
                "entryPointType": "video",
                "uri": "https://meet.google.com/abc-defg-hij"
            }]
        }
    })
    .to_string()
}
