//! Intent extraction: ask the model whether the conversation so far
//! describes a meeting it can schedule, and turn its reply into either
//! text for the user or a `create_event` invocation.

use chrono::NaiveDate;
use serde_json::Value;
use thiserror::Error;

use super::models::Transcript;
use crate::ai::prompt::{FALLBACK_CLARIFICATION, today_fact};
use crate::ai::tools::{CreateEventArgs, CreateEventTool, MeetingRequest, MissingFields};
use crate::core::AppConfig;
use crate::openai::{CompletionMessage, completion};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Could not understand the model's reply: {0}")]
    Malformed(String),
    #[error(transparent)]
    Completion(#[from] anyhow::Error),
}

/// A model-proposed call to the offered tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionInvocation {
    pub id: String,
    pub name: String,
    pub args: CreateEventArgs,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// The model needs more from the user before it can act.
    Clarification(String),
    Invocation(ActionInvocation),
}

/// Interpret a chat completion response. A tool call wins over any
/// accompanying text; only the first tool call is considered.
pub fn parse_reply(resp: &Value, tool: &CreateEventTool) -> Result<Extraction, ExtractError> {
    let message = &resp["choices"][0]["message"];
    if message.is_null() {
        return Err(ExtractError::Malformed(format!(
            "No message in completion response: {}",
            resp
        )));
    }
    let message: CompletionMessage = serde_json::from_value(message.clone())
        .map_err(|e| ExtractError::Malformed(e.to_string()))?;

    if let Some(tool_calls) = message.tool_calls.filter(|calls| !calls.is_empty()) {
        if tool_calls.len() > 1 {
            tracing::warn!(
                "Received {} tool calls, only the first is used",
                tool_calls.len()
            );
        }
        let call = &tool_calls[0];
        tracing::debug!(
            "\nTool call: {}\nargs: {}",
            &call.function.name,
            &call.function.arguments
        );

        if call.function.name != tool.function_name() {
            return Err(ExtractError::Malformed(format!(
                "Received tool call that doesn't exist: {}",
                call.function.name
            )));
        }

        let arguments = call.function.arguments.trim();
        let arguments = if arguments.is_empty() { "{}" } else { arguments };
        let args: CreateEventArgs = serde_json::from_str(arguments).map_err(|e| {
            ExtractError::Malformed(format!("Invalid arguments {}: {}", arguments, e))
        })?;

        return Ok(Extraction::Invocation(ActionInvocation {
            id: call.id.clone(),
            name: call.function.name.clone(),
            args,
        }));
    }

    let content = message
        .content
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(FALLBACK_CLARIFICATION);

    Ok(Extraction::Clarification(content.to_string()))
}

pub struct IntentExtractor {
    api_hostname: String,
    api_key: String,
    model: String,
    tool: CreateEventTool,
}

impl IntentExtractor {
    pub fn new(api_hostname: &str, api_key: &str, model: &str) -> Self {
        Self {
            api_hostname: api_hostname.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            tool: CreateEventTool::new(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            &config.openai_api_hostname,
            &config.openai_api_key,
            &config.openai_model,
        )
    }

    /// The schema offered to the model on every turn.
    pub fn tool(&self) -> &CreateEventTool {
        &self.tool
    }

    /// Send the transcript, plus today's date as a context message
    /// that is not stored, and interpret the reply.
    pub async fn extract(
        &self,
        transcript: &Transcript,
        today: NaiveDate,
    ) -> Result<Extraction, ExtractError> {
        let messages = transcript.with_context(&today_fact(today));
        let resp = completion(
            &messages,
            std::slice::from_ref(&self.tool),
            &self.api_hostname,
            &self.api_key,
            &self.model,
        )
        .await?;

        parse_reply(&resp, &self.tool)
    }

    pub fn validate(&self, invocation: &ActionInvocation) -> Result<MeetingRequest, MissingFields> {
        invocation.args.validate(&self.tool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openai::{Message, Role};
    use mockito::Matcher;
    use serde_json::json;

    fn tool_call_reply(name: &str, arguments: &str) -> Value {
        json!({
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc123",
                        "type": "function",
                        "function": {"name": name, "arguments": arguments}
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        })
    }

    #[test]
    fn it_parses_a_clarification() {
        let resp = json!({"choices": [{"message": {"role": "assistant", "content": "Who should attend?"}}]});
        let extraction = parse_reply(&resp, &CreateEventTool::new()).unwrap();
        assert_eq!(
            extraction,
            Extraction::Clarification(String::from("Who should attend?"))
        );
    }

    #[test]
    fn it_falls_back_when_the_reply_is_empty() {
        let tool = CreateEventTool::new();
        for content in [json!(null), json!(""), json!("  \n")] {
            let resp = json!({"choices": [{"message": {"role": "assistant", "content": content}}]});
            assert_eq!(
                parse_reply(&resp, &tool).unwrap(),
                Extraction::Clarification(String::from(FALLBACK_CLARIFICATION))
            );
        }
    }

    #[test]
    fn it_parses_an_invocation() {
        let resp = tool_call_reply(
            "create_event",
            r#"{"summary":"Sync","start_time":"2024-06-11T15:00:00","end_time":"2024-06-11T16:00:00","attendees":["alice@x.com"]}"#,
        );
        let Extraction::Invocation(invocation) = parse_reply(&resp, &CreateEventTool::new()).unwrap()
        else {
            panic!("Expected an invocation");
        };
        assert_eq!(invocation.id, "call_abc123");
        assert_eq!(invocation.args.summary.as_deref(), Some("Sync"));
        assert_eq!(
            invocation.args.attendees,
            Some(vec![String::from("alice@x.com")])
        );
    }

    #[test]
    fn it_treats_empty_arguments_as_no_fields() {
        let tool = CreateEventTool::new();
        let resp = tool_call_reply("create_event", "");
        let Extraction::Invocation(invocation) = parse_reply(&resp, &tool).unwrap() else {
            panic!("Expected an invocation");
        };
        let missing = invocation.args.validate(&tool).unwrap_err();
        assert_eq!(missing.fields().len(), 4);
    }

    #[test]
    fn it_rejects_malformed_arguments() {
        let resp = tool_call_reply("create_event", r#"{"summary": "Sync""#);
        let err = parse_reply(&resp, &CreateEventTool::new()).unwrap_err();
        assert!(matches!(err, ExtractError::Malformed(_)));
    }

    #[test]
    fn it_rejects_unknown_tools() {
        let resp = tool_call_reply("delete_event", "{}");
        let err = parse_reply(&resp, &CreateEventTool::new()).unwrap_err();
        assert!(err.to_string().contains("delete_event"));
    }

    #[test]
    fn it_uses_only_the_first_tool_call() {
        let resp = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [
                        {
                            "id": "call_first",
                            "type": "function",
                            "function": {"name": "create_event", "arguments": r#"{"summary":"Sync"}"#}
                        },
                        {
                            "id": "call_second",
                            "type": "function",
                            "function": {"name": "delete_event", "arguments": "not json"}
                        }
                    ]
                }
            }]
        });
        let Extraction::Invocation(invocation) = parse_reply(&resp, &CreateEventTool::new()).unwrap()
        else {
            panic!("Expected an invocation");
        };
        assert_eq!(invocation.id, "call_first");
        assert_eq!(invocation.name, "create_event");
        assert_eq!(invocation.args.summary.as_deref(), Some("Sync"));
    }

    #[test]
    fn it_rejects_a_response_without_a_message() {
        let resp = json!({"error": {"message": "overloaded"}});
        let err = parse_reply(&resp, &CreateEventTool::new()).unwrap_err();
        assert!(matches!(err, ExtractError::Malformed(_)));
    }

    #[tokio::test]
    async fn it_sends_the_date_fact_and_the_tool() {
        let mut server = mockito::Server::new_async().await;
        let tool = serde_json::to_value(CreateEventTool::new()).unwrap();
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_body(Matcher::AllOf(vec![
                Matcher::PartialJson(json!({
                    "tools": [tool],
                    "tool_choice": "auto",
                })),
                Matcher::Regex(String::from("Today is Monday, June 10, 2024.")),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices": [{"message": {"role": "assistant", "content": "When?"}}]}"#)
            .create_async()
            .await;

        let extractor = IntentExtractor::new(&server.url(), "test-key", "gpt-4o");
        let mut transcript = Transcript::new_with_system_message("You schedule meetings.");
        transcript.push(Message::new(Role::User, "Set up a meeting"));
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();

        let extraction = extractor.extract(&transcript, today).await.unwrap();

        mock.assert_async().await;
        assert_eq!(extraction, Extraction::Clarification(String::from("When?")));
        assert_eq!(transcript.len(), 2);
    }
}
