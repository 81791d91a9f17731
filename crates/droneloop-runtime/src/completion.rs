//! [`CompletionService`] – the turn-based model endpoint.
//!
//! [`ResponsesClient`] speaks the OpenAI Responses API.  Context is carried
//! between requests with the response id, which the driver stores as an
//! opaque [`ContinuationToken`].
//!
//! # Example
//!
//! ```rust,no_run
//! use droneloop_runtime::completion::ResponsesClient;
//!
//! let client = ResponsesClient::new("https://api.openai.com", "gpt-4o-mini", "sk-...");
//! // Requires network access and a valid key – skipped in unit tests.
//! ```

use async_trait::async_trait;
use droneloop_types::{
    ActionResult, ContinuationToken, ConversationItem, DroneError, ProposedAction,
    SituationSnapshot, ToolSpec,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

// ─────────────────────────────────────────────────────────────────────────────
// Error type
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can arise while talking to the completion service.
#[derive(Error, Debug)]
pub enum CompletionError {
    /// The HTTP request failed or returned a non-success status.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// The response could not be interpreted.
    #[error("Unexpected response format: {0}")]
    BadResponse(String),
}

impl From<CompletionError> for DroneError {
    fn from(e: CompletionError) -> Self {
        DroneError::Completion(e.to_string())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Service contract
// ─────────────────────────────────────────────────────────────────────────────

/// Everything sent to the model for one request.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub instructions: &'a str,
    /// Items of the current turn, in order.
    pub items: &'a [ConversationItem],
    pub tools: &'a [ToolSpec],
    /// Context of every previously resolved situation, if any.
    pub previous: Option<&'a ContinuationToken>,
}

/// One entry of the model's ordered output.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputItem {
    /// Plain text for the operator.
    Message(String),
    ActionProposal(ProposedAction),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    /// Token to resume from once this situation is resolved.
    pub id: ContinuationToken,
    pub output: Vec<OutputItem>,
}

#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(
        &self,
        request: CompletionRequest<'_>,
    ) -> Result<CompletionResponse, CompletionError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire shapes
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    instructions: &'a str,
    input: Vec<InputItem<'a>>,
    tools: Vec<FunctionTool<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    previous_response_id: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum InputItem<'a> {
    Message {
        role: &'static str,
        content: Vec<ContentPart>,
    },
    FunctionCall {
        call_id: &'a str,
        name: &'a str,
        arguments: &'a str,
    },
    FunctionCallOutput {
        call_id: &'a str,
        output: String,
    },
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    InputText { text: String },
    InputImage { image_url: String },
}

#[derive(Serialize)]
struct FunctionTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    name: &'a str,
    description: &'a str,
    parameters: &'a Value,
    strict: bool,
}

#[derive(Deserialize)]
struct ResponsesResponse {
    id: String,
    #[serde(default)]
    output: Vec<RawOutputItem>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RawOutputItem {
    Message {
        #[serde(default)]
        content: Vec<RawContent>,
    },
    FunctionCall {
        call_id: String,
        name: String,
        #[serde(default)]
        arguments: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RawContent {
    OutputText { text: String },
    Refusal { refusal: String },
    #[serde(other)]
    Other,
}

fn situation_message(snapshot: &SituationSnapshot) -> InputItem<'static> {
    let mut content = vec![ContentPart::InputText {
        text: snapshot.describe(),
    }];
    if let Some(image) = &snapshot.image {
        content.push(ContentPart::InputImage {
            image_url: image.to_data_url(),
        });
    }
    InputItem::Message {
        role: "user",
        content,
    }
}

fn result_output(result: &ActionResult) -> InputItem<'_> {
    InputItem::FunctionCallOutput {
        call_id: &result.call_id,
        output: result.output(),
    }
}

/// Serialize `request` into a Responses API body for `model`.
pub fn build_request_body(model: &str, request: &CompletionRequest<'_>) -> Value {
    let input = request
        .items
        .iter()
        .map(|item| match item {
            ConversationItem::Situation(snapshot) => situation_message(snapshot),
            ConversationItem::ProposedAction(action) => InputItem::FunctionCall {
                call_id: &action.call_id,
                name: &action.name,
                arguments: &action.arguments,
            },
            ConversationItem::ActionResult(result) => result_output(result),
        })
        .collect();

    let tools = request
        .tools
        .iter()
        .map(|spec| FunctionTool {
            kind: "function",
            name: &spec.name,
            description: &spec.description,
            parameters: &spec.parameters,
            strict: spec.strict,
        })
        .collect();

    let body = ResponsesRequest {
        model,
        instructions: request.instructions,
        input,
        tools,
        previous_response_id: request.previous.map(ContinuationToken::as_str),
    };
    serde_json::to_value(body).unwrap_or(Value::Null)
}

/// Interpret a Responses API body.
///
/// Message parts are joined into one [`OutputItem::Message`] per message
/// item; output item types other than messages and function calls are
/// skipped.
pub fn parse_output(body: Value) -> Result<CompletionResponse, CompletionError> {
    let response: ResponsesResponse = serde_json::from_value(body)
        .map_err(|e| CompletionError::BadResponse(e.to_string()))?;

    if let Some(error) = response.error.filter(|e| !e.is_null()) {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(CompletionError::BadResponse(message));
    }

    let mut output = Vec::with_capacity(response.output.len());
    for item in response.output {
        match item {
            RawOutputItem::Message { content } => {
                let text: Vec<String> = content
                    .into_iter()
                    .filter_map(|part| match part {
                        RawContent::OutputText { text } => Some(text),
                        RawContent::Refusal { refusal } => Some(refusal),
                        RawContent::Other => None,
                    })
                    .collect();
                if !text.is_empty() {
                    output.push(OutputItem::Message(text.join("\n")));
                }
            }
            RawOutputItem::FunctionCall {
                call_id,
                name,
                arguments,
            } => output.push(OutputItem::ActionProposal(ProposedAction {
                call_id,
                name,
                arguments,
            })),
            RawOutputItem::Other => {}
        }
    }

    Ok(CompletionResponse {
        id: ContinuationToken::new(response.id),
        output,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// ResponsesClient
// ─────────────────────────────────────────────────────────────────────────────

/// Async client for `POST {base_url}/v1/responses`.
pub struct ResponsesClient {
    base_url: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

impl ResponsesClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionService for ResponsesClient {
    async fn complete(
        &self,
        request: CompletionRequest<'_>,
    ) -> Result<CompletionResponse, CompletionError> {
        let url = format!("{}/v1/responses", self.base_url);
        let body = build_request_body(&self.model, &request);
        debug!(
            url = %url,
            items = request.items.len(),
            tools = request.tools.len(),
            resumed = request.previous.is_some(),
            "sending completion request"
        );

        let mut builder = self.client.post(&url).json(&body);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }

        let response: Value = builder.send().await?.error_for_status()?.json().await?;
        parse_output(response)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use droneloop_types::{Image, SessionState};
    use serde_json::json;

    fn snapshot(image: Option<Image>) -> SituationSnapshot {
        SituationSnapshot {
            session_id: SessionState::new().id,
            captured_at: chrono::Utc::now(),
            image,
            altitude_m: 12.5,
            heading_deg: 90.0,
            briefing: None,
        }
    }

    fn tool() -> ToolSpec {
        ToolSpec {
            name: "land".to_string(),
            description: "Land the drone.".to_string(),
            parameters: json!({"type": "object", "properties": {}, "required": [], "additionalProperties": false}),
            strict: true,
        }
    }

    #[test]
    fn request_body_carries_every_item_in_order() {
        let action = ProposedAction {
            call_id: "call_7".to_string(),
            name: "land".to_string(),
            arguments: "{}".to_string(),
        };
        let items = vec![
            ConversationItem::Situation(snapshot(Some(Image::png(vec![1, 2, 3])))),
            ConversationItem::ProposedAction(action),
            ConversationItem::ActionResult(ActionResult::overridden("call_7", "not yet")),
        ];
        let tools = vec![tool()];
        let token = ContinuationToken::new("resp_1");
        let request = CompletionRequest {
            instructions: "fly",
            items: &items,
            tools: &tools,
            previous: Some(&token),
        };

        let body = build_request_body("gpt-test", &request);
        assert_eq!(body["model"], "gpt-test");
        assert_eq!(body["instructions"], "fly");
        assert_eq!(body["previous_response_id"], "resp_1");

        let input = body["input"].as_array().unwrap();
        assert_eq!(input.len(), 3);
        assert_eq!(input[0]["type"], "message");
        assert_eq!(input[0]["role"], "user");
        assert_eq!(input[0]["content"][0]["type"], "input_text");
        assert_eq!(input[0]["content"][0]["text"], "Altitude: 12.5\nHeading: 90");
        assert_eq!(input[0]["content"][1]["type"], "input_image");
        assert!(
            input[0]["content"][1]["image_url"]
                .as_str()
                .unwrap()
                .starts_with("data:image/png;base64,")
        );
        assert_eq!(input[1], json!({"type": "function_call", "call_id": "call_7", "name": "land", "arguments": "{}"}));
        assert_eq!(input[2], json!({"type": "function_call_output", "call_id": "call_7", "output": "not yet"}));

        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["name"], "land");
        assert_eq!(body["tools"][0]["strict"], true);
    }

    #[test]
    fn first_request_omits_previous_response_id() {
        let items = vec![ConversationItem::Situation(snapshot(None))];
        let request = CompletionRequest {
            instructions: "fly",
            items: &items,
            tools: &[],
            previous: None,
        };
        let body = build_request_body("gpt-test", &request);
        assert!(body.get("previous_response_id").is_none());
        assert_eq!(body["input"][0]["content"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn parse_output_preserves_order_and_kinds() {
        let body = json!({
            "id": "resp_42",
            "output": [
                {"type": "reasoning", "summary": []},
                {"type": "message", "role": "assistant", "content": [
                    {"type": "output_text", "text": "Taking off, then moving ahead."}
                ]},
                {"type": "function_call", "call_id": "call_a", "name": "takeoff", "arguments": "{}"},
                {"type": "function_call", "call_id": "call_b", "name": "move",
                 "arguments": "{\"direction\":\"forward\",\"distance\":2}"}
            ]
        });
        let parsed = parse_output(body).unwrap();
        assert_eq!(parsed.id, ContinuationToken::new("resp_42"));
        assert_eq!(parsed.output.len(), 3);
        assert_eq!(
            parsed.output[0],
            OutputItem::Message("Taking off, then moving ahead.".to_string())
        );
        match (&parsed.output[1], &parsed.output[2]) {
            (OutputItem::ActionProposal(a), OutputItem::ActionProposal(b)) => {
                assert_eq!(a.call_id, "call_a");
                assert_eq!(b.name, "move");
                assert_eq!(b.arguments, "{\"direction\":\"forward\",\"distance\":2}");
            }
            other => panic!("unexpected output: {other:?}"),
        }
    }

    #[test]
    fn parse_output_without_items_is_empty() {
        let parsed = parse_output(json!({"id": "resp_1"})).unwrap();
        assert!(parsed.output.is_empty());
    }

    #[test]
    fn parse_output_surfaces_service_error() {
        let body = json!({"id": "resp_1", "error": {"message": "rate limited"}, "output": []});
        match parse_output(body) {
            Err(CompletionError::BadResponse(msg)) => assert_eq!(msg, "rate limited"),
            other => panic!("expected BadResponse, got {other:?}"),
        }
    }

    #[test]
    fn parse_output_rejects_missing_id() {
        assert!(matches!(
            parse_output(json!({"output": []})),
            Err(CompletionError::BadResponse(_))
        ));
    }

    #[test]
    fn completion_error_becomes_drone_error() {
        let err: DroneError = CompletionError::BadResponse("boom".to_string()).into();
        assert!(matches!(err, DroneError::Completion(ref m) if m.contains("boom")));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_http_error() {
        let client = ResponsesClient::new("http://127.0.0.1:9/", "gpt-test", "");
        assert_eq!(client.model(), "gpt-test");
        let request = CompletionRequest {
            instructions: "",
            items: &[],
            tools: &[],
            previous: None,
        };
        assert!(matches!(
            client.complete(request).await,
            Err(CompletionError::Http(_))
        ));
    }
}
