// Wire types for the chat transports.
//
// Inbound frames are JSON objects carrying either a chat `message` or a
// `tool` call; outbound frames carry exactly one of `response`, `result`
// or `error`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Inbound requests
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("request must be a JSON object")]
    NotAnObject,

    #[error("request needs a string `message` or a `tool` field")]
    MissingField,

    #[error("invalid tool call: {0}")]
    InvalidTool(String),
}

/// Read-only tool operations. None of them touches the draft state.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum ToolCall {
    FetchPlayerStats { player_name: String },
    DraftStrategy,
    ReferenceContext,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClientRequest {
    Chat { message: String },
    Tool(ToolCall),
}

impl ClientRequest {
    /// Parse one inbound text frame. A `tool` field takes precedence over
    /// `message` when both are present.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| ProtocolError::InvalidJson(e.to_string()))?;
        let object = value.as_object().ok_or(ProtocolError::NotAnObject)?;

        if object.contains_key("tool") {
            let call: ToolCall = serde_json::from_value(value)
                .map_err(|e| ProtocolError::InvalidTool(e.to_string()))?;
            return Ok(ClientRequest::Tool(call));
        }

        match object.get("message").and_then(Value::as_str) {
            Some(message) => Ok(ClientRequest::Chat {
                message: message.to_string(),
            }),
            None => Err(ProtocolError::MissingField),
        }
    }
}

// ---------------------------------------------------------------------------
// Outbound responses
// ---------------------------------------------------------------------------

/// A single outbound frame: `{"response": ..}`, `{"result": ..}` or
/// `{"error": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerResponse {
    Response(String),
    Result(Value),
    Error(String),
}

impl ServerResponse {
    pub fn to_json(&self) -> String {
        // Serializing a String or Value cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"error":"serialization failed"}"#.into())
    }
}
