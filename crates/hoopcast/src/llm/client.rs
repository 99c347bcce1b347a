// Claude API streaming client using reqwest-eventsource.
//
// Sends a single user message to the Anthropic Messages API with
// `stream: true` and folds the Server-Sent Events into a `Completion`.
// `CompletionService` is the seam the draft session talks to: it drives the
// stream to completion and hands back one text segment per content block.

use std::collections::BTreeMap;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest_eventsource::{Event, RequestBuilderExt};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

// ---------------------------------------------------------------------------
// Error and result types
// ---------------------------------------------------------------------------

/// A finished stream. One segment per text content block, in block order.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub segments: Vec<String>,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LlmError {
    #[error("LLM not configured")]
    NotConfigured,

    #[error("failed to create event source: {0}")]
    Request(String),

    #[error("API returned status {0}")]
    Status(u16),

    #[error("network error: {0}")]
    Transport(String),

    #[error("stream error: {0}")]
    Stream(String),

    #[error("stream ended unexpectedly without any content")]
    EmptyStream,
}

// ---------------------------------------------------------------------------
// Completion seam
// ---------------------------------------------------------------------------

/// A text-completion backend: prompt in, ordered text segments out.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<Vec<String>, LlmError>;
}

// ---------------------------------------------------------------------------
// ClaudeClient
// ---------------------------------------------------------------------------

/// Low-level Claude API streaming client.
pub struct ClaudeClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl ClaudeClient {
    /// Create a new client with the given API key and model identifier.
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            model,
            endpoint: ANTHROPIC_API_URL.to_string(),
        }
    }

    /// Point the client at a different Messages endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Send `user_content` as the only message and stream the response,
    /// accumulating text deltas per content block.
    pub async fn stream_message(
        &self,
        user_content: &str,
        max_tokens: u32,
    ) -> Result<Completion, LlmError> {
        if self.api_key.is_empty() {
            return Err(LlmError::NotConfigured);
        }

        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": max_tokens,
            "stream": true,
            "messages": [{ "role": "user", "content": user_content }]
        });

        let request = self
            .http
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body);

        let mut es = request
            .eventsource()
            .map_err(|e| LlmError::Request(e.to_string()))?;

        let mut blocks: BTreeMap<usize, String> = BTreeMap::new();
        let mut input_tokens: u32 = 0;
        let mut output_tokens: u32 = 0;

        while let Some(event) = es.next().await {
            match event {
                Ok(Event::Open) => {
                    debug!("SSE connection opened");
                }
                Ok(Event::Message(msg)) => {
                    let event_type = msg.event.as_str();
                    let data = &msg.data;

                    match event_type {
                        "message_start" => {
                            match parse_input_tokens(data) {
                                Some(n) => input_tokens = n,
                                None => warn!("failed to parse input_tokens from message_start"),
                            }
                            debug!(input_tokens, "message_start");
                        }
                        "content_block_delta" => {
                            if let Some(text) = parse_delta_text(data) {
                                let block = parse_block_index(data).unwrap_or(0);
                                blocks.entry(block).or_default().push_str(&text);
                            }
                        }
                        "message_delta" => {
                            match parse_output_tokens(data) {
                                Some(n) => output_tokens = n,
                                None => warn!("failed to parse output_tokens from message_delta"),
                            }
                            debug!(output_tokens, "message_delta");
                        }
                        "message_stop" => {
                            debug!("message_stop, streaming complete");
                            es.close();
                            break;
                        }
                        "error" => {
                            es.close();
                            return Err(LlmError::Stream(parse_stream_error(data)));
                        }
                        // Ignore ping, content_block_start, content_block_stop, etc.
                        _ => {
                            debug!(event_type, "ignoring SSE event");
                        }
                    }
                }
                Err(reqwest_eventsource::Error::StreamEnded) => {
                    debug!("SSE stream ended before message_stop");
                    es.close();
                    break;
                }
                Err(err) => {
                    warn!(?err, "SSE stream error");
                    es.close();
                    return Err(classify_stream_error(&err));
                }
            }
        }

        // Text received before a missing message_stop still counts.
        if blocks.is_empty() {
            return Err(LlmError::EmptyStream);
        }
        Ok(Completion {
            segments: blocks.into_values().collect(),
            input_tokens,
            output_tokens,
        })
    }
}

#[async_trait]
impl CompletionService for ClaudeClient {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<Vec<String>, LlmError> {
        let completion = self.stream_message(prompt, max_tokens).await?;
        debug!(
            input_tokens = completion.input_tokens,
            output_tokens = completion.output_tokens,
            blocks = completion.segments.len(),
            "completion finished"
        );
        Ok(completion.segments)
    }
}

// ---------------------------------------------------------------------------
// LlmClient wrapper
// ---------------------------------------------------------------------------

/// High-level wrapper that can be either an active Claude client or disabled.
pub enum LlmClient {
    /// Claude API is configured and ready.
    Active(ClaudeClient),
    /// LLM functionality is disabled (no API key configured).
    Disabled,
}

impl LlmClient {
    /// Build an `LlmClient` from the application config.
    ///
    /// Returns `Active` if an API key is present in credentials, otherwise
    /// returns `Disabled`.
    pub fn from_config(config: &Config) -> Self {
        match &config.credentials.anthropic_api_key {
            Some(key) if !key.is_empty() => {
                LlmClient::Active(ClaudeClient::new(key.clone(), config.llm.model.clone()))
            }
            _ => LlmClient::Disabled,
        }
    }
}

#[async_trait]
impl CompletionService for LlmClient {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<Vec<String>, LlmError> {
        match self {
            LlmClient::Active(client) => client.complete(prompt, max_tokens).await,
            LlmClient::Disabled => Err(LlmError::NotConfigured),
        }
    }
}

// ---------------------------------------------------------------------------
// SSE JSON parsing helpers
// ---------------------------------------------------------------------------

/// Extract `input_tokens` from a `message_start` event's JSON.
///
/// Expected shape: `{ "type": "message_start", "message": { "usage": { "input_tokens": N } } }`
pub(crate) fn parse_input_tokens(data: &str) -> Option<u32> {
    let v: Value = serde_json::from_str(data).ok()?;
    v.get("message")?
        .get("usage")?
        .get("input_tokens")?
        .as_u64()
        .map(|n| n as u32)
}

/// Extract `delta.text` from a `content_block_delta` event's JSON.
///
/// Expected shape: `{ "type": "content_block_delta", "delta": { "type": "text_delta", "text": "..." } }`
pub(crate) fn parse_delta_text(data: &str) -> Option<String> {
    let v: Value = serde_json::from_str(data).ok()?;
    v.get("delta")?
        .get("text")?
        .as_str()
        .map(|s| s.to_string())
}

/// Extract the content block `index` from a `content_block_delta` event.
pub(crate) fn parse_block_index(data: &str) -> Option<usize> {
    let v: Value = serde_json::from_str(data).ok()?;
    v.get("index")?.as_u64().map(|n| n as usize)
}

/// Extract `output_tokens` from a `message_delta` event's JSON.
///
/// Expected shape: `{ "type": "message_delta", "usage": { "output_tokens": N } }`
pub(crate) fn parse_output_tokens(data: &str) -> Option<u32> {
    let v: Value = serde_json::from_str(data).ok()?;
    v.get("usage")?
        .get("output_tokens")?
        .as_u64()
        .map(|n| n as u32)
}

/// Message of an in-stream `error` event, or the raw payload if it has none.
///
/// Expected shape: `{ "type": "error", "error": { "type": "overloaded_error", "message": "..." } }`
fn parse_stream_error(data: &str) -> String {
    serde_json::from_str::<Value>(data)
        .ok()
        .and_then(|v| {
            v.get("error")?
                .get("message")?
                .as_str()
                .map(|s| s.to_string())
        })
        .unwrap_or_else(|| data.to_string())
}

fn classify_stream_error(err: &reqwest_eventsource::Error) -> LlmError {
    match err {
        reqwest_eventsource::Error::InvalidStatusCode(status, _response) => {
            LlmError::Status(status.as_u16())
        }
        reqwest_eventsource::Error::Transport(e) => LlmError::Transport(e.to_string()),
        other => LlmError::Stream(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
