//! Chat-completions client for an OpenAI-compatible API.
//!
//! Covers the three call modes the relay needs:
//! - [`OpenAiClient::complete`]: one non-streaming user turn
//! - [`OpenAiClient::stream`]: incremental text deltas parsed from SSE
//! - [`OpenAiClient::call_tool`]: a completion with a forced function call

use bytes::{Buf, BytesMut};
use futures::future::ready;
use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::config::OpenAiConfig;
use crate::providers::{check_status, ProviderError};

/// Stream of text fragments in the order the provider sent them.
pub type DeltaStream = BoxStream<'static, Result<String, ProviderError>>;

/// Client bound to the server's own credential. Immutable after construction.
#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

// ─── Wire Types ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

/// A callable tool declaration.
#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema of the arguments object.
    pub parameters: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Tool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

/// A function call returned by the model.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCall {
    pub function: FunctionCall,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded arguments object.
    pub arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    delta: ChunkDelta,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

// ─── Client ────────────────────────────────────────────────────────────────

impl OpenAiClient {
    pub fn new(http: reqwest::Client, api_key: impl Into<String>, config: &OpenAiConfig) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send(&self, body: &ChatCompletionRequest<'_>) -> Result<reqwest::Response, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(url = %url, model = body.model, stream = body.stream, "Chat completion call");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        check_status(response).await
    }

    /// Send `message` as a single user turn and return the reply text.
    pub async fn complete(&self, message: &str) -> Result<String, ProviderError> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage::user(message)],
            stream: false,
            tools: None,
            tool_choice: None,
        };

        let response: ChatCompletionResponse = self.send(&body).await?.json().await?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or(ProviderError::EmptyResponse)?;

        Ok(choice.message.content.unwrap_or_default())
    }

    /// Open a streaming completion for `message`.
    ///
    /// Yields each non-empty `delta.content` as it arrives and ends at the
    /// provider's `[DONE]` line or at end of body, whichever comes first.
    pub async fn stream(&self, message: &str) -> Result<DeltaStream, ProviderError> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage::user(message)],
            stream: true,
            tools: None,
            tool_choice: None,
        };

        let response = self.send(&body).await?;
        Ok(delta_stream(response.bytes_stream()))
    }

    /// Run a completion that must call `tool`. Returns the first tool call, if any.
    pub async fn call_tool(
        &self,
        system: &str,
        message: &str,
        tool: Tool,
    ) -> Result<Option<ToolCall>, ProviderError> {
        let tool_choice = json!({
            "type": "function",
            "function": {"name": tool.function.name},
        });

        let body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage::system(system), ChatMessage::user(message)],
            stream: false,
            tools: Some(vec![tool]),
            tool_choice: Some(tool_choice),
        };

        let response: ChatCompletionResponse = self.send(&body).await?.json().await?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or(ProviderError::EmptyResponse)?;

        Ok(choice
            .message
            .tool_calls
            .and_then(|calls| calls.into_iter().next()))
    }
}

// ─── SSE Parsing ───────────────────────────────────────────────────────────

/// One `data:` payload from the provider's event stream.
#[derive(Debug, PartialEq, Eq)]
pub enum SseData {
    Message(String),
    Done,
}

/// Splits a byte stream into SSE `data:` payloads.
///
/// Lines may be split across network chunks; incomplete lines stay buffered
/// until their terminating newline arrives.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: BytesMut,
}

impl SseDecoder {
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseData> {
        self.buffer.extend_from_slice(chunk);

        let mut out = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line = self.buffer.split_to(pos);
            self.buffer.advance(1);

            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches('\r');
            let Some(data) = line.strip_prefix("data:") else {
                continue;
            };
            let data = data.strip_prefix(' ').unwrap_or(data);

            if data == "[DONE]" {
                out.push(SseData::Done);
            } else {
                out.push(SseData::Message(data.to_string()));
            }
        }
        out
    }
}

fn parse_delta(data: &str) -> Result<Option<String>, ProviderError> {
    let chunk: ChatCompletionChunk = serde_json::from_str(data)?;
    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty()))
}

fn delta_stream<S>(bytes: S) -> DeltaStream
where
    S: futures::Stream<Item = reqwest::Result<bytes::Bytes>> + Send + 'static,
{
    bytes
        .scan(SseDecoder::default(), |decoder, chunk| {
            let items: Vec<Result<SseData, ProviderError>> = match chunk {
                Ok(bytes) => decoder.feed(&bytes).into_iter().map(Ok).collect(),
                Err(e) => vec![Err(ProviderError::Http(e))],
            };
            ready(Some(stream::iter(items)))
        })
        .flatten()
        .take_while(|item| ready(!matches!(item, Ok(SseData::Done))))
        .filter_map(|item| {
            ready(match item {
                Ok(SseData::Message(data)) => parse_delta(&data).transpose(),
                Ok(SseData::Done) => None,
                Err(e) => Some(Err(e)),
            })
        })
        .boxed()
}
