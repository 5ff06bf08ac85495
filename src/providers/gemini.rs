//! Image generation through the Gemini `generateContent` API.
//!
//! The server never holds a Gemini credential. [`GeminiConnector`] carries
//! only the endpoint and a pooled HTTP client; each request builds its own
//! [`GeminiClient`] from the caller's key and drops it when the request ends.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GeminiConfig;
use crate::providers::{check_status, ProviderError};

/// Credential-free factory for request-scoped clients.
#[derive(Debug, Clone)]
pub struct GeminiConnector {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl GeminiConnector {
    pub fn new(http: reqwest::Client, config: &GeminiConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.image_model.clone(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Build a client authenticated with a caller-supplied key.
    pub fn with_api_key(&self, api_key: impl Into<String>) -> GeminiClient {
        GeminiClient {
            http: self.http.clone(),
            endpoint: format!("{}/models/{}:generateContent", self.base_url, self.model),
            api_key: api_key.into(),
        }
    }
}

/// Client bound to one caller's key for the duration of one request.
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

/// Response of `generateContent`, reduced to what image extraction needs.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GenerateContentResponse {
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Candidate {
    pub content: Option<Content>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Part {
    pub text: Option<String>,
    pub inline_data: Option<InlineData>,
}

/// Binary payload carried inline in a response part.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    /// Base64 as sent on the wire.
    pub data: String,
}

impl InlineData {
    pub fn bytes(&self) -> Result<Vec<u8>, ProviderError> {
        Ok(STANDARD.decode(&self.data)?)
    }
}

impl GenerateContentResponse {
    /// Raw bytes of the first inline-data part of the first candidate.
    pub fn first_inline_image(&self) -> Result<Option<Vec<u8>>, ProviderError> {
        let parts = self
            .candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| content.parts.as_slice())
            .unwrap_or_default();

        parts
            .iter()
            .find_map(|part| part.inline_data.as_ref())
            .map(InlineData::bytes)
            .transpose()
    }
}

impl GeminiClient {
    /// Submit `prompt` as a single user turn.
    pub async fn generate_content(
        &self,
        prompt: &str,
    ) -> Result<GenerateContentResponse, ProviderError> {
        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        debug!(endpoint = %self.endpoint, "Gemini generateContent call");

        let response = self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    /// Generate an image for `prompt`, returning its raw bytes if the model produced one.
    pub async fn generate_image(&self, prompt: &str) -> Result<Option<Vec<u8>>, ProviderError> {
        self.generate_content(prompt).await?.first_inline_image()
    }
}
