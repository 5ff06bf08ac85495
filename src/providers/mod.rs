//! HTTP clients for the external AI providers.
//!
//! - [`openai`]: chat completions (plain, streaming, forced tool call)
//! - [`gemini`]: request-scoped image generation

pub mod gemini;
pub mod openai;

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Error code: {status} - {body}")]
    Status { status: StatusCode, body: String },

    #[error("Invalid JSON from provider: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Provider returned no choices")]
    EmptyResponse,
}

/// Turn a non-2xx response into [`ProviderError::Status`], keeping the body for the caller.
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Status { status, body })
}
