//! HTTP error responses for the structured levels (3 and 4).
//!
//! Errors render as `{"detail": "<message>"}`, the shape the frontend reads.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::providers::ProviderError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Invalid tool arguments: {0}")]
    ToolArguments(serde_json::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Provider(_) | ApiError::ToolArguments(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::BadRequest("missing".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Provider(ProviderError::EmptyResponse).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_tool_argument_error_is_server_error() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{bad").unwrap_err();
        let err = ApiError::ToolArguments(parse_err);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().starts_with("Invalid tool arguments: "));
    }

    #[test]
    fn test_provider_message_is_passed_through() {
        let err = ApiError::from(ProviderError::EmptyResponse);
        assert_eq!(err.to_string(), "Provider returned no choices");
    }
}
