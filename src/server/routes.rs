//! HTTP API for the four demonstration levels.
//!
//! - POST /api/level1/basic: plain completion, errors embedded in the reply
//! - POST /api/level2/stream: SSE token stream (see [`super::streaming`])
//! - POST /api/level3/ui: forced tool call returning a dashboard update
//! - POST /api/level4/image: image generation with the caller's own key
//! - GET /health

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::request::Parts;
use axum::http::HeaderValue;
use axum::response::sse::{KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::dashboard::{self, DashboardUpdate};
use crate::providers::gemini::GeminiConnector;
use crate::providers::openai::OpenAiClient;
use crate::server::error::ApiError;
use crate::server::streaming::{live_stream, simulated_stream};

/// Application state shared across handlers. Built once before the
/// listener starts and never mutated.
pub struct AppState {
    /// Server-credentialed chat client; `None` selects simulation mode.
    pub openai: Option<OpenAiClient>,
    pub gemini: GeminiConnector,
    pub config: Arc<Config>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(openai: Option<OpenAiClient>, gemini: GeminiConnector, config: Arc<Config>) -> Self {
        Self {
            openai,
            gemini,
            config,
            start_time: Instant::now(),
        }
    }

    fn mode(&self) -> &'static str {
        if self.openai.is_some() {
            "live"
        } else {
            "simulation"
        }
    }
}

/// Build the axum router with all API routes.
pub fn build_router(state: Arc<AppState>) -> anyhow::Result<Router> {
    // Other origins get no allow-origin header at all, rather than a mismatched one.
    let allowed: HeaderValue = state.config.server.allowed_origin.parse()?;
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _: &Parts| {
            *origin == allowed
        }))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    Ok(Router::new()
        .route("/api/level1/basic", post(chat_basic))
        .route("/api/level2/stream", post(chat_stream))
        .route("/api/level3/ui", post(chat_ui))
        .route("/api/level4/image", post(generate_image))
        .route("/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

// ─── Request/Response Types ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Image request. The key is used for this one call and never logged.
#[derive(Deserialize)]
pub struct ImageRequest {
    pub message: String,
    #[serde(default)]
    pub user_api_key: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BasicResponse {
    pub response: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiResponse {
    UiUpdate { data: serde_json::Value },
    Error { message: String },
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImageResponse {
    Success { image_base64: String },
    Error { message: String },
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub mode: String,
    pub uptime_secs: u64,
}

// ─── Route Handlers ────────────────────────────────────────────────────────

async fn chat_basic(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Json<BasicResponse> {
    let request_id = Uuid::new_v4().to_string();
    info!(request_id, level = 1, mode = state.mode(), "Basic chat request");

    let Some(client) = &state.openai else {
        tokio::time::sleep(state.config.simulation.response_delay()).await;
        return Json(BasicResponse {
            response: format!(
                "[Simulation] Backend running, but no server API Key found. You said: {}",
                req.message
            ),
        });
    };

    debug!(request_id, model = client.model(), "Calling chat provider");
    let response = match client.complete(&req.message).await {
        Ok(text) => text,
        Err(e) => {
            warn!(request_id, error = %e, "Basic chat failed");
            format!("OpenAI Error: {e}")
        }
    };

    Json(BasicResponse { response })
}

async fn chat_stream(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> impl IntoResponse {
    let request_id = Uuid::new_v4().to_string();
    info!(request_id, level = 2, mode = state.mode(), "Streaming chat request");

    match &state.openai {
        Some(client) => {
            debug!(request_id, model = client.model(), "Opening provider stream");
            let stream = live_stream(client.clone(), req.message, request_id);
            Sse::new(stream).keep_alive(KeepAlive::default()).into_response()
        }
        None => {
            let stream = simulated_stream(state.config.simulation.stream_interval());
            Sse::new(stream).keep_alive(KeepAlive::default()).into_response()
        }
    }
}

async fn chat_ui(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<UiResponse>, ApiError> {
    let request_id = Uuid::new_v4().to_string();
    info!(request_id, level = 3, mode = state.mode(), "UI tool-call request");

    let Some(client) = &state.openai else {
        tokio::time::sleep(state.config.simulation.response_delay()).await;
        let data = DashboardUpdate::simulated().to_value();
        return Ok(Json(UiResponse::UiUpdate { data }));
    };

    debug!(request_id, model = client.model(), "Calling chat provider with tool");
    let call = client
        .call_tool(dashboard::SYSTEM_PROMPT, &req.message, dashboard::tool())
        .await
        .inspect_err(|e| warn!(request_id, error = %e, "UI tool call failed"))?;

    match call {
        Some(call) => {
            let data: serde_json::Value = serde_json::from_str(&call.function.arguments)
                .map_err(ApiError::ToolArguments)?;
            info!(request_id, tool = call.function.name, "UI update triggered");
            Ok(Json(UiResponse::UiUpdate { data }))
        }
        None => Ok(Json(UiResponse::Error {
            message: "No UI update triggered".to_string(),
        })),
    }
}

async fn generate_image(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ImageRequest>,
) -> Result<Json<ImageResponse>, ApiError> {
    let request_id = Uuid::new_v4().to_string();
    info!(request_id, level = 4, model = state.gemini.model(), "Image generation request");

    if req.user_api_key.is_empty() {
        return Err(ApiError::BadRequest(
            "API Key is required for this level.".to_string(),
        ));
    }

    let client = state.gemini.with_api_key(req.user_api_key);
    let image = client
        .generate_image(&req.message)
        .await
        .inspect_err(|e| error!(request_id, error = %e, "Gemini image generation failed"))?;

    match image {
        Some(bytes) => {
            info!(request_id, bytes = bytes.len(), "Image generated");
            Ok(Json(ImageResponse::Success {
                image_base64: STANDARD.encode(&bytes),
            }))
        }
        None => Ok(Json(ImageResponse::Error {
            message: "No image found in response.".to_string(),
        })),
    }
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        mode: state.mode().to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}
