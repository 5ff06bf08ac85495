//! Shared helpers for driving the router in-process.

#![allow(dead_code)]

use std::sync::Arc;

use ai_relay::config::Config;
use ai_relay::providers::gemini::GeminiConnector;
use ai_relay::providers::openai::OpenAiClient;
use ai_relay::server::routes::{build_router, AppState};
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

pub const SERVER_KEY: &str = "sk-server-test";

/// Config with fast simulation timings, pointing both providers at `base_url`.
pub fn test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.openai.base_url = base_url.to_string();
    config.gemini.base_url = base_url.to_string();
    config.simulation.response_delay_ms = 20;
    config.simulation.stream_interval_ms = 0;
    config
}

/// Router in simulation mode (no server key).
pub fn simulation_router(config: Config) -> Router {
    router(config, None)
}

/// Router in live mode, authenticated with [`SERVER_KEY`].
pub fn live_router(config: Config) -> Router {
    router(config, Some(SERVER_KEY))
}

fn router(config: Config, key: Option<&str>) -> Router {
    let http = reqwest::Client::new();
    let openai = key.map(|key| OpenAiClient::new(http.clone(), key, &config.openai));
    let gemini = GeminiConnector::new(http, &config.gemini);
    let state = Arc::new(AppState::new(openai, gemini, Arc::new(config)));
    build_router(state).unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_string(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn json_body(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let body = body_string(response).await;
    (status, serde_json::from_str(&body).unwrap())
}

/// Payloads of every `data:` event in an SSE body, in order.
pub fn sse_payloads(body: &str) -> Vec<String> {
    body.split("\n\n")
        .filter(|event| !event.is_empty())
        .filter_map(|event| event.strip_prefix("data: "))
        .map(str::to_string)
        .collect()
}
