//! HTTP server relaying frontend requests to the AI providers.
//!
//! - [`routes`]: Request/response types, route handlers and CORS
//! - [`streaming`]: SSE streaming for the Level 2 token relay
//! - [`error`]: Error bodies for the structured levels

pub mod error;
pub mod routes;
pub mod streaming;
