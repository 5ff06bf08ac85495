//! ai-relay: a thin backend between a demo frontend and two AI providers.
//!
//! Four levels, one endpoint each:
//!   1. plain chat completion
//!   2. server-sent token streaming
//!   3. forced tool call producing a dashboard update
//!   4. image generation with a caller-supplied key
//!
//! Without a server-side OpenAI key, Levels 1-3 answer with canned
//! simulation output instead of calling the provider.

pub mod config;
pub mod dashboard;
pub mod providers;
pub mod server;
