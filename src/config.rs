//! Runtime configuration for ai-relay.
//!
//! Settings come from three places, in increasing priority:
//! a JSON config file, a `.env` file, and the command line / process environment.
//! The server's OpenAI credential is read once at startup and decides whether
//! Levels 1-3 run live or in simulation mode.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::{Deserialize, Serialize};

/// Command-line arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "ai-relay", about = "Relay for chat, streaming, tool-call and image requests")]
pub struct Cli {
    /// Path to configuration file (JSON).
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// HTTP listen address (overrides `server.listen` from the config file).
    #[arg(long)]
    pub listen: Option<String>,

    /// Path to a `.env` file loaded before reading the environment.
    #[arg(long, default_value = ".env")]
    pub env_file: PathBuf,

    /// Server-side OpenAI API key. Leave unset to run Levels 1-3 in simulation mode.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Report whether the env file and server key were found, then exit.
    #[arg(long)]
    pub check_env: bool,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// The configured server key, treating an empty value as absent.
    pub fn server_api_key(&self) -> Option<&str> {
        self.openai_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,

    /// Chat-completion provider.
    pub openai: OpenAiConfig,

    /// Image-generation provider.
    pub gemini: GeminiConfig,

    /// Timing of canned responses when no server key is configured.
    pub simulation: SimulationConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address (e.g. "127.0.0.1:8000").
    pub listen: String,

    /// The single frontend origin allowed to make cross-origin requests.
    pub allowed_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8000".to_string(),
            allowed_origin: "http://localhost:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API base URL, without trailing slash.
    pub base_url: String,

    /// Model used for all chat levels.
    pub model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API base URL, without trailing slash.
    pub base_url: String,

    /// Model used for image generation.
    pub image_model: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            image_model: "gemini-2.5-flash-image".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Delay before a simulated Level 1 / Level 3 answer, in milliseconds.
    pub response_delay_ms: u64,

    /// Delay between simulated stream events, in milliseconds.
    pub stream_interval_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            response_delay_ms: 1000,
            stream_interval_ms: 100,
        }
    }
}

impl SimulationConfig {
    pub fn response_delay(&self) -> Duration {
        Duration::from_millis(self.response_delay_ms)
    }

    pub fn stream_interval(&self) -> Duration {
        Duration::from_millis(self.stream_interval_ms)
    }
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults for missing fields.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let data = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&data)?;
            Ok(config)
        } else {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            Ok(Config::default())
        }
    }
}
