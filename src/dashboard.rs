//! The `update_dashboard_ui` tool used by Level 3.
//!
//! The model is forced to call this tool, so its arguments arrive as a
//! schema-constrained JSON object instead of free text.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::providers::openai::{FunctionDefinition, Tool};

pub const TOOL_NAME: &str = "update_dashboard_ui";

pub const TOOL_DESCRIPTION: &str = "Updates the dashboard UI theme and status.";

pub const SYSTEM_PROMPT: &str = "You are a UI assistant. Use the update_dashboard_ui function.";

pub const SIMULATION_STATUS: &str = "Simulation Mode Active";

/// Colour theme the frontend knows how to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    Blue,
    Red,
}

impl Theme {
    pub const ALL: [Theme; 4] = [Theme::Light, Theme::Dark, Theme::Blue, Theme::Red];

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::Blue => "blue",
            Theme::Red => "red",
        }
    }
}

/// Arguments of an `update_dashboard_ui` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardUpdate {
    pub theme: Theme,
    pub status_message: String,
}

impl DashboardUpdate {
    /// Canned update returned when no server key is configured.
    pub fn simulated() -> Self {
        Self {
            theme: Theme::Blue,
            status_message: SIMULATION_STATUS.to_string(),
        }
    }

    pub fn to_value(&self) -> serde_json::Value {
        json!({
            "theme": self.theme.as_str(),
            "status_message": self.status_message,
        })
    }
}

/// Tool declaration sent to the chat provider.
pub fn tool() -> Tool {
    let themes: Vec<&str> = Theme::ALL.iter().map(Theme::as_str).collect();

    Tool {
        kind: "function".to_string(),
        function: FunctionDefinition {
            name: TOOL_NAME.to_string(),
            description: TOOL_DESCRIPTION.to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "theme": {"type": "string", "enum": themes},
                    "status_message": {"type": "string"}
                },
                "required": ["theme", "status_message"],
            }),
        },
    }
}
