//! Language-model endpoint configuration.

use serde::{Deserialize, Serialize};

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

const fn default_temperature() -> f32 {
    0.1
}

const fn default_request_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API (no trailing slash).
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Bearer token for the API.
    #[serde(default)]
    pub api_key: String,

    /// Chat model used for checklist extraction and compliance analysis.
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key: String::new(),
            model: default_model(),
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl LlmConfig {
    /// Check if the config has the minimum required fields for remote access.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.api_base.is_empty()
    }
}
