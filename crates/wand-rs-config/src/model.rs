//! Configuration schema for wand.

use serde::{Deserialize, Serialize};

/// Marker the model is told to answer with when a record needs no change.
pub const DEFAULT_NO_CHANGE_MARKER: &str = "HECK NO BROTHER";

/// Root config for the wand SDK and CLI.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct WandConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub correction: CorrectionConfig,
}

impl WandConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> WandConfigBuilder {
        WandConfigBuilder::new()
    }
}

/// Builder for assembling a `WandConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct WandConfigBuilder {
    config: WandConfig,
}

impl WandConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the provider configuration.
    pub fn provider(mut self, provider: ProviderConfig) -> Self {
        self.config.provider = provider;
        self
    }

    /// Replace the correction pass configuration.
    pub fn correction(mut self, correction: CorrectionConfig) -> Self {
        self.config.correction = correction;
        self
    }

    /// Override only the model name.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.provider.model = model.into();
        self
    }

    pub fn build(self) -> WandConfig {
        self.config
    }
}

/// OpenAI-compatible chat completion endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderConfig {
    /// API root; `/chat/completions` is appended.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the bearer token.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

/// Settings for the batch correction pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CorrectionConfig {
    /// Matched case-insensitively as a substring of the model answer.
    #[serde(default = "default_no_change_marker")]
    pub no_change_marker: String,
    /// Instruction used when none is given on the command line.
    #[serde(default)]
    pub instruction: Option<String>,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            no_change_marker: default_no_change_marker(),
            instruction: None,
        }
    }
}

fn default_no_change_marker() -> String {
    DEFAULT_NO_CHANGE_MARKER.to_string()
}
