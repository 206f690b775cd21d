//! Provider configuration
//!
//! Uses `#[serde(tag = "provider", flatten)]` so all fields appear at the
//! same level in TOML:
//!
//! ```toml
//! provider = "anthropic"
//! api_key = "sk-ant-..."
//! model = "claude-3-5-haiku-20241022"
//!
//! [[models]]
//! id = "claude-next"
//! max_output_tokens = 16384
//! supports_cache_hints = true
//! ```

use ccore::{Error, ModelDescriptor, Result};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use url::Url;

/// Configuration of one provider adapter.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    /// Provider-specific settings, discriminated by the `provider` field.
    #[serde(flatten)]
    pub backend: BackendConfig,

    /// Requested model id. Unknown or missing ids resolve to the catalog
    /// default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<CompactString>,

    /// Whether to request usage reporting from backends that make it opt-in.
    #[serde(default = "default_usage")]
    pub usage: bool,

    /// Extra catalog entries, replacing built-in ones with the same id.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub models: Vec<ModelDescriptor>,
}

fn default_usage() -> bool {
    true
}

impl ProviderConfig {
    /// Parse a configuration from TOML.
    pub fn from_toml(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| Error::config(format!("invalid provider config: {e}")))
    }

    /// Human-readable provider kind string for logging.
    pub fn kind(&self) -> &'static str {
        match &self.backend {
            BackendConfig::Anthropic(_) => "anthropic",
            BackendConfig::OpenAI(_) => "openai",
            BackendConfig::DeepSeek(_) => "deepseek",
            BackendConfig::OpenRouter(_) => "openrouter",
        }
    }

    /// The remote settings shared by every backend.
    pub fn remote(&self) -> &RemoteConfig {
        match &self.backend {
            BackendConfig::Anthropic(remote)
            | BackendConfig::OpenAI(remote)
            | BackendConfig::DeepSeek(remote)
            | BackendConfig::OpenRouter(remote) => remote,
        }
    }

    /// Check credentials and the endpoint override.
    pub fn validate(&self) -> Result<()> {
        let remote = self.remote();
        if remote.api_key.trim().is_empty() {
            return Err(Error::config(format!("{}: api_key is empty", self.kind())));
        }

        if let Some(base_url) = &remote.base_url {
            let url = Url::parse(base_url).map_err(|e| {
                Error::config(format!("{}: invalid base_url {base_url}: {e}", self.kind()))
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(Error::config(format!(
                    "{}: unsupported base_url scheme {}",
                    self.kind(),
                    url.scheme()
                )));
            }
        }
        Ok(())
    }
}

/// Provider-specific configuration, discriminated by the `provider` field
/// in TOML/JSON.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum BackendConfig {
    /// Anthropic Messages API.
    Anthropic(RemoteConfig),
    /// OpenAI API.
    #[serde(rename = "openai")]
    OpenAI(RemoteConfig),
    /// DeepSeek API, OpenAI-compatible.
    #[serde(rename = "deepseek")]
    DeepSeek(RemoteConfig),
    /// OpenRouter API, OpenAI-compatible.
    #[serde(rename = "openrouter")]
    OpenRouter(RemoteConfig),
}

/// Configuration for remote HTTP API providers.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct RemoteConfig {
    /// API key.
    #[serde(default)]
    pub api_key: String,
    /// Optional override of the full endpoint URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}
