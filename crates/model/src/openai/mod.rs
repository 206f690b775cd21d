//! OpenAI-compatible provider.
//!
//! One adapter serves OpenAI, DeepSeek, OpenRouter and any endpoint speaking
//! the chat completions protocol; they differ in endpoint and model catalog
//! only.

use crate::http::HttpProvider;
use ccore::{Catalog, ModelDescriptor, Result};
use compact_str::CompactString;
use reqwest::Client;
pub use request::{Request, encode};
pub use stream::{Chunk, Decoder, decode};

mod provider;
mod request;
mod stream;

/// The OpenAI chat completions endpoint.
pub const ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// The DeepSeek chat completions endpoint.
pub const DEEPSEEK_ENDPOINT: &str = "https://api.deepseek.com/chat/completions";

/// The OpenRouter chat completions endpoint.
pub const OPENROUTER_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";

/// An OpenAI-compatible provider.
#[derive(Clone, Debug)]
pub struct OpenAI {
    /// Transport with bearer auth and content-type set.
    http: HttpProvider,
    /// Known models.
    catalog: Catalog,
    /// Requested model id, resolved against the catalog per request.
    model: Option<CompactString>,
    /// Whether to ask the backend for usage in stream mode.
    usage: bool,
}

impl OpenAI {
    /// Create a provider targeting the OpenAI API.
    pub fn api(client: Client, key: &str) -> Result<Self> {
        Self::with_catalog(client, key, ENDPOINT, Catalog::openai())
    }

    /// Create a provider targeting the DeepSeek API.
    pub fn deepseek(client: Client, key: &str) -> Result<Self> {
        Self::with_catalog(client, key, DEEPSEEK_ENDPOINT, Catalog::deepseek())
    }

    /// Create a provider targeting the OpenRouter API.
    pub fn openrouter(client: Client, key: &str) -> Result<Self> {
        Self::with_catalog(client, key, OPENROUTER_ENDPOINT, Catalog::openrouter())
    }

    /// Create a provider targeting a custom OpenAI-compatible endpoint.
    pub fn custom(client: Client, key: &str, endpoint: &str) -> Result<Self> {
        Self::with_catalog(client, key, endpoint, Catalog::openai())
    }

    /// Create a provider with an explicit endpoint and catalog.
    pub fn with_catalog(
        client: Client,
        key: &str,
        endpoint: &str,
        catalog: Catalog,
    ) -> Result<Self> {
        Ok(Self {
            http: HttpProvider::bearer(client, key, endpoint)?,
            catalog,
            model: None,
            usage: true,
        })
    }

    /// Request a specific model id.
    pub fn with_model(mut self, model: impl Into<CompactString>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Register extra model descriptors.
    pub fn with_models(mut self, extra: impl IntoIterator<Item = ModelDescriptor>) -> Self {
        self.catalog = self.catalog.with(extra);
        self
    }

    /// Whether to request usage reporting (`stream_options.include_usage`).
    pub fn with_usage(mut self, usage: bool) -> Self {
        self.usage = usage;
        self
    }

    /// The underlying transport.
    pub fn http(&self) -> &HttpProvider {
        &self.http
    }
}
