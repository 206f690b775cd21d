//! Claude (Anthropic) provider.
//!
//! Implements the Anthropic Messages API, which differs from the OpenAI
//! chat completions format in message structure, system prompt placement
//! and streaming events.

use crate::http::HttpProvider;
use ccore::{Catalog, ModelDescriptor, Result};
use compact_str::CompactString;
use reqwest::{
    Client,
    header::{HeaderName, HeaderValue},
};
pub use request::{Request, encode};
pub use stream::{Chunk, Decoder, decode};

mod provider;
mod request;
mod stream;

/// The Anthropic Messages API endpoint.
pub const ENDPOINT: &str = "https://api.anthropic.com/v1/messages";

/// The Anthropic API version header value.
const API_VERSION: &str = "2023-06-01";

/// Beta opt-in required for `cache_control` blocks.
pub const PROMPT_CACHING_BETA: &str = "prompt-caching-2024-07-31";

/// The Claude provider.
#[derive(Clone, Debug)]
pub struct Claude {
    /// Transport with x-api-key, anthropic-version and content-type set.
    http: HttpProvider,
    /// Known models.
    catalog: Catalog,
    /// Requested model id, resolved against the catalog per request.
    model: Option<CompactString>,
}

impl Claude {
    /// Create a provider targeting the Anthropic API.
    pub fn anthropic(client: Client, key: &str) -> Result<Self> {
        Self::custom(client, key, ENDPOINT)
    }

    /// Create a provider targeting a custom Anthropic-compatible endpoint.
    pub fn custom(client: Client, key: &str, endpoint: &str) -> Result<Self> {
        let http = HttpProvider::custom_header(client, "x-api-key", key, endpoint)?
            .with_header(
                HeaderName::from_static("anthropic-version"),
                HeaderValue::from_static(API_VERSION),
            );
        Ok(Self {
            http,
            catalog: Catalog::anthropic(),
            model: None,
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

    /// The underlying transport.
    pub fn http(&self) -> &HttpProvider {
        &self.http
    }
}
