//! Provider implementation.
//!
//! Unified `Provider` enum with enum dispatch over concrete backends.
//! `build_provider()` matches on the configured backend.

use crate::{
    claude::Claude,
    config::{BackendConfig, ProviderConfig},
    openai::OpenAI,
};
use ccore::{Event, Model, ModelDescriptor, Result, TraceConfig, Traced, Turn};
use futures_core::Stream;
use futures_util::future::Either;

/// Unified LLM provider enum.
///
/// The variant is chosen once from configuration; callers are monomorphized
/// on `Provider`.
#[derive(Clone, Debug)]
pub enum Provider {
    /// Anthropic Messages API.
    Claude(Claude),
    /// OpenAI-compatible API (covers OpenAI, DeepSeek, OpenRouter).
    OpenAI(OpenAI),
}

impl Provider {
    /// Wrap the provider so every call is traced as configured.
    pub fn traced(self, config: &TraceConfig) -> Traced<Self> {
        Traced::from_config(self, config)
    }
}

/// Construct a `Provider` from config and a shared HTTP client.
///
/// Fails with a configuration error before any request is made.
pub fn build_provider(config: &ProviderConfig, client: reqwest::Client) -> Result<Provider> {
    config.validate()?;
    let remote = config.remote();
    let key = remote.api_key.as_str();
    let base_url = remote.base_url.as_deref();

    let mut provider = match &config.backend {
        BackendConfig::Anthropic(_) => Provider::Claude(match base_url {
            Some(url) => Claude::custom(client, key, url)?,
            None => Claude::anthropic(client, key)?,
        }),
        BackendConfig::OpenAI(_) => Provider::OpenAI(match base_url {
            Some(url) => OpenAI::custom(client, key, url)?,
            None => OpenAI::api(client, key)?,
        }),
        BackendConfig::DeepSeek(_) => Provider::OpenAI(match base_url {
            Some(url) => OpenAI::with_catalog(client, key, url, ccore::Catalog::deepseek())?,
            None => OpenAI::deepseek(client, key)?,
        }),
        BackendConfig::OpenRouter(_) => Provider::OpenAI(match base_url {
            Some(url) => OpenAI::with_catalog(client, key, url, ccore::Catalog::openrouter())?,
            None => OpenAI::openrouter(client, key)?,
        }),
    };

    let models = config.models.iter().cloned();
    provider = match provider {
        Provider::Claude(p) => Provider::Claude(p.with_models(models)),
        Provider::OpenAI(p) => Provider::OpenAI(p.with_models(models).with_usage(config.usage)),
    };
    if let Some(model) = &config.model {
        provider = match provider {
            Provider::Claude(p) => Provider::Claude(p.with_model(model.clone())),
            Provider::OpenAI(p) => Provider::OpenAI(p.with_model(model.clone())),
        };
    }

    tracing::debug!(
        "built {} provider for {}",
        config.kind(),
        provider.descriptor().id
    );
    Ok(provider)
}

impl Model for Provider {
    fn descriptor(&self) -> ModelDescriptor {
        match self {
            Self::Claude(p) => p.descriptor(),
            Self::OpenAI(p) => p.descriptor(),
        }
    }

    fn create_message(
        &self,
        system: &str,
        turns: &[Turn],
    ) -> impl Stream<Item = Result<Event>> + Send {
        match self {
            Self::Claude(p) => Either::Left(p.create_message(system, turns)),
            Self::OpenAI(p) => Either::Right(p.create_message(system, turns)),
        }
    }
}
