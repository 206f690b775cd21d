//! Model descriptors and per-backend catalogs.
//!
//! Each backend family ships a static table of known models plus a default.
//! Resolution never fails: an unknown or missing model id resolves to the
//! family default so callers always obtain a usable descriptor.

use crate::Usage;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Resolved identity and capabilities of a backend model.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ModelDescriptor {
    /// Backend model identifier.
    pub id: CompactString,

    /// Maximum tokens the model may generate per response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,

    /// Context window size in tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_window: Option<u32>,

    /// Whether the model accepts image parts.
    #[serde(default)]
    pub supports_images: bool,

    /// Whether the model accepts cache directives.
    #[serde(default)]
    pub supports_cache_hints: bool,

    /// USD per million input tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_price: Option<f64>,

    /// USD per million output tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_price: Option<f64>,

    /// USD per million tokens written to the prefix cache.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_write_price: Option<f64>,

    /// USD per million tokens read from the prefix cache.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_read_price: Option<f64>,
}

impl ModelDescriptor {
    /// A descriptor with no declared capabilities.
    pub fn new(id: impl Into<CompactString>) -> Self {
        Self {
            id: id.into(),
            max_output_tokens: None,
            context_window: None,
            supports_images: false,
            supports_cache_hints: false,
            input_price: None,
            output_price: None,
            cache_write_price: None,
            cache_read_price: None,
        }
    }

    /// USD cost of a usage record, if the model is priced.
    ///
    /// Cache writes and reads are billed at their own rates; a missing cache
    /// rate bills those tokens at nothing.
    pub fn cost(&self, usage: &Usage) -> Option<f64> {
        let input = self.input_price?;
        let output = self.output_price?;
        let per_token = |count: u32, price: f64| f64::from(count) * price / 1_000_000.0;

        let mut cost =
            per_token(usage.input_tokens, input) + per_token(usage.output_tokens, output);
        if let (Some(tokens), Some(price)) = (usage.cache_write_tokens, self.cache_write_price) {
            cost += per_token(tokens, price);
        }
        if let (Some(tokens), Some(price)) = (usage.cache_read_tokens, self.cache_read_price) {
            cost += per_token(tokens, price);
        }
        Some(cost)
    }
}

/// Known models of one backend family.
#[derive(Debug, Clone)]
pub struct Catalog {
    default: ModelDescriptor,
    models: Vec<ModelDescriptor>,
}

impl Catalog {
    /// Create a catalog from a default and the known models.
    ///
    /// The default is always resolvable by its own id.
    pub fn new(default: ModelDescriptor, models: impl IntoIterator<Item = ModelDescriptor>) -> Self {
        Self {
            default,
            models: models.into_iter().collect(),
        }
    }

    /// Add or replace entries, e.g. from configuration.
    pub fn with(mut self, extra: impl IntoIterator<Item = ModelDescriptor>) -> Self {
        for descriptor in extra {
            if self.default.id == descriptor.id {
                self.default = descriptor.clone();
            }
            match self.models.iter_mut().find(|m| m.id == descriptor.id) {
                Some(existing) => *existing = descriptor,
                None => self.models.push(descriptor),
            }
        }
        self
    }

    /// Resolve a requested model id, falling back to the default.
    pub fn resolve(&self, requested: Option<&str>) -> ModelDescriptor {
        let Some(id) = requested else {
            return self.default.clone();
        };

        if self.default.id == id {
            return self.default.clone();
        }

        match self.models.iter().find(|m| m.id == id) {
            Some(descriptor) => descriptor.clone(),
            None => {
                tracing::debug!("unknown model {id}, falling back to {}", self.default.id);
                self.default.clone()
            }
        }
    }

    /// The family default.
    pub fn default_model(&self) -> &ModelDescriptor {
        &self.default
    }

    /// Anthropic Messages API models.
    pub fn anthropic() -> Self {
        let sonnet = claude("claude-3-5-sonnet-20241022", 8192, (3.0, 15.0, 3.75, 0.3));
        Self::new(
            sonnet.clone(),
            [
                sonnet,
                claude("claude-3-7-sonnet-20250219", 8192, (3.0, 15.0, 3.75, 0.3)),
                ModelDescriptor {
                    supports_images: false,
                    ..claude("claude-3-5-haiku-20241022", 8192, (0.8, 4.0, 1.0, 0.08))
                },
                claude("claude-3-opus-20240229", 4096, (15.0, 75.0, 18.75, 1.5)),
                claude("claude-3-haiku-20240307", 4096, (0.25, 1.25, 0.3, 0.03)),
            ],
        )
    }

    /// OpenAI chat completions models.
    pub fn openai() -> Self {
        let gpt4o = ModelDescriptor {
            max_output_tokens: Some(16_384),
            context_window: Some(128_000),
            supports_images: true,
            input_price: Some(2.5),
            output_price: Some(10.0),
            cache_read_price: Some(1.25),
            ..ModelDescriptor::new("gpt-4o")
        };
        Self::new(
            gpt4o.clone(),
            [
                gpt4o,
                ModelDescriptor {
                    max_output_tokens: Some(16_384),
                    context_window: Some(128_000),
                    supports_images: true,
                    input_price: Some(0.15),
                    output_price: Some(0.6),
                    cache_read_price: Some(0.075),
                    ..ModelDescriptor::new("gpt-4o-mini")
                },
                ModelDescriptor {
                    max_output_tokens: Some(100_000),
                    context_window: Some(200_000),
                    input_price: Some(1.1),
                    output_price: Some(4.4),
                    cache_read_price: Some(0.55),
                    ..ModelDescriptor::new("o3-mini")
                },
            ],
        )
    }

    /// DeepSeek models (OpenAI-compatible, automatic prefix caching).
    pub fn deepseek() -> Self {
        let chat = ModelDescriptor {
            max_output_tokens: Some(8_192),
            context_window: Some(64_000),
            input_price: Some(0.27),
            output_price: Some(1.1),
            cache_write_price: Some(0.27),
            cache_read_price: Some(0.07),
            ..ModelDescriptor::new("deepseek-chat")
        };
        Self::new(
            chat.clone(),
            [
                chat,
                ModelDescriptor {
                    max_output_tokens: Some(8_192),
                    context_window: Some(64_000),
                    input_price: Some(0.55),
                    output_price: Some(2.19),
                    cache_write_price: Some(0.55),
                    cache_read_price: Some(0.14),
                    ..ModelDescriptor::new("deepseek-reasoner")
                },
            ],
        )
    }

    /// OpenRouter models (OpenAI-compatible, forwards cache directives to
    /// Anthropic models).
    pub fn openrouter() -> Self {
        let sonnet = ModelDescriptor {
            id: "anthropic/claude-3.5-sonnet".into(),
            ..claude("claude-3-5-sonnet-20241022", 8192, (3.0, 15.0, 3.75, 0.3))
        };
        Self::new(
            sonnet.clone(),
            [
                sonnet,
                ModelDescriptor {
                    id: "anthropic/claude-3.5-haiku".into(),
                    supports_images: false,
                    ..claude("claude-3-5-haiku-20241022", 8192, (0.8, 4.0, 1.0, 0.08))
                },
                ModelDescriptor {
                    id: "openai/gpt-4o".into(),
                    ..Self::openai().default
                },
            ],
        )
    }
}

/// A cache-capable Claude model with a 200k context window.
fn claude(id: &str, max_output_tokens: u32, prices: (f64, f64, f64, f64)) -> ModelDescriptor {
    let (input, output, cache_write, cache_read) = prices;
    ModelDescriptor {
        max_output_tokens: Some(max_output_tokens),
        context_window: Some(200_000),
        supports_images: true,
        supports_cache_hints: true,
        input_price: Some(input),
        output_price: Some(output),
        cache_write_price: Some(cache_write),
        cache_read_price: Some(cache_read),
        ..ModelDescriptor::new(id)
    }
}
