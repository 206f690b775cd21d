//! Request body for the Anthropic Messages API.

use super::PROMPT_CACHING_BETA;
use crate::{DEFAULT_MAX_TOKENS, http::WireRequest};
use ccore::{Body, CacheDirective, Content, ModelDescriptor, Part, Role, Turn, apply_cache_hints};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Serialize;
use serde_json::{Value, json};

/// The request body for the Anthropic Messages API.
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    /// The model identifier.
    pub model: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
    /// System prompt blocks (top-level, not in messages array).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub system: Vec<Value>,
    /// The messages array (Anthropic content block format).
    pub messages: Vec<Value>,
    /// Whether to stream the response.
    pub stream: bool,
}

impl Request {
    /// Whether any system block or message part carries `cache_control`.
    pub fn uses_cache(&self) -> bool {
        let cached = |block: &Value| block.get("cache_control").is_some();
        self.system.iter().any(cached)
            || self.messages.iter().any(|message| {
                message["content"]
                    .as_array()
                    .is_some_and(|blocks| blocks.iter().any(cached))
            })
    }
}

/// Transcode a conversation into a streaming Messages API request.
///
/// The system prompt becomes the top-level `system` block list; history turns
/// with the system role are appended to it. On cache-capable models the last
/// system block and the tails of the two most recent user turns carry
/// `cache_control`, and the prompt caching beta header is attached.
pub fn encode(system: &str, turns: &[Turn], descriptor: &ModelDescriptor) -> WireRequest<Request> {
    let turns = apply_cache_hints(turns, descriptor);

    let mut blocks = Vec::new();
    if !system.is_empty() {
        blocks.push(json!({ "type": "text", "text": system }));
    }

    let mut messages = Vec::with_capacity(turns.len());
    for turn in turns.iter() {
        match turn.role {
            Role::System => blocks.extend(turn.content.clone().into_parts().iter().map(block)),
            Role::User | Role::Assistant => messages.push(json!({
                "role": turn.role,
                "content": content(&turn.content),
            })),
        }
    }

    if descriptor.supports_cache_hints
        && let Some(Value::Object(last)) = blocks.last_mut()
    {
        last.insert("cache_control".into(), json!(CacheDirective::Ephemeral));
    }

    let body = Request {
        model: descriptor.id.to_string(),
        max_tokens: descriptor.max_output_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        temperature: 0.0,
        system: blocks,
        messages,
        stream: true,
    };

    let mut headers = HeaderMap::new();
    if body.uses_cache() {
        headers.insert(
            "anthropic-beta",
            HeaderValue::from_static(PROMPT_CACHING_BETA),
        );
    }

    WireRequest { body, headers }
}

/// Message content: a plain string, or a block list.
fn content(content: &Content) -> Value {
    match content {
        Content::Text(text) => Value::String(text.clone()),
        Content::Parts(parts) => Value::Array(parts.iter().map(block).collect()),
    }
}

/// One content block.
fn block(part: &Part) -> Value {
    let mut value = match &part.body {
        Body::Text(text) => json!({ "type": "text", "text": text }),
        Body::Image { media_type, data } => json!({
            "type": "image",
            "source": {
                "type": "base64",
                "media_type": media_type,
                "data": data,
            },
        }),
        Body::Opaque(value) => value.clone(),
    };

    if let (Some(cache), Value::Object(map)) = (part.cache, &mut value) {
        map.insert("cache_control".into(), json!(cache));
    }
    value
}
