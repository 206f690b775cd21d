//! Request body for OpenAI-compatible chat completions.
//!
//! A non-empty system prompt travels as a synthetic leading `system`
//! message. Parts use the OpenAI content array shape; `cache_control` is
//! forwarded on parts for backends that relay it (OpenRouter to Anthropic
//! models).

use crate::{DEFAULT_MAX_TOKENS, http::WireRequest};
use ccore::{Body, Content, ModelDescriptor, Part, Turn, apply_cache_hints};
use reqwest::header::HeaderMap;
use serde::Serialize;
use serde_json::{Value, json};

/// OpenAI-compatible chat completions request body.
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    /// The messages to send.
    pub messages: Vec<Value>,
    /// The model identifier.
    pub model: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Temperature.
    pub temperature: f64,
    /// Whether to stream the response.
    pub stream: bool,
    /// Stream options (e.g. include_usage).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_options: Option<Value>,
}

/// Transcode a conversation into a streaming chat completions request.
pub fn encode(
    system: &str,
    turns: &[Turn],
    descriptor: &ModelDescriptor,
    usage: bool,
) -> WireRequest<Request> {
    let turns = apply_cache_hints(turns, descriptor);

    let mut messages = Vec::with_capacity(turns.len() + 1);
    if !system.is_empty() {
        messages.push(json!({ "role": "system", "content": system }));
    }
    messages.extend(turns.iter().map(|turn| {
        json!({
            "role": turn.role,
            "content": content(&turn.content),
        })
    }));

    WireRequest {
        body: Request {
            messages,
            model: descriptor.id.to_string(),
            max_tokens: descriptor.max_output_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: 0.0,
            stream: true,
            stream_options: usage.then(|| json!({ "include_usage": true })),
        },
        headers: HeaderMap::new(),
    }
}

fn content(content: &Content) -> Value {
    match content {
        Content::Text(text) => Value::String(text.clone()),
        Content::Parts(parts) => Value::Array(parts.iter().map(part).collect()),
    }
}

fn part(part: &Part) -> Value {
    let mut value = match &part.body {
        Body::Text(text) => json!({ "type": "text", "text": text }),
        Body::Image { media_type, data } => json!({
            "type": "image_url",
            "image_url": { "url": format!("data:{media_type};base64,{data}") },
        }),
        Body::Opaque(value) => value.clone(),
    };

    if let (Some(cache), Value::Object(map)) = (part.cache, &mut value) {
        map.insert("cache_control".into(), json!(cache));
    }
    value
}
