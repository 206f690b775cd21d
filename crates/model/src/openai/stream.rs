//! Streaming chunk decoding for OpenAI-compatible chat completions.
//!
//! Chunks carry no block structure: text arrives as `choices[0].delta.content`
//! and usage, when requested, as one absolute record near the end.

use async_stream::try_stream;
use ccore::{Error, Event, Result, Usage};
use futures_core::Stream;
use futures_util::StreamExt;
use serde::Deserialize;
use smallvec::SmallVec;

/// A streaming chat completion chunk
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Chunk {
    /// The list of completion choices (with delta content)
    #[serde(default)]
    pub choices: Vec<Choice>,

    /// Token usage statistics (only in final chunk)
    #[serde(default)]
    pub usage: Option<ChunkUsage>,

    /// Backend failure reported inside the stream.
    #[serde(default)]
    pub error: Option<ErrorBody>,
}

impl Chunk {
    /// Get the content of the first choice
    pub fn content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.delta.content.as_deref())
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub delta: Delta,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Delta {
    #[serde(default)]
    pub content: Option<String>,
}

/// Absolute usage counts.
///
/// Cache reads come from `prompt_tokens_details.cached_tokens` (OpenAI) or
/// `prompt_cache_hit_tokens` (DeepSeek); cache writes from
/// `cache_creation_input_tokens` (OpenRouter relaying Anthropic).
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ChunkUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub prompt_tokens_details: Option<PromptTokensDetails>,
    #[serde(default)]
    pub prompt_cache_hit_tokens: Option<u32>,
    #[serde(default)]
    pub cache_creation_input_tokens: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PromptTokensDetails {
    #[serde(default)]
    pub cached_tokens: Option<u32>,
}

impl From<ChunkUsage> for Usage {
    fn from(usage: ChunkUsage) -> Self {
        Self {
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
            cache_write_tokens: usage.cache_creation_input_tokens,
            cache_read_tokens: usage
                .prompt_tokens_details
                .and_then(|d| d.cached_tokens)
                .or(usage.prompt_cache_hit_tokens),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub code: Option<serde_json::Value>,
}

/// Chunk decoder for OpenAI-compatible streams.
///
/// Stateless: every usage record is already absolute.
#[derive(Debug, Default, Clone, Copy)]
pub struct Decoder;

impl Decoder {
    /// Decode one chunk into zero or more canonical events.
    ///
    /// Fails only on a backend `error` payload.
    pub fn decode(&self, chunk: Chunk) -> Result<SmallVec<[Event; 2]>> {
        if let Some(error) = chunk.error {
            return Err(match error.code {
                Some(code) => Error::Transport(format!("{code}: {}", error.message)),
                None => Error::Transport(error.message),
            });
        }

        let mut events = SmallVec::new();
        if let Some(text) = chunk.content() {
            events.push(Event::text(text));
        }
        if let Some(usage) = chunk.usage {
            events.push(Event::Usage(usage.into()));
        }
        Ok(events)
    }
}

/// Decode a stream of OpenAI-compatible chunks into canonical events.
pub fn decode<S>(chunks: S) -> impl Stream<Item = Result<Event>> + Send
where
    S: Stream<Item = Result<Chunk>> + Send,
{
    try_stream! {
        let decoder = Decoder;
        let mut chunks = std::pin::pin!(chunks);
        while let Some(chunk) = chunks.next().await {
            for event in decoder.decode(chunk?)? {
                yield event;
            }
        }
    }
}
