//! SSE event decoding for the Anthropic streaming Messages API.
//!
//! Anthropic streaming events differ from OpenAI's format:
//! - `message_start`: initial message metadata with a usage snapshot
//! - `content_block_start`: begin a content block (text or tool_use)
//! - `content_block_delta`: incremental content (text_delta or input_json_delta)
//! - `content_block_stop`: end of a content block
//! - `message_delta`: final stop_reason and output token count
//! - `message_stop`: end of message
//!
//! Only text and usage survive normalization; tool use, thinking and JSON
//! deltas are skipped.

use async_stream::try_stream;
use ccore::{Error, Event, Result, Usage, UsageState};
use futures_core::Stream;
use futures_util::StreamExt;
use serde::Deserialize;
use smallvec::SmallVec;

/// A raw SSE event from the Anthropic streaming API.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Chunk {
    /// Initial message metadata.
    MessageStart { message: MessageMeta },
    /// Begin a content block.
    ContentBlockStart {
        #[serde(default)]
        index: u32,
        content_block: ContentBlock,
    },
    /// Incremental content within a block.
    ContentBlockDelta {
        #[serde(default)]
        index: u32,
        delta: BlockDelta,
    },
    /// End of a content block.
    ContentBlockStop {},
    /// Final message delta (stop reason + usage).
    MessageDelta {
        #[serde(default)]
        usage: Option<DeltaUsage>,
    },
    /// End of message.
    MessageStop,
    /// Ping (keep-alive).
    Ping,
    /// Backend failure reported inside the stream.
    Error { error: ErrorBody },
    /// Catch-all for unknown event types.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageMeta {
    #[serde(default)]
    pub usage: Option<StartUsage>,
}

/// Usage snapshot carried by `message_start`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StartUsage {
    #[serde(default)]
    pub input_tokens: u32,
    #[serde(default)]
    pub output_tokens: u32,
    #[serde(default)]
    pub cache_creation_input_tokens: Option<u32>,
    #[serde(default)]
    pub cache_read_input_tokens: Option<u32>,
}

impl From<StartUsage> for Usage {
    fn from(usage: StartUsage) -> Self {
        Self {
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            cache_write_tokens: usage.cache_creation_input_tokens,
            cache_read_tokens: usage.cache_read_input_tokens,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        #[serde(default)]
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockDelta {
    TextDelta { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DeltaUsage {
    #[serde(default)]
    pub output_tokens: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub message: String,
}

/// Per-request decoder state.
///
/// Owns the usage accumulator of exactly one stream.
#[derive(Debug, Default)]
pub struct Decoder {
    usage: UsageState,
    blocks: usize,
}

impl Decoder {
    /// Decode one chunk into zero or more canonical events.
    ///
    /// Fails only on a backend `error` event.
    pub fn decode(&mut self, chunk: Chunk) -> Result<SmallVec<[Event; 2]>> {
        let mut events = SmallVec::new();
        match chunk {
            Chunk::MessageStart { message } => {
                if let Some(usage) = message.usage {
                    self.usage.snapshot(usage.into());
                    events.push(Event::Usage(self.usage.usage()));
                }
            }
            Chunk::ContentBlockStart { content_block, .. } => {
                let first = self.blocks == 0;
                self.blocks += 1;
                if let ContentBlock::Text { text } = content_block {
                    if !first {
                        events.push(Event::text("\n"));
                    }
                    if !text.is_empty() {
                        events.push(Event::text(text));
                    }
                }
            }
            Chunk::ContentBlockDelta {
                delta: BlockDelta::TextDelta { text },
                ..
            } => {
                if !text.is_empty() {
                    events.push(Event::text(text));
                }
            }
            Chunk::MessageDelta {
                usage:
                    Some(DeltaUsage {
                        output_tokens: Some(output),
                    }),
            } => self.usage.set_output(output),
            Chunk::Error { error } => {
                return Err(Error::Transport(format!("{}: {}", error.kind, error.message)));
            }
            Chunk::Unknown => tracing::debug!("skipping unknown anthropic event"),
            Chunk::ContentBlockDelta { .. }
            | Chunk::ContentBlockStop {}
            | Chunk::MessageDelta { .. }
            | Chunk::MessageStop
            | Chunk::Ping => {}
        }
        Ok(events)
    }

    /// The terminal usage event, if the backend reported any usage.
    pub fn finish(self) -> Option<Event> {
        self.usage.finish().map(Event::Usage)
    }
}

/// Decode a stream of Anthropic chunks into canonical events.
///
/// The terminal usage event is appended when the chunk stream ends
/// naturally; a transport error ends the output without it.
pub fn decode<S>(chunks: S) -> impl Stream<Item = Result<Event>> + Send
where
    S: Stream<Item = Result<Chunk>> + Send,
{
    try_stream! {
        let mut decoder = Decoder::default();
        let mut chunks = std::pin::pin!(chunks);
        while let Some(chunk) = chunks.next().await {
            for event in decoder.decode(chunk?)? {
                yield event;
            }
        }
        if let Some(usage) = decoder.finish() {
            yield usage;
        }
    }
}
