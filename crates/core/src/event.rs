//! Canonical stream events.

use serde::{Deserialize, Serialize};

/// A backend-agnostic unit of streamed output.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Incremental text, in the order the backend produced it.
    Text {
        /// The text fragment.
        text: String,
    },
    /// Cumulative token usage.
    Usage(Usage),
}

impl Event {
    /// Create a text event.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// The text of a text event.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::Usage(_) => None,
        }
    }

    /// The usage of a usage event.
    pub fn as_usage(&self) -> Option<&Usage> {
        match self {
            Self::Usage(usage) => Some(usage),
            Self::Text { .. } => None,
        }
    }
}

impl From<Usage> for Event {
    fn from(usage: Usage) -> Self {
        Self::Usage(usage)
    }
}

/// Token usage of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Usage {
    /// Prompt tokens.
    pub input_tokens: u32,

    /// Generated tokens.
    pub output_tokens: u32,

    /// Prompt tokens written to the backend's prefix cache.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_write_tokens: Option<u32>,

    /// Prompt tokens served from the backend's prefix cache.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_read_tokens: Option<u32>,
}

impl Usage {
    /// Usage with plain input and output counts.
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
            ..Default::default()
        }
    }
}
