//! Canonical conversation turns.
//!
//! A [`Turn`] is backend-agnostic: transcoders borrow `&[Turn]` and map each
//! [`Part`] into their own wire shape. Cache directives are only ever set by
//! [`crate::apply_cache_hints`], which derives a new list instead of
//! mutating the caller's turns.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A turn in the conversation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Turn {
    /// The role of the turn.
    pub role: Role,

    /// The content of the turn.
    pub content: Content,
}

impl Turn {
    /// Create a user turn with a single text body.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Content::Text(text.into()),
        }
    }

    /// Create an assistant turn with a single text body.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: Content::Text(text.into()),
        }
    }

    /// Create a system turn with a single text body.
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: Content::Text(text.into()),
        }
    }

    /// Create a turn from an ordered list of parts.
    pub fn parts(role: Role, parts: impl IntoIterator<Item = Part>) -> Self {
        Self {
            role,
            content: Content::Parts(parts.into_iter().collect()),
        }
    }
}

/// The role of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The user role
    #[default]
    User,
    /// The assistant role
    Assistant,
    /// The system role
    System,
}

/// The content of a turn.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Content {
    /// A single text body.
    Text(String),
    /// An ordered list of parts.
    Parts(Vec<Part>),
}

impl Content {
    /// Convert into an ordered part list, wrapping a text body as one part.
    pub fn into_parts(self) -> Vec<Part> {
        match self {
            Self::Text(text) => vec![Part::text(text)],
            Self::Parts(parts) => parts,
        }
    }

    /// Borrow the parts, if the content is already a part list.
    pub fn as_parts(&self) -> Option<&[Part]> {
        match self {
            Self::Text(_) => None,
            Self::Parts(parts) => Some(parts),
        }
    }
}

/// One part of a turn's content.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Part {
    /// The payload of the part.
    #[serde(flatten)]
    pub body: Body,

    /// Cache directive, set by the cache hint policy only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheDirective>,
}

impl Part {
    /// A text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            body: Body::Text(text.into()),
            cache: None,
        }
    }

    /// A base64 encoded image part.
    pub fn image(media_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            body: Body::Image {
                media_type: media_type.into(),
                data: data.into(),
            },
            cache: None,
        }
    }

    /// A backend-native part passed through verbatim.
    pub fn opaque(value: Value) -> Self {
        Self {
            body: Body::Opaque(value),
            cache: None,
        }
    }
}

/// Payload of a [`Part`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Body {
    /// Plain text.
    Text(String),
    /// Base64 encoded image.
    Image {
        /// MIME type, e.g. `image/png`.
        media_type: String,
        /// Base64 payload.
        data: String,
    },
    /// Backend-native part, not interpreted by conduit.
    Opaque(Value),
}

/// Request that the backend caches the request prefix ending at this part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CacheDirective {
    /// Short-lived prefix cache.
    Ephemeral,
}
