//! Error taxonomy shared by every adapter.

/// Errors surfaced to callers of [`crate::Model::create_message`].
///
/// Unrecognized backend chunks are not errors: decoders log and skip them.
/// Observability failures never reach this type either, the tracer swallows
/// them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Unusable credentials, endpoint or model configuration. Raised before
    /// any transport call is attempted.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Connection, authentication or mid-stream failure reported by the
    /// transport or the backend.
    #[error("transport error: {0}")]
    Transport(String),
}

impl Error {
    /// Build a configuration error from any displayable cause.
    pub fn config(cause: impl std::fmt::Display) -> Self {
        Self::Configuration(cause.to_string())
    }

    /// Build a transport error from any displayable cause.
    pub fn transport(cause: impl std::fmt::Display) -> Self {
        Self::Transport(cause.to_string())
    }

    /// Whether this error came from the transport.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Result alias used across conduit.
pub type Result<T> = std::result::Result<T, Error>;
