//! Streaming adapters for conduit.
//!
//! Transcodes canonical conversations into Anthropic Messages and
//! OpenAI-compatible chat completions requests, streams the responses over
//! SSE and decodes them back into canonical events. [`build_provider`] picks
//! the adapter from a [`ProviderConfig`].

pub use {
    claude::Claude,
    config::{BackendConfig, ProviderConfig, RemoteConfig},
    http::{HttpProvider, WireRequest},
    openai::OpenAI,
    provider::{Provider, build_provider},
    reqwest::Client,
};

pub mod claude;
pub mod config;
pub mod http;
pub mod openai;
mod provider;

/// Fallback for `max_tokens` when the model descriptor declares no limit.
pub const DEFAULT_MAX_TOKENS: u32 = 8192;
