//! Core abstractions of conduit.
//!
//! Provides the backend-agnostic conversation model (`Turn`, `Part`), the
//! canonical stream events (`Event`, `Usage`), the usage accumulator, the
//! cache hint policy, model catalogs, the `Model` adapter trait and the
//! tracing wrapper that instruments any adapter.

pub use {
    cache::{apply_cache_hints, cache_targets},
    catalog::{Catalog, ModelDescriptor},
    error::{Error, Result},
    event::{Event, Usage},
    message::{Body, CacheDirective, Content, Part, Role, Turn},
    model::Model,
    trace::{
        Instrumented, JsonlSink, LogSink, RunType, SinkConfig, TraceConfig, TraceRecord,
        TraceSink, Traced, Tracer,
    },
    usage::UsageState,
};

#[cfg(feature = "testing")]
pub use trace::MemorySink;

mod cache;
mod catalog;
mod error;
mod event;
mod message;
mod model;
mod trace;
mod usage;
