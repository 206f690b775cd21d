//! Best-effort tracing of streaming calls.
//!
//! A [`Tracer`] wraps canonical event streams in [`Instrumented`], which
//! forwards every event untouched and hands a [`TraceRecord`] to the
//! configured [`TraceSink`] when the stream completes, fails or is dropped.
//! Sink failures are logged and discarded. A tracer without a sink is a pure
//! passthrough.

use crate::{Event, Model, ModelDescriptor, Result, Turn};
use chrono::{DateTime, Utc};
use compact_str::CompactString;
use futures_core::Stream;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::{path::PathBuf, sync::Arc};
use ulid::Ulid;

pub use sink::{JsonlSink, LogSink, TraceSink};
pub use stream::Instrumented;

#[cfg(feature = "testing")]
pub use sink::MemorySink;

mod sink;
mod stream;

/// Kind of traced run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunType {
    /// A model call.
    Llm,
    /// A composite call wrapping other runs.
    Chain,
}

/// One traced call, handed to the sink and then dropped.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TraceRecord {
    /// Unique id of the run.
    pub id: Ulid,

    /// Name of the traced operation.
    pub name: CompactString,

    /// Kind of the run.
    pub run_type: RunType,

    /// Inputs captured before the first event was requested.
    pub inputs: Value,

    /// Summary of the produced events: concatenated text and final usage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Value>,

    /// The failure that ended the stream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Whether the caller dropped the stream before it ended.
    #[serde(default, skip_serializing_if = "is_false")]
    pub cancelled: bool,

    /// When the run started.
    pub start_time: DateTime<Utc>,

    /// When the run ended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Tracing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TraceConfig {
    /// Whether calls are traced at all.
    #[serde(default)]
    pub enabled: bool,

    /// Run name recorded for traced model calls.
    #[serde(default = "default_name")]
    pub name: CompactString,

    /// Where records go.
    #[serde(default)]
    pub sink: SinkConfig,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            name: default_name(),
            sink: SinkConfig::default(),
        }
    }
}

fn default_name() -> CompactString {
    "create_message".into()
}

/// Trace sink selection.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SinkConfig {
    /// Emit records as `tracing` events.
    #[default]
    Log,
    /// Append records as JSON lines to a file.
    File {
        /// Path of the JSON lines file.
        path: PathBuf,
    },
}

/// Hands trace records of instrumented streams to a sink.
#[derive(Clone, Default)]
pub struct Tracer {
    sink: Option<Arc<dyn TraceSink>>,
}

impl Tracer {
    /// A tracer submitting to `sink`.
    pub fn new(sink: impl TraceSink + 'static) -> Self {
        Self {
            sink: Some(Arc::new(sink)),
        }
    }

    /// A passthrough tracer.
    pub fn disabled() -> Self {
        Self { sink: None }
    }

    /// Build a tracer from configuration.
    ///
    /// A sink that cannot be created disables tracing instead of failing.
    pub fn from_config(config: &TraceConfig) -> Self {
        if !config.enabled {
            return Self::disabled();
        }

        match &config.sink {
            SinkConfig::Log => Self::new(LogSink),
            SinkConfig::File { path } => match JsonlSink::open(path) {
                Ok(sink) => Self::new(sink),
                Err(e) => {
                    tracing::warn!("tracing disabled, failed to open trace sink: {e:#}");
                    Self::disabled()
                }
            },
        }
    }

    /// Whether records are submitted anywhere.
    pub fn enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Instrument a canonical event stream.
    ///
    /// `inputs` is only evaluated when tracing is enabled.
    pub fn instrument<S>(
        &self,
        name: &str,
        run_type: RunType,
        inputs: impl FnOnce() -> Value,
        stream: S,
    ) -> Instrumented<S>
    where
        S: Stream<Item = Result<Event>>,
    {
        let record = self.sink.as_ref().map(|sink| {
            (
                sink.clone(),
                TraceRecord {
                    id: Ulid::new(),
                    name: name.into(),
                    run_type,
                    inputs: inputs(),
                    outputs: None,
                    error: None,
                    cancelled: false,
                    start_time: Utc::now(),
                    end_time: None,
                },
            )
        });
        Instrumented::new(stream, record)
    }
}

/// A [`Model`] whose every `create_message` call is traced.
#[derive(Clone)]
pub struct Traced<M> {
    inner: M,
    tracer: Tracer,
    name: CompactString,
}

impl<M: Model> Traced<M> {
    /// Trace calls to `inner` under `name`.
    pub fn new(inner: M, tracer: Tracer, name: impl Into<CompactString>) -> Self {
        Self {
            inner,
            tracer,
            name: name.into(),
        }
    }

    /// Trace calls to `inner` as configured.
    pub fn from_config(inner: M, config: &TraceConfig) -> Self {
        Self::new(inner, Tracer::from_config(config), config.name.clone())
    }
}

impl<M: Model> Model for Traced<M> {
    fn descriptor(&self) -> ModelDescriptor {
        self.inner.descriptor()
    }

    fn create_message(
        &self,
        system: &str,
        turns: &[Turn],
    ) -> impl Stream<Item = Result<Event>> + Send {
        let stream = self.inner.create_message(system, turns);
        self.tracer.instrument(
            &self.name,
            RunType::Llm,
            || {
                json!({
                    "model": self.inner.descriptor().id,
                    "system": system,
                    "turns": turns,
                })
            },
            stream,
        )
    }
}
