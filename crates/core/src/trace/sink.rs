//! Trace sinks.

use super::TraceRecord;
use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::Path,
};

/// Destination of trace records.
///
/// Errors returned here are logged by the tracer and never reach the traced
/// stream. Sinks must report failures through the returned `Result`: the
/// tracer also catches panics, but only under `panic = "unwind"`. The `prod`
/// profile builds with `panic = "abort"`, where a panicking sink aborts the
/// process.
pub trait TraceSink: Send + Sync {
    /// Submit one completed record.
    fn submit(&self, record: &TraceRecord) -> Result<()>;
}

/// Emits records as `tracing` events under the `conduit::trace` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl TraceSink for LogSink {
    fn submit(&self, record: &TraceRecord) -> Result<()> {
        let json = serde_json::to_string(record)?;
        tracing::info!(
            target: "conduit::trace",
            id = %record.id,
            name = %record.name,
            failed = record.error.is_some(),
            "{json}"
        );
        Ok(())
    }
}

/// Appends records as JSON lines to a file.
#[derive(Debug)]
pub struct JsonlSink {
    file: Mutex<File>,
}

impl JsonlSink {
    /// Open (or create) the file at `path` for appending.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open trace file {}", path.display()))?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl TraceSink for JsonlSink {
    fn submit(&self, record: &TraceRecord) -> Result<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        let mut file = self.file.lock();
        file.write_all(&line)?;
        file.flush()?;
        Ok(())
    }
}

/// Collects records in memory.
#[cfg(feature = "testing")]
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: std::sync::Arc<Mutex<Vec<TraceRecord>>>,
    failing: bool,
}

#[cfg(feature = "testing")]
impl MemorySink {
    /// An empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink rejecting every record.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Records submitted so far.
    pub fn records(&self) -> Vec<TraceRecord> {
        self.records.lock().clone()
    }
}

#[cfg(feature = "testing")]
impl TraceSink for MemorySink {
    fn submit(&self, record: &TraceRecord) -> Result<()> {
        if self.failing {
            anyhow::bail!("sink unavailable");
        }
        self.records.lock().push(record.clone());
        Ok(())
    }
}
