//! Stream adapter forwarding events while collecting a trace summary.

use super::{TraceRecord, TraceSink};
use crate::{Event, Result, Usage};
use chrono::Utc;
use futures_core::Stream;
use serde_json::json;
use std::{
    panic::{self, AssertUnwindSafe},
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

/// A canonical event stream instrumented by a [`super::Tracer`].
///
/// Events pass through unchanged. The record is submitted exactly once: at
/// the end of the stream, on the first error, or on drop.
pub struct Instrumented<S> {
    inner: Pin<Box<S>>,
    run: Option<Run>,
}

impl<S> Instrumented<S> {
    pub(super) fn new(stream: S, record: Option<(Arc<dyn TraceSink>, TraceRecord)>) -> Self {
        Self {
            inner: Box::pin(stream),
            run: record.map(|(sink, record)| Run {
                sink,
                record,
                text: String::new(),
                usage: None,
            }),
        }
    }
}

impl<S> Stream for Instrumented<S>
where
    S: Stream<Item = Result<Event>>,
{
    type Item = Result<Event>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let poll = this.inner.as_mut().poll_next(cx);

        match &poll {
            Poll::Ready(Some(Ok(event))) => {
                if let Some(run) = this.run.as_mut() {
                    run.observe(event);
                }
            }
            Poll::Ready(Some(Err(e))) => {
                if let Some(run) = this.run.take() {
                    run.finish(Some(e.to_string()), false);
                }
            }
            Poll::Ready(None) => {
                if let Some(run) = this.run.take() {
                    run.finish(None, false);
                }
            }
            Poll::Pending => {}
        }

        poll
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<S> Drop for Instrumented<S> {
    fn drop(&mut self) {
        if let Some(run) = self.run.take() {
            run.finish(None, true);
        }
    }
}

/// An in-flight trace record.
struct Run {
    sink: Arc<dyn TraceSink>,
    record: TraceRecord,
    text: String,
    usage: Option<Usage>,
}

impl Run {
    fn observe(&mut self, event: &Event) {
        match event {
            Event::Text { text } => self.text.push_str(text),
            Event::Usage(usage) => self.usage = Some(*usage),
        }
    }

    fn finish(self, error: Option<String>, cancelled: bool) {
        let Self {
            sink,
            mut record,
            text,
            usage,
        } = self;

        record.outputs = Some(json!({ "text": text, "usage": usage }));
        record.error = error;
        record.cancelled = cancelled;
        record.end_time = Some(Utc::now());

        // a panicking sink must not abort an unwinding thread
        if std::thread::panicking() {
            return;
        }

        // only effective under panic = "unwind"
        match panic::catch_unwind(AssertUnwindSafe(|| sink.submit(&record))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("failed to submit trace {}: {e:#}", record.id),
            Err(_) => tracing::warn!("trace sink panicked while submitting {}", record.id),
        }
    }
}
