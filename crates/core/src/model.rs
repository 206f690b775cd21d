//! The adapter contract every backend implements.

use crate::{Event, ModelDescriptor, Result, Turn};
use futures_core::Stream;

/// Converse-and-stream capability of one backend.
///
/// Constructors are inherent methods on each adapter; the variant is chosen
/// at configuration time, never called polymorphically.
pub trait Model: Sized + Clone + Send + Sync {
    /// The descriptor requests are built for. Pure, no I/O.
    fn descriptor(&self) -> ModelDescriptor;

    /// Stream a response to `turns` under `system`.
    ///
    /// The stream is lazy and single-pass: nothing is sent until the first
    /// poll, and dropping it releases the connection. It yields text events
    /// in backend order and ends with one usage event when the backend
    /// reports usage. A transport failure ends it with [`crate::Error`];
    /// events yielded before the failure stay valid.
    fn create_message(
        &self,
        system: &str,
        turns: &[Turn],
    ) -> impl Stream<Item = Result<Event>> + Send;
}
