//! Model trait implementation for the Claude (Anthropic) provider.

use super::{Claude, decode, encode};
use ccore::{Event, Model, ModelDescriptor, Result, Turn};
use futures_core::Stream;

impl Model for Claude {
    fn descriptor(&self) -> ModelDescriptor {
        self.catalog.resolve(self.model.as_deref())
    }

    fn create_message(
        &self,
        system: &str,
        turns: &[Turn],
    ) -> impl Stream<Item = Result<Event>> + Send {
        let request = encode(system, turns, &self.descriptor());
        decode(self.http.stream_sse(&request.body, request.headers))
    }
}
