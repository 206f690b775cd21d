//! Model trait implementation for the OpenAI-compatible provider.

use super::{OpenAI, decode, encode};
use ccore::{Event, Model, ModelDescriptor, Result, Turn};
use futures_core::Stream;

impl Model for OpenAI {
    fn descriptor(&self) -> ModelDescriptor {
        self.catalog.resolve(self.model.as_deref())
    }

    fn create_message(
        &self,
        system: &str,
        turns: &[Turn],
    ) -> impl Stream<Item = Result<Event>> + Send {
        let request = encode(system, turns, &self.descriptor(), self.usage);
        decode(self.http.stream_sse(&request.body, request.headers))
    }
}
