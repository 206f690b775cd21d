//! Tests for the Anthropic Messages transcoder and decoder.

use ccore::{
    Catalog, Error, Event, ModelDescriptor, Part, Result, Role, Turn, Usage, cache_targets,
};
use conduit_model::claude::{Chunk, Decoder, PROMPT_CACHING_BETA, decode, encode};
use futures_util::{StreamExt, stream};
use serde_json::{Value, json};

fn sonnet() -> ModelDescriptor {
    Catalog::anthropic().default_model().clone()
}

fn chunks(values: Value) -> Vec<Chunk> {
    serde_json::from_value(values).expect("chunks")
}

fn decode_all(chunks: Vec<Chunk>) -> Vec<Event> {
    let mut decoder = Decoder::default();
    let mut events: Vec<Event> = chunks
        .into_iter()
        .flat_map(|chunk| decoder.decode(chunk).expect("decode"))
        .collect();
    events.extend(decoder.finish());
    events
}

fn two_text_blocks() -> Value {
    json!([
        { "type": "message_start", "message": { "id": "msg_1", "usage": { "input_tokens": 5, "output_tokens": 0 } } },
        { "type": "content_block_start", "index": 0, "content_block": { "type": "text", "text": "A" } },
        { "type": "content_block_stop", "index": 0 },
        { "type": "content_block_start", "index": 1, "content_block": { "type": "text", "text": "B" } },
        { "type": "content_block_delta", "index": 1, "delta": { "type": "text_delta", "text": "!" } },
        { "type": "message_stop" },
    ])
}

// --- decoder ---

#[test]
fn decode_separates_text_blocks() {
    assert_eq!(
        decode_all(chunks(two_text_blocks())),
        vec![
            Event::Usage(Usage::new(5, 0)),
            Event::text("A"),
            Event::text("\n"),
            Event::text("B"),
            Event::text("!"),
            Event::Usage(Usage::new(5, 0)),
        ]
    );
}

#[test]
fn decode_is_deterministic() {
    assert_eq!(
        decode_all(chunks(two_text_blocks())),
        decode_all(chunks(two_text_blocks()))
    );
}

#[test]
fn message_delta_overwrites_output_tokens() {
    let events = decode_all(chunks(json!([
        { "type": "message_start", "message": { "usage": {
            "input_tokens": 20,
            "output_tokens": 1,
            "cache_creation_input_tokens": 7,
            "cache_read_input_tokens": 3,
        } } },
        { "type": "content_block_start", "index": 0, "content_block": { "type": "text", "text": "" } },
        { "type": "content_block_delta", "index": 0, "delta": { "type": "text_delta", "text": "hi" } },
        { "type": "message_delta", "delta": { "stop_reason": "end_turn" }, "usage": { "output_tokens": 12 } },
        { "type": "message_stop" },
    ])));

    let expected = Usage {
        cache_write_tokens: Some(7),
        cache_read_tokens: Some(3),
        ..Usage::new(20, 12)
    };
    assert_eq!(events.last(), Some(&Event::Usage(expected)));
    // empty inline text is not yielded
    assert_eq!(events[1], Event::text("hi"));
    assert_eq!(events.iter().filter(|e| e.as_usage().is_some()).count(), 2);
}

#[test]
fn non_text_blocks_are_skipped() {
    let events = decode_all(chunks(json!([
        { "type": "content_block_start", "index": 0, "content_block": { "type": "thinking", "thinking": "" } },
        { "type": "content_block_delta", "index": 0, "delta": { "type": "thinking_delta", "thinking": "hmm" } },
        { "type": "content_block_stop", "index": 0 },
        { "type": "content_block_start", "index": 1, "content_block": { "type": "tool_use", "id": "t", "name": "f", "input": {} } },
        { "type": "content_block_delta", "index": 1, "delta": { "type": "input_json_delta", "partial_json": "{}" } },
        { "type": "content_block_start", "index": 2, "content_block": { "type": "text", "text": "done" } },
        { "type": "ping" },
        { "type": "some_future_event", "payload": 1 },
    ])));

    assert_eq!(events, vec![Event::text("\n"), Event::text("done")]);
}

#[test]
fn no_usage_reported_means_no_usage_event() {
    let events = decode_all(chunks(json!([
        { "type": "message_start", "message": { "id": "msg_1" } },
        { "type": "content_block_start", "index": 0, "content_block": { "type": "text", "text": "x" } },
        { "type": "message_stop" },
    ])));

    assert_eq!(events, vec![Event::text("x")]);
}

#[test]
fn error_chunk_is_a_transport_error() {
    let mut decoder = Decoder::default();
    let chunk: Chunk = serde_json::from_value(json!({
        "type": "error",
        "error": { "type": "overloaded_error", "message": "Overloaded" },
    }))
    .expect("chunk");

    let err = decoder.decode(chunk).expect_err("error chunk");
    assert!(err.is_transport());
    assert_eq!(err.to_string(), "transport error: overloaded_error: Overloaded");
}

#[tokio::test]
async fn transport_failure_ends_stream_without_usage() {
    let mut items: Vec<Result<Chunk>> = chunks(json!([
        { "type": "message_start", "message": { "usage": { "input_tokens": 5, "output_tokens": 0 } } },
        { "type": "content_block_start", "index": 0, "content_block": { "type": "text", "text": "A" } },
        { "type": "content_block_delta", "index": 0, "delta": { "type": "text_delta", "text": "B" } },
    ]))
    .into_iter()
    .map(Ok)
    .collect();
    items.push(Err(Error::Transport("connection reset".into())));
    items.push(Ok(serde_json::from_value(json!({ "type": "message_stop" })).expect("chunk")));

    let output: Vec<_> = decode(stream::iter(items)).collect().await;
    assert_eq!(output.len(), 4);
    assert_eq!(output[1].as_ref().ok(), Some(&Event::text("A")));
    assert_eq!(output[2].as_ref().ok(), Some(&Event::text("B")));
    assert!(matches!(&output[3], Err(Error::Transport(_))));
}

#[tokio::test]
async fn stream_appends_final_usage() {
    let items = chunks(two_text_blocks()).into_iter().map(Ok);
    let output: Vec<Event> = decode(stream::iter(items))
        .map(|item| item.expect("event"))
        .collect()
        .await;

    assert_eq!(output, decode_all(chunks(two_text_blocks())));
    let last_text = output.iter().rposition(|e| e.as_text().is_some());
    let last_usage = output.iter().rposition(|e| e.as_usage().is_some());
    assert!(last_usage > last_text);
}

// --- transcoder ---

#[test]
fn encode_places_system_prompt_top_level() {
    let turns = [Turn::user("hi")];
    let request = encode("be brief", &turns, &sonnet());

    assert_eq!(
        serde_json::to_value(&request.body).expect("body"),
        json!({
            "model": "claude-3-5-sonnet-20241022",
            "max_tokens": 8192,
            "temperature": 0.0,
            "system": [
                { "type": "text", "text": "be brief", "cache_control": { "type": "ephemeral" } },
            ],
            "messages": [
                { "role": "user", "content": [
                    { "type": "text", "text": "hi", "cache_control": { "type": "ephemeral" } },
                ] },
            ],
            "stream": true,
        })
    );
    assert_eq!(
        request.headers.get("anthropic-beta").map(|v| v.to_str().expect("ascii")),
        Some(PROMPT_CACHING_BETA)
    );
}

#[test]
fn system_turns_join_the_system_blocks() {
    let turns = [
        Turn::user("a"),
        Turn::system("remember this"),
        Turn::assistant("b"),
    ];
    let request = encode("base", &turns, &ModelDescriptor::new("plain"));

    assert_eq!(
        request.body.system,
        vec![
            json!({ "type": "text", "text": "base" }),
            json!({ "type": "text", "text": "remember this" }),
        ]
    );
    assert_eq!(request.body.messages.len(), 2);
    assert_eq!(request.body.messages[1]["role"], "assistant");
}

#[test]
fn uncacheable_model_gets_no_hints() {
    let turns = [Turn::user("a"), Turn::assistant("b"), Turn::user("c")];
    let request = encode("sys", &turns, &ModelDescriptor::new("plain"));

    assert!(!request.body.uses_cache());
    assert!(request.headers.get("anthropic-beta").is_none());
    assert_eq!(request.body.messages[0]["content"], "a");
    assert_eq!(request.body.max_tokens, conduit_model::DEFAULT_MAX_TOKENS);
    assert_eq!(request.body.temperature, 0.0);
    assert!(request.body.stream);
}

#[test]
fn max_tokens_follows_descriptor() {
    let opus = Catalog::anthropic().resolve(Some("claude-3-opus-20240229"));
    assert_eq!(encode("", &[], &opus).body.max_tokens, 4096);
}

#[test]
fn parts_map_to_content_blocks() {
    let turns = [Turn::parts(
        Role::User,
        [
            Part::image("image/png", "aGk="),
            Part::opaque(json!({ "type": "document", "source": { "type": "text", "data": "doc" } })),
            Part::text("summarize"),
        ],
    )];
    let request = encode("", &turns, &ModelDescriptor::new("plain"));

    assert!(request.body.system.is_empty());
    assert_eq!(
        request.body.messages[0]["content"],
        json!([
            { "type": "image", "source": { "type": "base64", "media_type": "image/png", "data": "aGk=" } },
            { "type": "document", "source": { "type": "text", "data": "doc" } },
            { "type": "text", "text": "summarize" },
        ])
    );
}

#[test]
fn cached_parts_match_policy() {
    let turns = [
        Turn::user("1"),
        Turn::assistant("2"),
        Turn::user("3"),
        Turn::assistant("4"),
        Turn::user("5"),
    ];
    let request = encode("sys", &turns, &sonnet());

    let cached: Vec<usize> = request
        .body
        .messages
        .iter()
        .enumerate()
        .filter(|(_, message)| {
            message["content"]
                .as_array()
                .is_some_and(|blocks| blocks.iter().any(|b| b.get("cache_control").is_some()))
        })
        .map(|(index, _)| index)
        .collect();

    let mut expected = cache_targets(&turns);
    expected.sort_unstable();
    assert_eq!(cached, expected);
}
