//! Shared HTTP transport for streaming providers.
//!
//! `HttpProvider` wraps a `reqwest::Client` with pre-configured headers and
//! endpoint URL, and opens Server-Sent Events streams whose `data:` payloads
//! are deserialized into backend-native chunks. Anthropic and the
//! OpenAI-compatible backends share it; only the chunk type differs.

use async_stream::try_stream;
use ccore::{Error, Result};
use futures_core::Stream;
use futures_util::StreamExt;
use reqwest::{
    Client, Method, Response,
    header::{self, HeaderMap, HeaderName, HeaderValue},
};
use serde::{Serialize, de::DeserializeOwned};

/// A transcoded request: the backend body plus the headers this particular
/// request needs on top of the provider's static ones.
#[derive(Debug, Clone)]
pub struct WireRequest<B> {
    /// The request body.
    pub body: B,
    /// Per-request headers, e.g. beta opt-ins.
    pub headers: HeaderMap,
}

/// Shared HTTP transport.
///
/// Holds a `reqwest::Client`, pre-built headers (auth + content-type),
/// and the target endpoint URL.
#[derive(Clone, Debug)]
pub struct HttpProvider {
    client: Client,
    headers: HeaderMap,
    endpoint: String,
}

impl HttpProvider {
    /// Create a provider with Bearer token authentication.
    pub fn bearer(client: Client, key: &str, endpoint: &str) -> Result<Self> {
        let value = format!("Bearer {key}")
            .parse::<HeaderValue>()
            .map_err(|e| Error::config(format!("invalid api key: {e}")))?;
        Ok(Self::no_auth(client, endpoint).with_header(header::AUTHORIZATION, value))
    }

    /// Create a provider with a custom header for authentication.
    ///
    /// Used by providers that don't use Bearer tokens (e.g. Anthropic
    /// uses `x-api-key`).
    pub fn custom_header(
        client: Client,
        header_name: &str,
        header_value: &str,
        endpoint: &str,
    ) -> Result<Self> {
        let name = header_name
            .parse::<HeaderName>()
            .map_err(|e| Error::config(format!("invalid header name {header_name}: {e}")))?;
        let value = header_value
            .parse::<HeaderValue>()
            .map_err(|e| Error::config(format!("invalid value for {header_name}: {e}")))?;
        Ok(Self::no_auth(client, endpoint).with_header(name, value))
    }

    /// Create a provider without authentication.
    pub fn no_auth(client: Client, endpoint: &str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("text/event-stream"));
        Self {
            client,
            headers,
            endpoint: endpoint.to_owned(),
        }
    }

    /// Add a static header sent with every request.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Stream an SSE response.
    ///
    /// Nothing is sent until the stream is first polled. Blocks are split on
    /// blank lines, `data:` lines are joined, the `[DONE]` sentinel is
    /// skipped and each payload is deserialized as `T`. Payloads that fail
    /// to deserialize are logged and skipped. Connection failures, non-2xx
    /// statuses, body interruptions and bodies that are not an event stream
    /// end the stream with [`Error::Transport`]. Dropping the stream drops
    /// the response and releases the connection.
    pub fn stream_sse<T, B>(
        &self,
        body: &B,
        extra: HeaderMap,
    ) -> impl Stream<Item = Result<T>> + Send + 'static + use<T, B>
    where
        T: DeserializeOwned + Send + 'static,
        B: Serialize,
    {
        if let Ok(body) = serde_json::to_string(body) {
            tracing::trace!("request: {}", body);
        }

        let mut headers = self.headers.clone();
        headers.extend(extra);
        let request = self
            .client
            .request(Method::POST, &self.endpoint)
            .headers(headers)
            .json(body);

        try_stream! {
            let response = request.send().await.map_err(Error::transport)?;
            let response = ensure_success(response).await?;
            let mut stream = response.bytes_stream();
            let mut buf: Vec<u8> = Vec::new();
            let mut shape = BodyShape::default();
            while let Some(next) = stream.next().await {
                let bytes = next.map_err(Error::transport)?;
                buf.extend(bytes.iter().filter(|b| **b != b'\r'));
                while let Some(pos) = buf.windows(2).position(|w| w == b"\n\n") {
                    let block: Vec<u8> = buf.drain(..pos + 2).collect();
                    let block = String::from_utf8_lossy(&block);
                    shape.inspect(&block);
                    if let Some(chunk) = parse_block(&block) {
                        yield chunk;
                    }
                }
            }

            // Handle any remaining data in buffer.
            let rest = String::from_utf8_lossy(&buf);
            shape.inspect(&rest);
            if let Some(chunk) = parse_block(&rest) {
                yield chunk;
            }
            shape.ensure_event_stream()?;
        }
    }

    /// Get the endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Get a reference to the headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

/// Turn a non-2xx response into a transport error carrying the body.
async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    Err(Error::Transport(format!("{status}: {text}")))
}

/// What the response body looked like, to tell an event stream from a
/// plain response served with a success status.
#[derive(Default)]
struct BodyShape {
    data: bool,
    stray: Option<String>,
}

impl BodyShape {
    fn inspect(&mut self, block: &str) {
        if block.lines().any(|line| line.starts_with("data:")) {
            self.data = true;
        } else if self.stray.is_none()
            && !block
                .lines()
                .filter(|line| !line.trim().is_empty())
                .all(is_sse_line)
        {
            self.stray = Some(block.trim().chars().take(256).collect());
        }
    }

    /// Fail if the body carried content but never a `data:` line.
    fn ensure_event_stream(self) -> Result<()> {
        match self.stray {
            Some(stray) if !self.data => Err(Error::Transport(format!(
                "unexpected response body: {stray}"
            ))),
            _ => Ok(()),
        }
    }
}

fn is_sse_line(line: &str) -> bool {
    line.starts_with(':')
        || ["data:", "event:", "id:", "retry:"]
            .iter()
            .any(|field| line.starts_with(field))
}

/// Parse a single SSE block (may contain `event:`, `data:` and comment
/// lines).
fn parse_block<T: DeserializeOwned>(block: &str) -> Option<T> {
    let data = block
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(str::trim_start)
        .collect::<Vec<_>>()
        .join("\n");
    if data.is_empty() || data == "[DONE]" {
        return None;
    }

    tracing::trace!("chunk: {data}");
    match serde_json::from_str(&data) {
        Ok(chunk) => Some(chunk),
        Err(e) => {
            tracing::warn!("failed to parse chunk: {e}, data: {data}");
            None
        }
    }
}
