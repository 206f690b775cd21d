//! Loopback HTTP fixture serving one canned response.

#![allow(dead_code)]

use serde_json::Value;
use std::time::Duration;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    task::JoinHandle,
};

/// A request captured by the fixture.
pub struct Captured {
    /// Request line and headers.
    pub head: String,
    /// Request body.
    pub body: String,
}

impl Captured {
    /// Value of a request header.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.lines().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim().eq_ignore_ascii_case(name).then(|| value.trim())
        })
    }

    /// The body parsed as JSON.
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("json body")
    }
}

/// Serve `response` to the first connection and return the endpoint plus a
/// handle resolving to the captured request.
pub async fn serve(response: String) -> (String, JoinHandle<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let captured = read_request(&mut socket).await;
        socket
            .write_all(response.as_bytes())
            .await
            .expect("write response");
        let _ = socket.shutdown().await;
        captured
    });
    (format!("http://{addr}/v1/stream"), handle)
}

/// Serve `first` to the first connection, then wait for the client to close
/// it without sending anything more. The handle resolves to whether the
/// close was observed within five seconds.
pub async fn serve_until_closed(first: String) -> (String, JoinHandle<bool>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        read_request(&mut socket).await;
        socket
            .write_all(first.as_bytes())
            .await
            .expect("write response");
        socket.flush().await.expect("flush");

        let mut rest = [0u8; 64];
        let closed = tokio::time::timeout(Duration::from_secs(5), socket.read(&mut rest)).await;
        matches!(closed, Ok(Ok(0)) | Ok(Err(_)))
    });
    (format!("http://{addr}/v1/stream"), handle)
}

/// A 200 response streaming each payload as one SSE `data:` block.
pub fn sse(payloads: &[&str]) -> String {
    let mut response = String::from(
        "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\nconnection: close\r\n\r\n",
    );
    for payload in payloads {
        response.push_str(&format!("data: {payload}\n\n"));
    }
    response
}

/// A 200 response whose declared length exceeds the bytes actually sent.
pub fn truncated(payloads: &[&str]) -> String {
    let body: String = payloads
        .iter()
        .map(|payload| format!("data: {payload}\n\n"))
        .collect();
    format!(
        "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\ncontent-length: {}\r\n\r\n{body}",
        body.len() + 512
    )
}

/// A complete non-streaming response with the given status line.
pub fn status(status: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    )
}

async fn read_request(socket: &mut TcpStream) -> Captured {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_end = loop {
        let n = socket.read(&mut chunk).await.expect("read request");
        assert!(n > 0, "connection closed before request head");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let length = head
        .lines()
        .find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())?
        })
        .unwrap_or(0);
    while buf.len() < head_end + length {
        let n = socket.read(&mut chunk).await.expect("read body");
        assert!(n > 0, "connection closed before request body");
        buf.extend_from_slice(&chunk[..n]);
    }

    Captured {
        head,
        body: String::from_utf8_lossy(&buf[head_end..head_end + length]).into_owned(),
    }
}
