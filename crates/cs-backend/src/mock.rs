//! Mock transport for testing.
//!
//! Renders a scripted reply into the exact bytes the chat endpoint sends, so
//! every layer from the line decoder up can be exercised without HTTP.

use std::time::Duration;

use async_stream::stream;
use bytes::{Bytes, BytesMut};
use futures::Stream;
use thiserror::Error;
use tokio::time::sleep;

use crate::error::ChatError;
use crate::sink::StreamSink;

/// One scripted step of a mock reply.
#[derive(Debug, Clone)]
pub enum MockFrame {
    /// `data:{"type":"start"}`
    Start,
    /// `data:{"type":"chunk","content":...}`
    Chunk { content: String },
    /// `data:{"type":"complete"}` with optional final content.
    Complete { content: Option<String> },
    /// `data:{"type":"error","error":...}`
    Error { message: String },
    /// An arbitrary line, newline appended.
    Raw { line: String },
    /// Bytes with no terminator.
    Unterminated { text: String },
    /// Fail the transport at this point.
    Fail { message: String },
    /// Delay before the next frame (for timing tests).
    Delay { ms: u64 },
}

impl MockFrame {
    pub fn chunk(content: impl Into<String>) -> Self {
        MockFrame::Chunk {
            content: content.into(),
        }
    }

    pub fn complete(content: impl Into<String>) -> Self {
        MockFrame::Complete {
            content: Some(content.into()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        MockFrame::Error {
            message: message.into(),
        }
    }

    pub fn raw(line: impl Into<String>) -> Self {
        MockFrame::Raw { line: line.into() }
    }

    pub fn unterminated(text: impl Into<String>) -> Self {
        MockFrame::Unterminated { text: text.into() }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        MockFrame::Fail {
            message: message.into(),
        }
    }

    /// Wire text for this frame. `None` for control steps.
    pub fn render(&self) -> Option<String> {
        let payload = match self {
            MockFrame::Start => serde_json::json!({ "type": "start" }),
            MockFrame::Chunk { content } => {
                serde_json::json!({ "type": "chunk", "content": content })
            }
            MockFrame::Complete { content: Some(content) } => {
                serde_json::json!({ "type": "complete", "content": content })
            }
            MockFrame::Complete { content: None } => serde_json::json!({ "type": "complete" }),
            MockFrame::Error { message } => {
                serde_json::json!({ "type": "error", "error": message })
            }
            MockFrame::Raw { line } => return Some(format!("{line}\n")),
            MockFrame::Unterminated { text } => return Some(text.clone()),
            MockFrame::Fail { .. } | MockFrame::Delay { .. } => return None,
        };
        Some(format!("data:{payload}\n"))
    }
}

/// Configuration for a mock transport.
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Frames to send, in order.
    pub frames: Vec<MockFrame>,
    /// Re-chunk the body into pieces of this many bytes, ignoring frame and
    /// character boundaries. `None` sends one transport chunk per frame.
    pub split: Option<usize>,
    /// Optional delay before each frame (ms).
    pub chunk_delay_ms: Option<u64>,
}

impl MockConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_frames(mut self, frames: Vec<MockFrame>) -> Self {
        self.frames = frames;
        self
    }

    pub fn with_split(mut self, bytes: usize) -> Self {
        self.split = Some(bytes.max(1));
        self
    }

    pub fn with_chunk_delay(mut self, ms: u64) -> Self {
        self.chunk_delay_ms = Some(ms);
        self
    }

    /// The full body as the server would send it, up to the first failure.
    pub fn body(&self) -> String {
        self.frames
            .iter()
            .take_while(|f| !matches!(f, MockFrame::Fail { .. }))
            .filter_map(MockFrame::render)
            .collect()
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("mock transport failure: {0}")]
pub struct MockTransportError(pub String);

impl From<MockTransportError> for ChatError {
    fn from(err: MockTransportError) -> Self {
        ChatError::Transport(err.0)
    }
}

/// Create a byte stream from mock config.
pub fn mock_transport(
    config: MockConfig,
) -> impl Stream<Item = Result<Bytes, MockTransportError>> + Send {
    let MockConfig {
        frames,
        split,
        chunk_delay_ms,
    } = config;

    stream! {
        let mut carry = BytesMut::new();

        for frame in frames {
            if let Some(delay_ms) = chunk_delay_ms {
                sleep(Duration::from_millis(delay_ms)).await;
            }

            match frame {
                MockFrame::Delay { ms } => {
                    sleep(Duration::from_millis(ms)).await;
                    continue;
                }
                MockFrame::Fail { message } => {
                    if !carry.is_empty() {
                        yield Ok(carry.split().freeze());
                    }
                    yield Err(MockTransportError(message));
                    return;
                }
                other => {
                    if let Some(text) = other.render() {
                        carry.extend_from_slice(text.as_bytes());
                    }
                }
            }

            match split {
                Some(size) => {
                    while carry.len() >= size {
                        yield Ok(carry.split_to(size).freeze());
                    }
                }
                None => {
                    yield Ok(carry.split().freeze());
                }
            }
        }

        if !carry.is_empty() {
            yield Ok(carry.split().freeze());
        }
    }
}

/// A callback observed by [`RecordingSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    Chunk(String),
    Complete(String),
    Error(String),
}

/// Sink that records every callback in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub calls: Vec<SinkCall>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chunks(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                SinkCall::Chunk(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                SinkCall::Error(m) => Some(m.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn completed(&self) -> Option<&str> {
        self.calls.iter().find_map(|c| match c {
            SinkCall::Complete(t) => Some(t.as_str()),
            _ => None,
        })
    }

    pub fn error_count(&self) -> usize {
        self.errors().len()
    }

    pub fn terminal_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| !matches!(c, SinkCall::Chunk(_)))
            .count()
    }
}

impl StreamSink for RecordingSink {
    fn on_chunk(&mut self, text: &str) {
        self.calls.push(SinkCall::Chunk(text.to_string()));
    }

    fn on_complete(&mut self, text: &str) {
        self.calls.push(SinkCall::Complete(text.to_string()));
    }

    fn on_error(&mut self, message: &str) {
        self.calls.push(SinkCall::Error(message.to_string()));
    }
}

/// Built-in test fixtures for common scenarios.
pub mod fixtures {
    use super::*;

    /// A normal reply: start, the chunks, then complete.
    pub fn reply(chunks: &[&str], final_content: Option<&str>) -> MockConfig {
        let mut frames = vec![MockFrame::Start];
        frames.extend(chunks.iter().map(|c| MockFrame::chunk(*c)));
        frames.push(MockFrame::Complete {
            content: final_content.map(str::to_string),
        });
        MockConfig::new().with_frames(frames)
    }

    /// The server reports an error before producing any text.
    pub fn server_error(message: &str) -> MockConfig {
        MockConfig::new().with_frames(vec![MockFrame::Start, MockFrame::error(message)])
    }

    /// Some chunks, then the connection breaks.
    pub fn fail_mid_stream(chunks: &[&str], message: &str) -> MockConfig {
        let mut frames = vec![MockFrame::Start];
        frames.extend(chunks.iter().map(|c| MockFrame::chunk(*c)));
        frames.push(MockFrame::fail(message));
        MockConfig::new().with_frames(frames)
    }

    /// Framing as emitted by the chat server: each event preceded by an
    /// `event:message` line and followed by a blank line, with the final
    /// text under `fullContent`.
    pub fn spring_framed(chunks: &[&str]) -> MockConfig {
        let mut frames = Vec::new();
        for chunk in chunks {
            frames.push(MockFrame::raw("event:message"));
            frames.push(MockFrame::raw(format!(
                "data:{}",
                serde_json::json!({ "type": "chunk", "content": chunk })
            )));
            frames.push(MockFrame::raw(""));
        }
        frames.push(MockFrame::raw("event:message"));
        frames.push(MockFrame::raw(format!(
            "data:{}",
            serde_json::json!({ "type": "complete", "fullContent": chunks.concat() })
        )));
        frames.push(MockFrame::raw(""));
        MockConfig::new().with_frames(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    async fn collect(config: MockConfig) -> Vec<Result<Bytes, MockTransportError>> {
        mock_transport(config).collect().await
    }

    #[test]
    fn frames_render_as_data_lines() {
        assert_eq!(
            MockFrame::Start.render().as_deref(),
            Some("data:{\"type\":\"start\"}\n")
        );
        let rendered = MockFrame::error("bad").render().unwrap();
        let payload: serde_json::Value =
            serde_json::from_str(rendered.strip_prefix("data:").unwrap().trim_end()).unwrap();
        assert_eq!(payload, serde_json::json!({ "type": "error", "error": "bad" }));
        assert_eq!(
            crate::frame::parse_frame(MockFrame::complete("done").render().unwrap().trim_end()),
            Some(cs_protocol::StreamEvent::Complete(Some("done".to_string())))
        );
        assert_eq!(MockFrame::fail("x").render(), None);
        assert_eq!(MockFrame::Delay { ms: 1 }.render(), None);
    }

    #[tokio::test]
    async fn one_transport_chunk_per_frame() {
        let chunks = collect(fixtures::reply(&["A", "B"], None)).await;
        assert_eq!(chunks.len(), 4);
        assert!(chunks.iter().all(|c| c.is_ok()));
    }

    #[tokio::test]
    async fn split_rechunks_whole_body() {
        let config = fixtures::reply(&["héllo"], Some("héllo")).with_split(3);
        let body = config.body();
        let chunks = collect(config).await;

        let joined: Vec<u8> = chunks
            .iter()
            .flat_map(|c| c.as_ref().unwrap().to_vec())
            .collect();
        assert_eq!(joined, body.as_bytes());
        assert!(chunks.iter().all(|c| c.as_ref().unwrap().len() <= 3));
    }

    #[tokio::test]
    async fn failure_flushes_pending_bytes_first() {
        let config = fixtures::fail_mid_stream(&["A"], "reset").with_split(1000);
        let chunks = collect(config).await;

        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].is_ok());
        assert_eq!(chunks[1], Err(MockTransportError("reset".to_string())));
    }

    #[tokio::test]
    async fn delays_do_not_emit_bytes() {
        let config = MockConfig::new()
            .with_frames(vec![
                MockFrame::chunk("A"),
                MockFrame::Delay { ms: 5 },
                MockFrame::chunk("B"),
            ])
            .with_chunk_delay(1);
        let chunks = collect(config).await;
        assert_eq!(chunks.len(), 2);
    }

    #[tokio::test]
    async fn spring_fixture_body() {
        let body = fixtures::spring_framed(&["a"]).body();
        assert!(body.starts_with("event:message\ndata:{"));
        assert!(body.contains("\"fullContent\":\"a\""));
        assert!(body.ends_with("\n\n"));
    }

    #[test]
    fn recording_sink_helpers() {
        let mut sink = RecordingSink::new();
        sink.on_chunk("A");
        sink.on_error("boom");
        assert_eq!(sink.chunks(), vec!["A"]);
        assert_eq!(sink.errors(), vec!["boom"]);
        assert_eq!(sink.completed(), None);
        assert_eq!(sink.terminal_count(), 1);
    }
}
