//! Event interpretation and reply accumulation.

use cs_protocol::StreamEvent;

use crate::sink::StreamSink;

/// Result of consuming one reply stream to its end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamSummary {
    /// Chunk content accumulated since the last `start`.
    pub content: String,
    /// Number of chunk events delivered.
    pub chunks: usize,
    /// Text passed to `on_complete`, if it fired.
    pub completed: Option<String>,
    /// Message passed to `on_error` by an in-band error event.
    pub error: Option<String>,
}

/// Drives sink callbacks from events and keeps the running reply text.
///
/// Lives for exactly one stream. At most one terminal callback fires; events
/// that arrive after it still update the accumulation but reach no callback.
#[derive(Debug, Default)]
pub struct ReplyAccumulator {
    content: String,
    chunks: usize,
    completed: Option<String>,
    error: Option<String>,
    terminated: bool,
}

impl ReplyAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Whether `on_complete` or `on_error` has already fired.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Apply one event and drive the matching callback.
    ///
    /// `start` resets the accumulation. `chunk` appends and forwards the
    /// fragment. `complete` reports its own text when present, else the
    /// accumulation. Only the first `complete` or `error` reaches the sink;
    /// chunks after it are still accumulated but not delivered.
    pub fn apply<K: StreamSink + ?Sized>(&mut self, event: StreamEvent, sink: &mut K) {
        match event {
            StreamEvent::Start => {
                self.content.clear();
            }
            StreamEvent::Chunk(text) => {
                self.content.push_str(&text);
                if self.terminated {
                    tracing::debug!("chunk after terminal event not delivered");
                    return;
                }
                self.chunks += 1;
                sink.on_chunk(&text);
            }
            StreamEvent::Complete(text) => {
                if self.terminated {
                    tracing::debug!("duplicate terminal event ignored");
                    return;
                }
                let text = text.unwrap_or_else(|| self.content.clone());
                self.terminated = true;
                sink.on_complete(&text);
                self.completed = Some(text);
            }
            StreamEvent::Error(message) => {
                if self.terminated {
                    tracing::debug!(error = %message, "error after terminal event not delivered");
                    return;
                }
                self.terminated = true;
                sink.on_error(&message);
                self.error = Some(message);
            }
        }
    }

    /// Report a transport failure unless a terminal callback already fired.
    pub fn fail<K: StreamSink + ?Sized>(&mut self, message: &str, sink: &mut K) {
        if self.terminated {
            tracing::debug!(error = message, "transport failure after terminal event");
            return;
        }
        self.terminated = true;
        sink.on_error(message);
    }

    /// Consume the accumulator at end of stream.
    pub fn finish(self) -> StreamSummary {
        StreamSummary {
            content: self.content,
            chunks: self.chunks,
            completed: self.completed,
            error: self.error,
        }
    }
}
