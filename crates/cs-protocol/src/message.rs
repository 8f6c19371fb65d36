//! Event types carried by the reply stream.

use serde::Deserialize;

/// Events produced by the framer, in stream order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A new logical reply begins. Accumulated content is discarded.
    Start,

    /// An incremental fragment of reply text.
    Chunk(String),

    /// The server finished the reply. Carries the final text when the server
    /// supplied a non-empty one.
    Complete(Option<String>),

    /// The server reported a failure in-band.
    Error(String),
}

impl StreamEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            StreamEvent::Start => EventKind::Start,
            StreamEvent::Chunk(_) => EventKind::Chunk,
            StreamEvent::Complete(_) => EventKind::Complete,
            StreamEvent::Error(_) => EventKind::Error,
        }
    }
}

/// The event vocabulary understood by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Start,
    Chunk,
    Complete,
    Error,
}

impl EventKind {
    /// Map a frame's `type` string. Matching is exact and case-sensitive.
    pub fn from_type(value: &str) -> Option<Self> {
        match value {
            "start" => Some(EventKind::Start),
            "chunk" => Some(EventKind::Chunk),
            "complete" => Some(EventKind::Complete),
            "error" => Some(EventKind::Error),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Start => "start",
            EventKind::Chunk => "chunk",
            EventKind::Complete => "complete",
            EventKind::Error => "error",
        }
    }
}

/// Raw JSON payload of one `data:` frame.
///
/// The chat server names the final text of a `complete` frame `fullContent`.
/// Both keys may appear in one frame; `content` wins when non-empty.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FramePayload {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, rename = "fullContent")]
    pub full_content: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl FramePayload {
    /// Convert into a typed event.
    ///
    /// Returns `None` for unknown kinds and for `chunk` frames without
    /// content, so only fully formed events leave this function.
    pub fn into_event(self) -> Option<StreamEvent> {
        match EventKind::from_type(&self.kind)? {
            EventKind::Start => Some(StreamEvent::Start),
            EventKind::Chunk => self.content.map(StreamEvent::Chunk),
            EventKind::Complete => {
                // Empty final text counts as absent.
                let final_text = self
                    .content
                    .filter(|c| !c.is_empty())
                    .or(self.full_content.filter(|c| !c.is_empty()));
                Some(StreamEvent::Complete(final_text))
            }
            EventKind::Error => Some(StreamEvent::Error(
                self.error.unwrap_or_else(|| "Unknown error".to_string()),
            )),
        }
    }
}
