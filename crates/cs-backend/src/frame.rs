//! Line-to-event framing.
//!
//! A frame is a single line starting with `data:`. The rest of the line,
//! trimmed, is a JSON object with a `type` field. Anything else on the wire
//! (blank lines, `event:` lines, comments) is not a frame.

use cs_protocol::{FramePayload, StreamEvent};

/// Case-sensitive marker that opens a data frame.
pub const DATA_PREFIX: &str = "data:";

/// Extract the trimmed payload of a data frame.
///
/// Returns `None` when the line is not a data frame or its payload is empty.
pub fn data_payload(line: &str) -> Option<&str> {
    let payload = line.strip_prefix(DATA_PREFIX)?.trim();
    if payload.is_empty() {
        None
    } else {
        Some(payload)
    }
}

/// Turn one line into an event.
///
/// Malformed payloads are logged and skipped so one bad frame never ends an
/// otherwise healthy stream. Unknown kinds are ignored.
pub fn parse_frame(line: &str) -> Option<StreamEvent> {
    let payload = data_payload(line)?;

    let frame: FramePayload = match serde_json::from_str(payload) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!(error = %e, payload, "skipping malformed stream frame");
            return None;
        }
    };

    let kind = frame.kind.clone();
    let event = frame.into_event();
    if event.is_none() {
        tracing::debug!(kind = %kind, "ignoring frame with unrecognized or incomplete kind");
    }
    event
}
