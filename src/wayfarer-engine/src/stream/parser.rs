//! Event parsing for individual stream frames.
//!
//! A frame is one `data: <payload>` unit. The parser is a pure function:
//! no I/O, no state between calls. Anything it cannot make sense of is
//! classified as noise, never as failure; a malformed control frame must
//! not abort the stream.

use serde::Deserialize;

/// Event prefix a frame must carry to be recognized. Case-sensitive.
const EVENT_PREFIX: &str = "data:";

/// Control payload the backend sends after the last token.
const DONE_MARKER: &str = "[DONE]";

/// Classification of one complete frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameEvent {
    /// One unit of assistant text.
    Token(String),
    /// The backend's end-of-stream control marker. Informational: the
    /// response body ending is the authoritative terminator.
    Done,
    /// Malformed, empty, or non-token frame. Dropped silently.
    Ignored,
}

/// Recognized JSON payload shape. The backend also emits `{"error": ...}`
/// frames; with no `token` field those fall through to [`FrameEvent::Ignored`].
#[derive(Debug, Deserialize)]
struct EventPayload {
    token: Option<String>,
}

/// Classify one complete frame.
pub fn parse_frame(frame: &str) -> FrameEvent {
    let Some(rest) = frame.strip_prefix(EVENT_PREFIX) else {
        return FrameEvent::Ignored;
    };
    let payload = rest.trim();
    if payload.is_empty() {
        return FrameEvent::Ignored;
    }
    if payload == DONE_MARKER {
        return FrameEvent::Done;
    }
    match serde_json::from_str::<EventPayload>(payload) {
        Ok(EventPayload { token: Some(token) }) => FrameEvent::Token(token),
        Ok(EventPayload { token: None }) => FrameEvent::Ignored,
        Err(_) => FrameEvent::Ignored,
    }
}
