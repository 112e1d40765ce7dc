//! Incremental frame decoding for the streaming response body.
//!
//! The backend separates event frames with a blank line. Chunk boundaries
//! are transport artifacts and may fall anywhere: inside the delimiter,
//! inside a frame, even inside a multi-byte UTF-8 character. The decoder
//! carries both kinds of partial state across [`FrameDecoder::push`] calls
//! so that every complete frame is extracted exactly once, in arrival
//! order, no matter how the bytes were split.

/// Frame delimiter: two consecutive newlines.
const FRAME_DELIMITER: &str = "\n\n";

/// Stateful chunk-to-frame decoder.
///
/// `pending` holds the undecoded tail bytes of a UTF-8 character split
/// across a chunk boundary; `buffer` holds decoded text that has not yet
/// formed a complete frame. After each push the buffer is exactly the
/// trailing, frame-incomplete suffix of everything received so far.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    pending: Vec<u8>,
    buffer: String,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw chunk; returns the complete frames it unlocked, in
    /// order. A chunk with no delimiter yields nothing and only grows the
    /// internal buffer.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        self.decode_pending();
        self.drain_frames()
    }

    /// Consume the decoder at end-of-body, surrendering any trailing
    /// frame-incomplete remainder. Returns `None` when the stream ended
    /// exactly on a frame boundary. What to do with a `Some` remainder is
    /// the caller's policy, not the decoder's.
    pub fn finish(mut self) -> Option<String> {
        if !self.pending.is_empty() {
            // A character cut off by end-of-body can never complete.
            self.buffer.push(char::REPLACEMENT_CHARACTER);
        }
        if self.buffer.is_empty() {
            None
        } else {
            Some(self.buffer)
        }
    }

    /// Decode as much of `pending` as is valid UTF-8, keeping only the
    /// trailing bytes of a still-incomplete character for the next chunk.
    /// Invalid sequences decode to U+FFFD without desynchronizing the
    /// stream.
    fn decode_pending(&mut self) {
        let bytes = std::mem::take(&mut self.pending);
        let mut pos = 0;
        while pos < bytes.len() {
            match std::str::from_utf8(&bytes[pos..]) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    pos = bytes.len();
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    if let Ok(text) = std::str::from_utf8(&bytes[pos..pos + valid]) {
                        self.buffer.push_str(text);
                    }
                    pos += valid;
                    match err.error_len() {
                        Some(bad) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            pos += bad;
                        }
                        None => {
                            // Incomplete trailing character; hold its bytes
                            // until the next chunk arrives.
                            self.pending = bytes[pos..].to_vec();
                            break;
                        }
                    }
                }
            }
        }
    }

    fn drain_frames(&mut self) -> Vec<String> {
        let mut frames = Vec::new();
        while let Some(at) = self.buffer.find(FRAME_DELIMITER) {
            frames.push(self.buffer[..at].to_string());
            self.buffer.drain(..at + FRAME_DELIMITER.len());
        }
        frames
    }
}
