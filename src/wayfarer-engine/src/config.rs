//! Engine configuration.
//!
//! All tunables live here as explicit data: endpoint location, the two
//! timeout deadlines, the reveal cadence, and the two stream-edge policies
//! (trailing partial frame, partially revealed draft on failure).

use std::time::Duration;

/// Default backend root.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Environment variable overriding the backend root.
pub const API_URL_ENV: &str = "WAYFARER_API_URL";

/// Deadline for the initial request (connect + response headers).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Deadline for receiving individual chunks during streaming. If no data
/// arrives within this duration, the connection is treated as stalled
/// rather than hanging indefinitely.
pub const DEFAULT_CHUNK_TIMEOUT: Duration = Duration::from_secs(60);

/// Delay between revealed characters of the typewriter effect.
pub const DEFAULT_REVEAL_INTERVAL: Duration = Duration::from_millis(15);

/// What to do with a non-empty decoder buffer when the response body ends
/// without a trailing frame delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrailingFramePolicy {
    /// Drop the remainder.
    #[default]
    Discard,
    /// Offer the remainder to the event parser as a best-effort final frame.
    ParseBestEffort,
}

/// What to do with a partially revealed in-progress message when the stream
/// dies mid-read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartialReplyPolicy {
    /// Seal the partial text as a normal message before the error notice.
    #[default]
    Finalize,
    /// Drop the partial text.
    Discard,
}

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Backend root URL, without a trailing slash.
    pub base_url: String,
    /// Deadline for the initial request.
    pub request_timeout: Duration,
    /// Per-chunk stall deadline while streaming.
    pub chunk_timeout: Duration,
    /// Inter-character delay of the typewriter reveal.
    pub reveal_interval: Duration,
    /// Handling of a trailing partial frame at end-of-body.
    pub trailing_frame: TrailingFramePolicy,
    /// Handling of a partially revealed draft on mid-stream failure.
    pub partial_reply: PartialReplyPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            chunk_timeout: DEFAULT_CHUNK_TIMEOUT,
            reveal_interval: DEFAULT_REVEAL_INTERVAL,
            trailing_frame: TrailingFramePolicy::default(),
            partial_reply: PartialReplyPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Default configuration with the backend root taken from the
    /// `WAYFARER_API_URL` environment variable when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var(API_URL_ENV) {
            config.base_url = url;
        }
        config
    }

    /// Set the backend root URL. A trailing slash is trimmed so endpoint
    /// paths can be appended uniformly.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Set the initial-request deadline.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the per-chunk stall deadline.
    pub fn with_chunk_timeout(mut self, timeout: Duration) -> Self {
        self.chunk_timeout = timeout;
        self
    }

    /// Set the typewriter inter-character delay.
    pub fn with_reveal_interval(mut self, interval: Duration) -> Self {
        self.reveal_interval = interval;
        self
    }

    /// Set the trailing-frame policy.
    pub fn with_trailing_frame(mut self, policy: TrailingFramePolicy) -> Self {
        self.trailing_frame = policy;
        self
    }

    /// Set the partial-reply policy.
    pub fn with_partial_reply(mut self, policy: PartialReplyPolicy) -> Self {
        self.partial_reply = policy;
        self
    }
}
