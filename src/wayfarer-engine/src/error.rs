//! Error types for the Wayfarer engine.

use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, WayfarerError>;

/// Main error type for the Wayfarer engine.
#[derive(Debug, Error)]
pub enum WayfarerError {
    // Network errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Backend error: {message}")]
    Backend { message: String },

    #[error("Request timeout")]
    Timeout,

    // Streaming errors
    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Stream stalled: no data received for {stalled_secs} seconds")]
    StreamStalled { stalled_secs: u64 },
}

impl WayfarerError {
    /// Short category label used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Backend { .. } => "backend",
            Self::Timeout => "timeout",
            Self::Stream(_) => "stream",
            Self::StreamStalled { .. } => "stream_stalled",
        }
    }
}
