//! Backend HTTP client.
//!
//! [`ChatBackend`] is the network seam of the pipeline: the session
//! controller only ever sees a stream of raw body chunks, so tests can
//! drive it with scripted bytes and never touch a socket.

pub mod types;

pub use types::{ChatReply, ChatRequest};

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::{Client, Response};

use crate::config::EngineConfig;
use crate::error::{Result, WayfarerError};

/// Path of the streaming chat endpoint.
const STREAM_PATH: &str = "/chat/stream";

/// Path of the non-streaming chat endpoint.
const CHAT_PATH: &str = "/chat";

/// Raw body chunks from the streaming chat endpoint.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>>> + Send>>;

/// The network seam between the session controller and the backend.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// POST the query to the streaming endpoint. Resolves once response
    /// headers arrive; a non-success status is an error, a success status
    /// yields the raw chunked body.
    async fn stream_chat(&self, query: &str) -> Result<ByteStream>;

    /// POST the query to the non-streaming endpoint and return the full
    /// answer in one piece.
    async fn chat(&self, query: &str) -> Result<String>;
}

/// HTTP implementation against the travel assistant backend.
pub struct HttpChatBackend {
    client: Client,
    base_url: String,
    request_timeout: Duration,
}

impl HttpChatBackend {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.clone(),
            request_timeout: config.request_timeout,
        }
    }

    /// Map a non-success response to a backend error, preferring the JSON
    /// `detail` field the backend puts in error bodies and falling back to
    /// a truncated raw-body preview.
    async fn error_for_status(response: Response) -> WayfarerError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("detail")?.as_str().map(String::from))
            .unwrap_or_else(|| {
                let preview: String = body.chars().take(200).collect();
                format!("HTTP {status}: {preview}")
            });
        WayfarerError::Backend { message }
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn stream_chat(&self, query: &str) -> Result<ByteStream> {
        let url = format!("{}{}", self.base_url, STREAM_PATH);
        tracing::debug!(url = %url, "starting streaming chat request");

        let send = self
            .client
            .post(&url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(&ChatRequest::new(query))
            .send();

        // The deadline covers connecting and receiving response headers.
        // Body pacing is guarded separately by the controller's per-chunk
        // stall timeout.
        let response = match tokio::time::timeout(self.request_timeout, send).await {
            Ok(sent) => sent?,
            Err(_) => {
                tracing::warn!(url = %url, "streaming chat request timed out");
                return Err(WayfarerError::Timeout);
            }
        };

        let status = response.status();
        tracing::debug!(status = %status, "streaming chat response received");
        if !status.is_success() {
            return Err(Self::error_for_status(response).await);
        }

        let chunks = response.bytes_stream().map(|chunk| match chunk {
            Ok(bytes) => Ok(bytes.to_vec()),
            Err(err) => Err(WayfarerError::Stream(err.to_string())),
        });
        Ok(chunks.boxed())
    }

    async fn chat(&self, query: &str) -> Result<String> {
        let url = format!("{}{}", self.base_url, CHAT_PATH);
        tracing::debug!(url = %url, "sending one-shot chat request");

        let response = self
            .client
            .post(&url)
            .timeout(self.request_timeout)
            .json(&ChatRequest::new(query))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_for_status(response).await);
        }

        let reply: ChatReply = response.json().await?;
        Ok(reply.answer)
    }
}
