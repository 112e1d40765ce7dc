//! Session controller: orchestrates one chat turn end to end.
//!
//! The controller owns the conversation and drives the whole pipeline for
//! a turn: append the user message, POST the query, feed response chunks
//! through the frame decoder and event parser, meter extracted tokens
//! through the reveal scheduler, and seal or dispose of the in-progress
//! reply. Exactly one turn is in flight at a time; the state machine
//! rejects input until it returns to [`SessionState::Idle`].

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::client::{ByteStream, ChatBackend};
use crate::config::{EngineConfig, PartialReplyPolicy, TrailingFramePolicy};
use crate::conversation::{Conversation, Message};
use crate::error::WayfarerError;
use crate::reveal::RevealScheduler;
use crate::stream::decoder::FrameDecoder;
use crate::stream::parser::{FrameEvent, parse_frame};

use super::state::SessionState;

/// Fixed assistant-authored notice appended when a turn fails. Failures
/// stay inside the conversational flow; there are no out-of-band alerts.
pub const ERROR_REPLY: &str =
    "Something went wrong while streaming the response. Please try again.";

/// How a submission resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The reply streamed to completion and was finalized.
    Completed,
    /// The turn failed; the error notice was appended.
    Failed,
    /// Empty or whitespace-only input; nothing happened.
    RejectedEmpty,
    /// A turn was already in flight; nothing happened.
    RejectedBusy,
}

/// Progress notifications for frontends.
///
/// Delivered over an unbounded channel so the pipeline never blocks on a
/// slow renderer; a frontend that only wants final state can ignore the
/// channel and read snapshots instead.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The user's message was appended to the conversation.
    UserAppended(Message),
    /// One character landed in the in-progress reply.
    RevealStep(char),
    /// The in-progress reply was sealed with its permanent id.
    ReplyFinalized(Message),
    /// The turn failed; the carried message is the appended error notice.
    TurnFailed(Message),
}

/// Controller for one chat conversation.
pub struct ChatSession {
    backend: Arc<dyn ChatBackend>,
    config: EngineConfig,
    scheduler: RevealScheduler,
    conversation: Conversation,
    state: SessionState,
    events: Option<mpsc::UnboundedSender<SessionEvent>>,
}

impl ChatSession {
    /// Create a session against the given backend. The conversation opens
    /// with the assistant's greeting.
    pub fn new(backend: Arc<dyn ChatBackend>, config: EngineConfig) -> Self {
        let scheduler = RevealScheduler::new(config.reveal_interval);
        Self {
            backend,
            scheduler,
            config,
            conversation: Conversation::with_welcome(),
            state: SessionState::Idle,
            events: None,
        }
    }

    /// Subscribe to progress events. Replaces any previous subscriber.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<SessionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    #[inline]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[inline]
    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Ordered snapshot of the conversation for rendering.
    pub fn snapshot(&self) -> Vec<Message> {
        self.conversation.snapshot()
    }

    /// Submit one user message and drive the turn to completion.
    ///
    /// Empty (post-trim) input is rejected before any network activity,
    /// with no visible effect. All failures resolve to
    /// [`TurnOutcome::Failed`] with the error notice appended; the session
    /// is always back in [`SessionState::Idle`] when this returns.
    pub async fn submit(&mut self, input: &str) -> TurnOutcome {
        let text = input.trim();
        if text.is_empty() {
            tracing::debug!("ignoring empty submission");
            return TurnOutcome::RejectedEmpty;
        }
        if self.state.is_busy() {
            tracing::warn!(state = ?self.state, "rejecting submission while a turn is in flight");
            return TurnOutcome::RejectedBusy;
        }

        // The user message lands immediately, before any network I/O.
        let user = Message::user(text);
        self.conversation.push(user.clone());
        self.emit(SessionEvent::UserAppended(user));

        self.state = SessionState::Sending;
        tracing::debug!(chars = text.chars().count(), "sending chat turn");
        let chunks = match self.backend.stream_chat(text).await {
            Ok(chunks) => chunks,
            Err(err) => return self.fail_turn(&err),
        };

        self.state = SessionState::Streaming;
        match self.run_stream(chunks).await {
            Ok(()) => {
                self.state = SessionState::Finalizing;
                if let Some(sealed) = self.conversation.finalize() {
                    tracing::debug!(id = %sealed.id, chars = sealed.text.chars().count(), "reply finalized");
                    self.emit(SessionEvent::ReplyFinalized(sealed));
                }
                self.state = SessionState::Idle;
                TurnOutcome::Completed
            }
            Err(err) => self.fail_turn(&err),
        }
    }

    /// Consume the response body: decode chunks into frames, classify
    /// each frame, and reveal extracted tokens in arrival order. The next
    /// chunk is not read until the current token has fully revealed.
    async fn run_stream(&mut self, mut chunks: ByteStream) -> Result<(), WayfarerError> {
        use futures::StreamExt;

        let mut decoder = FrameDecoder::new();
        loop {
            let chunk = match timeout(self.config.chunk_timeout, chunks.next()).await {
                Err(_) => {
                    return Err(WayfarerError::StreamStalled {
                        stalled_secs: self.config.chunk_timeout.as_secs(),
                    });
                }
                Ok(None) => break,
                Ok(Some(chunk)) => chunk?,
            };
            for frame in decoder.push(&chunk) {
                match parse_frame(&frame) {
                    FrameEvent::Token(token) => self.reveal_token(&token).await,
                    // End-of-body is the authoritative terminator; the
                    // marker is informational.
                    FrameEvent::Done => tracing::debug!("received end-of-stream marker"),
                    FrameEvent::Ignored => tracing::debug!(frame = %frame, "ignoring frame"),
                }
            }
        }

        if let Some(tail) = decoder.finish() {
            match self.config.trailing_frame {
                TrailingFramePolicy::Discard => {
                    tracing::debug!(bytes = tail.len(), "dropping trailing partial frame");
                }
                TrailingFramePolicy::ParseBestEffort => {
                    if let FrameEvent::Token(token) = parse_frame(&tail) {
                        self.reveal_token(&token).await;
                    }
                }
            }
        }
        Ok(())
    }

    async fn reveal_token(&mut self, token: &str) {
        let scheduler = self.scheduler.clone();
        let events = self.events.clone();
        scheduler
            .reveal(token, &mut self.conversation, |ch| {
                if let Some(tx) = &events {
                    let _ = tx.send(SessionEvent::RevealStep(ch));
                }
            })
            .await;
    }

    /// Route any failure into the Errored branch: dispose of the draft per
    /// policy, append the fixed error notice, return to Idle.
    fn fail_turn(&mut self, error: &WayfarerError) -> TurnOutcome {
        tracing::warn!(kind = error.kind(), error = %error, "chat turn failed");
        self.state = SessionState::Errored;

        match self.config.partial_reply {
            PartialReplyPolicy::Finalize => {
                if let Some(sealed) = self.conversation.finalize() {
                    tracing::debug!(id = %sealed.id, "sealed partial reply after failure");
                    self.emit(SessionEvent::ReplyFinalized(sealed));
                }
            }
            PartialReplyPolicy::Discard => {
                if let Some(dropped) = self.conversation.discard_draft() {
                    tracing::debug!(
                        chars = dropped.text.chars().count(),
                        "discarded partial reply after failure"
                    );
                }
            }
        }

        let notice = Message::assistant(ERROR_REPLY);
        self.conversation.push(notice.clone());
        self.emit(SessionEvent::TurnFailed(notice));
        self.state = SessionState::Idle;
        TurnOutcome::Failed
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }
}
