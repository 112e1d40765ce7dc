//! Tests for the session controller against scripted backends.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use pretty_assertions::assert_eq;

use crate::client::{ByteStream, ChatBackend};
use crate::config::{EngineConfig, PartialReplyPolicy, TrailingFramePolicy};
use crate::conversation::{Sender, WELCOME_TEXT};
use crate::error::{Result, WayfarerError};

use super::{ChatSession, ERROR_REPLY, SessionEvent, SessionState, TurnOutcome};

/// Backend that replays a fixed chunk script for every turn.
struct ScriptedBackend {
    script: Vec<ScriptedChunk>,
    calls: AtomicUsize,
}

#[derive(Clone)]
enum ScriptedChunk {
    Bytes(Vec<u8>),
    Error(String),
}

impl ScriptedBackend {
    fn new(script: Vec<ScriptedChunk>) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
        })
    }

    fn from_chunks(chunks: &[&[u8]]) -> Arc<Self> {
        Self::new(
            chunks
                .iter()
                .map(|c| ScriptedChunk::Bytes(c.to_vec()))
                .collect(),
        )
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn stream_chat(&self, _query: &str) -> Result<ByteStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let items: Vec<Result<Vec<u8>>> = self
            .script
            .iter()
            .cloned()
            .map(|chunk| match chunk {
                ScriptedChunk::Bytes(bytes) => Ok(bytes),
                ScriptedChunk::Error(message) => Err(WayfarerError::Stream(message)),
            })
            .collect();
        Ok(futures::stream::iter(items).boxed())
    }

    async fn chat(&self, _query: &str) -> Result<String> {
        unimplemented!("not used by these tests")
    }
}

/// Backend whose body never produces a chunk.
struct StallingBackend;

#[async_trait]
impl ChatBackend for StallingBackend {
    async fn stream_chat(&self, _query: &str) -> Result<ByteStream> {
        Ok(futures::stream::pending().boxed())
    }

    async fn chat(&self, _query: &str) -> Result<String> {
        unimplemented!("not used by these tests")
    }
}

/// Backend whose request fails before any body exists.
struct RefusingBackend;

#[async_trait]
impl ChatBackend for RefusingBackend {
    async fn stream_chat(&self, _query: &str) -> Result<ByteStream> {
        Err(WayfarerError::Backend {
            message: "service unavailable".to_string(),
        })
    }

    async fn chat(&self, _query: &str) -> Result<String> {
        unimplemented!("not used by these tests")
    }
}

fn test_config() -> EngineConfig {
    EngineConfig::default().with_reveal_interval(Duration::ZERO)
}

fn session_with(backend: Arc<dyn ChatBackend>, config: EngineConfig) -> ChatSession {
    ChatSession::new(backend, config)
}

// --------------------------------------------------------
// Happy path
// --------------------------------------------------------

#[tokio::test]
async fn streamed_tokens_become_one_finalized_reply() {
    let backend = ScriptedBackend::from_chunks(&[
        b"data: {\"token\":\"Hi\"}\n\n",
        b"data: {\"token\":\"!\"}\n\n",
        b"data: [DONE]\n\n",
    ]);
    let mut session = session_with(backend, test_config());

    let outcome = session.submit("Plan a trip to Vietnam").await;

    assert_eq!(outcome, TurnOutcome::Completed);
    assert_eq!(session.state(), SessionState::Idle);
    let snapshot = session.snapshot();
    assert_eq!(snapshot.len(), 3);
    assert_eq!(snapshot[0].text, WELCOME_TEXT);
    assert_eq!(snapshot[1].sender, Sender::User);
    assert_eq!(snapshot[1].text, "Plan a trip to Vietnam");
    assert_eq!(snapshot[2].sender, Sender::Assistant);
    assert_eq!(snapshot[2].text, "Hi!");
    assert!(session.conversation().draft().is_none());
}

#[tokio::test]
async fn chunk_boundaries_do_not_change_the_reply() {
    // One boundary splits the frame delimiter, another splits a multi-byte
    // character.
    let text = "data: {\"token\":\"H\u{e9}\"}\n\ndata: [DONE]\n\n".as_bytes();
    let eacute_mid = text.iter().position(|&b| b == 0xC3).unwrap() + 1;
    let delim_mid = "data: {\"token\":\"H\u{e9}\"}\n".len();
    let backend = ScriptedBackend::from_chunks(&[
        &text[..eacute_mid],
        &text[eacute_mid..delim_mid],
        &text[delim_mid..],
    ]);
    let mut session = session_with(backend, test_config());

    assert_eq!(session.submit("hello").await, TurnOutcome::Completed);
    assert_eq!(session.snapshot().last().unwrap().text, "H\u{e9}");
}

#[tokio::test]
async fn noise_frames_do_not_affect_the_reply() {
    let backend = ScriptedBackend::from_chunks(&[
        b"data: {\"token\":\"a\"}\n\n",
        b": keep-alive\n\n",
        b"data: {broken json\n\n",
        b"data: {\"error\":\"upstream hiccup\"}\n\n",
        b"data: {\"token\":\"b\"}\n\n",
    ]);
    let mut session = session_with(backend, test_config());

    assert_eq!(session.submit("hi").await, TurnOutcome::Completed);
    assert_eq!(session.snapshot().last().unwrap().text, "ab");
}

#[tokio::test]
async fn end_of_body_terminates_even_without_done_marker() {
    let backend = ScriptedBackend::from_chunks(&[b"data: {\"token\":\"done-less\"}\n\n"]);
    let mut session = session_with(backend, test_config());

    assert_eq!(session.submit("hi").await, TurnOutcome::Completed);
    assert_eq!(session.snapshot().last().unwrap().text, "done-less");
}

#[tokio::test]
async fn tokens_after_done_marker_still_reveal() {
    // The marker is informational; only end-of-body terminates the turn.
    let backend = ScriptedBackend::from_chunks(&[
        b"data: {\"token\":\"a\"}\n\ndata: [DONE]\n\ndata: {\"token\":\"b\"}\n\n",
    ]);
    let mut session = session_with(backend, test_config());

    assert_eq!(session.submit("hi").await, TurnOutcome::Completed);
    assert_eq!(session.snapshot().last().unwrap().text, "ab");
}

#[tokio::test]
async fn empty_stream_completes_without_a_reply() {
    let backend = ScriptedBackend::from_chunks(&[b"data: [DONE]\n\n"]);
    let mut session = session_with(backend, test_config());

    assert_eq!(session.submit("hi").await, TurnOutcome::Completed);
    // Welcome + user message only; no assistant reply was created.
    assert_eq!(session.snapshot().len(), 2);
}

// --------------------------------------------------------
// Input rejection
// --------------------------------------------------------

#[tokio::test]
async fn empty_input_is_rejected_before_any_network_activity() {
    let backend = ScriptedBackend::from_chunks(&[b"data: {\"token\":\"x\"}\n\n"]);
    let mut session = session_with(backend.clone(), test_config());

    assert_eq!(session.submit("").await, TurnOutcome::RejectedEmpty);
    assert_eq!(session.submit("   \n\t").await, TurnOutcome::RejectedEmpty);

    assert_eq!(backend.calls(), 0);
    assert_eq!(session.snapshot().len(), 1); // welcome only
    assert_eq!(session.state(), SessionState::Idle);
}

#[tokio::test]
async fn submitted_text_is_trimmed() {
    let backend = ScriptedBackend::from_chunks(&[b"data: [DONE]\n\n"]);
    let mut session = session_with(backend, test_config());

    session.submit("  hello  ").await;
    assert_eq!(session.snapshot()[1].text, "hello");
}

// --------------------------------------------------------
// Failure handling
// --------------------------------------------------------

#[tokio::test]
async fn request_failure_appends_one_error_notice() {
    let mut session = session_with(Arc::new(RefusingBackend), test_config());

    let outcome = session.submit("hi").await;

    assert_eq!(outcome, TurnOutcome::Failed);
    assert_eq!(session.state(), SessionState::Idle);
    let snapshot = session.snapshot();
    assert_eq!(snapshot.len(), 3); // welcome, user, notice
    assert_eq!(snapshot[2].sender, Sender::Assistant);
    assert_eq!(snapshot[2].text, ERROR_REPLY);
    assert!(session.conversation().draft().is_none());
}

#[tokio::test]
async fn mid_stream_failure_finalizes_partial_reply_by_default() {
    let backend = ScriptedBackend::new(vec![
        ScriptedChunk::Bytes(b"data: {\"token\":\"par\"}\n\n".to_vec()),
        ScriptedChunk::Error("connection reset".to_string()),
    ]);
    let mut session = session_with(backend, test_config());

    let outcome = session.submit("hi").await;

    assert_eq!(outcome, TurnOutcome::Failed);
    let snapshot = session.snapshot();
    assert_eq!(snapshot.len(), 4); // welcome, user, sealed partial, notice
    assert_eq!(snapshot[2].text, "par");
    assert_eq!(snapshot[3].text, ERROR_REPLY);
    assert!(session.conversation().draft().is_none());
}

#[tokio::test]
async fn mid_stream_failure_can_discard_partial_reply() {
    let backend = ScriptedBackend::new(vec![
        ScriptedChunk::Bytes(b"data: {\"token\":\"par\"}\n\n".to_vec()),
        ScriptedChunk::Error("connection reset".to_string()),
    ]);
    let config = test_config().with_partial_reply(PartialReplyPolicy::Discard);
    let mut session = session_with(backend, config);

    assert_eq!(session.submit("hi").await, TurnOutcome::Failed);
    let snapshot = session.snapshot();
    assert_eq!(snapshot.len(), 3); // welcome, user, notice
    assert_eq!(snapshot[2].text, ERROR_REPLY);
}

#[tokio::test(start_paused = true)]
async fn stalled_stream_fails_the_turn() {
    let config = test_config().with_chunk_timeout(Duration::from_millis(50));
    let mut session = session_with(Arc::new(StallingBackend), config);

    let outcome = session.submit("hi").await;

    assert_eq!(outcome, TurnOutcome::Failed);
    assert_eq!(session.state(), SessionState::Idle);
    assert_eq!(session.snapshot().last().unwrap().text, ERROR_REPLY);
}

#[tokio::test]
async fn failed_turn_accepts_a_new_submission() {
    let mut session = session_with(Arc::new(RefusingBackend), test_config());
    session.submit("first").await;

    assert_eq!(session.state(), SessionState::Idle);
    assert!(!session.is_busy());
    // A fresh submission is not rejected as busy.
    assert_eq!(session.submit("second").await, TurnOutcome::Failed);
}

// --------------------------------------------------------
// Trailing partial frame policies
// --------------------------------------------------------

#[tokio::test]
async fn trailing_partial_frame_is_discarded_by_default() {
    let backend = ScriptedBackend::from_chunks(&[
        b"data: {\"token\":\"Hi\"}\n\ndata: {\"token\":\"!\"}",
    ]);
    let mut session = session_with(backend, test_config());

    assert_eq!(session.submit("hi").await, TurnOutcome::Completed);
    assert_eq!(session.snapshot().last().unwrap().text, "Hi");
}

#[tokio::test]
async fn trailing_partial_frame_can_parse_best_effort() {
    let backend = ScriptedBackend::from_chunks(&[
        b"data: {\"token\":\"Hi\"}\n\ndata: {\"token\":\"!\"}",
    ]);
    let config = test_config().with_trailing_frame(TrailingFramePolicy::ParseBestEffort);
    let mut session = session_with(backend, config);

    assert_eq!(session.submit("hi").await, TurnOutcome::Completed);
    assert_eq!(session.snapshot().last().unwrap().text, "Hi!");
}

// --------------------------------------------------------
// Event channel
// --------------------------------------------------------

#[tokio::test]
async fn events_arrive_in_pipeline_order() {
    let backend = ScriptedBackend::from_chunks(&[
        b"data: {\"token\":\"Hi\"}\n\n",
        b"data: {\"token\":\"!\"}\n\n",
    ]);
    let mut session = session_with(backend, test_config());
    let mut rx = session.subscribe();

    session.submit("Plan a trip to Vietnam").await;

    let mut revealed = String::new();
    let mut finalized = None;
    let mut user_seen = false;
    while let Ok(event) = rx.try_recv() {
        match event {
            SessionEvent::UserAppended(message) => {
                assert!(!user_seen, "user message appended twice");
                assert!(revealed.is_empty(), "reveal started before user append");
                assert_eq!(message.text, "Plan a trip to Vietnam");
                user_seen = true;
            }
            SessionEvent::RevealStep(ch) => {
                assert!(finalized.is_none(), "reveal after finalize");
                revealed.push(ch);
            }
            SessionEvent::ReplyFinalized(message) => finalized = Some(message),
            SessionEvent::TurnFailed(_) => panic!("unexpected failure event"),
        }
    }

    assert!(user_seen);
    assert_eq!(revealed, "Hi!");
    assert_eq!(finalized.unwrap().text, "Hi!");
}

#[tokio::test]
async fn failure_emits_turn_failed_event() {
    let mut session = session_with(Arc::new(RefusingBackend), test_config());
    let mut rx = session.subscribe();

    session.submit("hi").await;

    let mut saw_failure = false;
    while let Ok(event) = rx.try_recv() {
        if let SessionEvent::TurnFailed(notice) = event {
            assert_eq!(notice.text, ERROR_REPLY);
            saw_failure = true;
        }
    }
    assert!(saw_failure);
}
