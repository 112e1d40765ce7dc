//! Wayfarer Engine - streaming chat pipeline for the Wayfarer client.
//!
//! This crate contains the client core:
//! - Frame decoding and event parsing for the backend's chunked stream
//! - The typewriter reveal scheduler
//! - Conversation state (message list + in-progress draft)
//! - The chat session controller state machine
//! - The backend HTTP client
//!
//! NOTE: This crate should NOT contain any terminal rendering code.
//! Presentation belongs in wayfarer-cli.

#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod client;
pub mod config;
pub mod conversation;
pub mod error;
pub mod reveal;
pub mod session;
pub mod stream;

pub use client::{ByteStream, ChatBackend, HttpChatBackend};
pub use config::{EngineConfig, PartialReplyPolicy, TrailingFramePolicy};
pub use conversation::{Conversation, Message, MessageId, Sender};
pub use error::{Result, WayfarerError};
pub use reveal::RevealScheduler;
pub use session::history::{SessionHistory, SessionSummary};
pub use session::{ChatSession, SessionEvent, SessionState, TurnOutcome};
pub use stream::decoder::FrameDecoder;
pub use stream::parser::{FrameEvent, parse_frame};
