//! Chat session orchestration.
//!
//! This module provides the [`ChatSession`] controller that drives a full
//! request/response cycle, the [`SessionState`] lifecycle it moves
//! through, and the read-only session history surface.

mod controller;
pub mod history;
mod state;

#[cfg(test)]
mod tests;

pub use controller::{ChatSession, ERROR_REPLY, SessionEvent, TurnOutcome};
pub use state::SessionState;
