//! Session history surface.
//!
//! A read-only list of prior sessions for the history sidebar. Selecting
//! an entry is a notification to the embedding application; the streaming
//! pipeline never consumes it, and nothing here is mutated by a running
//! turn.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary of one prior session for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Opaque session identifier.
    pub id: String,
    /// Display title (usually derived from the first query).
    pub title: String,
    /// Preview of the most recent message.
    pub last_message: String,
    /// When the session was last active.
    pub last_active: DateTime<Utc>,
}

/// Read-only list of prior sessions, most recent first.
#[derive(Debug, Clone, Default)]
pub struct SessionHistory {
    entries: Vec<SessionSummary>,
}

impl SessionHistory {
    /// Build the surface from known sessions; ordering is normalized to
    /// most recent first regardless of input order.
    pub fn new(mut entries: Vec<SessionSummary>) -> Self {
        entries.sort_by(|a, b| b.last_active.cmp(&a.last_active));
        Self { entries }
    }

    pub fn summaries(&self) -> &[SessionSummary] {
        &self.entries
    }

    /// Look up a session chosen by the user.
    pub fn select(&self, id: &str) -> Option<&SessionSummary> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
