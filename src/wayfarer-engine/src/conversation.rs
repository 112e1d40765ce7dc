//! Conversation state: the ordered message list plus the in-progress draft.
//!
//! The reply currently being streamed lives in an explicit `draft` slot
//! instead of hiding behind a reserved id, so it can never collide with a
//! minted identifier. Rendering always sees the draft as the last element
//! of the snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Greeting seeded into a fresh conversation.
pub const WELCOME_TEXT: &str = "Hello! Welcome to Wayfarer, your travel planning companion. \
     Where would you like to explore today?";

/// Opaque message identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Mint a fresh permanent identifier.
    pub fn mint() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// One chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub text: String,
    pub sender: Sender,
    pub sent_at: DateTime<Utc>,
}

impl Message {
    fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: MessageId::mint(),
            text: text.into(),
            sender,
            sent_at: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Sender::Assistant, text)
    }
}

/// Ordered conversation state.
///
/// Insertion order is the only ordering; nothing is reordered and nothing
/// is removed except by [`Conversation::reset`]. At most one draft exists
/// at any time.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    draft: Option<Message>,
}

impl Conversation {
    /// An empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh conversation seeded with the assistant's greeting.
    pub fn with_welcome() -> Self {
        Self {
            messages: vec![Message::assistant(WELCOME_TEXT)],
            draft: None,
        }
    }

    /// Append a completed message.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Append revealed characters to the in-progress reply, creating it if
    /// this is the first reveal of the turn. Atomic with respect to
    /// snapshot reads.
    pub fn reveal_into_draft(&mut self, chars: &str) {
        match &mut self.draft {
            Some(draft) => draft.text.push_str(chars),
            None => self.draft = Some(Message::assistant(chars)),
        }
    }

    /// Seal the in-progress reply: mint a fresh permanent id, keep text,
    /// sender, and timestamp, and move it into the ordered sequence. The
    /// observable snapshot keeps its order and length; only the identity
    /// changes. No-op when nothing is in progress.
    pub fn finalize(&mut self) -> Option<Message> {
        let mut sealed = self.draft.take()?;
        sealed.id = MessageId::mint();
        self.messages.push(sealed.clone());
        Some(sealed)
    }

    /// Drop the in-progress reply, returning it for logging.
    pub fn discard_draft(&mut self) -> Option<Message> {
        self.draft.take()
    }

    /// The in-progress reply, if any.
    pub fn draft(&self) -> Option<&Message> {
        self.draft.as_ref()
    }

    /// Full ordered sequence for rendering, in-progress reply last.
    /// Consumers get an owned snapshot; there are no torn reads.
    pub fn snapshot(&self) -> Vec<Message> {
        let mut view = self.messages.clone();
        view.extend(self.draft.clone());
        view
    }

    /// The most recent element of the rendered sequence.
    pub fn last(&self) -> Option<&Message> {
        self.draft.as_ref().or_else(|| self.messages.last())
    }

    /// Number of rendered messages, draft included.
    pub fn len(&self) -> usize {
        self.messages.len() + usize::from(self.draft.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear everything. The only permitted deletion; used when switching
    /// sessions.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.draft = None;
    }
}
