//! Typewriter reveal scheduling.
//!
//! Streamed tokens arrive in bursts; the scheduler meters them out one
//! character at a time so the reply appears to be typed rather than pasted.
//! The pacing delay is plain injectable data, so tests run deterministically
//! under tokio's paused clock.

use std::time::Duration;

use crate::conversation::Conversation;

/// Paced character-by-character reveal of streamed tokens.
///
/// The reveal is cooperative and non-preemptive: `reveal` returns only
/// after every character of the token has landed in the store, delays
/// included, so the caller's network loop cannot start token *k+1* while
/// token *k* is still being revealed. Characters are never reordered.
#[derive(Debug, Clone)]
pub struct RevealScheduler {
    interval: Duration,
}

impl RevealScheduler {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Reveal every character of `token` into the conversation's
    /// in-progress reply, sleeping the configured interval before each
    /// step. Each step atomically appends to the draft (creating it on the
    /// first step of a turn), then fires `on_step`. Returns the number of
    /// reveal steps performed.
    pub async fn reveal(
        &self,
        token: &str,
        conversation: &mut Conversation,
        mut on_step: impl FnMut(char),
    ) -> usize {
        let mut steps = 0;
        for ch in token.chars() {
            tokio::time::sleep(self.interval).await;
            let mut utf8 = [0u8; 4];
            conversation.reveal_into_draft(ch.encode_utf8(&mut utf8));
            on_step(ch);
            steps += 1;
        }
        steps
    }
}
