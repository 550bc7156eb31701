//! Owned session state for one activation of the voice loop

use crate::controller::Phase;
use crate::transcript::{Reply, Turn};

/// Mutable controller state for an active session
///
/// Created on activation and reset on deactivation or purge. The transcript
/// grows without bound in memory; only the most recent K turns are handed to
/// the responder as context.
#[derive(Debug)]
pub struct Session {
    /// Current phase of the turn-taking loop
    pub(crate) phase: Phase,
    /// Ordered history of completed turns, insertion order significant
    pub(crate) transcript: Vec<Turn>,
    /// The single reply awaiting synthesis, if any
    pub(crate) pending_reply: Option<Reply>,
    /// Consecutive silent retries since the last completed turn
    pub(crate) silent_retries: u32,
}

impl Session {
    /// Create a fresh session in the `Offline` phase
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: Phase::Offline,
            transcript: Vec::new(),
            pending_reply: None,
            silent_retries: 0,
        }
    }

    /// Current phase
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Completed turns so far, oldest first
    #[must_use]
    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    /// Whether a reply is currently awaiting speech
    #[must_use]
    pub const fn has_pending_reply(&self) -> bool {
        self.pending_reply.is_some()
    }

    /// The most recent `window` turns, for the responder context
    #[must_use]
    pub fn recent_turns(&self, window: usize) -> &[Turn] {
        let start = self.transcript.len().saturating_sub(window);
        &self.transcript[start..]
    }

    /// Drop all history and any pending reply, keeping the current phase
    pub fn purge(&mut self) {
        self.transcript.clear();
        self.pending_reply = None;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
