//! Collaborator ports for the turn controller
//!
//! The controller sequences four external collaborators behind narrow
//! traits: a speech source (microphone + endpointing), a transcriber, a
//! speech sink (synthesis + playback), and the conversation store. The
//! traits are `?Send` because cpal streams are not `Send`; the loop runs on
//! the main task.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::Result;
use crate::db::VaultEntry;

/// Preferred voice identity for synthesis, matched best-effort
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoiceIdentity {
    #[default]
    Female,
    Male,
}

impl VoiceIdentity {
    /// Parse a user-supplied identity string, defaulting to female
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("male") {
            Self::Male
        } else {
            Self::Female
        }
    }
}

impl std::fmt::Display for VoiceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Female => write!(f, "female"),
            Self::Male => write!(f, "male"),
        }
    }
}

/// Captures one utterance worth of audio
#[async_trait(?Send)]
pub trait SpeechSource {
    /// Block until an utterance is captured or the listen timeout elapses
    ///
    /// Returns WAV bytes on success, `Ok(None)` when the timeout passed with
    /// no detectable speech. The capture buffer is reset on entry so audio
    /// played while speaking is never carried into the next turn.
    ///
    /// # Errors
    ///
    /// Returns error only for device-level failures.
    async fn listen(&mut self) -> Result<Option<Vec<u8>>>;
}

/// Converts captured audio to text
#[async_trait(?Send)]
pub trait Transcriber {
    /// Transcribe WAV audio
    ///
    /// `Ok(None)` signals "nothing recognized"; silence and noise are not
    /// errors.
    ///
    /// # Errors
    ///
    /// Returns error if the transcription request itself fails.
    async fn transcribe(&self, audio: &[u8]) -> Result<Option<String>>;
}

/// Speaks reply text aloud
#[async_trait(?Send)]
pub trait SpeechSink {
    /// Synthesize and play `text`, returning once playback has finished
    ///
    /// # Errors
    ///
    /// Returns error if synthesis or playback fails.
    async fn speak(&mut self, text: &str, voice: VoiceIdentity) -> Result<()>;
}

/// Append-only log of completed turns
///
/// Both operations are best-effort: implementations swallow storage failures
/// so persistence can never abort a turn or block the voice loop.
pub trait ConversationStore {
    /// Record a completed turn
    fn append(&self, query: &str, reply: &str, timestamp: DateTime<Utc>);

    /// Most recent entries, newest first; empty on failure
    fn recent(&self, limit: usize) -> Vec<VaultEntry>;
}
