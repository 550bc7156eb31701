//! Conversation entities: utterances, replies, and turns
//!
//! An `Utterance` is one recognized unit of user speech; a `Reply` is one
//! generated response intended for synthesis. Both are immutable once created
//! and retained only as read-only history.

use chrono::{DateTime, Utc};

/// One recognized unit of user speech, rendered as text
#[derive(Debug, Clone)]
pub struct Utterance {
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Utterance {
    /// Create an utterance stamped with the current time
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// One generated response text, intended for speech synthesis
#[derive(Debug, Clone)]
pub struct Reply {
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Reply {
    /// Create a reply stamped with the current time
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// One utterance/reply pair
#[derive(Debug, Clone)]
pub struct Turn {
    pub utterance: Utterance,
    pub reply: Reply,
}

/// Clean up a raw transcript: trim and collapse internal whitespace
///
/// Returns `None` when nothing recognizable remains, which the controller
/// treats as a silent retry rather than an error.
#[must_use]
pub fn normalize(raw: &str) -> Option<String> {
    let cleaned = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() { None } else { Some(cleaned) }
}
