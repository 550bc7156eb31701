//! Intent responders
//!
//! Maps a normalized utterance plus bounded recent context to a reply. Two
//! interchangeable strategies: a deterministic keyword-rule table and a
//! hosted chat-completion call.

mod hosted;
mod keyword;

use async_trait::async_trait;

use crate::Result;
use crate::transcript::{Reply, Turn};

pub use hosted::HostedResponder;
pub use keyword::KeywordResponder;

/// Responder strategy selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponderKind {
    /// Offline keyword-rule table, no external dependencies
    #[default]
    Keyword,
    /// Hosted chat completion with optional single-step web search
    Hosted,
}

impl ResponderKind {
    /// Parse a user-supplied strategy name
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("hosted") {
            Self::Hosted
        } else {
            Self::Keyword
        }
    }
}

/// Produces a reply for one utterance
#[async_trait(?Send)]
pub trait Responder {
    /// Respond to `utterance` given the most recent turns as context
    ///
    /// # Errors
    ///
    /// Returns error only when no reply can be produced at all; strategies
    /// degrade internally first (retry without tools, generic apology).
    async fn respond(&self, utterance: &str, context: &[Turn]) -> Result<Reply>;
}
