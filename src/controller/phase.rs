//! Controller phases and the legal transition table

/// Phase of the turn-taking loop
///
/// The loop is a single-threaded cooperative machine: exactly one phase is
/// active at a time and a phase must complete (or fail) before the next
/// begins. `Listening` always intervenes between `Speaking` and
/// `Transcribing` so the assistant never transcribes its own speech.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Session inactive; the only terminal phase
    Offline,
    /// Waiting for speech on the capture device
    Listening,
    /// Submitting captured audio to the speech-to-text collaborator
    Transcribing,
    /// Awaiting the intent responder
    Thinking,
    /// Waiting for synthesis playback of the reply to finish
    Speaking,
}

impl Phase {
    /// Whether a transition from this phase to `next` is legal
    ///
    /// Deactivation (`next == Offline`) is permitted from any phase. The
    /// retry edges `Transcribing -> Listening` and `Thinking -> Listening`
    /// cover unrecognized speech and responder failure.
    #[must_use]
    pub const fn permits(self, next: Self) -> bool {
        matches!(
            (self, next),
            (_, Self::Offline)
                | (Self::Offline | Self::Transcribing | Self::Thinking | Self::Speaking, Self::Listening)
                | (Self::Listening, Self::Transcribing)
                | (Self::Transcribing, Self::Thinking)
                | (Self::Thinking, Self::Speaking)
        )
    }

    /// Short status label for logs
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Offline => "offline",
            Self::Listening => "listening",
            Self::Transcribing => "transcribing",
            Self::Thinking => "thinking",
            Self::Speaking => "speaking",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Phase; 5] = [
        Phase::Offline,
        Phase::Listening,
        Phase::Transcribing,
        Phase::Thinking,
        Phase::Speaking,
    ];

    #[test]
    fn test_deactivate_allowed_from_every_phase() {
        for phase in ALL {
            assert!(phase.permits(Phase::Offline), "{phase:?} -> Offline");
        }
    }

    #[test]
    fn test_forward_cycle() {
        assert!(Phase::Offline.permits(Phase::Listening));
        assert!(Phase::Listening.permits(Phase::Transcribing));
        assert!(Phase::Transcribing.permits(Phase::Thinking));
        assert!(Phase::Thinking.permits(Phase::Speaking));
        assert!(Phase::Speaking.permits(Phase::Listening));
    }

    #[test]
    fn test_silent_retry_edges() {
        assert!(Phase::Transcribing.permits(Phase::Listening));
        assert!(Phase::Thinking.permits(Phase::Listening));
    }

    #[test]
    fn test_speaking_never_reaches_transcribing_directly() {
        assert!(!Phase::Speaking.permits(Phase::Transcribing));
    }

    #[test]
    fn test_no_phase_skipping() {
        assert!(!Phase::Listening.permits(Phase::Thinking));
        assert!(!Phase::Listening.permits(Phase::Speaking));
        assert!(!Phase::Transcribing.permits(Phase::Speaking));
        assert!(!Phase::Speaking.permits(Phase::Thinking));
        assert!(!Phase::Offline.permits(Phase::Transcribing));
        assert!(!Phase::Offline.permits(Phase::Thinking));
        assert!(!Phase::Offline.permits(Phase::Speaking));
    }

    #[test]
    fn test_no_backward_edges_except_retry() {
        assert!(!Phase::Thinking.permits(Phase::Transcribing));
        assert!(!Phase::Speaking.permits(Phase::Transcribing));
        assert!(!Phase::Transcribing.permits(Phase::Transcribing));
    }
}
