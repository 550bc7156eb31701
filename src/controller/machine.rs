//! The turn-taking controller
//!
//! Sequences the listen, transcribe, think, speak cycle over the collaborator
//! ports. One phase runs at a time; the deactivate signal is observed at
//! every phase transition and on each tick entry.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::controller::ports::{
    ConversationStore, SpeechSink, SpeechSource, Transcriber, VoiceIdentity,
};
use crate::controller::{Phase, Session};
use crate::responder::Responder;
use crate::transcript::{self, Reply, Turn, Utterance};
use crate::{Error, Result};

/// User-issued deactivate signal, shared with signal handlers
///
/// Raising the signal moves the controller to `Offline` at the next phase
/// transition, discarding any pending reply.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request deactivation
    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Reset the signal so the session can be activated again
    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Tuning for the turn controller
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Context window K: most recent turns handed to the responder
    pub context_turns: usize,
    /// Preferred voice identity for synthesis
    pub voice: VoiceIdentity,
    /// Spoken apology when the responder fails; `None` retries silently
    pub fallback_reply: Option<String>,
    /// Consecutive silent retries before the status is logged at warn level
    pub retry_report_threshold: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            context_turns: 4,
            voice: VoiceIdentity::Female,
            fallback_reply: Some("Sorry, I ran into a problem with that.".to_string()),
            retry_report_threshold: 5,
        }
    }
}

/// Outcome of a single pass through the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A full turn completed and was persisted
    Completed,
    /// Nothing usable was heard; the loop stays at listening
    Retry,
    /// A built-in session command was handled instead of a turn
    Command,
    /// The deactivate signal was observed; the session is offline
    Deactivated,
}

/// Built-in commands recognized before the responder runs
enum SessionCommand {
    /// Speak a farewell, then deactivate
    Farewell,
    /// Clear the in-memory transcript
    Purge,
    /// Re-speak the most recent reply
    Repeat,
}

/// The turn-taking state machine
pub struct TurnController {
    session: Session,
    source: Box<dyn SpeechSource>,
    transcriber: Box<dyn Transcriber>,
    responder: Box<dyn Responder>,
    sink: Box<dyn SpeechSink>,
    store: Box<dyn ConversationStore>,
    stop: StopSignal,
    config: ControllerConfig,
}

impl TurnController {
    /// Create a controller over its five collaborators
    #[must_use]
    pub fn new(
        source: Box<dyn SpeechSource>,
        transcriber: Box<dyn Transcriber>,
        responder: Box<dyn Responder>,
        sink: Box<dyn SpeechSink>,
        store: Box<dyn ConversationStore>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            session: Session::new(),
            source,
            transcriber,
            responder,
            sink,
            store,
            stop: StopSignal::new(),
            config,
        }
    }

    /// Handle that can deactivate the controller from elsewhere
    #[must_use]
    pub fn stop_handle(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Read-only view of the session state
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Move from `Offline` to `Listening`
    ///
    /// # Errors
    ///
    /// Returns error if the session is already active.
    pub fn activate(&mut self) -> Result<()> {
        if self.session.phase != Phase::Offline {
            return Err(Error::Controller(format!(
                "cannot activate from {}",
                self.session.phase.label()
            )));
        }
        self.stop.clear();
        self.session.silent_retries = 0;
        self.session.phase = Phase::Listening;
        tracing::info!("session activated");
        Ok(())
    }

    /// Move to `Offline`, discarding any pending reply
    pub fn deactivate(&mut self) {
        let discarded = self.session.pending_reply.take().is_some();
        self.session.phase = Phase::Offline;
        tracing::info!(discarded_pending_reply = discarded, "session deactivated");
    }

    /// Run the loop until deactivated
    ///
    /// # Errors
    ///
    /// Returns error only on an internal transition bug; collaborator
    /// failures are absorbed as retries or spoken apologies.
    pub async fn run(&mut self) -> Result<()> {
        self.activate()?;
        while self.session.phase != Phase::Offline {
            self.tick().await?;
        }
        Ok(())
    }

    /// Execute one pass of the listen/transcribe/think/speak cycle
    ///
    /// Expects the session to be at `Listening`; returns to `Listening` on
    /// completion or retry, or to `Offline` on deactivation.
    ///
    /// # Errors
    ///
    /// Returns error only for an illegal phase transition.
    pub async fn tick(&mut self) -> Result<TickOutcome> {
        if self.stop.is_raised() || self.session.phase == Phase::Offline {
            self.deactivate();
            return Ok(TickOutcome::Deactivated);
        }

        // Listen
        let audio = match self.source.listen().await {
            Ok(Some(audio)) => audio,
            Ok(None) => {
                self.note_silent_retry("no speech before listen timeout");
                return Ok(TickOutcome::Retry);
            }
            Err(e) => {
                tracing::warn!(error = %e, "audio capture failed, retrying");
                self.note_silent_retry("capture failure");
                return Ok(TickOutcome::Retry);
            }
        };

        // Transcribe
        if !self.transition(Phase::Transcribing)? {
            return Ok(TickOutcome::Deactivated);
        }
        let raw = match self.transcriber.transcribe(&audio).await {
            Ok(Some(text)) => text,
            Ok(None) => return self.silent_return("nothing recognized"),
            Err(e) => {
                tracing::debug!(error = %e, "transcription failed");
                return self.silent_return("transcription failure");
            }
        };
        let Some(text) = transcript::normalize(&raw) else {
            return self.silent_return("empty transcript");
        };
        tracing::info!(utterance = %text, "utterance transcribed");

        if let Some(command) = Self::parse_command(&text) {
            return self.handle_command(command).await;
        }

        // Think
        if !self.transition(Phase::Thinking)? {
            return Ok(TickOutcome::Deactivated);
        }
        let utterance = Utterance::new(text);
        let context = self.session.recent_turns(self.config.context_turns).to_vec();
        let reply = match self.responder.respond(&utterance.text, &context).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "responder failed");
                match &self.config.fallback_reply {
                    Some(apology) => Reply::new(apology.clone()),
                    None => return self.silent_return("responder failure"),
                }
            }
        };
        self.session.pending_reply = Some(reply);

        // Speak
        if !self.transition(Phase::Speaking)? {
            // Deactivation discards the pending reply unspoken
            return Ok(TickOutcome::Deactivated);
        }
        let Some(reply) = self.session.pending_reply.take() else {
            return self.silent_return("pending reply vanished");
        };
        self.deliver(&reply.text).await;

        // Persist the completed turn; storage failures are swallowed
        self.store.append(&utterance.text, &reply.text, reply.timestamp);
        self.session.transcript.push(Turn { utterance, reply });
        self.session.silent_retries = 0;

        if self.transition(Phase::Listening)? {
            Ok(TickOutcome::Completed)
        } else {
            Ok(TickOutcome::Deactivated)
        }
    }

    /// Move to `next` unless the stop signal is raised
    ///
    /// Returns `Ok(false)` when deactivation preempted the transition.
    fn transition(&mut self, next: Phase) -> Result<bool> {
        if self.stop.is_raised() {
            self.deactivate();
            return Ok(false);
        }
        if !self.session.phase.permits(next) {
            return Err(Error::Controller(format!(
                "illegal transition {} -> {}",
                self.session.phase.label(),
                next.label()
            )));
        }
        tracing::debug!(from = self.session.phase.label(), to = next.label(), "phase");
        self.session.phase = next;
        Ok(true)
    }

    /// Return to listening without any user-visible error
    fn silent_return(&mut self, reason: &str) -> Result<TickOutcome> {
        self.note_silent_retry(reason);
        if self.transition(Phase::Listening)? {
            Ok(TickOutcome::Retry)
        } else {
            Ok(TickOutcome::Deactivated)
        }
    }

    fn note_silent_retry(&mut self, reason: &str) {
        self.session.silent_retries += 1;
        if self.session.silent_retries == self.config.retry_report_threshold {
            tracing::warn!(retries = self.session.silent_retries, reason, "still listening");
        } else {
            tracing::debug!(retries = self.session.silent_retries, reason, "silent retry");
        }
    }

    /// Speak text, logging but not propagating sink failures
    async fn deliver(&mut self, text: &str) {
        if let Err(e) = self.sink.speak(text, self.config.voice).await {
            tracing::warn!(error = %e, "speech synthesis failed");
        }
    }

    fn parse_command(text: &str) -> Option<SessionCommand> {
        let lower = text.to_lowercase();
        let has_word = |w: &str| lower.split_whitespace().any(|t| t == w);
        if has_word("exit") || has_word("quit") || has_word("goodbye") || lower == "stop" {
            Some(SessionCommand::Farewell)
        } else if lower.contains("clear history") {
            Some(SessionCommand::Purge)
        } else if lower.contains("repeat") {
            Some(SessionCommand::Repeat)
        } else {
            None
        }
    }

    /// Handle a built-in command: speak its acknowledgement, then resume
    async fn handle_command(&mut self, command: SessionCommand) -> Result<TickOutcome> {
        if !self.transition(Phase::Thinking)? || !self.transition(Phase::Speaking)? {
            return Ok(TickOutcome::Deactivated);
        }

        match command {
            SessionCommand::Farewell => {
                self.deliver("Goodbye!").await;
                self.deactivate();
                Ok(TickOutcome::Deactivated)
            }
            SessionCommand::Purge => {
                self.session.purge();
                self.deliver("Conversation history cleared!").await;
                if self.transition(Phase::Listening)? {
                    Ok(TickOutcome::Command)
                } else {
                    Ok(TickOutcome::Deactivated)
                }
            }
            SessionCommand::Repeat => {
                let line = self.session.transcript.last().map_or_else(
                    || "Nothing to repeat yet.".to_string(),
                    |turn| format!("I said: {}", turn.reply.text),
                );
                self.deliver(&line).await;
                if self.transition(Phase::Listening)? {
                    Ok(TickOutcome::Command)
                } else {
                    Ok(TickOutcome::Deactivated)
                }
            }
        }
    }
}
