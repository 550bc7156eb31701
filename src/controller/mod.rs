//! Turn-taking controller
//!
//! The state machine sequencing the hands-free voice loop:
//! listen, transcribe, think, speak, and back to listening.

mod machine;
mod phase;
mod ports;
mod session;

pub use machine::{ControllerConfig, StopSignal, TickOutcome, TurnController};
pub use phase::Phase;
pub use ports::{ConversationStore, SpeechSink, SpeechSource, Transcriber, VoiceIdentity};
pub use session::Session;
