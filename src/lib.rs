//! Aura Gateway - Voice turn-taking controller for the Aura assistant
//!
//! This library provides the core functionality for the Aura gateway:
//! - Voice pipeline (capture, utterance endpointing, STT, TTS, playback)
//! - A phase-gated turn controller (listen, transcribe, think, speak)
//! - Responder strategies (offline keyword rules, hosted completions)
//! - An append-only conversation vault
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                  Voice Pipeline                   │
//! │   Mic → Endpointing → STT      TTS → Playback    │
//! └───────────────┬──────────────────▲───────────────┘
//!                 │                  │
//! ┌───────────────▼──────────────────┴───────────────┐
//! │                 Turn Controller                   │
//! │   Listening → Transcribing → Thinking → Speaking │
//! └───────────────┬──────────────────────────────────┘
//!                 │
//! ┌───────────────▼──────────────────────────────────┐
//! │   Responder (keyword rules │ hosted completion)  │
//! │            Conversation Vault (SQLite)           │
//! └──────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod controller;
pub mod db;
pub mod error;
pub mod llm;
pub mod responder;
pub mod tools;
pub mod transcript;
pub mod voice;

pub use config::Config;
pub use controller::{
    ControllerConfig, ConversationStore, Phase, SpeechSink, SpeechSource, StopSignal, TickOutcome,
    Transcriber, TurnController, VoiceIdentity,
};
pub use db::{DbConn, DbPool, VaultEntry, VaultRepo};
pub use error::{Error, Result};
pub use llm::{ChatClient, GroqClient};
pub use responder::{HostedResponder, KeywordResponder, Responder, ResponderKind};
pub use tools::{SearchProvider, SearchResult, SearchTool, WebSearchTool};
pub use transcript::{Reply, Turn, Utterance};
