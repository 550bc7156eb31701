//! Shared test utilities

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use aura_gateway::db::{self, VaultEntry};
use aura_gateway::transcript::{Reply, Turn};
use aura_gateway::{
    ConversationStore, DbPool, Responder, Result, SpeechSink, SpeechSource, StopSignal,
    Transcriber, VoiceIdentity,
};

/// Set up an in-memory test database
#[must_use]
pub fn setup_test_db() -> DbPool {
    db::init_memory().expect("failed to init test db")
}

/// Local wrapper around `Rc` so crate traits can be implemented for shared
/// test doubles without tripping the orphan rule
pub struct Shared<T>(pub Rc<T>);

impl<T> std::ops::Deref for Shared<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

/// Speech source that plays back scripted utterances as UTF-8 bytes
///
/// `None` entries simulate a listen window elapsing without speech. Every
/// listen call is appended to the shared event log.
pub struct ScriptedSource {
    script: RefCell<VecDeque<Option<String>>>,
    pub events: Rc<RefCell<Vec<String>>>,
}

impl ScriptedSource {
    pub fn new(utterances: &[Option<&str>], events: Rc<RefCell<Vec<String>>>) -> Rc<Self> {
        Rc::new(Self {
            script: RefCell::new(
                utterances
                    .iter()
                    .map(|u| u.map(String::from))
                    .collect(),
            ),
            events,
        })
    }
}

#[async_trait(?Send)]
impl SpeechSource for Shared<ScriptedSource> {
    async fn listen(&mut self) -> Result<Option<Vec<u8>>> {
        self.events.borrow_mut().push("listen".to_string());
        match self.script.borrow_mut().pop_front() {
            Some(Some(text)) => Ok(Some(text.into_bytes())),
            Some(None) | None => Ok(None),
        }
    }
}

/// Transcriber that decodes the scripted UTF-8 bytes back into text
pub struct Utf8Transcriber;

#[async_trait(?Send)]
impl Transcriber for Utf8Transcriber {
    async fn transcribe(&self, audio: &[u8]) -> Result<Option<String>> {
        let text = String::from_utf8_lossy(audio).to_string();
        if text.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(text))
        }
    }
}

/// Responder echoing the utterance and recording the context it was given
pub struct EchoResponder {
    pub contexts: RefCell<Vec<Vec<Turn>>>,
    /// When set, raised after producing the reply, simulating a
    /// deactivation that lands while the controller is thinking
    pub raise_after: RefCell<Option<StopSignal>>,
}

impl EchoResponder {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            contexts: RefCell::new(Vec::new()),
            raise_after: RefCell::new(None),
        })
    }
}

#[async_trait(?Send)]
impl Responder for Shared<EchoResponder> {
    async fn respond(&self, utterance: &str, context: &[Turn]) -> Result<Reply> {
        self.contexts.borrow_mut().push(context.to_vec());
        if let Some(stop) = self.raise_after.borrow().as_ref() {
            stop.raise();
        }
        Ok(Reply::new(format!("echo: {utterance}")))
    }
}

/// Responder that always fails
pub struct FailingResponder;

#[async_trait(?Send)]
impl Responder for FailingResponder {
    async fn respond(&self, _utterance: &str, _context: &[Turn]) -> Result<Reply> {
        Err(aura_gateway::Error::Completion("unreachable".to_string()))
    }
}

/// Sink recording everything spoken, sharing the event log with the source
pub struct RecordingSink {
    pub spoken: RefCell<Vec<String>>,
    pub events: Rc<RefCell<Vec<String>>>,
}

impl RecordingSink {
    pub fn new(events: Rc<RefCell<Vec<String>>>) -> Rc<Self> {
        Rc::new(Self {
            spoken: RefCell::new(Vec::new()),
            events,
        })
    }
}

#[async_trait(?Send)]
impl SpeechSink for Shared<RecordingSink> {
    async fn speak(&mut self, text: &str, _voice: VoiceIdentity) -> Result<()> {
        self.events.borrow_mut().push(format!("speak: {text}"));
        self.spoken.borrow_mut().push(text.to_string());
        Ok(())
    }
}

/// In-memory conversation store
pub struct MemoryStore {
    pub entries: RefCell<Vec<(String, String)>>,
}

impl MemoryStore {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            entries: RefCell::new(Vec::new()),
        })
    }
}

impl ConversationStore for Shared<MemoryStore> {
    fn append(&self, query: &str, reply: &str, _timestamp: DateTime<Utc>) {
        self.entries
            .borrow_mut()
            .push((query.to_string(), reply.to_string()));
    }

    fn recent(&self, limit: usize) -> Vec<VaultEntry> {
        self.entries
            .borrow()
            .iter()
            .rev()
            .take(limit)
            .enumerate()
            .map(|(i, (query, reply))| VaultEntry {
                id: i64::try_from(i).unwrap_or_default(),
                timestamp: Utc::now().to_rfc3339(),
                query: query.clone(),
                reply: reply.clone(),
            })
            .collect()
    }
}
