//! Conversation vault integration tests

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use aura_gateway::db::{RECENT_LIMIT, VaultRepo};
use aura_gateway::{ControllerConfig, ConversationStore, TickOutcome, TurnController};

use common::{EchoResponder, RecordingSink, ScriptedSource, Shared, Utf8Transcriber, setup_test_db};

#[tokio::test]
async fn test_completed_turns_reach_the_vault() {
    let vault = VaultRepo::new(setup_test_db());
    let events = Rc::new(RefCell::new(Vec::new()));

    let mut controller = TurnController::new(
        Box::new(Shared(ScriptedSource::new(
            &[Some("first"), Some("second")],
            Rc::clone(&events),
        ))),
        Box::new(Utf8Transcriber),
        Box::new(Shared(EchoResponder::new())),
        Box::new(Shared(RecordingSink::new(events))),
        Box::new(vault.clone()),
        ControllerConfig::default(),
    );
    controller.activate().unwrap();

    assert_eq!(controller.tick().await.unwrap(), TickOutcome::Completed);
    assert_eq!(controller.tick().await.unwrap(), TickOutcome::Completed);

    let entries = vault.newest(RECENT_LIMIT).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].query, "second");
    assert_eq!(entries[0].reply, "echo: second");
    assert_eq!(entries[1].query, "first");
}

#[tokio::test]
async fn test_clear_history_leaves_the_vault_intact() {
    let vault = VaultRepo::new(setup_test_db());
    let events = Rc::new(RefCell::new(Vec::new()));

    let mut controller = TurnController::new(
        Box::new(Shared(ScriptedSource::new(
            &[Some("hello"), Some("clear history")],
            Rc::clone(&events),
        ))),
        Box::new(Utf8Transcriber),
        Box::new(Shared(EchoResponder::new())),
        Box::new(Shared(RecordingSink::new(events))),
        Box::new(vault.clone()),
        ControllerConfig::default(),
    );
    controller.activate().unwrap();

    controller.tick().await.unwrap();
    assert_eq!(controller.tick().await.unwrap(), TickOutcome::Command);

    assert!(controller.session().transcript().is_empty());
    assert_eq!(vault.count().unwrap(), 1);
}

#[tokio::test]
async fn test_store_trait_reads_back_entries() {
    let vault = VaultRepo::new(setup_test_db());

    ConversationStore::append(&vault, "hi", "Hello!", chrono::Utc::now());
    let entries = ConversationStore::recent(&vault, 10);

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].query, "hi");
}
