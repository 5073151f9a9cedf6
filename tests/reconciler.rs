//! Save reconciliation: debounce, hash gating, and failure recovery.

mod common;
use common::*;

use std::sync::Arc;
use std::time::Duration;

use flowboard::events::{EditorEvent, EventChannel};
use flowboard::persistence::GraphDocument;
use flowboard::sync::{SaveOutcome, SaveReconciler, SaveTrigger};
use flowboard::types::Viewport;

const DEBOUNCE: Duration = Duration::from_millis(100);

fn document(name: &str) -> GraphDocument {
    let mut model = empty_model();
    add(&mut model, "agent", 0.0, 0.0);
    GraphDocument::from_model(&model, name, Viewport::default(), None)
}

fn reconciler(store: Arc<RecordingStore>) -> (SaveReconciler, EventChannel) {
    let channel = EventChannel::unbounded();
    let reconciler = SaveReconciler::new(store, channel.sender()).with_debounce(DEBOUNCE);
    (reconciler, channel)
}

#[tokio::test(start_paused = true)]
async fn debounced_saves_supersede_each_other() {
    let store = RecordingStore::new();
    let (reconciler, _channel) = reconciler(Arc::clone(&store));

    reconciler.debounced_save(document("draft-1"));
    // Let the spawned timer register its deadline before advancing.
    tokio::task::yield_now().await;
    tokio::time::advance(Duration::from_millis(50)).await;
    reconciler.debounced_save(document("draft-2"));
    tokio::task::yield_now().await;

    tokio::time::advance(DEBOUNCE + Duration::from_millis(10)).await;
    tokio::task::yield_now().await;

    let saved = store.saved.lock();
    assert_eq!(saved.len(), 1, "only the superseding save fires");
    assert_eq!(saved[0].name, "draft-2");
}

#[tokio::test(start_paused = true)]
async fn unchanged_content_is_hash_gated() {
    let store = RecordingStore::new();
    let (reconciler, channel) = reconciler(Arc::clone(&store));
    let doc = document("stable");

    let first = reconciler
        .save(doc.clone(), SaveTrigger::Manual, false)
        .await;
    assert!(matches!(first, SaveOutcome::Saved { .. }));

    let second = reconciler
        .save(doc.clone(), SaveTrigger::Manual, false)
        .await;
    assert_eq!(second, SaveOutcome::Skipped);
    assert_eq!(store.save_count(), 1, "no second persistence call");

    // Debounced re-save of identical content also never reaches the store.
    reconciler.debounced_save(doc);
    assert!(reconciler.status().pending_changes);
    tokio::task::yield_now().await;
    tokio::time::advance(DEBOUNCE + Duration::from_millis(10)).await;
    tokio::task::yield_now().await;
    assert_eq!(store.save_count(), 1);
    // The skip is proof of persistence: the dirty flag must not stick.
    assert!(!reconciler.status().pending_changes);

    let events = channel.drain();
    assert!(events
        .iter()
        .any(|e| matches!(e, EditorEvent::SaveSkipped { .. })));
}

#[tokio::test(start_paused = true)]
async fn force_bypasses_the_hash_gate() {
    let store = RecordingStore::new();
    let (reconciler, _channel) = reconciler(Arc::clone(&store));
    let doc = document("stable");

    reconciler.save(doc.clone(), SaveTrigger::Manual, false).await;
    let forced = reconciler.save(doc, SaveTrigger::Manual, true).await;
    assert!(matches!(forced, SaveOutcome::Saved { .. }));
    assert_eq!(store.save_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn immediate_save_failure_requeues_through_debounce() {
    let store = RecordingStore::failing();
    let (reconciler, channel) = reconciler(Arc::clone(&store));

    let outcome = reconciler.immediate_save(document("flaky")).await;
    assert_eq!(outcome, SaveOutcome::Failed);

    let status = reconciler.status();
    assert_eq!(status.retry_count, 1);
    assert!(status.pending_changes);
    assert!(status.last_error.is_some());
    assert!(reconciler.has_pending_timer());

    // Store recovers before the debounce fires; the retry lands.
    *store.fail.lock() = false;
    tokio::task::yield_now().await;
    tokio::time::advance(DEBOUNCE + Duration::from_millis(10)).await;
    tokio::task::yield_now().await;
    assert_eq!(store.save_count(), 1);

    let status = reconciler.status();
    assert_eq!(status.retry_count, 0);
    assert!(!status.pending_changes);
    assert!(status.last_error.is_none());

    let events = channel.drain();
    assert!(events
        .iter()
        .any(|e| matches!(e, EditorEvent::SaveFailed { retry_count: 1, .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, EditorEvent::SaveCompleted { .. })));
}

#[tokio::test(start_paused = true)]
async fn stop_all_prevents_a_pending_debounce_from_firing() {
    let store = RecordingStore::new();
    let (reconciler, _channel) = reconciler(Arc::clone(&store));

    reconciler.debounced_save(document("doomed"));
    // Let the timer register so the cancellation is what is being tested.
    tokio::task::yield_now().await;
    reconciler.stop_all();

    tokio::time::advance(DEBOUNCE * 3).await;
    tokio::task::yield_now().await;
    assert_eq!(store.save_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn failed_save_keeps_the_model_side_hash_unset() {
    let store = RecordingStore::failing();
    let (reconciler, _channel) = reconciler(Arc::clone(&store));
    let doc = document("flaky");

    let outcome = reconciler.save(doc.clone(), SaveTrigger::Auto, false).await;
    assert_eq!(outcome, SaveOutcome::Failed);
    assert!(reconciler.status().last_saved_hash.is_none());

    // Content is still considered unsaved: a retry is not hash-gated.
    *store.fail.lock() = false;
    let retry = reconciler.save(doc, SaveTrigger::Auto, false).await;
    assert!(matches!(retry, SaveOutcome::Saved { .. }));
}
