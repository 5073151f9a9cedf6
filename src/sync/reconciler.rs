//! The save reconciler.
//!
//! Keeps the remote copy of the graph consistent with the in-memory model
//! without saving redundantly or losing data on transient failure. Failures
//! are recorded (`retry_count`, `last_error`) and surfaced as events, never
//! propagated as errors up the call stack; the in-memory model is never
//! rolled back because of a save failure, since it stays authoritative
//! until the next successful save.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::instrument;

use crate::events::{EditorEvent, EventSender};
use crate::persistence::{GraphDocument, PersistenceApi};
use crate::sync::{ChangeHash, DebounceScheduler};

/// Env var overriding the autosave debounce window, in milliseconds.
pub const AUTOSAVE_ENV: &str = "FLOWBOARD_AUTOSAVE_MS";

/// Default debounce window when the env var is absent or unparsable.
pub const DEFAULT_AUTOSAVE_MS: u64 = 2000;

/// What initiated a save.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveTrigger {
    Manual,
    Auto,
}

impl fmt::Display for SaveTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveTrigger::Manual => write!(f, "manual"),
            SaveTrigger::Auto => write!(f, "auto"),
        }
    }
}

/// Result of a save attempt. Failure is an outcome, not an error: the
/// reconciler has already recorded and surfaced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved { graph_id: String },
    /// The content hash matched the last saved hash; no call was issued.
    Skipped,
    Failed,
}

/// Reconciler-owned status, shared with the debounce timer task.
#[derive(Clone, Debug, Default)]
pub struct SyncStatus {
    pub last_saved_hash: Option<ChangeHash>,
    pub pending_changes: bool,
    pub retry_count: u32,
    pub last_error: Option<String>,
}

/// Orchestrates persistence of graph documents against the remote store.
pub struct SaveReconciler {
    api: Arc<dyn PersistenceApi>,
    status: Arc<Mutex<SyncStatus>>,
    scheduler: DebounceScheduler,
    debounce: Duration,
    events: EventSender,
}

impl SaveReconciler {
    /// A reconciler over the given persistence API. The debounce window is
    /// resolved from [`AUTOSAVE_ENV`] (via dotenv) falling back to
    /// [`DEFAULT_AUTOSAVE_MS`].
    #[must_use]
    pub fn new(api: Arc<dyn PersistenceApi>, events: EventSender) -> Self {
        Self {
            api,
            status: Arc::new(Mutex::new(SyncStatus::default())),
            scheduler: DebounceScheduler::new(),
            debounce: resolve_autosave_delay(None),
            events,
        }
    }

    /// Override the debounce window (tests, embedding hosts).
    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Current status snapshot.
    #[must_use]
    pub fn status(&self) -> SyncStatus {
        self.status.lock().clone()
    }

    /// Schedule an autosave of `document` after the debounce window,
    /// superseding any previously pending window. Called on every mutating
    /// model operation; the hash gate makes this safe at keystroke
    /// frequency.
    pub fn debounced_save(&self, document: GraphDocument) {
        self.status.lock().pending_changes = true;
        let api = Arc::clone(&self.api);
        let status = Arc::clone(&self.status);
        let events = self.events.clone();
        self.scheduler.schedule(self.debounce, move || async move {
            perform_save(api, status, events, document, SaveTrigger::Auto, false).await;
        });
    }

    /// Save now, bypassing the debounce window. Used when the caller needs
    /// the change durably stored before proceeding (bulk programmatic
    /// edits, navigation). On failure the document is re-queued through the
    /// debounce path as a recovery attempt.
    pub async fn immediate_save(&self, document: GraphDocument) -> SaveOutcome {
        self.scheduler.cancel_all();
        let outcome = self
            .save(document.clone(), SaveTrigger::Manual, false)
            .await;
        if outcome == SaveOutcome::Failed {
            self.debounced_save(document);
        }
        outcome
    }

    /// Perform a persistence call, gated on the content hash unless
    /// `force`. Never returns an error: failures update `retry_count` and
    /// `last_error` and emit [`EditorEvent::SaveFailed`].
    pub async fn save(
        &self,
        document: GraphDocument,
        trigger: SaveTrigger,
        force: bool,
    ) -> SaveOutcome {
        perform_save(
            Arc::clone(&self.api),
            Arc::clone(&self.status),
            self.events.clone(),
            document,
            trigger,
            force,
        )
        .await
    }

    /// Cancel every outstanding timer. Called on navigating away from the
    /// editor so a stray autosave cannot fire against a torn-down session.
    pub fn stop_all(&self) {
        self.scheduler.cancel_all();
    }

    /// Whether a debounced save is currently armed.
    #[must_use]
    pub fn has_pending_timer(&self) -> bool {
        self.scheduler.has_pending()
    }
}

#[instrument(skip(api, status, events, document), fields(%trigger, force))]
async fn perform_save(
    api: Arc<dyn PersistenceApi>,
    status: Arc<Mutex<SyncStatus>>,
    events: EventSender,
    document: GraphDocument,
    trigger: SaveTrigger,
    force: bool,
) -> SaveOutcome {
    let hash = ChangeHash::of_document(&document);
    {
        let mut s = status.lock();
        if !force && s.last_saved_hash == Some(hash) {
            // The hash match is proof the content is persisted, even when
            // the skip was reached through the debounce path.
            s.pending_changes = false;
            drop(s);
            tracing::debug!(%hash, "content already persisted; skipping save");
            events.emit(EditorEvent::SaveSkipped { hash });
            return SaveOutcome::Skipped;
        }
    }

    events.emit(EditorEvent::SaveStarted { trigger });
    match api.save_graph(&document).await {
        Ok(graph_id) => {
            {
                let mut s = status.lock();
                s.last_saved_hash = Some(hash);
                s.pending_changes = false;
                s.retry_count = 0;
                s.last_error = None;
            }
            tracing::debug!(%graph_id, %hash, "save completed");
            events.emit(EditorEvent::SaveCompleted { graph_id: graph_id.clone(), hash });
            SaveOutcome::Saved { graph_id }
        }
        Err(err) => {
            let retry_count = {
                let mut s = status.lock();
                s.retry_count += 1;
                s.pending_changes = true;
                s.last_error = Some(err.to_string());
                s.retry_count
            };
            tracing::warn!(%err, retry_count, "save failed; model kept authoritative");
            events.emit(EditorEvent::SaveFailed {
                trigger,
                message: err.to_string(),
                retry_count,
            });
            SaveOutcome::Failed
        }
    }
}

/// Resolve the autosave debounce window: explicit value, else env var, else
/// default.
#[must_use]
pub fn resolve_autosave_delay(provided: Option<Duration>) -> Duration {
    if let Some(delay) = provided {
        return delay;
    }
    dotenvy::dotenv().ok();
    let millis = std::env::var(AUTOSAVE_ENV)
        .ok()
        .and_then(|raw| raw.parse::<u64>().ok())
        .unwrap_or(DEFAULT_AUTOSAVE_MS);
    Duration::from_millis(millis)
}
