//! Single-slot debounce scheduler.
//!
//! One pending timer per scheduler instance: scheduling a new window always
//! supersedes the previous one rather than queuing behind it. Cancellation
//! is an explicit token (generation counter) checked after the sleep, so an
//! aborted-but-already-woken task can never run a stale action; `cancel_all`
//! invalidates every outstanding token in one operation.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

#[derive(Default)]
struct Inner {
    generation: u64,
    handle: Option<tokio::task::JoinHandle<()>>,
}

/// Explicit scheduler object behind `debounced_save`.
#[derive(Clone, Default)]
pub struct DebounceScheduler {
    inner: Arc<Mutex<Inner>>,
}

impl DebounceScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm (or re-arm) the single timer slot. After `delay`, `action` runs
    /// unless a later `schedule` or `cancel_all` superseded this token.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F, Fut>(&self, delay: Duration, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut inner = self.inner.lock();
        inner.generation = inner.generation.wrapping_add(1);
        let token = inner.generation;
        if let Some(handle) = inner.handle.take() {
            handle.abort();
        }
        let shared = Arc::clone(&self.inner);
        inner.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if shared.lock().generation != token {
                return;
            }
            action().await;
        }));
    }

    /// Cancel any outstanding timer. Safe to call repeatedly; after this,
    /// no previously scheduled action will run.
    pub fn cancel_all(&self) {
        let mut inner = self.inner.lock();
        inner.generation = inner.generation.wrapping_add(1);
        if let Some(handle) = inner.handle.take() {
            handle.abort();
        }
    }

    /// Whether a timer is currently armed.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.inner
            .lock()
            .handle
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}
