//! Persistence reconciliation: hash-gated change detection, the single-slot
//! debounce scheduler, and the save reconciler that orchestrates manual,
//! auto, debounced, and immediate saves against the remote store.
//!
//! Requests are fire-and-await and are not guaranteed to complete in the
//! order issued; the content hash gate is what protects correctness under
//! reordering, not temporal ordering of requests.

pub mod hash;
pub mod reconciler;
pub mod scheduler;

pub use hash::ChangeHash;
pub use reconciler::{SaveOutcome, SaveReconciler, SaveTrigger, SyncStatus};
pub use scheduler::DebounceScheduler;
