//! Editor event channel.
//!
//! Save results, interrupt transitions, and validation warnings are surfaced
//! as events rather than propagated as errors up the call stack, so the UI
//! layer can render actionable messages without the core throwing past a
//! component boundary. The channel is a plain `flume` MPMC pair; dropping
//! the receiver silently discards events, which is acceptable for a
//! display-only stream.

use chrono::{DateTime, Utc};

use crate::sync::{ChangeHash, SaveTrigger};

/// An event surfaced by the editing core for the UI layer.
#[derive(Clone, Debug, PartialEq)]
pub enum EditorEvent {
    /// A persistence call is about to be issued.
    SaveStarted { trigger: SaveTrigger },
    /// The remote store accepted the document.
    SaveCompleted { graph_id: String, hash: ChangeHash },
    /// The content hash matched the last saved hash; no call was made.
    SaveSkipped { hash: ChangeHash },
    /// The persistence call failed; the in-memory model is unchanged.
    SaveFailed {
        trigger: SaveTrigger,
        message: String,
        retry_count: u32,
    },
    /// The execution runtime paused at a node.
    Interrupted { node_id: String, thread_id: String },
    /// A resume command was accepted and the interrupt cleared.
    Resumed { thread_id: String },
    /// The user discarded a pending interrupt without resuming.
    InterruptDiscarded { thread_id: String },
    /// A non-blocking validation finding.
    ValidationWarning { message: String },
}

/// Timestamped envelope for an [`EditorEvent`].
#[derive(Clone, Debug)]
pub struct EventEnvelope {
    pub when: DateTime<Utc>,
    pub event: EditorEvent,
}

/// Cloneable sending half of the editor event channel.
#[derive(Clone, Debug)]
pub struct EventSender {
    tx: flume::Sender<EventEnvelope>,
}

impl EventSender {
    /// Emit an event. A disconnected receiver is not an error here; the
    /// event is dropped with a trace record.
    pub fn emit(&self, event: EditorEvent) {
        let envelope = EventEnvelope {
            when: Utc::now(),
            event,
        };
        if self.tx.send(envelope).is_err() {
            tracing::trace!("editor event dropped: no receiver attached");
        }
    }
}

/// Editor event channel: one sender handed to core components, one receiver
/// for the UI layer.
#[derive(Debug)]
pub struct EventChannel {
    sender: EventSender,
    receiver: flume::Receiver<EventEnvelope>,
}

impl EventChannel {
    /// Create an unbounded channel.
    #[must_use]
    pub fn unbounded() -> Self {
        let (tx, rx) = flume::unbounded();
        Self {
            sender: EventSender { tx },
            receiver: rx,
        }
    }

    /// A cloneable sender for core components.
    #[must_use]
    pub fn sender(&self) -> EventSender {
        self.sender.clone()
    }

    /// Receiving half, for UI layers that want to await events.
    #[must_use]
    pub fn receiver(&self) -> &flume::Receiver<EventEnvelope> {
        &self.receiver
    }

    /// Drain everything currently queued, oldest first.
    #[must_use]
    pub fn drain(&self) -> Vec<EditorEvent> {
        self.receiver.try_iter().map(|env| env.event).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_returns_events_in_order() {
        let channel = EventChannel::unbounded();
        let sender = channel.sender();
        sender.emit(EditorEvent::ValidationWarning {
            message: "first".into(),
        });
        sender.emit(EditorEvent::ValidationWarning {
            message: "second".into(),
        });
        let drained = channel.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(
            drained[0],
            EditorEvent::ValidationWarning {
                message: "first".into()
            }
        );
    }

    #[test]
    fn emit_without_receiver_does_not_panic() {
        let channel = EventChannel::unbounded();
        let sender = channel.sender();
        drop(channel);
        sender.emit(EditorEvent::ValidationWarning {
            message: "orphan".into(),
        });
    }
}
