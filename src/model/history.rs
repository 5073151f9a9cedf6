//! Bounded undo/redo history over graph snapshots.
//!
//! Every [`HistoryState`] is a structural copy, never an alias of the live
//! model's arrays, so later mutation of the live model cannot corrupt a
//! stored snapshot. The buffer keeps at most [`HISTORY_CAP`] past states;
//! the oldest is evicted first.

use crate::model::{WorkflowEdge, WorkflowNode};

/// Maximum number of past states retained.
pub const HISTORY_CAP: usize = 50;

/// An immutable (nodes, edges) pair captured before a destructive mutation.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryState {
    pub nodes: Vec<WorkflowNode>,
    pub edges: Vec<WorkflowEdge>,
}

/// Bounded stack of past states plus a redo list.
///
/// Undo restores the state immediately before the last snapshot-preceded
/// mutation; redo reapplies it. Pushing a new snapshot clears the redo
/// list, so a divergent edit after an undo discards the abandoned branch.
#[derive(Clone, Debug, Default)]
pub struct HistoryBuffer {
    past: Vec<HistoryState>,
    future: Vec<HistoryState>,
}

impl HistoryBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push the pre-mutation state. Clears the redo list and evicts the
    /// oldest entry once the cap is reached.
    pub fn push(&mut self, state: HistoryState) {
        self.future.clear();
        if self.past.len() == HISTORY_CAP {
            self.past.remove(0);
        }
        self.past.push(state);
    }

    /// Step back: returns the state to restore, moving `current` onto the
    /// redo list. `None` when there is nothing to undo.
    pub fn undo(&mut self, current: HistoryState) -> Option<HistoryState> {
        let previous = self.past.pop()?;
        self.future.push(current);
        Some(previous)
    }

    /// Step forward: returns the state to restore, moving `current` back
    /// onto the past stack. `None` when there is nothing to redo.
    pub fn redo(&mut self, current: HistoryState) -> Option<HistoryState> {
        let next = self.future.pop()?;
        self.past.push(current);
        Some(next)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.past.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.past.is_empty()
    }
}
