//! Canonical content hash of (nodes, edges).
//!
//! The hash is computed over the persisted shapes in id-sorted order, so it
//! is stable for equal content regardless of insertion order or the order
//! operations happened to run in. It gates every save: content whose hash
//! equals the last successfully saved hash is already persisted and is
//! never sent again.

use std::fmt;
use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use crate::model::{WorkflowEdge, WorkflowNode};
use crate::persistence::{GraphDocument, PersistedNode};

/// Content hash over the persisted form of a graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChangeHash(u64);

impl ChangeHash {
    /// Hash live model content.
    #[must_use]
    pub fn of(nodes: &[WorkflowNode], edges: &[WorkflowEdge]) -> Self {
        let persisted: Vec<PersistedNode> = nodes.iter().map(PersistedNode::from).collect();
        Self::of_persisted(&persisted, edges)
    }

    /// Hash an assembled document; equals [`ChangeHash::of`] for the same
    /// content.
    #[must_use]
    pub fn of_document(document: &GraphDocument) -> Self {
        Self::of_persisted(&document.nodes, &document.edges)
    }

    fn of_persisted(nodes: &[PersistedNode], edges: &[WorkflowEdge]) -> Self {
        let mut hasher = FxHasher::default();

        // serde_json objects keep keys sorted, so the serialized string of
        // each element is canonical; sorting elements by id removes the
        // remaining order dependence.
        let mut node_lines: Vec<(String, String)> = nodes
            .iter()
            .map(|n| (n.id.clone(), serde_json::to_string(n).unwrap_or_default()))
            .collect();
        node_lines.sort();
        let mut edge_lines: Vec<(String, String)> = edges
            .iter()
            .map(|e| (e.id.clone(), serde_json::to_string(e).unwrap_or_default()))
            .collect();
        edge_lines.sort();

        node_lines.len().hash(&mut hasher);
        for (_, line) in &node_lines {
            line.hash(&mut hasher);
        }
        edge_lines.len().hash(&mut hasher);
        for (_, line) in &edge_lines {
            line.hash(&mut hasher);
        }
        ChangeHash(hasher.finish())
    }
}

impl fmt::Display for ChangeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}
