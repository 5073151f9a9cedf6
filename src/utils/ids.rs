//! Editor-side id generation for nodes and edges.
//!
//! Ids are opaque strings in the editor namespace. The execution runtime
//! uses its own identifiers; translating between the two namespaces is a
//! collaborator concern (see [`crate::interrupt`]).

use uuid::Uuid;

/// Generates unique ids for nodes and edges.
///
/// # Examples
///
/// ```rust
/// use flowboard::utils::IdGenerator;
///
/// let ids = IdGenerator::new();
/// let a = ids.node_id();
/// let b = ids.node_id();
/// assert!(a.starts_with("node-"));
/// assert_ne!(a, b);
/// ```
#[derive(Clone, Debug, Default)]
pub struct IdGenerator;

impl IdGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// A fresh node id, `node-<uuid>`.
    #[must_use]
    pub fn node_id(&self) -> String {
        format!("node-{}", Uuid::new_v4())
    }

    /// A fresh edge id, `edge-<uuid>`.
    #[must_use]
    pub fn edge_id(&self) -> String {
        format!("edge-{}", Uuid::new_v4())
    }
}
