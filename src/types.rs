//! Core types for the flowboard editing core.
//!
//! This module defines the fundamental types shared across the graph model,
//! the connection resolver, and the persistence layer: canvas geometry and
//! the edge classification enum. These are the core domain concepts that
//! define what an editable workflow graph *is*.
//!
//! # Key Types
//!
//! - [`EdgeType`]: Classifies the semantics of an edge between two nodes
//! - [`Position`] / [`Viewport`]: Canvas geometry carried through persistence
//!
//! # Examples
//!
//! ```rust
//! use flowboard::types::EdgeType;
//!
//! let loop_back = EdgeType::LoopBack;
//! assert_eq!(loop_back.encode(), "loop_back");
//! assert_eq!(EdgeType::decode("loop_back"), EdgeType::LoopBack);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// A point on the editor canvas, in canvas coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The visible canvas region, persisted alongside the graph so the editor
/// reopens where the user left off. Never interpreted by this core.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

/// Classifies the semantics of an edge between two nodes.
///
/// The classification is decided once, at connection time, by the
/// [`resolver`](crate::resolver) and then persisted; it is never recomputed
/// from topology afterwards.
///
/// # Persistence
///
/// `EdgeType` serializes to the wire names `"normal"`, `"conditional"` and
/// `"loop_back"` through both serde and the [`encode`](Self::encode)/
/// [`decode`](Self::decode) methods.
///
/// # Examples
///
/// ```rust
/// use flowboard::types::EdgeType;
///
/// assert_eq!(EdgeType::Conditional.encode(), "conditional");
/// assert_eq!(EdgeType::decode("normal"), EdgeType::Normal);
///
/// // Forward compatibility - unknown encodings fall back to Normal
/// assert_eq!(EdgeType::decode("mystery"), EdgeType::Normal);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    /// Plain control flow with no routing key.
    #[default]
    Normal,
    /// One branch of a rule-bearing source node, tagged with a route key.
    Conditional,
    /// A backward control-flow jump re-entering an earlier point in the
    /// graph (loop continuation). Carries rendering offsets in
    /// [`EdgeData`](crate::model::EdgeData) that this core stores but never
    /// recomputes.
    LoopBack,
}

impl EdgeType {
    /// Encode an EdgeType into its persisted string form.
    #[must_use]
    pub fn encode(&self) -> &'static str {
        match self {
            EdgeType::Normal => "normal",
            EdgeType::Conditional => "conditional",
            EdgeType::LoopBack => "loop_back",
        }
    }

    /// Decode a persisted string form back into an EdgeType.
    ///
    /// Unrecognized encodings fall back to [`Normal`](Self::Normal) so older
    /// documents with vendor extensions remain loadable.
    #[must_use]
    pub fn decode(s: &str) -> Self {
        match s {
            "conditional" => EdgeType::Conditional,
            "loop_back" => EdgeType::LoopBack,
            _ => EdgeType::Normal,
        }
    }

    /// Returns `true` if this edge carries a routing key namespace.
    #[must_use]
    pub fn is_routed(&self) -> bool {
        !matches!(self, Self::Normal)
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

/// Node-type ids of the three rule-bearing types recognized by the
/// connection resolver.
pub mod node_types {
    /// Multi-way router driven by declared rules.
    pub const ROUTER: &str = "router";
    /// Binary condition with `true` / `false` branches.
    pub const CONDITION: &str = "condition";
    /// Loop gate with `continue_loop` / `exit_loop` branches.
    pub const LOOP: &str = "loop";

    /// Returns `true` if the given node type participates in route-key
    /// assignment.
    #[must_use]
    pub fn is_rule_bearing(node_type: &str) -> bool {
        matches!(node_type, ROUTER | CONDITION | LOOP)
    }
}

/// Well-known route keys assigned by the connection resolver.
pub mod route_keys {
    pub const TRUE: &str = "true";
    pub const FALSE: &str = "false";
    pub const CONTINUE_LOOP: &str = "continue_loop";
    pub const EXIT_LOOP: &str = "exit_loop";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_type_round_trip() {
        for et in [EdgeType::Normal, EdgeType::Conditional, EdgeType::LoopBack] {
            assert_eq!(EdgeType::decode(et.encode()), et);
        }
    }

    #[test]
    fn edge_type_serde_wire_names() {
        let json = serde_json::to_string(&EdgeType::LoopBack).unwrap();
        assert_eq!(json, "\"loop_back\"");
        let back: EdgeType = serde_json::from_str("\"conditional\"").unwrap();
        assert_eq!(back, EdgeType::Conditional);
    }

    #[test]
    fn rule_bearing_types() {
        assert!(node_types::is_rule_bearing(node_types::ROUTER));
        assert!(node_types::is_rule_bearing(node_types::CONDITION));
        assert!(node_types::is_rule_bearing(node_types::LOOP));
        assert!(!node_types::is_rule_bearing("agent"));
    }
}
