//! Workflow edges.
//!
//! Edge semantics are decided once at connection time by the
//! [`resolver`](crate::resolver) and stored on [`EdgeData`]; the loop-back
//! geometry offsets position a rendered path and are persisted verbatim,
//! never recomputed here.

use serde::{Deserialize, Serialize};

use crate::types::EdgeType;

/// Semantic and rendering payload of an edge.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeData {
    #[serde(default)]
    pub edge_type: EdgeType,
    /// Which rule/branch of the source node this edge represents. For
    /// rule-bearing sources this *should* match a declared rule id; that is
    /// validated as a warning, not enforced (see `validation`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Loop-back rendering geometry, persisted but opaque to this core.
    #[serde(default, rename = "offsetY", skip_serializing_if = "Option::is_none")]
    pub offset_y: Option<f64>,
    #[serde(default, rename = "leftOffsetX", skip_serializing_if = "Option::is_none")]
    pub left_offset_x: Option<f64>,
    #[serde(default, rename = "rightOffsetX", skip_serializing_if = "Option::is_none")]
    pub right_offset_x: Option<f64>,
}

impl EdgeData {
    /// Data for a plain unrouted edge.
    #[must_use]
    pub fn normal() -> Self {
        Self::default()
    }

    /// Data for a classified edge with an optional route key.
    #[must_use]
    pub fn routed(edge_type: EdgeType, route_key: Option<String>) -> Self {
        Self {
            edge_type,
            route_key,
            ..Self::default()
        }
    }
}

/// A directed edge between two nodes.
///
/// Invariant (held by [`GraphModel`](crate::model::GraphModel)): `source`
/// and `target` reference existing nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkflowEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub data: EdgeData,
}

impl WorkflowEdge {
    /// The route key, if this edge carries one.
    #[must_use]
    pub fn route_key(&self) -> Option<&str> {
        self.data.route_key.as_deref()
    }

    /// Returns `true` if this edge touches the given node id as source or
    /// target.
    #[must_use]
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}
