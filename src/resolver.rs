//! Connection resolution: deciding the semantics of a new edge the moment
//! two node ports are joined.
//!
//! [`resolve_connection`] is a pure function over the proposed endpoints and
//! the current graph content, so the same inputs always classify the same
//! way and the graph never enters a state where a conditional source has an
//! ambiguous or duplicate routing key. Rejecting duplicate connections is
//! the caller's job ([`GraphModel::connect`](crate::model::GraphModel::connect));
//! the resolver only classifies.
//!
//! Loop-back detection is a heuristic over canvas positions, not a semantic
//! guarantee: it is deliberately isolated in [`looks_backward`] so a future
//! explicit loop-continuation tag can replace it without touching the
//! classification sites.

use serde_json::Value;

use crate::model::{ConfigObject, WorkflowEdge, WorkflowNode};
use crate::types::{EdgeType, node_types, route_keys};

/// Outcome of classifying a proposed connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionResolution {
    pub edge_type: EdgeType,
    /// `None` for normal edges, and for rule-bearing sources whose branches
    /// are all wired already (the UI then lets the user pick manually).
    pub route_key: Option<String>,
}

impl ConnectionResolution {
    fn normal() -> Self {
        Self {
            edge_type: EdgeType::Normal,
            route_key: None,
        }
    }

    fn conditional(route_key: Option<String>) -> Self {
        Self {
            edge_type: EdgeType::Conditional,
            route_key,
        }
    }
}

/// Heuristic: does the edge visually run backward? True when the target's
/// horizontal position precedes the source's, which is treated as evidence
/// of a loop body wrap-around.
#[must_use]
pub fn looks_backward(source: &WorkflowNode, target: &WorkflowNode) -> bool {
    target.position.x < source.position.x
}

/// Classify a proposed edge from `source_id` to `target_id`.
///
/// - Non-rule-bearing sources produce a normal edge with no route key.
/// - A router assigns the first declared rule whose key is not yet used by
///   an existing outgoing edge (declaration order = priority order); with
///   every rule wired the key is left unassigned.
/// - A condition assigns `"true"`, then `"false"`, then nothing.
/// - A loop gate assigns `"continue_loop"` then `"exit_loop"`; a
///   `"continue_loop"` edge is classified loop-back when it is a self-loop
///   or when [`looks_backward`] holds.
#[must_use]
pub fn resolve_connection(
    source_id: &str,
    target_id: &str,
    nodes: &[WorkflowNode],
    edges: &[WorkflowEdge],
) -> ConnectionResolution {
    let Some(source) = nodes.iter().find(|n| n.id == source_id) else {
        return ConnectionResolution::normal();
    };
    if !node_types::is_rule_bearing(&source.node_type) {
        return ConnectionResolution::normal();
    }

    let used: Vec<&str> = edges
        .iter()
        .filter(|e| e.source == source_id)
        .filter_map(WorkflowEdge::route_key)
        .collect();
    let unused = |key: &str| !used.contains(&key);

    match source.node_type.as_str() {
        node_types::ROUTER => {
            let rules = source.config.route_rules().unwrap_or(&[]);
            let key = rules.iter().map(|r| r.id.as_str()).find(|id| unused(id));
            ConnectionResolution::conditional(key.map(str::to_string))
        }
        node_types::CONDITION => {
            let key = if unused(route_keys::TRUE) {
                Some(route_keys::TRUE)
            } else if unused(route_keys::FALSE) {
                Some(route_keys::FALSE)
            } else {
                None
            };
            ConnectionResolution::conditional(key.map(str::to_string))
        }
        node_types::LOOP => {
            let key = if unused(route_keys::CONTINUE_LOOP) {
                route_keys::CONTINUE_LOOP
            } else {
                route_keys::EXIT_LOOP
            };
            let target = nodes.iter().find(|n| n.id == target_id);
            let is_loop_back = key == route_keys::CONTINUE_LOOP
                && (source_id == target_id
                    || target.is_some_and(|t| looks_backward(source, t)));
            ConnectionResolution {
                edge_type: if is_loop_back {
                    EdgeType::LoopBack
                } else {
                    EdgeType::Conditional
                },
                route_key: Some(key.to_string()),
            }
        }
        _ => ConnectionResolution::normal(),
    }
}

/// The reference token auto-wiring appends: `{sourceId.output}`.
#[must_use]
pub fn reference_token(source_id: &str) -> String {
    format!("{{{source_id}.output}}")
}

/// Find the first property of a default configuration that looks like a
/// data-mapping list: array-typed, or keyed with `mapping`/`dependencies`.
/// "First" follows the object's canonical key order.
#[must_use]
pub fn mapping_key(default_config: &Value) -> Option<String> {
    let object = default_config.as_object()?;
    object
        .iter()
        .find(|(key, value)| {
            let lowered = key.to_ascii_lowercase();
            value.is_array() || lowered.contains("mapping") || lowered.contains("dependencies")
        })
        .map(|(key, _)| key.clone())
}

/// Append `token` to the mapping list at `key`, creating the list if the
/// entry is absent or null. Returns `true` when the config changed. An
/// existing non-array value is left alone: auto-wiring seeds configuration,
/// it never overwrites what the user already set.
pub fn append_reference(config: &mut ConfigObject, key: &str, token: &str) -> bool {
    match config.get_mut(key) {
        Some(Value::Array(items)) => {
            if items.iter().any(|v| v.as_str() == Some(token)) {
                return false;
            }
            items.push(Value::String(token.to_string()));
            true
        }
        Some(Value::Null) | None => {
            config.insert(
                key.to_string(),
                Value::Array(vec![Value::String(token.to_string())]),
            );
            true
        }
        Some(_) => false,
    }
}
