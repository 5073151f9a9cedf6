//! The owning graph model and its closed command API.
//!
//! All mutation passes through the named operations here rather than ad hoc
//! external writes, which is what preserves the snapshot-before-destructive-
//! operation invariant. Structurally destructive operations (delete,
//! multi-node delete, connect, duplicate, content replacement) push the
//! pre-mutation state onto the [`HistoryBuffer`] first; keystroke-level
//! edits (label, config patch, position) do not, so history holds one entry
//! per user-intent-level action instead of one per field write.

use std::sync::Arc;

use miette::Diagnostic;
use thiserror::Error;

use crate::model::{
    ConfigObject, HistoryBuffer, HistoryState, NodeConfig, StateField, WorkflowEdge, WorkflowNode,
    schema,
};
use crate::registry::NodeTypeRegistry;
use crate::resolver;
use crate::types::Position;
use crate::utils::IdGenerator;

/// Canvas offset applied to duplicated nodes so the clone lands clear of
/// the original and of fixed UI chrome.
const DUPLICATE_OFFSET: f64 = 40.0;

/// Errors from graph mutation operations.
#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("node not found: {id}")]
    #[diagnostic(code(flowboard::graph::node_not_found))]
    NodeNotFound { id: String },

    #[error("edge not found: {id}")]
    #[diagnostic(code(flowboard::graph::edge_not_found))]
    EdgeNotFound { id: String },

    #[error("unknown node type: {node_type}")]
    #[diagnostic(
        code(flowboard::graph::unknown_node_type),
        help("Register the type with the node type registry before adding nodes of it.")
    )]
    UnknownNodeType { node_type: String },

    #[error("connection from {source_id} to {target_id} already exists")]
    #[diagnostic(code(flowboard::graph::duplicate_connection))]
    DuplicateConnection {
        source_id: String,
        target_id: String,
    },

    #[error("invalid state field name: {name:?}")]
    #[diagnostic(
        code(flowboard::graph::invalid_field_name),
        help("Field names must match ^[a-zA-Z_][a-zA-Z0-9_]*$.")
    )]
    InvalidFieldName { name: String },

    #[error("state field already declared: {name}")]
    #[diagnostic(code(flowboard::graph::duplicate_field))]
    DuplicateField { name: String },

    #[error("state field not found: {name}")]
    #[diagnostic(code(flowboard::graph::field_not_found))]
    FieldNotFound { name: String },
}

/// The single source of truth for the editable graph.
pub struct GraphModel {
    nodes: Vec<WorkflowNode>,
    edges: Vec<WorkflowEdge>,
    state_fields: Vec<StateField>,
    history: HistoryBuffer,
    registry: Arc<dyn NodeTypeRegistry>,
    ids: IdGenerator,
}

impl GraphModel {
    /// An empty model backed by the given node type registry.
    #[must_use]
    pub fn new(registry: Arc<dyn NodeTypeRegistry>) -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            state_fields: Vec::new(),
            history: HistoryBuffer::new(),
            registry,
            ids: IdGenerator::new(),
        }
    }

    /// A model initialized from loaded content. Edges referencing missing
    /// nodes are dropped with a warning so the endpoint invariant holds
    /// from the start.
    #[must_use]
    pub fn with_content(
        registry: Arc<dyn NodeTypeRegistry>,
        nodes: Vec<WorkflowNode>,
        edges: Vec<WorkflowEdge>,
        state_fields: Vec<StateField>,
    ) -> Self {
        let mut model = Self::new(registry);
        model.nodes = nodes;
        model.edges = Self::retain_valid_edges(&model.nodes, edges);
        model.state_fields = state_fields;
        model
    }

    fn retain_valid_edges(
        nodes: &[WorkflowNode],
        edges: Vec<WorkflowEdge>,
    ) -> Vec<WorkflowEdge> {
        edges
            .into_iter()
            .filter(|edge| {
                let ok = nodes.iter().any(|n| n.id == edge.source)
                    && nodes.iter().any(|n| n.id == edge.target);
                if !ok {
                    tracing::warn!(edge = %edge.id, "dropping edge with missing endpoint");
                }
                ok
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    #[must_use]
    pub fn nodes(&self) -> &[WorkflowNode] {
        &self.nodes
    }

    #[must_use]
    pub fn edges(&self) -> &[WorkflowEdge] {
        &self.edges
    }

    #[must_use]
    pub fn state_fields(&self) -> &[StateField] {
        &self.state_fields
    }

    #[must_use]
    pub fn node(&self, id: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    #[must_use]
    pub fn edge(&self, id: &str) -> Option<&WorkflowEdge> {
        self.edges.iter().find(|e| e.id == id)
    }

    #[must_use]
    pub fn state_field(&self, name: &str) -> Option<&StateField> {
        self.state_fields.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<dyn NodeTypeRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    fn current_state(&self) -> HistoryState {
        HistoryState {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    /// Push the current (pre-mutation) state onto the history buffer and
    /// clear the redo list.
    pub fn take_snapshot(&mut self) {
        let state = self.current_state();
        self.history.push(state);
    }

    /// Restore the state immediately before the last snapshot-preceded
    /// mutation. Returns `false` (without mutating) when there is nothing
    /// to undo.
    pub fn undo(&mut self) -> bool {
        let current = self.current_state();
        match self.history.undo(current) {
            Some(previous) => {
                self.nodes = previous.nodes;
                self.edges = previous.edges;
                true
            }
            None => false,
        }
    }

    /// Reapply the last undone mutation. Returns `false` (without mutating)
    /// when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let current = self.current_state();
        match self.history.redo(current) {
            Some(next) => {
                self.nodes = next.nodes;
                self.edges = next.edges;
                true
            }
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Node operations
    // ------------------------------------------------------------------

    /// Add a node of the given type at `position`. Configuration starts
    /// from the registry's default for the type, shallow-merged with
    /// `config_override`; `label` defaults to the type id.
    pub fn add_node(
        &mut self,
        node_type: &str,
        position: Position,
        label: Option<&str>,
        config_override: Option<ConfigObject>,
    ) -> Result<&WorkflowNode, GraphError> {
        let spec = self
            .registry
            .get(node_type)
            .ok_or_else(|| GraphError::UnknownNodeType {
                node_type: node_type.to_string(),
            })?;
        let mut config = NodeConfig::from_value(node_type, spec.default_config.clone());
        if let Some(patch) = config_override {
            config = config.merged(node_type, &patch);
        }
        let node = WorkflowNode {
            id: self.ids.node_id(),
            node_type: node_type.to_string(),
            position,
            label: label.unwrap_or(node_type).to_string(),
            config,
        };
        tracing::debug!(id = %node.id, %node_type, "add node");
        self.nodes.push(node);
        Ok(self.nodes.last().expect("just pushed"))
    }

    /// Shallow-merge a patch into a node's configuration. Not snapshotted:
    /// config edits arrive per keystroke.
    pub fn update_node_config(
        &mut self,
        id: &str,
        patch: &ConfigObject,
    ) -> Result<(), GraphError> {
        let node = self
            .nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| GraphError::NodeNotFound { id: id.to_string() })?;
        node.merge_config_patch(patch);
        Ok(())
    }

    pub fn update_node_label(&mut self, id: &str, label: &str) -> Result<(), GraphError> {
        let node = self
            .nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| GraphError::NodeNotFound { id: id.to_string() })?;
        node.label = label.to_string();
        Ok(())
    }

    pub fn move_node(&mut self, id: &str, position: Position) -> Result<(), GraphError> {
        let node = self
            .nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| GraphError::NodeNotFound { id: id.to_string() })?;
        node.position = position;
        Ok(())
    }

    /// Delete a node and every edge touching it.
    pub fn delete_node(&mut self, id: &str) -> Result<(), GraphError> {
        if self.node(id).is_none() {
            return Err(GraphError::NodeNotFound { id: id.to_string() });
        }
        self.take_snapshot();
        self.nodes.retain(|n| n.id != id);
        self.edges.retain(|e| !e.touches(id));
        Ok(())
    }

    /// Delete several nodes (drag-selection delete) under a single history
    /// entry. Ids with no matching node are ignored; returns the number of
    /// nodes removed.
    pub fn delete_nodes(&mut self, ids: &[String]) -> usize {
        let existing: Vec<&String> = ids.iter().filter(|id| self.node(id).is_some()).collect();
        if existing.is_empty() {
            return 0;
        }
        self.take_snapshot();
        let before = self.nodes.len();
        self.nodes.retain(|n| !ids.contains(&n.id));
        self.edges
            .retain(|e| !ids.contains(&e.source) && !ids.contains(&e.target));
        before - self.nodes.len()
    }

    /// Clone a node's label and configuration into a new node, offset on
    /// the canvas so it lands clear of the original.
    pub fn duplicate_node(&mut self, id: &str) -> Result<&WorkflowNode, GraphError> {
        let source = self
            .node(id)
            .ok_or_else(|| GraphError::NodeNotFound { id: id.to_string() })?
            .clone();
        self.take_snapshot();
        let clone = WorkflowNode {
            id: self.ids.node_id(),
            node_type: source.node_type.clone(),
            position: Position::new(
                source.position.x + DUPLICATE_OFFSET,
                source.position.y + DUPLICATE_OFFSET,
            ),
            label: source.label.clone(),
            config: source.config.clone(),
        };
        self.nodes.push(clone);
        Ok(self.nodes.last().expect("just pushed"))
    }

    // ------------------------------------------------------------------
    // Edge operations
    // ------------------------------------------------------------------

    /// Connect two nodes. The resolver classifies the edge and assigns its
    /// route key; afterwards the target's configuration is auto-wired with
    /// a `{sourceId.output}` reference when its type declares a mapping
    /// list and the token is not already present.
    pub fn connect(&mut self, source: &str, target: &str) -> Result<&WorkflowEdge, GraphError> {
        if self.node(source).is_none() {
            return Err(GraphError::NodeNotFound {
                id: source.to_string(),
            });
        }
        if self.node(target).is_none() {
            return Err(GraphError::NodeNotFound {
                id: target.to_string(),
            });
        }
        if self
            .edges
            .iter()
            .any(|e| e.source == source && e.target == target)
        {
            return Err(GraphError::DuplicateConnection {
                source_id: source.to_string(),
                target_id: target.to_string(),
            });
        }

        self.take_snapshot();
        let resolution = resolver::resolve_connection(source, target, &self.nodes, &self.edges);
        tracing::debug!(
            %source,
            %target,
            edge_type = %resolution.edge_type,
            route_key = ?resolution.route_key,
            "connect"
        );
        let edge = WorkflowEdge {
            id: self.ids.edge_id(),
            source: source.to_string(),
            target: target.to_string(),
            data: crate::model::EdgeData::routed(resolution.edge_type, resolution.route_key),
        };
        self.edges.push(edge);
        self.auto_wire_target(source, target);
        Ok(self.edges.last().expect("just pushed"))
    }

    fn auto_wire_target(&mut self, source: &str, target: &str) {
        let Some(target_node) = self.nodes.iter_mut().find(|n| n.id == target) else {
            return;
        };
        let Some(spec) = self.registry.get(&target_node.node_type) else {
            return;
        };
        let Some(key) = resolver::mapping_key(&spec.default_config) else {
            return;
        };
        let token = resolver::reference_token(source);
        let mut object = target_node.config.to_object();
        if resolver::append_reference(&mut object, &key, &token) {
            tracing::debug!(%target, %key, %token, "auto-wired data mapping");
            target_node.config = NodeConfig::from_object(&target_node.node_type, object);
        }
    }

    pub fn delete_edge(&mut self, id: &str) -> Result<(), GraphError> {
        if self.edge(id).is_none() {
            return Err(GraphError::EdgeNotFound { id: id.to_string() });
        }
        self.take_snapshot();
        self.edges.retain(|e| e.id != id);
        Ok(())
    }

    // ------------------------------------------------------------------
    // State schema operations
    // ------------------------------------------------------------------

    /// Declare a state field. The name must be a valid identifier and
    /// unique within the graph. An incoherent reducer/type combination is
    /// accepted with a warning; the runtime owns reducer semantics.
    pub fn add_state_field(&mut self, field: StateField) -> Result<(), GraphError> {
        self.check_field(&field, None)?;
        self.state_fields.push(field);
        Ok(())
    }

    /// Replace the declaration named `name` (renames allowed).
    pub fn update_state_field(&mut self, name: &str, field: StateField) -> Result<(), GraphError> {
        let index = self
            .state_fields
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| GraphError::FieldNotFound {
                name: name.to_string(),
            })?;
        self.check_field(&field, Some(name))?;
        self.state_fields[index] = field;
        Ok(())
    }

    pub fn delete_state_field(&mut self, name: &str) -> Result<(), GraphError> {
        let before = self.state_fields.len();
        self.state_fields.retain(|f| f.name != name);
        if self.state_fields.len() == before {
            return Err(GraphError::FieldNotFound {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn check_field(&self, field: &StateField, replacing: Option<&str>) -> Result<(), GraphError> {
        if !schema::is_valid_field_name(&field.name) {
            return Err(GraphError::InvalidFieldName {
                name: field.name.clone(),
            });
        }
        let clash = self
            .state_fields
            .iter()
            .any(|f| f.name == field.name && Some(f.name.as_str()) != replacing);
        if clash {
            return Err(GraphError::DuplicateField {
                name: field.name.clone(),
            });
        }
        if let Some(reducer) = field.reducer
            && !schema::reducer_matches(field.field_type, reducer)
        {
            tracing::warn!(
                field = %field.name,
                field_type = %field.field_type,
                ?reducer,
                "reducer does not match field type; runtime behavior is undefined"
            );
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Bulk replacement (import)
    // ------------------------------------------------------------------

    /// Replace the graph content wholesale, as one undoable action. Used by
    /// import after the file has been validated; edges with missing
    /// endpoints are dropped to keep the invariant.
    pub fn replace_content(&mut self, nodes: Vec<WorkflowNode>, edges: Vec<WorkflowEdge>) {
        self.take_snapshot();
        self.nodes = nodes;
        self.edges = Self::retain_valid_edges(&self.nodes, edges);
    }
}
