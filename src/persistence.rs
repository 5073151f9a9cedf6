/*!
Persistence primitives for the graph document: serde-friendly shapes
decoupled from the in-memory model, the remote store contract, the legacy
variables migration, and the export/import file format.

Design goals:
- Explicit persisted structs with conversion logic localized in `From`
  impls, so the reconciler stays lean and declarative.
- Forward compatibility: unknown edge-type encodings and legacy variable
  shapes round-trip into the modern model instead of failing the load.

This module does not perform I/O itself; the [`PersistenceApi`] trait is
implemented by the surrounding product against its backend.
*/

use async_trait::async_trait;
use chrono::Utc;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::model::{
    FieldType, GraphModel, NodeConfig, StateField, WorkflowEdge, WorkflowNode, schema,
};
use crate::types::{Position, Viewport};

/// Width given to nodes from exports that predate explicit sizing.
pub const DEFAULT_NODE_WIDTH: f64 = 140.0;
/// Height given to nodes from exports that predate explicit sizing.
pub const DEFAULT_NODE_HEIGHT: f64 = 100.0;

/// Version tag written into export files.
pub const EXPORT_VERSION: &str = "1.0";

/// Remote-store and serialization errors.
#[derive(Debug, Error, Diagnostic)]
pub enum PersistenceError {
    #[error("network error: {message}")]
    #[diagnostic(
        code(flowboard::persistence::network),
        help("The save will be retried; the in-memory graph is unaffected.")
    )]
    Network { message: String },

    #[error("server rejected the request ({status}): {message}")]
    #[diagnostic(code(flowboard::persistence::server))]
    Server { status: u16, message: String },

    #[error("graph not found: {graph_id}")]
    #[diagnostic(code(flowboard::persistence::not_found))]
    NotFound { graph_id: String },

    #[error("JSON serialization/deserialization failed: {source}")]
    #[diagnostic(code(flowboard::persistence::serde))]
    Serde {
        #[source]
        source: serde_json::Error,
    },

    #[error("persistence error: {0}")]
    #[diagnostic(code(flowboard::persistence::other))]
    Other(String),
}

/// Persisted shape of a node. `config` stays a raw JSON value at this seam;
/// the typed [`NodeConfig`] is reconstructed on conversion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersistedNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub position: Position,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub config: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(
        default,
        rename = "positionAbsolute",
        skip_serializing_if = "Option::is_none"
    )]
    pub position_absolute: Option<Position>,
}

impl PersistedNode {
    /// Fill in layout fields older exports lack: 140×100 sizing and the
    /// absolute position mirrored from `position`.
    #[must_use]
    pub fn with_layout_defaults(mut self) -> Self {
        self.width.get_or_insert(DEFAULT_NODE_WIDTH);
        self.height.get_or_insert(DEFAULT_NODE_HEIGHT);
        self.position_absolute.get_or_insert(self.position);
        self
    }
}

impl From<&WorkflowNode> for PersistedNode {
    fn from(node: &WorkflowNode) -> Self {
        PersistedNode {
            id: node.id.clone(),
            node_type: node.node_type.clone(),
            position: node.position,
            label: node.label.clone(),
            config: node.config.to_value(),
            width: None,
            height: None,
            position_absolute: None,
        }
    }
}

impl From<PersistedNode> for WorkflowNode {
    fn from(p: PersistedNode) -> Self {
        let config = NodeConfig::from_value(&p.node_type, p.config);
        WorkflowNode {
            id: p.id,
            node_type: p.node_type,
            position: p.position,
            label: p.label,
            config,
        }
    }
}

/// The `variables` payload of a stored graph.
///
/// The modern shape is the serialized [`StateField`] list. The documented
/// legacy shape is a flat `{name: default}` map from before typed state
/// schemas existed; it is migrated on load when the modern shape is absent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariablesPayload {
    Modern(Vec<StateField>),
    Legacy(serde_json::Map<String, Value>),
}

impl VariablesPayload {
    /// Migrate into StateField records. Legacy entries get their type
    /// inferred from the default value and overwrite semantics; entries
    /// with invalid identifiers are dropped with a warning rather than
    /// failing the load.
    #[must_use]
    pub fn migrate(self) -> Vec<StateField> {
        match self {
            VariablesPayload::Modern(fields) => fields,
            VariablesPayload::Legacy(map) => {
                let mut fields = Vec::with_capacity(map.len());
                for (name, default) in map {
                    if !schema::is_valid_field_name(&name) {
                        tracing::warn!(%name, "dropping legacy variable with invalid name");
                        continue;
                    }
                    let field_type = infer_field_type(&default);
                    fields.push(StateField::new(name, field_type).with_default(default));
                }
                fields
            }
        }
    }
}

fn infer_field_type(value: &Value) -> FieldType {
    match value {
        Value::Bool(_) => FieldType::Bool,
        Value::Number(n) if n.is_i64() || n.is_u64() => FieldType::Int,
        Value::Number(_) => FieldType::Float,
        Value::Array(_) => FieldType::List,
        Value::Object(_) => FieldType::Dict,
        Value::String(_) | Value::Null => FieldType::String,
    }
}

/// Complete persisted shape of a graph, as stored and loaded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub name: String,
    pub nodes: Vec<PersistedNode>,
    pub edges: Vec<WorkflowEdge>,
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(
        default,
        rename = "workspaceId",
        skip_serializing_if = "Option::is_none"
    )]
    pub workspace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<VariablesPayload>,
}

impl GraphDocument {
    /// Assemble a document from live model content.
    #[must_use]
    pub fn from_model(
        model: &GraphModel,
        name: impl Into<String>,
        viewport: Viewport,
        workspace_id: Option<String>,
    ) -> Self {
        GraphDocument {
            name: name.into(),
            nodes: model.nodes().iter().map(PersistedNode::from).collect(),
            edges: model.edges().to_vec(),
            viewport,
            workspace_id,
            variables: Some(VariablesPayload::Modern(model.state_fields().to_vec())),
        }
    }

    /// Split into model content, migrating the variables payload.
    #[must_use]
    pub fn into_model_parts(self) -> (Vec<WorkflowNode>, Vec<WorkflowEdge>, Vec<StateField>) {
        let nodes = self.nodes.into_iter().map(WorkflowNode::from).collect();
        let fields = self.variables.map(VariablesPayload::migrate).unwrap_or_default();
        (nodes, self.edges, fields)
    }
}

/// The remote store contract. On conflict the in-memory model wins; a load
/// never overwrites in-session edits.
#[async_trait]
pub trait PersistenceApi: Send + Sync {
    async fn load_graph_state(&self, graph_id: &str) -> Result<GraphDocument, PersistenceError>;

    /// Persist the document; returns the graph id assigned by the store.
    async fn save_graph(&self, document: &GraphDocument) -> Result<String, PersistenceError>;
}

// ---------------------------------------------------------------------
// Export / import file format
// ---------------------------------------------------------------------

/// The shareable JSON file format.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportFile {
    pub version: String,
    pub nodes: Vec<PersistedNode>,
    pub edges: Vec<WorkflowEdge>,
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(rename = "exportedAt")]
    pub exported_at: String,
}

/// Export the model's content with layout defaults applied, stamped with
/// the current time.
#[must_use]
pub fn export_graph(model: &GraphModel, viewport: Viewport) -> ExportFile {
    ExportFile {
        version: EXPORT_VERSION.to_string(),
        nodes: model
            .nodes()
            .iter()
            .map(|n| PersistedNode::from(n).with_layout_defaults())
            .collect(),
        edges: model.edges().to_vec(),
        viewport,
        exported_at: Utc::now().to_rfc3339(),
    }
}

/// Errors rejecting an import file. Raised before any model mutation, so a
/// failed import leaves the live graph untouched.
#[derive(Debug, Error, Diagnostic)]
pub enum ImportError {
    #[error("import file is not a JSON object")]
    #[diagnostic(code(flowboard::import::not_an_object))]
    NotAnObject,

    #[error("import file is missing a 'nodes' array")]
    #[diagnostic(
        code(flowboard::import::missing_nodes),
        help("Expected the flowboard export format: {{version, nodes, edges, viewport, exportedAt}}.")
    )]
    MissingNodes,

    #[error("import file is missing an 'edges' array")]
    #[diagnostic(
        code(flowboard::import::missing_edges),
        help("Expected the flowboard export format: {{version, nodes, edges, viewport, exportedAt}}.")
    )]
    MissingEdges,

    #[error("import file is malformed: {source}")]
    #[diagnostic(code(flowboard::import::malformed))]
    Malformed {
        #[source]
        source: serde_json::Error,
    },
}

/// Validated content of an import file, ready for
/// [`GraphModel::replace_content`].
#[derive(Clone, Debug, PartialEq)]
pub struct ImportedGraph {
    pub nodes: Vec<WorkflowNode>,
    pub edges: Vec<WorkflowEdge>,
    pub viewport: Option<Viewport>,
}

/// Validate and parse an import file.
///
/// `nodes` and `edges` must be present arrays; anything else is rejected
/// with a descriptive error and no mutation. Nodes missing layout fields
/// are defaulted so older exports remain loadable.
pub fn parse_import(value: &Value) -> Result<ImportedGraph, ImportError> {
    let object = value.as_object().ok_or(ImportError::NotAnObject)?;
    match object.get("nodes") {
        Some(Value::Array(_)) => {}
        _ => return Err(ImportError::MissingNodes),
    }
    match object.get("edges") {
        Some(Value::Array(_)) => {}
        _ => return Err(ImportError::MissingEdges),
    }

    let nodes: Vec<PersistedNode> = serde_json::from_value(object["nodes"].clone())
        .map_err(|source| ImportError::Malformed { source })?;
    let edges: Vec<WorkflowEdge> = serde_json::from_value(object["edges"].clone())
        .map_err(|source| ImportError::Malformed { source })?;
    let viewport: Option<Viewport> = match object.get("viewport") {
        Some(v) if !v.is_null() => Some(
            serde_json::from_value(v.clone())
                .map_err(|source| ImportError::Malformed { source })?,
        ),
        _ => None,
    };

    Ok(ImportedGraph {
        nodes: nodes
            .into_iter()
            .map(|n| WorkflowNode::from(n.with_layout_defaults()))
            .collect(),
        edges,
        viewport,
    })
}
