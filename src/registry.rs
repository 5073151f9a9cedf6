//! Node type registry: the narrow contract the core needs from the
//! node-type catalog.
//!
//! The catalog's content (forms, icons, documentation) lives outside this
//! crate. The core only needs, per node type: the default configuration used
//! when a node is created, the configuration schema forwarded to property
//! forms, and the statically declared state-read/write footprint. The
//! dynamic part of the footprint is parsed out of mapping-like config fields
//! by [`state_footprint`].

use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::{Value, json};

use crate::model::WorkflowNode;
use crate::types::node_types;

/// Per-type contract entry.
#[derive(Clone, Debug)]
pub struct NodeTypeSpec {
    /// Configuration a freshly added node of this type starts with.
    pub default_config: Value,
    /// JSON schema of the configuration, forwarded to property forms.
    pub schema: Value,
    /// State fields this type always reads, independent of configuration.
    pub state_reads: Vec<String>,
    /// State fields this type always writes, independent of configuration.
    pub state_writes: Vec<String>,
}

impl NodeTypeSpec {
    /// A spec with the given default config and no static footprint.
    #[must_use]
    pub fn with_default_config(default_config: Value) -> Self {
        Self {
            default_config,
            schema: Value::Null,
            state_reads: Vec::new(),
            state_writes: Vec::new(),
        }
    }
}

/// Read-only lookup of node type contracts.
pub trait NodeTypeRegistry: Send + Sync {
    fn get(&self, node_type: &str) -> Option<&NodeTypeSpec>;
}

/// In-memory registry, the default implementation for embedding hosts and
/// tests.
#[derive(Clone, Debug, Default)]
pub struct InMemoryRegistry {
    specs: FxHashMap<String, NodeTypeSpec>,
}

impl InMemoryRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            specs: FxHashMap::default(),
        }
    }

    /// Registry pre-populated with the three rule-bearing types the
    /// connection resolver recognizes.
    #[must_use]
    pub fn with_builtin_types() -> Self {
        Self::new()
            .with_spec(
                node_types::ROUTER,
                NodeTypeSpec::with_default_config(json!({ "rules": [] })),
            )
            .with_spec(
                node_types::CONDITION,
                NodeTypeSpec::with_default_config(json!({ "expression": "" })),
            )
            .with_spec(
                node_types::LOOP,
                NodeTypeSpec::with_default_config(
                    json!({ "condition": "", "max_iterations": 10 }),
                ),
            )
    }

    /// Registers a spec for a node type, replacing any previous entry.
    pub fn register(&mut self, node_type: impl Into<String>, spec: NodeTypeSpec) -> &mut Self {
        self.specs.insert(node_type.into(), spec);
        self
    }

    /// Builder-style registration.
    #[must_use]
    pub fn with_spec(mut self, node_type: impl Into<String>, spec: NodeTypeSpec) -> Self {
        self.register(node_type, spec);
        self
    }
}

impl NodeTypeRegistry for InMemoryRegistry {
    fn get(&self, node_type: &str) -> Option<&NodeTypeSpec> {
        self.specs.get(node_type)
    }
}

/// The state fields a node touches: static declarations from the registry
/// merged with names parsed from its mapping configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StateFootprint {
    pub reads: FxHashSet<String>,
    pub writes: FxHashSet<String>,
}

/// Compute a node's state footprint.
///
/// Static reads/writes come from the registry entry for the node's type.
/// Dynamic names are parsed out of config entries whose key marks them as
/// input or output mappings: every `{name}` or `{name.field}` reference
/// token found in an input-mapping array contributes `name` to the reads,
/// and output mappings contribute to the writes. The core stores and
/// indexes these declarations; it never evaluates the expressions.
#[must_use]
pub fn state_footprint(node: &WorkflowNode, registry: &dyn NodeTypeRegistry) -> StateFootprint {
    let mut footprint = StateFootprint::default();
    if let Some(spec) = registry.get(&node.node_type) {
        footprint.reads.extend(spec.state_reads.iter().cloned());
        footprint.writes.extend(spec.state_writes.iter().cloned());
    }

    for (key, value) in node.config.to_object() {
        let lowered = key.to_ascii_lowercase();
        let is_input = lowered.contains("input") || lowered.contains("dependencies");
        let is_output = lowered.contains("output");
        if !is_input && !is_output {
            continue;
        }
        let names = collect_reference_names(&value);
        if is_input {
            footprint.reads.extend(names.iter().cloned());
        }
        if is_output {
            footprint.writes.extend(names);
        }
    }
    footprint
}

/// Extract the leading name of every `{name}` / `{name.field}` token in a
/// string or array-of-strings value.
fn collect_reference_names(value: &Value) -> Vec<String> {
    let mut names = Vec::new();
    match value {
        Value::String(s) => collect_from_str(s, &mut names),
        Value::Array(items) => {
            for item in items {
                if let Value::String(s) = item {
                    collect_from_str(s, &mut names);
                }
            }
        }
        _ => {}
    }
    names
}

fn collect_from_str(s: &str, names: &mut Vec<String>) {
    let mut rest = s;
    while let Some(open) = rest.find('{') {
        let Some(close_rel) = rest[open..].find('}') else {
            break;
        };
        let token = &rest[open + 1..open + close_rel];
        let name = token.split('.').next().unwrap_or(token).trim();
        if !name.is_empty() {
            names.push(name.to_string());
        }
        rest = &rest[open + close_rel + 1..];
    }
}
