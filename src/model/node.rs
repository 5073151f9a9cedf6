//! Workflow nodes and their typed configuration records.
//!
//! Configuration is not a single untyped map: each node type carries its own
//! strongly-typed record, with a catch-all [`NodeConfig::Generic`] variant
//! for catalog types the core has no special knowledge of. The accessor
//! table on [`NodeConfig`] is the only way other components read
//! type-specific fields, so duck-typed `config[key]` lookups stay out of the
//! codebase.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{Position, node_types};

/// Raw object form of a node configuration, used at the persistence seam
/// and for shallow patch merges.
pub type ConfigObject = serde_json::Map<String, Value>;

/// One declared rule of a router node. Declaration order is priority order
/// for route-key assignment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteRule {
    /// Rule identifier; conditional edges reference it as their route key.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Routing expression, evaluated by the external runtime only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

/// Configuration of a `router` node.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RouterConfig {
    #[serde(default)]
    pub rules: Vec<RouteRule>,
    #[serde(flatten)]
    pub rest: ConfigObject,
}

/// Configuration of a `condition` node.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionConfig {
    #[serde(default)]
    pub expression: String,
    #[serde(flatten)]
    pub rest: ConfigObject,
}

fn default_max_iterations() -> u32 {
    10
}

/// Configuration of a `loop` gate node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoopConfig {
    #[serde(default)]
    pub condition: String,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    #[serde(flatten)]
    pub rest: ConfigObject,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            condition: String::new(),
            max_iterations: default_max_iterations(),
            rest: ConfigObject::new(),
        }
    }
}

/// Typed node configuration, keyed by node type.
///
/// The variant is chosen by [`NodeConfig::from_value`] from the node's type
/// id; a malformed typed payload falls back to [`Generic`](Self::Generic)
/// with a warning rather than rejecting the document, mirroring the
/// warning-only leniency used elsewhere in the editor.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeConfig {
    Router(RouterConfig),
    Condition(ConditionConfig),
    Loop(LoopConfig),
    Generic(ConfigObject),
}

impl NodeConfig {
    /// Build the typed record for `node_type` from a raw JSON value.
    #[must_use]
    pub fn from_value(node_type: &str, value: Value) -> Self {
        let object = match value {
            Value::Object(map) => map,
            Value::Null => ConfigObject::new(),
            other => {
                tracing::warn!(%node_type, ?other, "non-object node config; treating as empty");
                ConfigObject::new()
            }
        };
        Self::from_object(node_type, object)
    }

    /// Build the typed record for `node_type` from an object form.
    #[must_use]
    pub fn from_object(node_type: &str, object: ConfigObject) -> Self {
        let raw = Value::Object(object);
        let parsed = match node_type {
            node_types::ROUTER => {
                serde_json::from_value::<RouterConfig>(raw.clone()).map(NodeConfig::Router)
            }
            node_types::CONDITION => {
                serde_json::from_value::<ConditionConfig>(raw.clone()).map(NodeConfig::Condition)
            }
            node_types::LOOP => {
                serde_json::from_value::<LoopConfig>(raw.clone()).map(NodeConfig::Loop)
            }
            _ => {
                return match raw {
                    Value::Object(map) => NodeConfig::Generic(map),
                    _ => NodeConfig::Generic(ConfigObject::new()),
                };
            }
        };
        match parsed {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(%node_type, %err, "malformed typed config; keeping raw object");
                match raw {
                    Value::Object(map) => NodeConfig::Generic(map),
                    _ => NodeConfig::Generic(ConfigObject::new()),
                }
            }
        }
    }

    /// Raw object form, as persisted.
    #[must_use]
    pub fn to_object(&self) -> ConfigObject {
        let value = match self {
            NodeConfig::Router(c) => serde_json::to_value(c),
            NodeConfig::Condition(c) => serde_json::to_value(c),
            NodeConfig::Loop(c) => serde_json::to_value(c),
            NodeConfig::Generic(map) => Ok(Value::Object(map.clone())),
        };
        match value {
            Ok(Value::Object(map)) => map,
            _ => ConfigObject::new(),
        }
    }

    /// Raw JSON form, as persisted.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.to_object())
    }

    /// Declared router rules, in declaration (priority) order.
    #[must_use]
    pub fn route_rules(&self) -> Option<&[RouteRule]> {
        match self {
            NodeConfig::Router(c) => Some(&c.rules),
            _ => None,
        }
    }

    /// Shallow-merge a patch into this configuration: top-level keys of the
    /// patch replace existing keys, everything else is kept. The result is
    /// re-typed for `node_type`.
    #[must_use]
    pub fn merged(&self, node_type: &str, patch: &ConfigObject) -> Self {
        let mut object = self.to_object();
        for (key, value) in patch {
            object.insert(key.clone(), value.clone());
        }
        Self::from_object(node_type, object)
    }
}

/// A node on the canvas.
///
/// `node_type` keys into the [`NodeTypeRegistry`](crate::registry::NodeTypeRegistry);
/// together with `config` it determines the node's declared state footprint.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkflowNode {
    pub id: String,
    pub node_type: String,
    pub position: Position,
    pub label: String,
    pub config: NodeConfig,
}

impl WorkflowNode {
    /// Shallow-merge a config patch (see [`NodeConfig::merged`]).
    pub fn merge_config_patch(&mut self, patch: &ConfigObject) {
        self.config = self.config.merged(&self.node_type, patch);
    }
}
