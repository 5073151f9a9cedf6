//! The graph-level state-variable schema.
//!
//! State fields declare the variables a workflow's nodes read and write by
//! name. The core stores and indexes the declarations; expressions that
//! reference them are evaluated by the external runtime, and the declared
//! reducers are applied there too, never here.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Declared type of a state field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Int,
    Float,
    Bool,
    List,
    Dict,
    Messages,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::String => "string",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Bool => "bool",
            FieldType::List => "list",
            FieldType::Dict => "dict",
            FieldType::Messages => "messages",
        };
        write!(f, "{name}")
    }
}

/// Merge policy applied by the runtime when a node writes the field.
/// Absence means overwrite.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReducerKind {
    Add,
    Append,
    Merge,
}

impl fmt::Display for ReducerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReducerKind::Add => "add",
            ReducerKind::Append => "append",
            ReducerKind::Merge => "merge",
        };
        write!(f, "{name}")
    }
}

/// A declared graph-level variable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateField {
    /// Identifier matching `^[a-zA-Z_][a-zA-Z0-9_]*$`, unique within a
    /// graph.
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(rename = "defaultValue", default)]
    pub default_value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reducer: Option<ReducerKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl StateField {
    /// A field with the given name and type, null default, overwrite
    /// semantics.
    #[must_use]
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            default_value: Value::Null,
            reducer: None,
            description: None,
        }
    }

    #[must_use]
    pub fn with_default(mut self, default_value: Value) -> Self {
        self.default_value = default_value;
        self
    }

    #[must_use]
    pub fn with_reducer(mut self, reducer: ReducerKind) -> Self {
        self.reducer = Some(reducer);
        self
    }
}

/// Check a field name against `^[a-zA-Z_][a-zA-Z0-9_]*$`.
#[must_use]
pub fn is_valid_field_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Whether a reducer/field-type combination is coherent.
///
/// The core never evaluates reducers, so incoherent combinations are
/// reported as warnings instead of rejected at definition time.
#[must_use]
pub fn reducer_matches(field_type: FieldType, reducer: ReducerKind) -> bool {
    match reducer {
        ReducerKind::Add => matches!(field_type, FieldType::Int | FieldType::Float),
        ReducerKind::Append => matches!(field_type, FieldType::List | FieldType::Messages),
        ReducerKind::Merge => matches!(field_type, FieldType::Dict),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_name_validation() {
        assert!(is_valid_field_name("history"));
        assert!(is_valid_field_name("_hidden"));
        assert!(is_valid_field_name("step_2"));
        assert!(!is_valid_field_name(""));
        assert!(!is_valid_field_name("2step"));
        assert!(!is_valid_field_name("has-dash"));
        assert!(!is_valid_field_name("has space"));
    }

    #[test]
    fn reducer_coherence() {
        assert!(reducer_matches(FieldType::Int, ReducerKind::Add));
        assert!(reducer_matches(FieldType::List, ReducerKind::Append));
        assert!(reducer_matches(FieldType::Dict, ReducerKind::Merge));
        assert!(!reducer_matches(FieldType::String, ReducerKind::Add));
        assert!(!reducer_matches(FieldType::Bool, ReducerKind::Merge));
    }

    #[test]
    fn serde_shape_uses_wire_names() {
        let field = StateField::new("notes", FieldType::List).with_reducer(ReducerKind::Append);
        let value = serde_json::to_value(&field).unwrap();
        assert_eq!(value["type"], "list");
        assert_eq!(value["reducer"], "append");
        assert!(value.get("description").is_none());
    }
}
