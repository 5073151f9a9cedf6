//! Whole-graph validation, run before deployment and on demand.
//!
//! Issues carry a severity: errors block deployment, warnings do not. Route
//! keys that do not match a declared rule are warnings only, because rules
//! can legitimately be authored after the connection that will carry them.

use crate::model::{GraphModel, WorkflowNode, schema};
use crate::types::{node_types, route_keys};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// What part of the graph an issue is about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IssueOrigin {
    Global,
    Node(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub origin: IssueOrigin,
    /// Stable machine-readable code, e.g. `dangling_edge`.
    pub code: &'static str,
    pub message: String,
}

impl ValidationIssue {
    fn error(origin: IssueOrigin, code: &'static str, message: String) -> Self {
        Self {
            severity: Severity::Error,
            origin,
            code,
            message,
        }
    }

    fn warning(origin: IssueOrigin, code: &'static str, message: String) -> Self {
        Self {
            severity: Severity::Warning,
            origin,
            code,
            message,
        }
    }
}

/// Validate the graph's structural integrity and routing/schema coherence.
#[must_use]
pub fn validate_graph(model: &GraphModel) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for edge in model.edges() {
        for endpoint in [&edge.source, &edge.target] {
            if model.node(endpoint).is_none() {
                issues.push(ValidationIssue::error(
                    IssueOrigin::Global,
                    "dangling_edge",
                    format!(
                        "edge '{}' references missing node '{endpoint}'",
                        edge.id
                    ),
                ));
            }
        }
    }

    for edge in model.edges() {
        let Some(source) = model.node(&edge.source) else {
            continue;
        };
        if !node_types::is_rule_bearing(&source.node_type) {
            continue;
        }
        if let Some(route_key) = edge.route_key()
            && !declared_route_keys(source)
                .iter()
                .any(|k| k.as_str() == route_key)
        {
            issues.push(ValidationIssue::warning(
                IssueOrigin::Node(source.id.clone()),
                "unmatched_route_key",
                format!(
                    "edge '{}' carries route key '{route_key}' not declared by {} '{}'",
                    edge.id, source.node_type, source.id
                ),
            ));
        }
    }

    let fields = model.state_fields();
    for (i, field) in fields.iter().enumerate() {
        if fields[..i].iter().any(|f| f.name == field.name) {
            issues.push(ValidationIssue::error(
                IssueOrigin::Global,
                "duplicate_field",
                format!("state field '{}' is declared more than once", field.name),
            ));
        }
        if let Some(reducer) = field.reducer
            && !schema::reducer_matches(field.field_type, reducer)
        {
            issues.push(ValidationIssue::warning(
                IssueOrigin::Global,
                "reducer_mismatch",
                format!(
                    "reducer '{reducer}' does not match type '{}' of field '{}'",
                    field.field_type, field.name
                ),
            ));
        }
    }

    issues
}

/// A graph is deployable when validation produced no errors; warnings are
/// allowed through.
#[must_use]
pub fn deployment_ready(issues: &[ValidationIssue]) -> bool {
    issues.iter().all(|i| i.severity != Severity::Error)
}

/// Route keys a rule-bearing node declares: a router's rule ids, a
/// condition's two branches, a loop's continue/exit pair.
fn declared_route_keys(node: &WorkflowNode) -> Vec<String> {
    match node.node_type.as_str() {
        node_types::ROUTER => node
            .config
            .route_rules()
            .map(|rules| rules.iter().map(|r| r.id.clone()).collect())
            .unwrap_or_default(),
        node_types::CONDITION => {
            vec![route_keys::TRUE.to_string(), route_keys::FALSE.to_string()]
        }
        node_types::LOOP => vec![
            route_keys::CONTINUE_LOOP.to_string(),
            route_keys::EXIT_LOOP.to_string(),
        ],
        _ => Vec::new(),
    }
}

/// Convenience for hosts that only care about a yes/no plus messages.
#[must_use]
pub fn error_messages(issues: &[ValidationIssue]) -> Vec<String> {
    issues
        .iter()
        .filter(|i| i.severity == Severity::Error)
        .map(|i| i.message.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConfigObject, FieldType, ReducerKind, StateField};
    use crate::registry::InMemoryRegistry;
    use crate::types::Position;
    use serde_json::json;
    use std::sync::Arc;

    fn object(value: serde_json::Value) -> ConfigObject {
        value.as_object().cloned().unwrap()
    }

    fn model_with_router() -> GraphModel {
        let registry = Arc::new(InMemoryRegistry::with_builtin_types());
        let mut model = GraphModel::new(registry);
        let router_id = model
            .add_node(
                "router",
                Position::new(0.0, 0.0),
                None,
                Some(object(json!({"rules": [{"id": "hot"}, {"id": "cold"}]}))),
            )
            .unwrap()
            .id
            .clone();
        let target_id = model
            .add_node("condition", Position::new(100.0, 0.0), None, None)
            .unwrap()
            .id
            .clone();
        model.connect(&router_id, &target_id).unwrap();
        model
    }

    #[test]
    fn clean_graph_is_deployment_ready() {
        let model = model_with_router();
        let issues = validate_graph(&model);
        assert!(deployment_ready(&issues), "unexpected issues: {issues:?}");
    }

    #[test]
    fn unmatched_route_key_is_warning_only() {
        let mut model = model_with_router();
        let router_id = model.nodes()[0].id.clone();
        // Remove the rule the connection was assigned to.
        model
            .update_node_config(&router_id, &object(json!({"rules": [{"id": "cold"}]})))
            .unwrap();
        let issues = validate_graph(&model);
        assert!(issues
            .iter()
            .any(|i| i.code == "unmatched_route_key" && i.severity == Severity::Warning));
        assert!(deployment_ready(&issues));
    }

    #[test]
    fn duplicate_fields_block_deployment() {
        // Duplicates cannot enter through add_state_field; emulate a loaded
        // document that carries them.
        let registry = Arc::new(InMemoryRegistry::with_builtin_types());
        let model = GraphModel::with_content(
            registry,
            Vec::new(),
            Vec::new(),
            vec![
                StateField::new("count", FieldType::Int),
                StateField::new("count", FieldType::String),
            ],
        );
        let issues = validate_graph(&model);
        assert!(issues.iter().any(|i| i.code == "duplicate_field"));
        assert!(!deployment_ready(&issues));
    }

    #[test]
    fn reducer_mismatch_is_warning() {
        let registry = Arc::new(InMemoryRegistry::with_builtin_types());
        let model = GraphModel::with_content(
            registry,
            Vec::new(),
            Vec::new(),
            vec![StateField::new("count", FieldType::Int).with_reducer(ReducerKind::Append)],
        );
        let issues = validate_graph(&model);
        assert!(issues
            .iter()
            .any(|i| i.code == "reducer_mismatch" && i.severity == Severity::Warning));
        assert!(deployment_ready(&issues));
    }
}
