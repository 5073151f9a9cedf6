//! Persisted document shapes, the export/import format, and migration of
//! legacy variables payloads.

mod common;
use common::*;

use flowboard::model::{FieldType, GraphModel, StateField};
use flowboard::persistence::{
    self, DEFAULT_NODE_HEIGHT, DEFAULT_NODE_WIDTH, EXPORT_VERSION, GraphDocument, ImportError,
};
use flowboard::sync::ChangeHash;
use flowboard::types::Viewport;
use serde_json::json;

fn populated_model() -> GraphModel {
    let mut model = empty_model();
    let a = add(&mut model, "agent", 0.0, 0.0);
    let b = add(&mut model, "condition", 200.0, 50.0);
    model.connect(&a, &b).unwrap();
    model
        .add_state_field(StateField::new("history", FieldType::Messages))
        .unwrap();
    model
}

#[test]
fn document_round_trips_model_content() {
    let model = populated_model();
    let document = GraphDocument::from_model(&model, "demo", Viewport::default(), None);

    let (nodes, edges, fields) = document.into_model_parts();
    let restored = GraphModel::with_content(registry(), nodes, edges, fields);
    assert_eq!(restored.nodes(), model.nodes());
    assert_eq!(restored.edges(), model.edges());
    assert_eq!(restored.state_fields(), model.state_fields());
}

#[test]
fn document_hash_matches_model_hash() {
    let model = populated_model();
    let document = GraphDocument::from_model(&model, "demo", Viewport::default(), None);
    assert_eq!(
        ChangeHash::of(model.nodes(), model.edges()),
        ChangeHash::of_document(&document)
    );
}

#[test]
fn export_applies_layout_defaults() {
    let model = populated_model();
    let export = persistence::export_graph(&model, Viewport::default());
    assert_eq!(export.version, EXPORT_VERSION);
    for node in &export.nodes {
        assert_eq!(node.width, Some(DEFAULT_NODE_WIDTH));
        assert_eq!(node.height, Some(DEFAULT_NODE_HEIGHT));
        assert_eq!(node.position_absolute, Some(node.position));
    }
    assert!(!export.exported_at.is_empty());
}

#[test]
fn export_then_import_round_trips() {
    let model = populated_model();
    let export = persistence::export_graph(&model, Viewport::default());
    let file = serde_json::to_value(&export).unwrap();

    let imported = persistence::parse_import(&file).unwrap();
    assert_eq!(imported.nodes.len(), model.nodes().len());
    assert_eq!(imported.edges, model.edges().to_vec());

    let mut target = empty_model();
    target.replace_content(imported.nodes, imported.edges);
    assert_eq!(target.nodes(), model.nodes());
    assert!(target.can_undo(), "import is one undoable action");
}

#[test]
fn import_rejects_files_without_edges_and_leaves_model_untouched() {
    let model = populated_model();
    let nodes_before = model.nodes().len();
    let edges_before = model.edges().len();
    let could_undo_before = model.can_undo();

    let bad = json!({"version": "1.0", "nodes": []});
    match persistence::parse_import(&bad) {
        Err(ImportError::MissingEdges) => {}
        other => panic!("expected MissingEdges, got {other:?}"),
    }
    // Rejection happens before anything reaches the model: no content
    // change and no new history entry.
    assert_eq!(model.nodes().len(), nodes_before);
    assert_eq!(model.edges().len(), edges_before);
    assert_eq!(model.can_undo(), could_undo_before);
}

#[test]
fn import_rejects_non_object_payloads() {
    assert!(matches!(
        persistence::parse_import(&json!([1, 2, 3])),
        Err(ImportError::NotAnObject)
    ));
    assert!(matches!(
        persistence::parse_import(&json!({"nodes": "nope", "edges": []})),
        Err(ImportError::MissingNodes)
    ));
}

#[test]
fn import_defaults_missing_layout_fields() {
    let file = json!({
        "nodes": [{
            "id": "n1",
            "type": "agent",
            "position": {"x": 5.0, "y": 6.0},
            "label": "n1",
            "config": {"model": "m"}
        }],
        "edges": []
    });
    let imported = persistence::parse_import(&file).unwrap();
    assert_eq!(imported.nodes.len(), 1);
    assert_eq!(imported.nodes[0].id, "n1");
}

#[test]
fn legacy_variables_payload_migrates_on_load() {
    let document: GraphDocument = serde_json::from_value(json!({
        "name": "old",
        "nodes": [],
        "edges": [],
        "variables": {"counter": 3, "title": "draft"}
    }))
    .unwrap();

    let (_, _, fields) = document.into_model_parts();
    assert_eq!(fields.len(), 2);
    let counter = fields.iter().find(|f| f.name == "counter").unwrap();
    assert_eq!(counter.field_type, FieldType::Int);
    assert_eq!(counter.default_value, json!(3));
    assert!(counter.reducer.is_none(), "legacy fields overwrite");
}

#[test]
fn loading_drops_edges_with_missing_endpoints() {
    let document: GraphDocument = serde_json::from_value(json!({
        "name": "torn",
        "nodes": [{
            "id": "n1",
            "type": "agent",
            "position": {"x": 0.0, "y": 0.0},
            "label": "n1",
            "config": {}
        }],
        "edges": [
            {"id": "e1", "source": "n1", "target": "ghost"},
            {"id": "e2", "source": "n1", "target": "n1"}
        ]
    }))
    .unwrap();

    let (nodes, edges, fields) = document.into_model_parts();
    let model = GraphModel::with_content(registry(), nodes, edges, fields);
    assert_eq!(model.edges().len(), 1);
    assert_eq!(model.edges()[0].id, "e2");
}
