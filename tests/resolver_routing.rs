//! Connection-time edge classification and route-key assignment.

mod common;
use common::*;

use flowboard::model::ConfigObject;
use flowboard::resolver::{self, ConnectionResolution};
use flowboard::types::{EdgeType, Position};
use serde_json::json;

fn object(value: serde_json::Value) -> ConfigObject {
    value.as_object().cloned().unwrap()
}

#[test]
fn plain_sources_produce_normal_edges() {
    let mut model = empty_model();
    let a = add(&mut model, "agent", 0.0, 0.0);
    let b = add(&mut model, "agent", 100.0, 0.0);
    let edge = model.connect(&a, &b).unwrap();
    assert_eq!(edge.data.edge_type, EdgeType::Normal);
    assert_eq!(edge.route_key(), None);
}

#[test]
fn router_assigns_rules_in_declaration_order() {
    let mut model = empty_model();
    let router = model
        .add_node(
            "router",
            Position::new(0.0, 0.0),
            None,
            Some(object(json!({"rules": [{"id": "hot"}, {"id": "cold"}]}))),
        )
        .unwrap()
        .id
        .clone();
    let t1 = add(&mut model, "agent", 100.0, 0.0);
    let t2 = add(&mut model, "agent", 100.0, 100.0);
    let t3 = add(&mut model, "agent", 100.0, 200.0);

    assert_eq!(model.connect(&router, &t1).unwrap().route_key(), Some("hot"));
    assert_eq!(model.connect(&router, &t2).unwrap().route_key(), Some("cold"));
    // Every rule wired: classified conditional, key left for manual pick.
    let third = model.connect(&router, &t3).unwrap();
    assert_eq!(third.data.edge_type, EdgeType::Conditional);
    assert_eq!(third.route_key(), None);
}

#[test]
fn condition_assigns_true_then_false_then_nothing() {
    let mut model = empty_model();
    let cond = add(&mut model, "condition", 0.0, 0.0);
    let t1 = add(&mut model, "agent", 100.0, 0.0);
    let t2 = add(&mut model, "agent", 100.0, 100.0);
    let t3 = add(&mut model, "agent", 100.0, 200.0);

    assert_eq!(model.connect(&cond, &t1).unwrap().route_key(), Some("true"));
    assert_eq!(model.connect(&cond, &t2).unwrap().route_key(), Some("false"));
    // Both branches wired: still conditional, key left for manual pick.
    let third = model.connect(&cond, &t3).unwrap();
    assert_eq!(third.route_key(), None);
    assert_eq!(third.data.edge_type, EdgeType::Conditional);
}

#[test]
fn loop_assigns_continue_then_exit() {
    let mut model = empty_model();
    let gate = add(&mut model, "loop", 100.0, 0.0);
    let forward = add(&mut model, "agent", 200.0, 0.0);
    let after = add(&mut model, "agent", 300.0, 0.0);

    // Forward continue edge: conditional, not loop-back.
    let first = model.connect(&gate, &forward).unwrap();
    assert_eq!(first.route_key(), Some("continue_loop"));
    assert_eq!(first.data.edge_type, EdgeType::Conditional);

    let second = model.connect(&gate, &after).unwrap();
    assert_eq!(second.route_key(), Some("exit_loop"));
    assert_eq!(second.data.edge_type, EdgeType::Conditional);
}

#[test]
fn backward_continue_edge_is_loop_back() {
    let mut model = empty_model();
    let body = add(&mut model, "agent", 0.0, 0.0);
    let gate = add(&mut model, "loop", 200.0, 0.0);
    let edge = model.connect(&gate, &body).unwrap();
    assert_eq!(edge.route_key(), Some("continue_loop"));
    assert_eq!(edge.data.edge_type, EdgeType::LoopBack);
}

#[test]
fn self_loop_on_gate_is_loop_back() {
    let mut model = empty_model();
    let gate = add(&mut model, "loop", 100.0, 0.0);
    let edge = model.connect(&gate, &gate).unwrap();
    assert_eq!(edge.data.edge_type, EdgeType::LoopBack);
    assert_eq!(edge.route_key(), Some("continue_loop"));
}

#[test]
fn resolution_is_pure_over_the_same_inputs() {
    let mut model = empty_model();
    let cond = add(&mut model, "condition", 0.0, 0.0);
    let target = add(&mut model, "agent", 100.0, 0.0);

    let first = resolver::resolve_connection(&cond, &target, model.nodes(), model.edges());
    let second = resolver::resolve_connection(&cond, &target, model.nodes(), model.edges());
    assert_eq!(first, second);
    assert_eq!(
        first,
        ConnectionResolution {
            edge_type: EdgeType::Conditional,
            route_key: Some("true".to_string()),
        }
    );
    // The pure call classified but did not mutate.
    assert!(model.edges().is_empty());
}

#[test]
fn connecting_auto_wires_the_target_mapping() {
    let mut model = empty_model();
    let source = add(&mut model, "agent", 0.0, 0.0);
    let target = add(&mut model, "agent", 100.0, 0.0);
    model.connect(&source, &target).unwrap();

    let config = model.node(&target).unwrap().config.to_value();
    let expected = format!("{{{source}.output}}");
    assert_eq!(config["input_mapping"], json!([expected]));

    // Reconnecting elsewhere never duplicates the token.
    let other = add(&mut model, "agent", 50.0, 100.0);
    model.connect(&other, &target).unwrap();
    let config = model.node(&target).unwrap().config.to_value();
    assert_eq!(
        config["input_mapping"].as_array().unwrap().len(),
        2,
        "one token per distinct source"
    );
}

#[test]
fn deleted_edge_frees_its_route_key() {
    let mut model = empty_model();
    let cond = add(&mut model, "condition", 0.0, 0.0);
    let t1 = add(&mut model, "agent", 100.0, 0.0);
    let t2 = add(&mut model, "agent", 100.0, 100.0);

    let first_id = model.connect(&cond, &t1).unwrap().id.clone();
    model.delete_edge(&first_id).unwrap();
    // "true" is available again.
    assert_eq!(model.connect(&cond, &t2).unwrap().route_key(), Some("true"));
}
