//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;

use flowboard::model::GraphModel;
use flowboard::persistence::{GraphDocument, PersistenceApi, PersistenceError};
use flowboard::registry::{InMemoryRegistry, NodeTypeSpec};
use flowboard::types::Position;

/// The builtin rule-bearing types plus an "agent" type whose default config
/// carries an input mapping list, so auto-wiring has something to append to.
pub fn registry() -> Arc<InMemoryRegistry> {
    Arc::new(InMemoryRegistry::with_builtin_types().with_spec(
        "agent",
        NodeTypeSpec::with_default_config(json!({
            "model": "default",
            "input_mapping": []
        })),
    ))
}

pub fn empty_model() -> GraphModel {
    GraphModel::new(registry())
}

/// Add a node and return its id.
pub fn add(model: &mut GraphModel, node_type: &str, x: f64, y: f64) -> String {
    model
        .add_node(node_type, Position::new(x, y), None, None)
        .unwrap()
        .id
        .clone()
}

/// Persistence fake that records every saved document and can be switched
/// into a failing mode.
pub struct RecordingStore {
    pub saved: Mutex<Vec<GraphDocument>>,
    pub fail: Mutex<bool>,
}

impl RecordingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            saved: Mutex::new(Vec::new()),
            fail: Mutex::new(false),
        })
    }

    pub fn failing() -> Arc<Self> {
        let store = Self::new();
        *store.fail.lock() = true;
        store
    }

    pub fn save_count(&self) -> usize {
        self.saved.lock().len()
    }
}

#[async_trait]
impl PersistenceApi for RecordingStore {
    async fn load_graph_state(&self, graph_id: &str) -> Result<GraphDocument, PersistenceError> {
        Err(PersistenceError::NotFound {
            graph_id: graph_id.to_string(),
        })
    }

    async fn save_graph(&self, document: &GraphDocument) -> Result<String, PersistenceError> {
        if *self.fail.lock() {
            return Err(PersistenceError::Network {
                message: "connection refused".into(),
            });
        }
        self.saved.lock().push(document.clone());
        Ok("graph-1".to_string())
    }
}
