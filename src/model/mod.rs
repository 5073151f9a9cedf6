//! The in-memory graph model: nodes, edges, the graph-level state-variable
//! schema, and the bounded undo/redo history.
//!
//! [`GraphModel`] is the single source of truth for the editable graph. All
//! mutation passes through its named operations; the persistence layer holds
//! a durable copy that is reconciled but never authoritative over an
//! in-session edit.

pub mod edge;
pub mod graph;
pub mod history;
pub mod node;
pub mod schema;

pub use edge::{EdgeData, WorkflowEdge};
pub use graph::{GraphError, GraphModel};
pub use history::{HISTORY_CAP, HistoryBuffer, HistoryState};
pub use node::{
    ConditionConfig, ConfigObject, LoopConfig, NodeConfig, RouteRule, RouterConfig, WorkflowNode,
};
pub use schema::{FieldType, ReducerKind, StateField, is_valid_field_name, reducer_matches};
