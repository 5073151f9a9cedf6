//! # Flowboard: Visual Workflow Editing Core
//!
//! Flowboard is the headless editing core behind a visual workflow builder:
//! the graph document model, its undo/redo history, connection-time edge
//! semantics, autosave reconciliation against a remote store, and the
//! human-in-the-loop interrupt/resume protocol. Rendering, forms, and the
//! node execution runtime live outside this crate and plug in through the
//! trait seams in [`persistence`], [`registry`], and [`interrupt`].
//!
//! ## Core Concepts
//!
//! - **GraphModel**: the single source of truth for nodes, edges, and the
//!   state-variable schema, with a closed command API
//! - **HistoryBuffer**: bounded snapshot undo/redo over destructive
//!   operations
//! - **Resolver**: decides edge type and route key once, at connection time
//! - **SaveReconciler**: hash-gated, debounced persistence of the document
//! - **InterruptController**: holds a paused execution thread and issues
//!   one structured resume command
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use flowboard::model::GraphModel;
//! use flowboard::registry::InMemoryRegistry;
//! use flowboard::types::Position;
//!
//! let registry = Arc::new(InMemoryRegistry::with_builtin_types());
//! let mut model = GraphModel::new(registry);
//!
//! let router = model
//!     .add_node("router", Position::new(0.0, 0.0), None, None)?
//!     .id
//!     .clone();
//! let check = model
//!     .add_node("condition", Position::new(200.0, 0.0), None, None)?
//!     .id
//!     .clone();
//!
//! model.connect(&router, &check)?;
//! assert!(model.can_undo());
//! model.undo();
//! assert!(model.edges().is_empty());
//! # Ok::<(), flowboard::model::GraphError>(())
//! ```
//!
//! ## Module Guide
//!
//! - [`model`] - graph document, history, and the mutation API
//! - [`resolver`] - connection-time edge classification and auto-wiring
//! - [`registry`] - node type specs, defaults, and state footprints
//! - [`sync`] - content hashing, debounce scheduling, save reconciliation
//! - [`persistence`] - persisted shapes, store contract, export/import
//! - [`interrupt`] - pause/resume state machine over execution threads
//! - [`validation`] - pre-deployment graph checks
//! - [`events`] - the editor event channel consumed by UI layers

pub mod events;
pub mod interrupt;
pub mod model;
pub mod persistence;
pub mod registry;
pub mod resolver;
pub mod sync;
pub mod telemetry;
pub mod types;
pub mod utils;
pub mod validation;
