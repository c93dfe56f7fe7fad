//! Graph Engine - dataflow execution core for Patchbay
//!
//! This crate is the engineering kernel of a visual node editor: users
//! place typed nodes on a canvas, wire output sockets to input sockets,
//! and the engine propagates data through the resulting graph,
//! re-evaluating downstream nodes whenever an upstream value changes.
//!
//! It provides:
//!
//! - The graph data model and store ([`graph::Graph`])
//! - Eager recursive dependency propagation ([`engine::Propagator`])
//! - A processor registry keyed by node type ([`registry::NodeRegistry`])
//! - Compressed snapshot-based undo/redo ([`history::HistoryManager`])
//! - Vertical-stack container layout ([`layout`])
//! - The downloadable session format ([`session::SessionDocument`])
//! - An explicit editor context tying it together ([`editor::Editor`])
//!
//! Per-node-type behavior lives behind the [`registry::NodeProcessor`]
//! contract; the built-in processors ship in the `canvas-nodes` crate.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use graph_engine::editor::Editor;
//! use graph_engine::registry::{NodeRegistry, ProcessorOutput};
//! use graph_engine::descriptor::{NodeCategory, NodeMetadata, SocketMetadata, SocketType};
//! use graph_engine::types::Position;
//!
//! let mut registry = NodeRegistry::new();
//! registry.register_fn(
//!     NodeMetadata {
//!         node_type: "text".to_string(),
//!         category: NodeCategory::Input,
//!         label: "Text".to_string(),
//!         description: "Emits its text parameter".to_string(),
//!         inputs: vec![],
//!         outputs: vec![SocketMetadata::optional("text", "Text", SocketType::Text)],
//!     },
//!     |ctx| Ok(ProcessorOutput::empty().with("text", ctx.param("text").cloned().unwrap_or_default())),
//! );
//!
//! let mut editor = Editor::new(Arc::new(registry));
//! let id = editor.create_node("text", Position::new(0.0, 0.0));
//! editor.set_parameter(&id, "text", serde_json::json!("hello")).unwrap();
//! assert_eq!(
//!     editor.graph().node(&id).unwrap().output("text"),
//!     Some(&serde_json::json!("hello"))
//! );
//! ```

pub mod builder;
pub mod descriptor;
pub mod editor;
pub mod engine;
pub mod error;
pub mod events;
pub mod graph;
pub mod history;
pub mod layout;
pub mod registry;
pub mod resource;
pub mod session;
pub mod types;
pub mod validation;

// Re-export key types
pub use descriptor::{NodeCategory, NodeMetadata, SocketMetadata, SocketType};
pub use editor::{Editor, EditorConfig};
pub use engine::{ProcessContext, Propagator};
pub use error::{EngineError, Result};
pub use events::{EditorEvent, EventSink, NullEventSink, VecEventSink};
pub use graph::{ConnectOutcome, Graph};
pub use history::HistoryManager;
pub use registry::{
    NodeProcessor, NodeRegistry, ProcessorError, ProcessorOutput, ProcessorRegistration,
};
pub use session::SessionDocument;
pub use types::{Connection, Endpoint, Node, NodeId, Position, Size, ViewTransform};
