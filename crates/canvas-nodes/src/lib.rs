//! Canvas Nodes - built-in node processors for Patchbay
//!
//! Each node type lives in its own module and provides two things:
//! a descriptor ([`graph_engine::NodeMetadata`]) describing its sockets,
//! and a [`graph_engine::NodeProcessor`] implementing its recompute. Both
//! are submitted to the engine's registry at link time through
//! `inventory`, so [`builtin_registry`] picks up every node type compiled
//! into the process.
//!
//! Data processors never raise for malformed input: failures become the
//! node's status line and downstream nodes receive neutral values.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use graph_engine::editor::Editor;
//! use graph_engine::types::{Endpoint, Position};
//!
//! let registry = Arc::new(canvas_nodes::builtin_registry());
//! let mut editor = Editor::new(registry);
//!
//! let source = editor.create_node("text", Position::new(0.0, 0.0));
//! let parser = editor.create_node("csv", Position::new(300.0, 0.0));
//! editor.connect(
//!     Endpoint::new(&source, "text"),
//!     Endpoint::new(&parser, "text"),
//! );
//! editor
//!     .set_parameter(&source, "text", serde_json::json!("a,b\n1,2"))
//!     .unwrap();
//!
//! let records = editor.graph().node(&parser).unwrap().output("records").unwrap();
//! assert_eq!(records, &serde_json::json!([{"a": "1", "b": "2"}]));
//! ```

pub mod container;
pub mod expr;
pub mod input;
pub mod output;
pub mod processing;

use graph_engine::NodeRegistry;

/// Build a registry holding every node type linked into the process
pub fn builtin_registry() -> NodeRegistry {
    let registry = NodeRegistry::from_inventory();
    log::debug!("built registry with {} node type(s)", registry.node_types().len());
    registry
}
