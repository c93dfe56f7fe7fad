//! Fluent builder for editor graphs
//!
//! Convenience API for constructing graphs programmatically in tests and
//! demo seeds. Ids are caller-supplied; the underlying store advances its
//! counter past them as usual.

use crate::graph::Graph;
use crate::types::{Endpoint, Node, Position, Size};

/// Fluent builder for constructing graphs
///
/// # Example
///
/// ```
/// use graph_engine::builder::GraphBuilder;
/// use graph_engine::types::Position;
///
/// let graph = GraphBuilder::new()
///     .node("a", "text", Position::new(0.0, 0.0))
///     .with_parameter("text", serde_json::json!("hello"))
///     .node("b", "find_replace", Position::new(300.0, 0.0))
///     .wire("a", "text", "b", "text")
///     .build();
///
/// assert_eq!(graph.len(), 2);
/// ```
#[derive(Default)]
pub struct GraphBuilder {
    graph: Graph,
}

impl GraphBuilder {
    /// Create a new builder with an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node with an explicit id
    pub fn node(
        mut self,
        id: impl Into<String>,
        node_type: impl Into<String>,
        position: Position,
    ) -> Self {
        self.graph
            .insert_node(Node::new(id.into(), node_type, position));
        self
    }

    /// Set a parameter on the most recently added node
    pub fn with_parameter(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        if let Some(node) = self.last_node_id() {
            if let Some(node) = self.graph.node_mut(&node) {
                node.set_parameter(key, value);
            }
        }
        self
    }

    /// Set the size of the most recently added node
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        if let Some(node) = self.last_node_id() {
            if let Some(node) = self.graph.node_mut(&node) {
                node.size = Size::new(width, height);
            }
        }
        self
    }

    /// Wire an output socket to an input socket
    pub fn wire(
        mut self,
        from_node: impl Into<String>,
        from_socket: impl Into<String>,
        to_node: impl Into<String>,
        to_socket: impl Into<String>,
    ) -> Self {
        self.graph.connect(
            Endpoint::new(from_node, from_socket),
            Endpoint::new(to_node, to_socket),
        );
        self
    }

    /// Nest a node inside a container, maintaining both back-references
    pub fn child_of(mut self, child_id: &str, parent_id: &str) -> Self {
        if let Some(child) = self.graph.node_mut(child_id) {
            child.parent_id = Some(parent_id.to_string());
        }
        if let Some(parent) = self.graph.node_mut(parent_id) {
            parent.children.push(child_id.to_string());
        }
        self
    }

    /// Finish and return the graph
    pub fn build(self) -> Graph {
        self.graph
    }

    fn last_node_id(&self) -> Option<String> {
        self.graph.nodes().last().map(|n| n.id.clone())
    }
}
