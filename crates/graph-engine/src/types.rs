//! Core types for editor graphs
//!
//! These types define the structure of an editor session: nodes with
//! parameters and cached outputs, connections between named sockets,
//! and the canvas view transform.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Unique identifier for a node
pub type NodeId = String;

/// Name of an input or output socket on a node
pub type SocketName = String;

/// A point on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    /// Create a new position
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Width and height of a node on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    /// Create a new size
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for Size {
    fn default() -> Self {
        // Default footprint of a freshly placed node
        Self {
            width: 220.0,
            height: 120.0,
        }
    }
}

/// The canvas pan offset and zoom factor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    /// Pan offset of the canvas origin
    pub offset: Position,
    /// Zoom factor (1.0 = 100%)
    pub scale: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            offset: Position::default(),
            scale: 1.0,
        }
    }
}

/// A node instance in a graph
///
/// `parameters` holds user-editable configuration; `outputs` is the cache
/// of the last recompute and is rebuilt wholesale every time the node's
/// processor runs. Both maps are ordered so that serialization is
/// deterministic and history snapshots can be compared textually.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique identifier for this node instance
    pub id: NodeId,
    /// Node type tag (resolved through the processor registry)
    #[serde(rename = "type")]
    pub node_type: String,
    /// Position on the canvas
    pub position: Position,
    /// Size on the canvas
    pub size: Size,
    /// User-editable configuration, keyed by parameter name
    #[serde(default)]
    pub parameters: BTreeMap<String, serde_json::Value>,
    /// Cached outputs of the last recompute, keyed by socket name.
    /// Not persisted; rebuilt by propagation.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, serde_json::Value>,
    /// Node-local human-readable status line. Not persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Containing node, if this node is nested inside a container
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
    /// Ordered children, if this node is a container
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeId>,
    /// Opaque host-side display properties, carried through serialization
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<serde_json::Value>,
    /// Opaque host-side code-block properties, carried through serialization
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_block_properties: Option<serde_json::Value>,
}

impl Node {
    /// Create a new node with empty parameters and outputs
    pub fn new(id: impl Into<NodeId>, node_type: impl Into<String>, position: Position) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            position,
            size: Size::default(),
            parameters: BTreeMap::new(),
            outputs: BTreeMap::new(),
            status: None,
            parent_id: None,
            children: Vec::new(),
            properties: None,
            code_block_properties: None,
        }
    }

    /// Get a parameter value
    pub fn parameter(&self, key: &str) -> Option<&serde_json::Value> {
        self.parameters.get(key)
    }

    /// Get a parameter as a string slice
    pub fn parameter_str(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(|v| v.as_str())
    }

    /// Set a parameter value
    pub fn set_parameter(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.parameters.insert(key.into(), value);
    }

    /// Get an output value
    pub fn output(&self, socket: &str) -> Option<&serde_json::Value> {
        self.outputs.get(socket)
    }

    /// The center point of the node's bounds
    pub fn center(&self) -> Position {
        Position::new(
            self.position.x + self.size.width / 2.0,
            self.position.y + self.size.height / 2.0,
        )
    }

    /// Check whether a canvas point lies within the node's bounds
    pub fn contains_point(&self, point: Position) -> bool {
        point.x >= self.position.x
            && point.x <= self.position.x + self.size.width
            && point.y >= self.position.y
            && point.y <= self.position.y + self.size.height
    }
}

/// One end of a connection: a node and a socket name on it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    /// Node id
    pub node: NodeId,
    /// Socket name on that node
    pub socket: SocketName,
}

impl Endpoint {
    /// Create a new endpoint
    pub fn new(node: impl Into<NodeId>, socket: impl Into<SocketName>) -> Self {
        Self {
            node: node.into(),
            socket: socket.into(),
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.node, self.socket)
    }
}

/// A directed edge from one node's output socket to another node's input socket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    /// Source output socket
    pub from: Endpoint,
    /// Destination input socket
    pub to: Endpoint,
}

impl Connection {
    /// Create a new connection
    pub fn new(from: Endpoint, to: Endpoint) -> Self {
        Self { from, to }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_center_and_containment() {
        let mut node = Node::new("node-1", "text", Position::new(100.0, 50.0));
        node.size = Size::new(200.0, 100.0);

        let center = node.center();
        assert_eq!(center.x, 200.0);
        assert_eq!(center.y, 100.0);

        assert!(node.contains_point(Position::new(150.0, 75.0)));
        assert!(node.contains_point(Position::new(100.0, 50.0)));
        assert!(!node.contains_point(Position::new(99.0, 75.0)));
        assert!(!node.contains_point(Position::new(150.0, 151.0)));
    }

    #[test]
    fn test_node_parameters() {
        let mut node = Node::new("node-1", "text", Position::default());
        node.set_parameter("text", serde_json::json!("hello"));

        assert_eq!(node.parameter_str("text"), Some("hello"));
        assert!(node.parameter("missing").is_none());
    }

    #[test]
    fn test_node_serialization_skips_transient_fields() {
        let mut node = Node::new("node-1", "text", Position::default());
        node.outputs
            .insert("text".to_string(), serde_json::json!("cached"));
        node.status = Some("ok".to_string());

        let json = serde_json::to_string(&node).unwrap();
        assert!(json.contains("\"type\":\"text\""));

        // Round-trip through the persisted shape drops nothing structural
        let back: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, "node-1");
        assert_eq!(back.node_type, "text");
    }

    #[test]
    fn test_endpoint_display() {
        let ep = Endpoint::new("node-3", "text");
        assert_eq!(ep.to_string(), "node-3:text");
    }
}
