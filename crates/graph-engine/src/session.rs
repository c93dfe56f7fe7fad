//! Session serialization
//!
//! The downloadable session format: every node's user-editable content
//! keyed by parameter name, the connection list, the canvas view
//! transform, and the id counter. Loading replaces the whole graph;
//! structural problems abort the load before anything is applied, leaving
//! the caller's graph in its last-good state.
//!
//! Cosmetic state (cached outputs, status lines) is not persisted; it is
//! rebuilt by propagating every node once after load.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::graph::Graph;
use crate::types::{Connection, Node, Position, Size, ViewTransform};

/// A node in the serialized session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionNode {
    /// Node id
    pub id: String,
    /// Node type tag
    #[serde(rename = "type")]
    pub node_type: String,
    /// Canvas x position
    pub x: f64,
    /// Canvas y position
    pub y: f64,
    /// Node width
    pub width: f64,
    /// Node height
    pub height: f64,
    /// Every user-editable field, keyed by parameter name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub content: BTreeMap<String, serde_json::Value>,
    /// Opaque host-side display properties
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<serde_json::Value>,
    /// Opaque host-side code-block properties
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_block_properties: Option<serde_json::Value>,
    /// Containing node id, if nested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Ordered children, if a container
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<String>,
}

impl SessionNode {
    fn from_node(node: &Node) -> Self {
        Self {
            id: node.id.clone(),
            node_type: node.node_type.clone(),
            x: node.position.x,
            y: node.position.y,
            width: node.size.width,
            height: node.size.height,
            content: node.parameters.clone(),
            properties: node.properties.clone(),
            code_block_properties: node.code_block_properties.clone(),
            parent_id: node.parent_id.clone(),
            children: node.children.clone(),
        }
    }

    fn into_node(self) -> Node {
        Node {
            id: self.id,
            node_type: self.node_type,
            position: Position::new(self.x, self.y),
            size: Size::new(self.width, self.height),
            parameters: self.content,
            outputs: BTreeMap::new(),
            status: None,
            parent_id: self.parent_id,
            children: self.children,
            properties: self.properties,
            code_block_properties: self.code_block_properties,
        }
    }
}

/// A complete serialized editor session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDocument {
    /// Serialized nodes, in table order
    pub nodes: Vec<SessionNode>,
    /// The connection list
    #[serde(default)]
    pub connections: Vec<Connection>,
    /// Canvas pan offset
    #[serde(default)]
    pub canvas_offset: Position,
    /// Canvas zoom factor
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// The id counter at capture time
    #[serde(default)]
    pub node_counter: u64,
}

fn default_scale() -> f64 {
    1.0
}

impl SessionDocument {
    /// Capture the current graph and view transform
    pub fn capture(graph: &Graph, view: &ViewTransform) -> Self {
        Self {
            nodes: graph.nodes().iter().map(SessionNode::from_node).collect(),
            connections: graph.connections().to_vec(),
            canvas_offset: view.offset,
            scale: view.scale,
            node_counter: graph.node_counter(),
        }
    }

    /// Serialize to compact JSON bytes
    ///
    /// Deterministic for a given session (parameter maps are ordered), so
    /// history snapshots can be compared textually.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Serialize to pretty JSON for the downloadable session file
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a session from JSON bytes
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Build a graph and view transform from this session
    ///
    /// All structural checks happen before anything is returned: duplicate
    /// node ids, connection endpoints referencing nonexistent nodes, and
    /// inconsistent parent/child back-references abort the load.
    pub fn apply(self) -> Result<(Graph, ViewTransform)> {
        self.check_structure()?;

        let mut graph = Graph::new();
        let node_counter = self.node_counter;
        for session_node in self.nodes {
            graph.insert_node(session_node.into_node());
        }
        graph.advance_counter_to(node_counter);
        for connection in self.connections {
            // Endpoints were checked above; push directly so connection
            // order (and thus fan-out order) survives the round-trip.
            graph.connect(connection.from, connection.to);
        }

        let view = ViewTransform {
            offset: self.canvas_offset,
            scale: self.scale,
        };
        Ok((graph, view))
    }

    fn check_structure(&self) -> Result<()> {
        let mut ids = std::collections::HashSet::new();
        for node in &self.nodes {
            if !ids.insert(node.id.as_str()) {
                return Err(EngineError::invalid_session(format!(
                    "duplicate node id '{}'",
                    node.id
                )));
            }
        }

        for connection in &self.connections {
            for endpoint in [&connection.from, &connection.to] {
                if !ids.contains(endpoint.node.as_str()) {
                    return Err(EngineError::invalid_session(format!(
                        "connection references nonexistent node '{}'",
                        endpoint.node
                    )));
                }
            }
            if connection.from.node == connection.to.node {
                return Err(EngineError::invalid_session(format!(
                    "self-loop on node '{}'",
                    connection.from.node
                )));
            }
        }

        for node in &self.nodes {
            if let Some(parent_id) = &node.parent_id {
                let parent = self
                    .nodes
                    .iter()
                    .find(|n| &n.id == parent_id)
                    .ok_or_else(|| {
                        EngineError::invalid_session(format!(
                            "node '{}' references nonexistent parent '{}'",
                            node.id, parent_id
                        ))
                    })?;
                if !parent.children.contains(&node.id) {
                    return Err(EngineError::invalid_session(format!(
                        "parent '{}' does not list child '{}'",
                        parent_id, node.id
                    )));
                }
            }
            for child_id in &node.children {
                let child = self.nodes.iter().find(|n| &n.id == child_id).ok_or_else(|| {
                    EngineError::invalid_session(format!(
                        "container '{}' lists nonexistent child '{}'",
                        node.id, child_id
                    ))
                })?;
                if child.parent_id.as_deref() != Some(node.id.as_str()) {
                    return Err(EngineError::invalid_session(format!(
                        "child '{}' does not reference parent '{}'",
                        child_id, node.id
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Endpoint;
    use serde_json::json;

    fn sample_graph() -> Graph {
        let mut graph = Graph::new();
        let a = graph.create_node("text", Position::new(10.0, 20.0));
        let b = graph.create_node("csv", Position::new(400.0, 20.0));
        graph
            .node_mut(&a)
            .unwrap()
            .set_parameter("text", json!("a,b\n1,2"));
        graph.connect(Endpoint::new(&a, "text"), Endpoint::new(&b, "text"));
        graph
    }

    #[test]
    fn test_round_trip_reproduces_structure() {
        let graph = sample_graph();
        let view = ViewTransform {
            offset: Position::new(-40.0, 12.5),
            scale: 0.75,
        };

        let json = SessionDocument::capture(&graph, &view).to_json().unwrap();
        let (restored, restored_view) = SessionDocument::from_json(&json).unwrap().apply().unwrap();

        assert_eq!(restored.len(), graph.len());
        assert_eq!(restored.connections(), graph.connections());
        assert_eq!(restored_view, view);
        for (a, b) in graph.nodes().iter().zip(restored.nodes()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.node_type, b.node_type);
            assert_eq!(a.position, b.position);
            assert_eq!(a.size, b.size);
            assert_eq!(a.parameters, b.parameters);
        }
        assert_eq!(restored.node_counter(), graph.node_counter());
    }

    #[test]
    fn test_round_trip_is_stable() {
        let graph = sample_graph();
        let view = ViewTransform::default();

        let first = SessionDocument::capture(&graph, &view).to_json().unwrap();
        let (restored, restored_view) =
            SessionDocument::from_json(&first).unwrap().apply().unwrap();
        let second = SessionDocument::capture(&restored, &restored_view)
            .to_json()
            .unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_outputs_are_not_persisted() {
        let mut graph = sample_graph();
        graph
            .node_mut("node-1")
            .unwrap()
            .outputs
            .insert("text".to_string(), json!("cached"));
        graph.node_mut("node-1").unwrap().status = Some("ok".to_string());

        let json = SessionDocument::capture(&graph, &ViewTransform::default())
            .to_json()
            .unwrap();
        let (restored, _) = SessionDocument::from_json(&json).unwrap().apply().unwrap();

        assert!(restored.node("node-1").unwrap().outputs.is_empty());
        assert!(restored.node("node-1").unwrap().status.is_none());
    }

    #[test]
    fn test_rejects_connection_to_missing_node() {
        let json = json!({
            "nodes": [
                {"id": "node-1", "type": "text", "x": 0.0, "y": 0.0, "width": 220.0, "height": 120.0}
            ],
            "connections": [
                {"from": {"node": "node-1", "socket": "text"}, "to": {"node": "ghost", "socket": "text"}}
            ],
            "canvasOffset": {"x": 0.0, "y": 0.0},
            "scale": 1.0,
            "nodeCounter": 1
        });

        let doc = SessionDocument::from_json(json.to_string().as_bytes()).unwrap();
        assert!(matches!(doc.apply(), Err(EngineError::InvalidSession(_))));
    }

    #[test]
    fn test_rejects_inconsistent_parent_links() {
        let json = json!({
            "nodes": [
                {"id": "node-1", "type": "group", "x": 0.0, "y": 0.0, "width": 300.0, "height": 200.0},
                {"id": "node-2", "type": "text", "x": 10.0, "y": 10.0, "width": 220.0, "height": 120.0,
                 "parentId": "node-1"}
            ],
            "connections": [],
            "canvasOffset": {"x": 0.0, "y": 0.0},
            "scale": 1.0,
            "nodeCounter": 2
        });

        // node-1 does not list node-2 in children
        let doc = SessionDocument::from_json(json.to_string().as_bytes()).unwrap();
        assert!(matches!(doc.apply(), Err(EngineError::InvalidSession(_))));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let json = json!({
            "nodes": [
                {"id": "node-1", "type": "text", "x": 0.0, "y": 0.0, "width": 220.0, "height": 120.0},
                {"id": "node-1", "type": "text", "x": 50.0, "y": 0.0, "width": 220.0, "height": 120.0}
            ]
        });

        let doc = SessionDocument::from_json(json.to_string().as_bytes()).unwrap();
        assert!(matches!(doc.apply(), Err(EngineError::InvalidSession(_))));
    }

    #[test]
    fn test_counter_advances_past_loaded_ids() {
        let json = json!({
            "nodes": [
                {"id": "node-9", "type": "text", "x": 0.0, "y": 0.0, "width": 220.0, "height": 120.0}
            ],
            "nodeCounter": 9
        });

        let doc = SessionDocument::from_json(json.to_string().as_bytes()).unwrap();
        let (mut graph, _) = doc.apply().unwrap();
        assert_eq!(graph.create_node("text", Position::default()), "node-10");
    }

    #[test]
    fn test_malformed_json_is_a_serialization_error() {
        let result = SessionDocument::from_json(b"{not json");
        assert!(matches!(result, Err(EngineError::Serialization(_))));
    }
}
