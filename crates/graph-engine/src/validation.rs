//! Graph validation diagnostics
//!
//! Validates graph structure: dangling edge references, cycles, unknown
//! node types, required-input coverage, and parent/child back-reference
//! consistency. These are diagnostics for hosts and load boundaries; the
//! propagation engine itself never consults them.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::graph::Graph;
use crate::registry::NodeRegistry;

/// Validation error with location context
#[derive(Debug, Clone)]
pub enum ValidationError {
    /// Cycle detected in the graph
    CycleDetected,
    /// A connection endpoint references a nonexistent node
    DanglingConnection { node_id: String },
    /// A node has an unknown type (not in the registry)
    UnknownNodeType { node_id: String, node_type: String },
    /// A required input socket is not connected
    UnconnectedRequiredInput { node_id: String, socket: String },
    /// More than one connection targets the same input socket
    DuplicateInputConnection { node_id: String, socket: String },
    /// A node's parent does not list it as a child, or vice versa
    ParentChildMismatch { node_id: String, parent_id: String },
    /// A node's parent is not a container type
    ParentNotContainer { node_id: String, parent_id: String },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CycleDetected => write!(f, "Cycle detected in graph"),
            Self::DanglingConnection { node_id } => {
                write!(f, "Connection references nonexistent node '{}'", node_id)
            }
            Self::UnknownNodeType { node_id, node_type } => {
                write!(f, "Unknown node type '{}' for node '{}'", node_type, node_id)
            }
            Self::UnconnectedRequiredInput { node_id, socket } => {
                write!(
                    f,
                    "Required input '{}' on node '{}' is not connected",
                    socket, node_id
                )
            }
            Self::DuplicateInputConnection { node_id, socket } => {
                write!(
                    f,
                    "Input '{}' on node '{}' has more than one connection",
                    socket, node_id
                )
            }
            Self::ParentChildMismatch { node_id, parent_id } => {
                write!(
                    f,
                    "Node '{}' and parent '{}' disagree about their linkage",
                    node_id, parent_id
                )
            }
            Self::ParentNotContainer { node_id, parent_id } => {
                write!(
                    f,
                    "Parent '{}' of node '{}' is not a container type",
                    parent_id, node_id
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a graph
///
/// Returns all validation errors found (not just the first). Pass a
/// registry to enable node type, required-input, and container checks.
pub fn validate_graph(graph: &Graph, registry: Option<&NodeRegistry>) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    validate_connection_references(graph, &mut errors);
    validate_single_input_connections(graph, &mut errors);
    validate_parent_links(graph, registry, &mut errors);
    if has_cycle(graph) {
        errors.push(ValidationError::CycleDetected);
    }

    if let Some(registry) = registry {
        validate_node_types(graph, registry, &mut errors);
        validate_required_inputs(graph, registry, &mut errors);
    }

    errors
}

/// Detect cycles using Kahn's algorithm (topological sort)
pub fn has_cycle(graph: &Graph) -> bool {
    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    for node in graph.nodes() {
        in_degree.insert(&node.id, 0);
    }
    for connection in graph.connections() {
        if let Some(degree) = in_degree.get_mut(connection.to.node.as_str()) {
            *degree += 1;
        }
    }

    let mut queue: VecDeque<&str> = in_degree
        .iter()
        .filter(|(_, &degree)| degree == 0)
        .map(|(&id, _)| id)
        .collect();

    let mut visited = 0;
    while let Some(node_id) = queue.pop_front() {
        visited += 1;
        for connection in graph.connections() {
            if connection.from.node == node_id {
                if let Some(degree) = in_degree.get_mut(connection.to.node.as_str()) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(&connection.to.node);
                    }
                }
            }
        }
    }

    visited < graph.len()
}

/// Check that all connection endpoints resolve to live nodes
fn validate_connection_references(graph: &Graph, errors: &mut Vec<ValidationError>) {
    let live: HashSet<&str> = graph.nodes().iter().map(|n| n.id.as_str()).collect();
    for connection in graph.connections() {
        for endpoint in [&connection.from, &connection.to] {
            if !live.contains(endpoint.node.as_str()) {
                errors.push(ValidationError::DanglingConnection {
                    node_id: endpoint.node.clone(),
                });
            }
        }
    }
}

/// Check that at most one connection targets each input socket
fn validate_single_input_connections(graph: &Graph, errors: &mut Vec<ValidationError>) {
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    for connection in graph.connections() {
        let key = (
            connection.to.node.as_str(),
            connection.to.socket.as_str(),
        );
        if !seen.insert(key) {
            errors.push(ValidationError::DuplicateInputConnection {
                node_id: connection.to.node.clone(),
                socket: connection.to.socket.clone(),
            });
        }
    }
}

/// Check parent/child back-reference consistency
fn validate_parent_links(
    graph: &Graph,
    registry: Option<&NodeRegistry>,
    errors: &mut Vec<ValidationError>,
) {
    for node in graph.nodes() {
        if let Some(parent_id) = &node.parent_id {
            match graph.node(parent_id) {
                Some(parent) => {
                    if !parent.children.contains(&node.id) {
                        errors.push(ValidationError::ParentChildMismatch {
                            node_id: node.id.clone(),
                            parent_id: parent_id.clone(),
                        });
                    }
                    if let Some(registry) = registry {
                        if !registry.is_container(&parent.node_type) {
                            errors.push(ValidationError::ParentNotContainer {
                                node_id: node.id.clone(),
                                parent_id: parent_id.clone(),
                            });
                        }
                    }
                }
                None => errors.push(ValidationError::ParentChildMismatch {
                    node_id: node.id.clone(),
                    parent_id: parent_id.clone(),
                }),
            }
        }
        for child_id in &node.children {
            let consistent = graph
                .node(child_id)
                .map(|child| child.parent_id.as_deref() == Some(node.id.as_str()))
                .unwrap_or(false);
            if !consistent {
                errors.push(ValidationError::ParentChildMismatch {
                    node_id: child_id.clone(),
                    parent_id: node.id.clone(),
                });
            }
        }
    }
}

/// Check that all nodes have known types in the registry
fn validate_node_types(graph: &Graph, registry: &NodeRegistry, errors: &mut Vec<ValidationError>) {
    for node in graph.nodes() {
        if !registry.has_type(&node.node_type) {
            errors.push(ValidationError::UnknownNodeType {
                node_id: node.id.clone(),
                node_type: node.node_type.clone(),
            });
        }
    }
}

/// Check that required inputs are connected
fn validate_required_inputs(
    graph: &Graph,
    registry: &NodeRegistry,
    errors: &mut Vec<ValidationError>,
) {
    let connected: HashSet<(&str, &str)> = graph
        .connections()
        .iter()
        .map(|c| (c.to.node.as_str(), c.to.socket.as_str()))
        .collect();

    for node in graph.nodes() {
        if let Some(metadata) = registry.metadata(&node.node_type) {
            for socket in &metadata.inputs {
                if socket.required
                    && !connected.contains(&(node.id.as_str(), socket.name.as_str()))
                {
                    errors.push(ValidationError::UnconnectedRequiredInput {
                        node_id: node.id.clone(),
                        socket: socket.name.clone(),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::descriptor::{NodeCategory, NodeMetadata, SocketMetadata, SocketType};
    use crate::registry::ProcessorOutput;
    use crate::types::Position;

    fn test_registry() -> NodeRegistry {
        let mut registry = NodeRegistry::new();
        registry.register_fn(
            NodeMetadata {
                node_type: "text".to_string(),
                category: NodeCategory::Input,
                label: "Text".to_string(),
                description: String::new(),
                inputs: vec![],
                outputs: vec![SocketMetadata::optional("text", "Text", SocketType::Text)],
            },
            |_ctx| Ok(ProcessorOutput::empty()),
        );
        registry.register_fn(
            NodeMetadata {
                node_type: "csv".to_string(),
                category: NodeCategory::Processing,
                label: "CSV".to_string(),
                description: String::new(),
                inputs: vec![SocketMetadata::required("text", "Text", SocketType::Text)],
                outputs: vec![SocketMetadata::optional(
                    "records",
                    "Records",
                    SocketType::Records,
                )],
            },
            |_ctx| Ok(ProcessorOutput::empty()),
        );
        registry.register_fn(
            NodeMetadata {
                node_type: "group".to_string(),
                category: NodeCategory::Container,
                label: "Group".to_string(),
                description: String::new(),
                inputs: vec![],
                outputs: vec![],
            },
            |_ctx| Ok(ProcessorOutput::empty()),
        );
        registry
    }

    #[test]
    fn test_valid_graph_has_no_errors() {
        let graph = GraphBuilder::new()
            .node("a", "text", Position::new(0.0, 0.0))
            .node("b", "csv", Position::new(300.0, 0.0))
            .wire("a", "text", "b", "text")
            .build();

        let registry = test_registry();
        let errors = validate_graph(&graph, Some(&registry));
        assert!(errors.is_empty(), "expected no errors, got: {:?}", errors);
    }

    #[test]
    fn test_detects_cycle() {
        let graph = GraphBuilder::new()
            .node("a", "text", Position::new(0.0, 0.0))
            .node("b", "text", Position::new(300.0, 0.0))
            .node("c", "text", Position::new(600.0, 0.0))
            .wire("a", "text", "b", "in")
            .wire("b", "text", "c", "in")
            .wire("c", "text", "a", "in")
            .build();

        assert!(has_cycle(&graph));
        let errors = validate_graph(&graph, None);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::CycleDetected)));
    }

    #[test]
    fn test_linear_graph_has_no_cycle() {
        let graph = GraphBuilder::new()
            .node("a", "text", Position::new(0.0, 0.0))
            .node("b", "text", Position::new(300.0, 0.0))
            .wire("a", "text", "b", "in")
            .build();

        assert!(!has_cycle(&graph));
    }

    #[test]
    fn test_unknown_node_type() {
        let graph = GraphBuilder::new()
            .node("a", "mystery", Position::new(0.0, 0.0))
            .build();

        let registry = test_registry();
        let errors = validate_graph(&graph, Some(&registry));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::UnknownNodeType { .. })));
    }

    #[test]
    fn test_unconnected_required_input() {
        let graph = GraphBuilder::new()
            .node("b", "csv", Position::new(0.0, 0.0))
            .build();

        let registry = test_registry();
        let errors = validate_graph(&graph, Some(&registry));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::UnconnectedRequiredInput { .. })));
    }

    #[test]
    fn test_parent_child_mismatch() {
        let mut graph = GraphBuilder::new()
            .node("g", "group", Position::new(0.0, 0.0))
            .node("a", "text", Position::new(10.0, 10.0))
            .build();
        graph.node_mut("a").unwrap().parent_id = Some("g".to_string());
        // "g" never lists "a" as a child

        let errors = validate_graph(&graph, None);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::ParentChildMismatch { .. })));
    }

    #[test]
    fn test_parent_must_be_container() {
        let mut graph = GraphBuilder::new()
            .node("p", "text", Position::new(0.0, 0.0))
            .node("a", "text", Position::new(10.0, 10.0))
            .build();
        graph.node_mut("a").unwrap().parent_id = Some("p".to_string());
        graph.node_mut("p").unwrap().children.push("a".to_string());

        let registry = test_registry();
        let errors = validate_graph(&graph, Some(&registry));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::ParentNotContainer { .. })));
    }
}
