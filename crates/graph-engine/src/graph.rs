//! Graph store: the node table and connection list
//!
//! The store owns node and connection lifetime exclusively. The propagation
//! engine and processors only read and write through it, never keeping
//! copies across calls. Node iteration order is insertion order, which is
//! also the order used when propagating a freshly loaded graph; connection
//! order is the stable fan-out order during propagation.

use crate::types::{Connection, Endpoint, Node, NodeId, Position};

/// Outcome of a [`Graph::connect`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// A new connection was added
    Connected,
    /// An existing connection into the same input socket was replaced
    Replaced,
    /// The connection was a self-loop and was silently ignored
    RejectedSelfLoop,
    /// One of the endpoints does not exist
    RejectedUnknownNode,
}

impl ConnectOutcome {
    /// Whether the graph changed as a result of the call
    pub fn changed(&self) -> bool {
        matches!(self, Self::Connected | Self::Replaced)
    }
}

/// The node table plus the connection list
///
/// Node ids are derived from a store-owned monotonic counter and are never
/// reused while the node exists.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    connections: Vec<Connection>,
    node_counter: u64,
}

impl Graph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh id and insert a node of the given type
    ///
    /// The type tag is not checked against any registry here; unknown types
    /// simply never recompute. Production callers pre-validate.
    pub fn create_node(&mut self, node_type: impl Into<String>, position: Position) -> NodeId {
        self.node_counter += 1;
        let id = format!("node-{}", self.node_counter);
        self.nodes.push(Node::new(id.clone(), node_type, position));
        id
    }

    /// Insert a node with a caller-supplied id (deserialization path)
    ///
    /// Advances the id counter past any trailing number in the id so that
    /// later [`Graph::create_node`] calls cannot collide with loaded nodes.
    pub fn insert_node(&mut self, node: Node) {
        if let Some(n) = trailing_number(&node.id) {
            self.node_counter = self.node_counter.max(n);
        }
        self.nodes.push(node);
    }

    /// Delete a node, every connection touching it, and its parent linkage
    pub fn remove_node(&mut self, id: &str) -> Option<Node> {
        let index = self.nodes.iter().position(|n| n.id == id)?;
        let node = self.nodes.remove(index);

        self.connections
            .retain(|c| c.from.node != id && c.to.node != id);

        // Detach from the former parent's children list
        if let Some(parent_id) = &node.parent_id {
            let parent_id = parent_id.clone();
            if let Some(parent) = self.node_mut(&parent_id) {
                parent.children.retain(|c| c != id);
            }
        }
        // Orphan any children it held
        for child_id in node.children.clone() {
            if let Some(child) = self.node_mut(&child_id) {
                child.parent_id = None;
            }
        }

        Some(node)
    }

    /// Find a node by id
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Find a node by id (mutable)
    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Check whether a node id exists
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }

    /// The node table, in insertion order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// The connection list, in creation order
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph holds no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The current value of the id counter
    pub fn node_counter(&self) -> u64 {
        self.node_counter
    }

    /// Force the id counter (deserialization path; never moves it backwards)
    pub fn advance_counter_to(&mut self, value: u64) {
        self.node_counter = self.node_counter.max(value);
    }

    /// Wire an output socket to an input socket
    ///
    /// At most one connection may target a given input socket: wiring into
    /// an occupied input silently replaces the prior connection. Self-loops
    /// are silently ignored. Cycles between different nodes are NOT
    /// rejected here; see the propagation engine's cycle policy.
    pub fn connect(&mut self, from: Endpoint, to: Endpoint) -> ConnectOutcome {
        if from.node == to.node {
            log::debug!("ignoring self-loop on node {}", from.node);
            return ConnectOutcome::RejectedSelfLoop;
        }
        if !self.contains(&from.node) || !self.contains(&to.node) {
            return ConnectOutcome::RejectedUnknownNode;
        }

        let had_prior = self.disconnect(&to).is_some();
        self.connections.push(Connection::new(from, to));
        if had_prior {
            ConnectOutcome::Replaced
        } else {
            ConnectOutcome::Connected
        }
    }

    /// Remove the connection targeting an input socket, if any
    ///
    /// The destination node must be re-propagated by the caller.
    pub fn disconnect(&mut self, to: &Endpoint) -> Option<Connection> {
        let index = self.connections.iter().position(|c| &c.to == to)?;
        Some(self.connections.remove(index))
    }

    /// Remove a connection by index in the connection list
    pub fn remove_connection(&mut self, index: usize) -> Option<Connection> {
        if index < self.connections.len() {
            Some(self.connections.remove(index))
        } else {
            None
        }
    }

    /// Connections arriving at a node
    pub fn incoming<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections.iter().filter(move |c| c.to.node == node_id)
    }

    /// Connections leaving a node
    pub fn outgoing<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections
            .iter()
            .filter(move |c| c.from.node == node_id)
    }

    /// The connection feeding a given input socket, if any
    pub fn input_source(&self, node_id: &str, socket: &str) -> Option<&Connection> {
        self.connections
            .iter()
            .find(|c| c.to.node == node_id && c.to.socket == socket)
    }

    /// Drop connections whose endpoints no longer resolve to live nodes
    ///
    /// Returns how many connections were removed. Dangling connections are
    /// never trusted by the propagation engine; this is called
    /// opportunistically before each propagation pass.
    pub fn prune_dangling(&mut self) -> usize {
        let before = self.connections.len();
        let live: std::collections::HashSet<&str> =
            self.nodes.iter().map(|n| n.id.as_str()).collect();
        self.connections
            .retain(|c| live.contains(c.from.node.as_str()) && live.contains(c.to.node.as_str()));
        let removed = before - self.connections.len();
        if removed > 0 {
            log::warn!("pruned {} dangling connection(s)", removed);
        }
        removed
    }
}

/// Parse the trailing number of an id like `node-12` or `import_3`
fn trailing_number(id: &str) -> Option<u64> {
    let digits: String = id
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return None;
    }
    digits.chars().rev().collect::<String>().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with_two_nodes() -> (Graph, NodeId, NodeId) {
        let mut graph = Graph::new();
        let a = graph.create_node("text", Position::new(0.0, 0.0));
        let b = graph.create_node("find_replace", Position::new(300.0, 0.0));
        (graph, a, b)
    }

    #[test]
    fn test_create_node_allocates_monotonic_ids() {
        let (graph, a, b) = graph_with_two_nodes();
        assert_eq!(a, "node-1");
        assert_eq!(b, "node-2");
        assert_eq!(graph.node_counter(), 2);
    }

    #[test]
    fn test_insert_node_advances_counter() {
        let mut graph = Graph::new();
        graph.insert_node(Node::new("node-7", "text", Position::default()));
        let next = graph.create_node("text", Position::default());
        assert_eq!(next, "node-8");
    }

    #[test]
    fn test_connect_and_replace() {
        let (mut graph, a, b) = graph_with_two_nodes();
        let c = graph.create_node("text", Position::new(0.0, 200.0));

        let outcome = graph.connect(Endpoint::new(&a, "text"), Endpoint::new(&b, "text"));
        assert_eq!(outcome, ConnectOutcome::Connected);

        // A second connection into the same input replaces the first
        let outcome = graph.connect(Endpoint::new(&c, "text"), Endpoint::new(&b, "text"));
        assert_eq!(outcome, ConnectOutcome::Replaced);

        let feeding: Vec<_> = graph.incoming(&b).collect();
        assert_eq!(feeding.len(), 1);
        assert_eq!(feeding[0].from.node, c);
    }

    #[test]
    fn test_connect_rejects_self_loop() {
        let (mut graph, a, _) = graph_with_two_nodes();
        let outcome = graph.connect(Endpoint::new(&a, "text"), Endpoint::new(&a, "other"));
        assert_eq!(outcome, ConnectOutcome::RejectedSelfLoop);
        assert!(graph.connections().is_empty());
    }

    #[test]
    fn test_fan_out_is_unrestricted() {
        let (mut graph, a, b) = graph_with_two_nodes();
        let c = graph.create_node("find_replace", Position::new(300.0, 200.0));

        graph.connect(Endpoint::new(&a, "text"), Endpoint::new(&b, "text"));
        graph.connect(Endpoint::new(&a, "text"), Endpoint::new(&c, "text"));

        assert_eq!(graph.outgoing(&a).count(), 2);
    }

    #[test]
    fn test_remove_node_drops_touching_connections() {
        let (mut graph, a, b) = graph_with_two_nodes();
        graph.connect(Endpoint::new(&a, "text"), Endpoint::new(&b, "text"));

        graph.remove_node(&a);
        assert!(graph.node(&a).is_none());
        assert!(graph.connections().is_empty());
    }

    #[test]
    fn test_remove_node_detaches_children_and_parent() {
        let mut graph = Graph::new();
        let container = graph.create_node("group", Position::default());
        let child = graph.create_node("text", Position::default());
        graph.node_mut(&child).unwrap().parent_id = Some(container.clone());
        graph.node_mut(&container).unwrap().children.push(child.clone());

        graph.remove_node(&container);
        assert_eq!(graph.node(&child).unwrap().parent_id, None);

        let container2 = graph.create_node("group", Position::default());
        graph.node_mut(&child).unwrap().parent_id = Some(container2.clone());
        graph
            .node_mut(&container2)
            .unwrap()
            .children
            .push(child.clone());

        graph.remove_node(&child);
        assert!(graph.node(&container2).unwrap().children.is_empty());
    }

    #[test]
    fn test_prune_dangling() {
        let (mut graph, a, b) = graph_with_two_nodes();
        graph.connect(Endpoint::new(&a, "text"), Endpoint::new(&b, "text"));

        // Remove the node out from under the connection list
        let index = graph.nodes.iter().position(|n| n.id == a).unwrap();
        graph.nodes.remove(index);

        assert_eq!(graph.prune_dangling(), 1);
        assert!(graph.connections().is_empty());
    }

    #[test]
    fn test_trailing_number() {
        assert_eq!(trailing_number("node-12"), Some(12));
        assert_eq!(trailing_number("import_3"), Some(3));
        assert_eq!(trailing_number("free"), None);
    }
}
