//! Dependency propagation engine
//!
//! Given a changed node, recompute its outputs and recursively re-trigger
//! every downstream node reachable via connections. Recursion follows
//! connection-list order with no topological pre-sort: a diamond dependency
//! recomputes the reconvergent node once per incoming path, which is
//! redundant but safe because recomputation is idempotent given identical
//! inputs.
//!
//! # Cycle policy
//!
//! The engine performs no cycle detection; a cyclic graph causes unbounded
//! recursion. Edge creation only blocks the trivial self-loop. Cycle
//! diagnostics for load boundaries live in [`crate::validation`].

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::events::{EditorEvent, EventSink};
use crate::graph::Graph;
use crate::registry::{NodeRegistry, ProcessorError, ProcessorOutput};
use crate::types::{Node, NodeId};

/// Read view handed to a processor for one recompute
///
/// Exposes the node's parameters and its resolved inputs: each named input
/// socket resolved to the upstream node's current output value, or absent
/// if unconnected. Processors never touch the graph directly.
pub struct ProcessContext<'a> {
    node: &'a Node,
    inputs: BTreeMap<String, serde_json::Value>,
    triggered: bool,
}

impl<'a> ProcessContext<'a> {
    /// Build a context for tests or ad-hoc processor invocation
    pub fn new(
        node: &'a Node,
        inputs: BTreeMap<String, serde_json::Value>,
        triggered: bool,
    ) -> Self {
        Self {
            node,
            inputs,
            triggered,
        }
    }

    /// The node being recomputed
    pub fn node(&self) -> &Node {
        self.node
    }

    /// The node's id
    pub fn node_id(&self) -> &str {
        &self.node.id
    }

    /// The node's type tag
    pub fn node_type(&self) -> &str {
        &self.node.node_type
    }

    /// Whether this recompute came from an explicit per-node trigger
    /// action (a "send"/"speak" button) rather than a cascade
    pub fn triggered(&self) -> bool {
        self.triggered
    }

    /// Get a parameter value
    pub fn param(&self, key: &str) -> Option<&serde_json::Value> {
        self.node.parameters.get(key)
    }

    /// Get a parameter as a string slice
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.param(key).and_then(|v| v.as_str())
    }

    /// Get a string parameter, falling back to a default
    pub fn param_or<'s>(&'s self, key: &str, default: &'s str) -> &'s str {
        self.param_str(key).unwrap_or(default)
    }

    /// Get a boolean parameter, falling back to a default
    ///
    /// Accepts JSON booleans and the strings "true"/"false" (session
    /// content maps may store either).
    pub fn param_bool(&self, key: &str, default: bool) -> bool {
        match self.param(key) {
            Some(serde_json::Value::Bool(b)) => *b,
            Some(serde_json::Value::String(s)) => match s.as_str() {
                "true" => true,
                "false" => false,
                _ => default,
            },
            _ => default,
        }
    }

    /// Get a resolved input value, if that socket is connected
    pub fn input(&self, socket: &str) -> Option<&serde_json::Value> {
        self.inputs.get(socket)
    }

    /// Get a resolved input value or fail with `no input connected`
    pub fn require_input(&self, socket: &str) -> Result<&serde_json::Value, ProcessorError> {
        self.inputs
            .get(socket)
            .ok_or_else(|| ProcessorError::MissingInput(socket.to_string()))
    }

    /// Get a required input as a string slice
    pub fn require_text(&self, socket: &str) -> Result<&str, ProcessorError> {
        let value = self.require_input(socket)?;
        value.as_str().ok_or_else(|| {
            ProcessorError::invalid_input(format!("input '{}' is not text", socket))
        })
    }

    /// Get a required input as a record array
    pub fn require_records(&self, socket: &str) -> Result<&Vec<serde_json::Value>, ProcessorError> {
        let value = self.require_input(socket)?;
        value.as_array().ok_or_else(|| {
            ProcessorError::invalid_input(format!("input '{}' is not a record array", socket))
        })
    }
}

/// The propagation engine
///
/// Holds the processor registry and the event sink; all graph access goes
/// through the `&mut Graph` passed to each call, so one engine can serve
/// any number of graphs.
pub struct Propagator {
    registry: Arc<NodeRegistry>,
    events: Arc<dyn EventSink>,
}

impl Propagator {
    /// Create a new propagator
    pub fn new(registry: Arc<NodeRegistry>, events: Arc<dyn EventSink>) -> Self {
        Self { registry, events }
    }

    /// The registry this propagator dispatches through
    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// Recompute a node and cascade to every downstream node
    ///
    /// Dangling connections are pruned before the pass begins and are
    /// never trusted during it.
    pub fn propagate(&self, graph: &mut Graph, node_id: &str) {
        graph.prune_dangling();
        self.run(graph, node_id, false);
    }

    /// Recompute a node from an explicit per-node trigger action
    ///
    /// Identical to [`Propagator::propagate`] except the root node's
    /// processor sees `ctx.triggered() == true`, which is what effect-only
    /// processors key their one-shot action on. Cascaded recomputes are
    /// not triggered.
    pub fn trigger(&self, graph: &mut Graph, node_id: &str) {
        graph.prune_dangling();
        self.run(graph, node_id, true);
    }

    /// Propagate every node once, in node-table iteration order
    ///
    /// Used after a full graph construction (session load, undo/redo
    /// restore).
    pub fn propagate_all(&self, graph: &mut Graph) {
        graph.prune_dangling();
        let ids: Vec<NodeId> = graph.nodes().iter().map(|n| n.id.clone()).collect();
        for id in ids {
            self.run(graph, &id, false);
        }
    }

    /// Cascade to a node's dependents without recomputing the node itself
    ///
    /// This is the continuation entry point for deferred asynchronous
    /// work: the host stores the completed outputs on the node, then calls
    /// this so downstream nodes pick the new value up.
    pub fn cascade_from(&self, graph: &mut Graph, node_id: &str) {
        graph.prune_dangling();
        self.cascade(graph, node_id);
    }

    fn run(&self, graph: &mut Graph, node_id: &str, triggered: bool) {
        // Borrows end before the graph is mutated below
        let result = {
            let Some(node) = graph.node(node_id) else {
                return;
            };
            let Some(processor) = self.registry.processor(&node.node_type) else {
                // Unknown types render as empty content and never recompute
                log::debug!(
                    "no processor for type '{}' on {}; skipping",
                    node.node_type,
                    node_id
                );
                return;
            };

            let inputs = resolve_inputs(graph, node_id);
            let ctx = ProcessContext::new(node, inputs, triggered);
            processor.process(&ctx)
        };

        let ProcessorOutput { outputs, status } = match result {
            Ok(output) => output,
            Err(err) => {
                // Contained: the error flows downstream as empty data
                log::debug!("processor error on {}: {}", node_id, err);
                ProcessorOutput::empty().with_status(err.to_string())
            }
        };

        if let Some(node) = graph.node_mut(node_id) {
            node.outputs = outputs;
            node.status = status.clone();
        }
        self.emit(EditorEvent::NodeRecomputed {
            node_id: node_id.to_string(),
            status,
        });

        self.cascade(graph, node_id);
    }

    fn cascade(&self, graph: &mut Graph, node_id: &str) {
        // Recursion follows connection-list order; fan-out targets are
        // visited in the order their edges were created.
        let targets: Vec<NodeId> = graph
            .outgoing(node_id)
            .map(|c| c.to.node.clone())
            .collect();
        for target in targets {
            self.run(graph, &target, false);
        }
    }

    fn emit(&self, event: EditorEvent) {
        if let Err(err) = self.events.send(event) {
            log::debug!("event delivery failed: {}", err);
        }
    }
}

/// Resolve each connected input socket to the upstream node's current
/// output value
///
/// Sockets whose upstream node or output value is absent resolve to
/// nothing; processors treat that the same as unconnected.
pub fn resolve_inputs(graph: &Graph, node_id: &str) -> BTreeMap<String, serde_json::Value> {
    let mut inputs = BTreeMap::new();
    for connection in graph.incoming(node_id) {
        let Some(upstream) = graph.node(&connection.from.node) else {
            continue;
        };
        if let Some(value) = upstream.outputs.get(&connection.from.socket) {
            inputs.insert(connection.to.socket.clone(), value.clone());
        }
    }
    inputs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{NodeCategory, NodeMetadata, SocketMetadata, SocketType};
    use crate::events::NullEventSink;
    use crate::types::{Endpoint, Position};
    use serde_json::json;

    fn passthrough_metadata(node_type: &str) -> NodeMetadata {
        NodeMetadata {
            node_type: node_type.to_string(),
            category: NodeCategory::Processing,
            label: node_type.to_string(),
            description: String::new(),
            inputs: vec![SocketMetadata::optional("in", "In", SocketType::Any)],
            outputs: vec![SocketMetadata::optional("out", "Out", SocketType::Any)],
        }
    }

    /// Registry with a "source" type (emits its `value` parameter) and a
    /// "double" type (numeric doubling of its `in` socket).
    fn test_registry() -> Arc<NodeRegistry> {
        let mut registry = NodeRegistry::new();
        registry.register_fn(passthrough_metadata("source"), |ctx| {
            let value = ctx.param("value").cloned().unwrap_or(json!(null));
            Ok(ProcessorOutput::empty().with("out", value))
        });
        registry.register_fn(passthrough_metadata("double"), |ctx| {
            let value = ctx
                .require_input("in")?
                .as_f64()
                .ok_or_else(|| ProcessorError::invalid_input("not a number"))?;
            Ok(ProcessorOutput::empty().with("out", json!(value * 2.0)))
        });
        Arc::new(registry)
    }

    fn propagator() -> Propagator {
        Propagator::new(test_registry(), Arc::new(NullEventSink))
    }

    #[test]
    fn test_propagate_chain() {
        let mut graph = Graph::new();
        let a = graph.create_node("source", Position::default());
        let b = graph.create_node("double", Position::default());
        let c = graph.create_node("double", Position::default());
        graph.node_mut(&a).unwrap().set_parameter("value", json!(3.0));
        graph.connect(Endpoint::new(&a, "out"), Endpoint::new(&b, "in"));
        graph.connect(Endpoint::new(&b, "out"), Endpoint::new(&c, "in"));

        propagator().propagate(&mut graph, &a);

        assert_eq!(graph.node(&b).unwrap().output("out"), Some(&json!(6.0)));
        assert_eq!(graph.node(&c).unwrap().output("out"), Some(&json!(12.0)));
    }

    #[test]
    fn test_propagate_is_idempotent() {
        let mut graph = Graph::new();
        let a = graph.create_node("source", Position::default());
        let b = graph.create_node("double", Position::default());
        graph.node_mut(&a).unwrap().set_parameter("value", json!(5.0));
        graph.connect(Endpoint::new(&a, "out"), Endpoint::new(&b, "in"));

        let engine = propagator();
        engine.propagate(&mut graph, &a);
        let first: Vec<_> = graph
            .nodes()
            .iter()
            .map(|n| (n.id.clone(), n.outputs.clone()))
            .collect();

        engine.propagate(&mut graph, &a);
        let second: Vec<_> = graph
            .nodes()
            .iter()
            .map(|n| (n.id.clone(), n.outputs.clone()))
            .collect();

        assert_eq!(first, second);
    }

    #[test]
    fn test_diamond_recomputes_to_consistent_values() {
        // a -> b -> d and a -> c -> d reconverge at d, which recomputes
        // once per incoming path; the final value only depends on current
        // inputs.
        let mut registry = NodeRegistry::new();
        registry.register_fn(passthrough_metadata("source"), |ctx| {
            let value = ctx.param("value").cloned().unwrap_or(json!(null));
            Ok(ProcessorOutput::empty().with("out", value))
        });
        registry.register_fn(passthrough_metadata("double"), |ctx| {
            let value = ctx
                .require_input("in")?
                .as_f64()
                .ok_or_else(|| ProcessorError::invalid_input("not a number"))?;
            Ok(ProcessorOutput::empty().with("out", json!(value * 2.0)))
        });
        registry.register_fn(passthrough_metadata("sum2"), |ctx| {
            let a = ctx.input("in1").and_then(|v| v.as_f64()).unwrap_or(0.0);
            let b = ctx.input("in2").and_then(|v| v.as_f64()).unwrap_or(0.0);
            Ok(ProcessorOutput::empty().with("out", json!(a + b)))
        });
        let engine = Propagator::new(Arc::new(registry), Arc::new(NullEventSink));

        let mut graph = Graph::new();
        let a = graph.create_node("source", Position::default());
        let b = graph.create_node("double", Position::default());
        let c = graph.create_node("double", Position::default());
        let d = graph.create_node("sum2", Position::default());
        graph.node_mut(&a).unwrap().set_parameter("value", json!(1.0));
        graph.connect(Endpoint::new(&a, "out"), Endpoint::new(&b, "in"));
        graph.connect(Endpoint::new(&a, "out"), Endpoint::new(&c, "in"));
        graph.connect(Endpoint::new(&b, "out"), Endpoint::new(&d, "in1"));
        graph.connect(Endpoint::new(&c, "out"), Endpoint::new(&d, "in2"));

        engine.propagate(&mut graph, &a);
        assert_eq!(graph.node(&d).unwrap().output("out"), Some(&json!(4.0)));

        // Idempotent across a second full pass
        engine.propagate(&mut graph, &a);
        assert_eq!(graph.node(&d).unwrap().output("out"), Some(&json!(4.0)));
    }

    #[test]
    fn test_processor_error_is_contained() {
        let mut graph = Graph::new();
        let a = graph.create_node("source", Position::default());
        let b = graph.create_node("double", Position::default());
        let c = graph.create_node("double", Position::default());
        // Text value makes "double" fail on b; c receives nothing
        graph
            .node_mut(&a)
            .unwrap()
            .set_parameter("value", json!("not a number"));
        graph.connect(Endpoint::new(&a, "out"), Endpoint::new(&b, "in"));
        graph.connect(Endpoint::new(&b, "out"), Endpoint::new(&c, "in"));

        propagator().propagate(&mut graph, &a);

        let b_node = graph.node(&b).unwrap();
        assert!(b_node.outputs.is_empty());
        assert!(b_node.status.is_some());

        // Downstream still re-propagated and reported its own missing input
        let c_node = graph.node(&c).unwrap();
        assert!(c_node.outputs.is_empty());
        assert!(c_node
            .status
            .as_deref()
            .unwrap()
            .contains("no input connected"));
    }

    #[test]
    fn test_unknown_type_is_noop() {
        let mut graph = Graph::new();
        let a = graph.create_node("mystery", Position::default());
        propagator().propagate(&mut graph, &a);
        assert!(graph.node(&a).unwrap().outputs.is_empty());
        assert!(graph.node(&a).unwrap().status.is_none());
    }

    #[test]
    fn test_disconnect_resets_downstream() {
        let mut graph = Graph::new();
        let a = graph.create_node("source", Position::default());
        let b = graph.create_node("double", Position::default());
        graph.node_mut(&a).unwrap().set_parameter("value", json!(2.0));
        graph.connect(Endpoint::new(&a, "out"), Endpoint::new(&b, "in"));

        let engine = propagator();
        engine.propagate(&mut graph, &a);
        assert_eq!(graph.node(&b).unwrap().output("out"), Some(&json!(4.0)));

        graph.disconnect(&Endpoint::new(&b, "in"));
        engine.propagate(&mut graph, &b);

        let b_node = graph.node(&b).unwrap();
        assert!(b_node.outputs.is_empty());
        assert!(b_node
            .status
            .as_deref()
            .unwrap()
            .contains("no input connected"));
    }

    #[test]
    fn test_trigger_flag_reaches_root_only() {
        let mut registry = NodeRegistry::new();
        registry.register_fn(passthrough_metadata("probe"), |ctx| {
            Ok(ProcessorOutput::empty().with("out", json!(ctx.triggered())))
        });
        let engine = Propagator::new(Arc::new(registry), Arc::new(NullEventSink));

        let mut graph = Graph::new();
        let a = graph.create_node("probe", Position::default());
        let b = graph.create_node("probe", Position::default());
        graph.connect(Endpoint::new(&a, "out"), Endpoint::new(&b, "in"));

        engine.trigger(&mut graph, &a);
        assert_eq!(graph.node(&a).unwrap().output("out"), Some(&json!(true)));
        assert_eq!(graph.node(&b).unwrap().output("out"), Some(&json!(false)));
    }

    #[test]
    fn test_resolve_inputs_skips_missing_upstream_socket() {
        let mut graph = Graph::new();
        let a = graph.create_node("source", Position::default());
        let b = graph.create_node("double", Position::default());
        graph.connect(Endpoint::new(&a, "absent"), Endpoint::new(&b, "in"));

        let inputs = resolve_inputs(&graph, &b);
        assert!(inputs.is_empty());
    }
}
