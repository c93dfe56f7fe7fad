//! Editor context
//!
//! An explicit application-state struct owning the graph, the processor
//! registry, the undo/redo history, and the canvas view transform. Every
//! operation goes through it, so multiple independent editors can coexist
//! in one process and the whole engine unit-tests without a UI.
//!
//! Mutation entry points follow the same shape: change the graph,
//! propagate the affected node, snapshot the result (immediately for
//! structural edits, debounced for continuous ones).

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::engine::Propagator;
use crate::error::{EngineError, Result};
use crate::events::{EditorEvent, EventSink, NullEventSink};
use crate::graph::{ConnectOutcome, Graph};
use crate::history::{HistoryManager, DEFAULT_MAX_DEPTH, DEFAULT_QUIET_PERIOD};
use crate::layout::{self, LayoutConfig};
use crate::registry::NodeRegistry;
use crate::session::SessionDocument;
use crate::types::{Connection, Endpoint, NodeId, Position, Size, ViewTransform};
use crate::validation::{self, ValidationError};

/// Tunables for an editor instance
#[derive(Debug, Clone)]
pub struct EditorConfig {
    /// Maximum undo depth
    pub max_history: usize,
    /// Quiet period before a continuous edit commits to history
    pub history_quiet_period: Duration,
    /// Container layout tuning
    pub layout: LayoutConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_history: DEFAULT_MAX_DEPTH,
            history_quiet_period: DEFAULT_QUIET_PERIOD,
            layout: LayoutConfig::default(),
        }
    }
}

/// A single editor instance: graph, registry, history, and view transform
pub struct Editor {
    graph: Graph,
    registry: Arc<NodeRegistry>,
    propagator: Propagator,
    history: HistoryManager,
    view: ViewTransform,
    events: Arc<dyn EventSink>,
    layout: LayoutConfig,
}

impl Editor {
    /// Create an editor with default configuration
    ///
    /// The empty starting graph is recorded as the history baseline.
    pub fn new(registry: Arc<NodeRegistry>) -> Self {
        Self::with_config(registry, EditorConfig::default())
    }

    /// Create an editor with explicit configuration
    pub fn with_config(registry: Arc<NodeRegistry>, config: EditorConfig) -> Self {
        let events: Arc<dyn EventSink> = Arc::new(NullEventSink);
        let mut editor = Self {
            graph: Graph::new(),
            propagator: Propagator::new(registry.clone(), events.clone()),
            registry,
            history: HistoryManager::new(config.max_history, config.history_quiet_period),
            view: ViewTransform::default(),
            events,
            layout: config.layout,
        };
        editor.record("init");
        editor
    }

    /// Attach an event sink (builder style)
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.propagator = Propagator::new(self.registry.clone(), events.clone());
        self.events = events;
        self
    }

    /// The current graph
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// The processor registry
    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// The canvas view transform
    pub fn view(&self) -> ViewTransform {
        self.view
    }

    /// Update the canvas view transform (pan/zoom)
    ///
    /// Not snapshotted on its own; the transform rides along with the
    /// next recorded edit.
    pub fn set_view(&mut self, view: ViewTransform) {
        self.view = view;
    }

    /// Whether undo is available
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Whether redo is available
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // -----------------------------------------------------------------
    // Graph mutation
    // -----------------------------------------------------------------

    /// Place a new node and compute its initial outputs
    pub fn create_node(&mut self, node_type: impl Into<String>, position: Position) -> NodeId {
        let id = self.graph.create_node(node_type, position);
        self.emit(EditorEvent::NodeAdded {
            node_id: id.clone(),
        });
        self.propagator.propagate(&mut self.graph, &id);
        self.record("create node");
        id
    }

    /// Delete a node; downstream nodes re-propagate and see the missing
    /// input
    pub fn remove_node(&mut self, id: &str) -> Result<()> {
        let downstream: Vec<NodeId> = self
            .graph
            .outgoing(id)
            .map(|c| c.to.node.clone())
            .collect();
        let removed = self
            .graph
            .remove_node(id)
            .ok_or_else(|| EngineError::UnknownNode(id.to_string()))?;

        self.emit(EditorEvent::NodeRemoved {
            node_id: id.to_string(),
        });
        for target in downstream {
            self.propagator.propagate(&mut self.graph, &target);
        }
        if let Some(parent_id) = removed.parent_id {
            layout::reflow(&mut self.graph, &parent_id, &self.layout);
        }
        self.record("remove node");
        Ok(())
    }

    /// Wire an output socket to an input socket and re-propagate the
    /// destination
    pub fn connect(&mut self, from: Endpoint, to: Endpoint) -> ConnectOutcome {
        let destination = to.node.clone();
        let outcome = self.graph.connect(from, to);
        if outcome.changed() {
            self.emit(EditorEvent::ConnectionsChanged {
                node_id: destination.clone(),
            });
            self.propagator.propagate(&mut self.graph, &destination);
            self.record("connect");
        }
        outcome
    }

    /// Remove the connection feeding an input socket and re-propagate the
    /// destination
    pub fn disconnect(&mut self, to: &Endpoint) -> Option<Connection> {
        let removed = self.graph.disconnect(to)?;
        self.emit(EditorEvent::ConnectionsChanged {
            node_id: to.node.clone(),
        });
        self.propagator.propagate(&mut self.graph, &to.node);
        self.record("disconnect");
        Some(removed)
    }

    /// Edit a node parameter
    ///
    /// Re-propagates immediately; the history entry is debounced so a
    /// typing burst coalesces into one snapshot per pause
    /// ([`Editor::tick`] commits it).
    pub fn set_parameter(
        &mut self,
        id: &str,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Result<()> {
        let node = self
            .graph
            .node_mut(id)
            .ok_or_else(|| EngineError::UnknownNode(id.to_string()))?;
        node.set_parameter(key, value);
        self.propagator.propagate(&mut self.graph, id);
        self.history.schedule("edit parameter", Instant::now());
        Ok(())
    }

    /// Explicit per-node trigger action (a "send"/"speak" button)
    pub fn trigger(&mut self, id: &str) {
        self.propagator.trigger(&mut self.graph, id);
    }

    /// Commit any debounced history entry whose quiet period has elapsed
    ///
    /// Hosts pump this from their event loop.
    pub fn tick(&mut self, now: Instant) {
        if let Some(reason) = self.history.take_due(now) {
            self.record(&reason);
        }
    }

    /// Continuation entry point for deferred asynchronous work
    ///
    /// Stores the completed outputs and status on the node, then cascades
    /// to its dependents exactly as a synchronous recompute would. Outputs
    /// are not persisted, so no history entry is involved.
    pub fn complete_async(
        &mut self,
        id: &str,
        outputs: BTreeMap<String, serde_json::Value>,
        status: Option<String>,
    ) -> Result<()> {
        let node = self
            .graph
            .node_mut(id)
            .ok_or_else(|| EngineError::UnknownNode(id.to_string()))?;
        node.outputs = outputs;
        node.status = status.clone();
        self.emit(EditorEvent::NodeRecomputed {
            node_id: id.to_string(),
            status,
        });
        self.propagator.cascade_from(&mut self.graph, id);
        Ok(())
    }

    // -----------------------------------------------------------------
    // Geometry
    // -----------------------------------------------------------------

    /// Move a node mid-drag (no reparenting, no history entry)
    pub fn move_node(&mut self, id: &str, position: Position) -> Result<()> {
        let node = self
            .graph
            .node_mut(id)
            .ok_or_else(|| EngineError::UnknownNode(id.to_string()))?;
        node.position = position;
        self.emit(EditorEvent::NodeBoundsChanged {
            node_id: id.to_string(),
        });
        Ok(())
    }

    /// Drop a node at a position, reparenting by its center point
    pub fn drop_node(&mut self, id: &str, position: Position) -> Result<()> {
        self.move_node(id, position)?;
        layout::reparent_at(&mut self.graph, &self.registry, id, &self.layout)?;
        self.record("move node");
        Ok(())
    }

    /// Resize a node, reflowing its container chain
    pub fn set_node_size(&mut self, id: &str, size: Size) -> Result<()> {
        let node = self
            .graph
            .node_mut(id)
            .ok_or_else(|| EngineError::UnknownNode(id.to_string()))?;
        node.size = size;
        let parent = node.parent_id.clone();
        let is_container = !node.children.is_empty();

        if is_container {
            layout::reflow(&mut self.graph, id, &self.layout);
        }
        if let Some(parent_id) = parent {
            layout::reflow(&mut self.graph, &parent_id, &self.layout);
        }
        self.emit(EditorEvent::NodeBoundsChanged {
            node_id: id.to_string(),
        });
        self.history.schedule("resize node", Instant::now());
        Ok(())
    }

    /// Move a node into a container (or to the root with `None`)
    pub fn set_parent(&mut self, child_id: &str, parent_id: Option<&str>) -> Result<()> {
        layout::set_parent(&mut self.graph, child_id, parent_id, &self.layout)?;
        self.record("reparent");
        Ok(())
    }

    // -----------------------------------------------------------------
    // Sessions, undo/redo
    // -----------------------------------------------------------------

    /// Capture the current session
    pub fn save_session(&self) -> SessionDocument {
        SessionDocument::capture(&self.graph, &self.view)
    }

    /// Replace the entire graph with a serialized session
    ///
    /// Structural errors abort the load and leave the current graph
    /// untouched. On success every node propagates once, in table order,
    /// and a history entry is recorded. The showcase loader is exactly
    /// this call.
    pub fn load_session(&mut self, json: &str) -> Result<()> {
        let (graph, view) = SessionDocument::from_json(json.as_bytes())?.apply()?;
        self.install(graph, view);
        self.record("load session");
        Ok(())
    }

    /// Replace the graph with an empty one
    pub fn clear(&mut self) {
        self.install(Graph::new(), ViewTransform::default());
        self.record("clear");
    }

    /// Step back one history entry
    pub fn undo(&mut self) -> Result<bool> {
        let Some(json) = self.history.undo()? else {
            return Ok(false);
        };
        self.restore(&json)?;
        Ok(true)
    }

    /// Step forward one history entry
    pub fn redo(&mut self) -> Result<bool> {
        let Some(json) = self.history.redo()? else {
            return Ok(false);
        };
        self.restore(&json)?;
        Ok(true)
    }

    // -----------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------

    fn restore(&mut self, json: &[u8]) -> Result<()> {
        // The restoring flag suppresses record calls re-entered from the
        // deserialize side effects below.
        self.history.begin_restore();
        let result = SessionDocument::from_json(json)
            .and_then(SessionDocument::apply)
            .map(|(graph, view)| self.install(graph, view));
        self.history.end_restore();
        self.emit_history_changed();
        result
    }

    fn install(&mut self, graph: Graph, view: ViewTransform) {
        self.graph = graph;
        self.view = view;

        let issues = validation::validate_graph(&self.graph, Some(&self.registry));
        for issue in &issues {
            log::warn!("session diagnostic: {}", issue);
        }
        let cyclic = issues
            .iter()
            .any(|issue| matches!(issue, ValidationError::CycleDetected));
        if cyclic {
            // A cyclic session would overflow the stack on the initial
            // pass; the structure loads, outputs stay empty.
            log::warn!("loaded graph contains a cycle; skipping initial propagation");
        } else {
            self.propagator.propagate_all(&mut self.graph);
        }
        self.emit(EditorEvent::GraphReplaced);
    }

    fn record(&mut self, reason: &str) {
        if self.history.is_restoring() {
            return;
        }
        let json = match self.save_session().to_json() {
            Ok(json) => json,
            Err(err) => {
                log::error!("failed to serialize session for history: {}", err);
                return;
            }
        };
        match self.history.record(&json, reason) {
            Ok(true) => self.emit_history_changed(),
            Ok(false) => {}
            Err(err) => log::error!("failed to record history entry: {}", err),
        }
    }

    fn emit_history_changed(&self) {
        self.emit(EditorEvent::HistoryChanged {
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        });
    }

    fn emit(&self, event: EditorEvent) {
        if let Err(err) = self.events.send(event) {
            log::debug!("event delivery failed: {}", err);
        }
    }
}
