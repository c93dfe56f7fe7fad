//! Editor event types
//!
//! Events are sent from the engine to the frontend (or any consumer) so it
//! can re-render the visual state of affected nodes. The trait abstracts
//! over the transport so the engine can be used headless.

use serde::{Deserialize, Serialize};

use crate::types::NodeId;

/// Trait for receiving editor events
pub trait EventSink: Send + Sync {
    /// Deliver an event
    ///
    /// Returns an error if the event could not be delivered (e.g. the
    /// consumer disconnected). Delivery failures are logged and ignored by
    /// the engine; they never interrupt propagation.
    fn send(&self, event: EditorEvent) -> Result<(), EventError>;
}

/// Error when delivering events fails
#[derive(Debug, Clone)]
pub struct EventError {
    pub message: String,
}

impl std::fmt::Display for EventError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event error: {}", self.message)
    }
}

impl std::error::Error for EventError {}

/// Events emitted by the editor core
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EditorEvent {
    /// A node's outputs/status were recomputed and its view is stale
    #[serde(rename_all = "camelCase")]
    NodeRecomputed {
        node_id: NodeId,
        status: Option<String>,
    },

    /// A node was added to the graph
    #[serde(rename_all = "camelCase")]
    NodeAdded { node_id: NodeId },

    /// A node was removed from the graph
    #[serde(rename_all = "camelCase")]
    NodeRemoved { node_id: NodeId },

    /// A node moved or resized (layout reflow included)
    #[serde(rename_all = "camelCase")]
    NodeBoundsChanged { node_id: NodeId },

    /// The connection set feeding a node changed
    #[serde(rename_all = "camelCase")]
    ConnectionsChanged { node_id: NodeId },

    /// The entire graph was replaced (load, clear, undo, redo)
    GraphReplaced,

    /// Undo/redo availability changed
    #[serde(rename_all = "camelCase")]
    HistoryChanged { can_undo: bool, can_redo: bool },
}

/// A no-op event sink that discards all events
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: EditorEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// A vector-based event sink that collects events
///
/// Useful for testing to verify events were emitted correctly.
pub struct VecEventSink {
    events: std::sync::Mutex<Vec<EditorEvent>>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self {
            events: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Get all collected events
    pub fn events(&self) -> Vec<EditorEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Clear all collected events
    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl Default for VecEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for VecEventSink {
    fn send(&self, event: EditorEvent) -> Result<(), EventError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}
