//! Node processor registry
//!
//! Maps a node's type tag to its processor and metadata. This is the
//! core's only contract with per-type behavior: processors resolve named
//! input sockets, compute named outputs, and report failures as node-local
//! status rather than exceptions.
//!
//! Processor crates register their types at link time via
//! [`ProcessorRegistration`] entries collected with `inventory`, or
//! imperatively through [`NodeRegistry::register`].

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::descriptor::{NodeCategory, NodeMetadata};
use crate::engine::ProcessContext;

/// Error produced inside a node processor
///
/// Processor errors are contained by the propagation engine: the failing
/// node's outputs become empty and the error's display string becomes the
/// node status. They never abort the surrounding cascade.
#[derive(Debug, Clone, Error)]
pub enum ProcessorError {
    /// A required input socket has no connection feeding it
    #[error("no input connected: {0}")]
    MissingInput(String),

    /// Input was present but had the wrong shape
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A user-supplied parameter could not be applied (bad pattern, bad expression)
    #[error("{0}")]
    BadParameter(String),

    /// The one-shot external action failed
    #[error("effect failed: {0}")]
    EffectFailed(String),
}

impl ProcessorError {
    /// Create an invalid-input error with a message
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a bad-parameter error with a message
    pub fn bad_parameter(msg: impl Into<String>) -> Self {
        Self::BadParameter(msg.into())
    }
}

/// The full replacement output set of one recompute
#[derive(Debug, Clone, Default)]
pub struct ProcessorOutput {
    /// New outputs, keyed by socket name; replaces the node's map wholesale
    pub outputs: std::collections::BTreeMap<String, serde_json::Value>,
    /// Optional node-local status line
    pub status: Option<String>,
}

impl ProcessorOutput {
    /// An empty output set with no status
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add an output value (builder style)
    pub fn with(mut self, socket: impl Into<String>, value: serde_json::Value) -> Self {
        self.outputs.insert(socket.into(), value);
        self
    }

    /// Set the status line (builder style)
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

/// Per-node-type processor
///
/// A processor resolves zero or more named input sockets, computes zero or
/// more named outputs, and never panics on malformed input: failures are
/// returned as [`ProcessorError`] and contained by the engine.
pub trait NodeProcessor: Send + Sync {
    /// Recompute the node's outputs from its parameters and resolved inputs
    fn process(&self, ctx: &ProcessContext<'_>) -> Result<ProcessorOutput, ProcessorError>;
}

/// A link-time processor registration entry
///
/// Processor crates submit these with `inventory::submit!`; the engine
/// collects them into a registry via [`NodeRegistry::from_inventory`].
pub struct ProcessorRegistration {
    /// Produces the node type's metadata
    pub descriptor: fn() -> NodeMetadata,
    /// Produces the shared processor instance
    pub construct: fn() -> Arc<dyn NodeProcessor>,
}

impl ProcessorRegistration {
    /// Create a new registration entry
    pub const fn new(
        descriptor: fn() -> NodeMetadata,
        construct: fn() -> Arc<dyn NodeProcessor>,
    ) -> Self {
        Self {
            descriptor,
            construct,
        }
    }
}

inventory::collect!(ProcessorRegistration);

/// A registration entry combining metadata with a processor
struct RegistryEntry {
    metadata: NodeMetadata,
    processor: Arc<dyn NodeProcessor>,
}

/// Registry of node types with their metadata and processors
pub struct NodeRegistry {
    entries: HashMap<String, RegistryEntry>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Build a registry from every `ProcessorRegistration` linked into the
    /// process
    pub fn from_inventory() -> Self {
        let mut registry = Self::new();
        for entry in inventory::iter::<ProcessorRegistration> {
            registry.register((entry.descriptor)(), (entry.construct)());
        }
        registry
    }

    /// Register a node type with metadata and a processor
    pub fn register(&mut self, metadata: NodeMetadata, processor: Arc<dyn NodeProcessor>) {
        self.entries.insert(
            metadata.node_type.clone(),
            RegistryEntry {
                metadata,
                processor,
            },
        );
    }

    /// Register a node type backed by a plain function
    pub fn register_fn<F>(&mut self, metadata: NodeMetadata, f: F)
    where
        F: Fn(&ProcessContext<'_>) -> Result<ProcessorOutput, ProcessorError>
            + Send
            + Sync
            + 'static,
    {
        self.register(metadata, Arc::new(FnProcessor(f)));
    }

    /// Get the processor for a node type
    pub fn processor(&self, node_type: &str) -> Option<Arc<dyn NodeProcessor>> {
        self.entries.get(node_type).map(|e| e.processor.clone())
    }

    /// Get metadata for a node type
    pub fn metadata(&self, node_type: &str) -> Option<&NodeMetadata> {
        self.entries.get(node_type).map(|e| &e.metadata)
    }

    /// Check if a node type is registered
    pub fn has_type(&self, node_type: &str) -> bool {
        self.entries.contains_key(node_type)
    }

    /// Whether nodes of this type may hold children
    pub fn is_container(&self, node_type: &str) -> bool {
        self.metadata(node_type)
            .map(|m| m.is_container())
            .unwrap_or(false)
    }

    /// All registered metadata
    pub fn all_metadata(&self) -> Vec<&NodeMetadata> {
        self.entries.values().map(|e| &e.metadata).collect()
    }

    /// Metadata grouped by category, for host palettes
    pub fn metadata_by_category(&self) -> HashMap<NodeCategory, Vec<&NodeMetadata>> {
        let mut grouped: HashMap<NodeCategory, Vec<&NodeMetadata>> = HashMap::new();
        for entry in self.entries.values() {
            grouped
                .entry(entry.metadata.category)
                .or_default()
                .push(&entry.metadata);
        }
        grouped
    }

    /// All registered type tags
    pub fn node_types(&self) -> Vec<&str> {
        self.entries.keys().map(|s| s.as_str()).collect()
    }

    /// Merge another registry into this one
    ///
    /// Entries from `other` override entries sharing the same type tag.
    pub fn merge(&mut self, other: NodeRegistry) {
        self.entries.extend(other.entries);
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Processor backed by a plain function or closure
struct FnProcessor<F>(F);

impl<F> NodeProcessor for FnProcessor<F>
where
    F: Fn(&ProcessContext<'_>) -> Result<ProcessorOutput, ProcessorError> + Send + Sync,
{
    fn process(&self, ctx: &ProcessContext<'_>) -> Result<ProcessorOutput, ProcessorError> {
        (self.0)(ctx)
    }
}
