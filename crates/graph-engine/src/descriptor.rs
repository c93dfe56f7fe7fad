//! Node descriptor metadata
//!
//! Every node type publishes a [`NodeMetadata`] describing its sockets,
//! category, and label. The metadata is the single source of truth for
//! host palettes and for validation; the engine itself only needs the
//! type-to-processor map.

use serde::{Deserialize, Serialize};

/// Category of a node, for grouping and container semantics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeCategory {
    /// Source nodes (text entry, imports)
    Input,
    /// Data transformation nodes
    Processing,
    /// Display/export nodes
    Output,
    /// Effect-only nodes performing a one-shot external action
    Effect,
    /// Container nodes that hold and lay out children
    Container,
}

/// The data type flowing through a socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocketType {
    /// Accepts any value
    Any,
    /// Text string
    Text,
    /// Numeric value
    Number,
    /// Boolean value
    Boolean,
    /// Array of string-keyed records
    Records,
    /// Arbitrary structured JSON
    Json,
}

impl SocketType {
    /// Check if this type can connect to another type
    pub fn is_compatible_with(&self, other: &SocketType) -> bool {
        matches!(self, SocketType::Any) || matches!(other, SocketType::Any) || self == other
    }
}

/// Metadata for a single input or output socket
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocketMetadata {
    /// Socket name (the key processors resolve)
    pub name: String,
    /// Human-readable label
    pub label: String,
    /// Data type of the socket
    pub data_type: SocketType,
    /// Whether this input must be connected for the node to produce output
    pub required: bool,
}

impl SocketMetadata {
    /// Create a required socket
    pub fn required(
        name: impl Into<String>,
        label: impl Into<String>,
        data_type: SocketType,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            data_type,
            required: true,
        }
    }

    /// Create an optional socket
    pub fn optional(
        name: impl Into<String>,
        label: impl Into<String>,
        data_type: SocketType,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            data_type,
            required: false,
        }
    }
}

/// Complete metadata for a node type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetadata {
    /// Unique type tag (e.g. "find_replace")
    pub node_type: String,
    /// Category for grouping and container semantics
    pub category: NodeCategory,
    /// Human-readable label
    pub label: String,
    /// Description of what the node does
    pub description: String,
    /// Input socket definitions
    pub inputs: Vec<SocketMetadata>,
    /// Output socket definitions
    pub outputs: Vec<SocketMetadata>,
}

impl NodeMetadata {
    /// Whether nodes of this type may hold children
    pub fn is_container(&self) -> bool {
        self.category == NodeCategory::Container
    }

    /// Find an input socket by name
    pub fn input(&self, name: &str) -> Option<&SocketMetadata> {
        self.inputs.iter().find(|s| s.name == name)
    }

    /// Find an output socket by name
    pub fn output(&self, name: &str) -> Option<&SocketMetadata> {
        self.outputs.iter().find(|s| s.name == name)
    }
}
