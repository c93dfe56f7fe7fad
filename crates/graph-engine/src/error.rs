//! Error types for the graph engine

use thiserror::Error;

/// Result type alias using EngineError
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur in the graph engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// A node id does not exist in the graph
    #[error("Unknown node: {0}")]
    UnknownNode(String),

    /// A session document was structurally invalid and the load was aborted
    #[error("Session rejected: {0}")]
    InvalidSession(String),

    /// A reparenting operation would corrupt the containment tree
    #[error("Invalid reparent: {0}")]
    InvalidReparent(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Snapshot compression error
    #[error("Compression error: {0}")]
    Compression(String),
}

impl EngineError {
    /// Create an invalid-session error with a message
    pub fn invalid_session(msg: impl Into<String>) -> Self {
        Self::InvalidSession(msg.into())
    }
}
