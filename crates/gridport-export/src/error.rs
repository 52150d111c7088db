//! Export error types.

use thiserror::Error;

use crate::session::NodeId;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Errors that can occur during an export.
///
/// Every variant is fatal for the whole export: there is no partial-export
/// mode, and the caller must discard any partially written destination file.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Node configuration is invalid.
    #[error("invalid config for node {node_id}: {message}")]
    Configuration {
        /// ID of the node with invalid config.
        node_id: NodeId,
        /// Error message.
        message: String,
    },

    /// The session or job graph violates a structural invariant.
    #[error("graph integrity violated: {0}")]
    GraphIntegrity(String),

    /// No converter accepts a node.
    #[error("no converter accepts node {node_id} ({name})")]
    UnsupportedNode {
        /// ID of the unclaimed node.
        node_id: NodeId,
        /// Display name of the unclaimed node.
        name: String,
    },

    /// A resource catalog natural key collides.
    #[error("duplicate resource: {0}")]
    DuplicateResource(String),

    /// A resource catalog lookup failed.
    #[error("unknown resource: {0}")]
    UnknownResource(String),

    /// The requested export format is declared but not implemented.
    #[error("export format '{0}' is not implemented")]
    UnsupportedFormat(&'static str),

    /// Filesystem failure outside the core primitives.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Staging or archive failure from the core primitives.
    #[error("storage error: {0}")]
    Core(#[from] gridport_core::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// XML document emission failure.
    #[error("document error: {0}")]
    Document(#[from] quick_xml::Error),
}
