//! Error types for the dialogue overlay.

use thiserror::Error;

use crate::NodeId;

/// Errors that can occur when working with dialogue files and graphs.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Container codec error.
    #[error("{0}")]
    Gff(#[from] veles_gff::Error),

    /// The file's type tag is not a dialogue tag.
    #[error("not a dialogue file: type tag {actual:?} (expected {expected:?})")]
    WrongFileType { expected: String, actual: String },

    /// A node handle does not resolve in this graph.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// No edge exists between the two nodes.
    #[error("no edge {from} -> {to}")]
    UnknownEdge { from: NodeId, to: NodeId },

    /// Edges must connect a speaker line to a player line or vice versa.
    #[error("edge {from} -> {to} connects two lines of the same kind")]
    MismatchedEdge { from: NodeId, to: NodeId },

    /// Entry points must target speaker lines.
    #[error("entry point targets a player line: {0}")]
    InvalidStart(NodeId),

    /// A node with this id is already present (restore after delete only
    /// works once).
    #[error("node {0} already present")]
    DuplicateNode(NodeId),
}

/// Result type for dialogue operations.
pub type Result<T> = std::result::Result<T, Error>;
