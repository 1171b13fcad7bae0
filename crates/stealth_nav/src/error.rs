//! Error types for the navigation crate

use crate::graph::NodeId;
use thiserror::Error;

/// Waypoint graph errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// The graph holds no nodes
    #[error("Waypoint graph is empty")]
    Empty,

    /// A link or route references a node that does not exist
    #[error("Unknown waypoint node: {0:?}")]
    UnknownNode(NodeId),

    /// A node name was registered twice
    #[error("Duplicate waypoint name: {0}")]
    DuplicateName(String),

    /// A node name could not be resolved
    #[error("No waypoint named '{0}'")]
    UnknownName(String),
}

/// Result type for graph operations
pub type Result<T> = std::result::Result<T, GraphError>;
