//! Error types for the perception system

use thiserror::Error;

/// Perception configuration errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PerceptionError {
    /// A sensor parameter is out of range
    #[error("Invalid sensor configuration: {0}")]
    InvalidConfig(String),

    /// A layer name could not be resolved
    #[error("Unknown query layer: {0}")]
    UnknownLayer(String),
}

/// Result type for perception operations
pub type Result<T> = std::result::Result<T, PerceptionError>;
