//! Error types for agent construction

use stealth_nav::GraphError;
use stealth_perception::PerceptionError;
use thiserror::Error;

/// Agent configuration and setup errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AiError {
    /// An agent parameter is out of range
    #[error("Invalid agent configuration: {0}")]
    InvalidConfig(String),

    /// Sensor setup failed
    #[error(transparent)]
    Perception(#[from] PerceptionError),

    /// A graph lookup failed while building the agent
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Result type for AI operations
pub type Result<T> = std::result::Result<T, AiError>;
