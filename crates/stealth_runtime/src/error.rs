//! Level loading errors

use stealth_ai::AiError;
use stealth_nav::GraphError;
use stealth_perception::PerceptionError;
use thiserror::Error;

/// Errors raised while loading or building a level
#[derive(Debug, Error)]
pub enum LevelError {
    /// Level file could not be read
    #[error("Failed to read level file: {0}")]
    Io(#[from] std::io::Error),

    /// Level file is not valid TOML for a level
    #[error("Failed to parse level: {0}")]
    Parse(#[from] toml::de::Error),

    /// Waypoint graph is inconsistent
    #[error("Invalid waypoint graph: {0}")]
    Graph(#[from] GraphError),

    /// Sensor or layer setup failed
    #[error(transparent)]
    Perception(#[from] PerceptionError),

    /// An enemy could not be built
    #[error(transparent)]
    Agent(#[from] AiError),

    /// Any other inconsistency in the level data
    #[error("Invalid level: {0}")]
    Invalid(String),
}

/// Result type for level operations
pub type Result<T> = std::result::Result<T, LevelError>;
