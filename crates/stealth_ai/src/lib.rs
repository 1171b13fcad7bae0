//! Stealth AI - enemy behavior for stealth games
//!
//! Agents patrol a route, roam a waypoint graph, investigate noises and hunt
//! the player. Each agent owns a [`PerceptionSensor`](stealth_perception::PerceptionSensor)
//! and a movement collaborator, and decides where to go next:
//!
//! - roaming picks random reachable nodes with a neighbor-biased look-ahead
//!   and a visited memory that resets before it can stall;
//! - investigating roams only inside a window around the disturbance;
//! - hunting chases the last position the player was actually seen at.
//!
//! # Example
//!
//! ```ignore
//! use stealth_ai::prelude::*;
//!
//! let mut agent = AgentBuilder::new(AgentId(0), graph, paths)
//!     .config(AgentConfig::default().roam_only())
//!     .spawn(locomotion, 0.0)?;
//!
//! for event in agent.tick(dt, now, &scene) {
//!     log::info!("{:?}", event);
//! }
//! ```

pub mod config;
pub mod controller;
pub mod decay;
pub mod error;
pub mod patrol;
pub mod roam;
pub mod state;

pub mod prelude {
    pub use crate::config::AgentConfig;
    pub use crate::controller::{AgentBuilder, AgentController, SharedPaths};
    pub use crate::decay::DecayProfile;
    pub use crate::error::{AiError, Result};
    pub use crate::patrol::PatrolRoute;
    pub use crate::roam::{RoamPlanner, RoamQuery, RoamScope};
    pub use crate::state::{AgentEvent, AgentState, StateMachine};
}

pub use prelude::*;
