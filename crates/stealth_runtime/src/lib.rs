//! Stealth Runtime - levels, level files and headless simulation
//!
//! Ties the navigation, perception, AI and game-state crates together into a
//! playable level.
//!
//! # Features
//!
//! - TOML level files: waypoints, walkable grid, sight blockers, enemies, objectives
//! - Level facade with a fixed per-frame update order
//! - Footstep and ad-hoc noise routing to enemies
//! - Scripted player for headless runs and scenario tests
//!
//! # Example
//!
//! ```ignore
//! use stealth_runtime::prelude::*;
//!
//! let desc = LevelDesc::load("levels/demo.toml")?;
//! let mut sim = Simulation::from_desc(&desc)?;
//! let summary = sim.run(60.0, 60.0);
//! println!("{:?}", summary.outcome);
//! ```

pub mod authoring;
pub mod config;
pub mod error;
pub mod level;
pub mod sim;

pub mod prelude {
    pub use crate::authoring::{
        AreaDesc, EnemyDesc, EscapeDesc, LevelDesc, LevelInfo, LinkDesc, NavMeshDesc, NodeDesc, ObstacleDesc,
        PlayerDesc, TreeDesc,
    };
    pub use crate::config::{RuntimeConfig, DEMO_LEVEL};
    pub use crate::error::{LevelError, Result};
    pub use crate::level::{AgentHandle, AgentSpawn, EscapeZone, Level, LevelAgent, TickReport, Tree, PLANT_REACH};
    pub use crate::sim::{ScriptedPlayer, Simulation, SimulationSummary};
}

pub use prelude::*;
