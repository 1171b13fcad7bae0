//! Stealth GameState - objectives and outcome of a stealth level
//!
//! # Features
//!
//! - Tree/gift objective with a one-shot escape unlock
//! - Win and lose latching (first outcome wins)
//! - Level timer with `m:ss.ss` formatting
//! - Listener trait for HUD, menus and logging
//!
//! # Example
//!
//! ```ignore
//! use stealth_gamestate::prelude::*;
//!
//! let mut events = EventLog::new();
//! let mut objectives = ObjectiveTracker::new();
//! objectives.register_tree(&mut events);
//! objectives.plant_gift(&mut events);
//! assert!(objectives.reach_escape(&mut events));
//! ```

pub mod listener;
pub mod objectives;
pub mod timer;

pub mod prelude {
    pub use crate::listener::{EventLog, GameEvent, GameStateListener, NullListener};
    pub use crate::objectives::{ObjectiveTracker, Outcome};
    pub use crate::timer::{format_time, LevelTimer};
}

pub use prelude::*;
