//! Runtime configuration
//!
//! Resolution order for the level file:
//! 1. `STEALTH_LEVEL` environment variable
//! 2. First non-flag command line argument
//! 3. The built-in demo level

use crate::authoring::LevelDesc;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Level bundled with the binary
pub const DEMO_LEVEL: &str = include_str!("../levels/demo.toml");

/// Headless run settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Level file; `None` runs the demo level
    pub level: Option<PathBuf>,
    /// Simulation steps per second
    pub tick_rate: f64,
    /// Maximum simulated seconds
    pub duration: f64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            level: None,
            tick_rate: 60.0,
            duration: 90.0,
        }
    }
}

impl RuntimeConfig {
    /// Load from the process environment and arguments
    pub fn load() -> Self {
        let vars = ["STEALTH_LEVEL", "STEALTH_SECONDS", "STEALTH_TICK_RATE"]
            .into_iter()
            .filter_map(|key| std::env::var(key).ok().map(|value| (key, value)));
        Self::from_sources(vars, std::env::args().skip(1))
    }

    /// Resolve from explicit environment pairs and arguments
    pub fn from_sources<'a, V, A>(vars: V, args: A) -> Self
    where
        V: IntoIterator<Item = (&'a str, String)>,
        A: IntoIterator<Item = String>,
    {
        let mut config = Self::default();
        let mut env_level = None;

        for (key, value) in vars {
            match key {
                "STEALTH_LEVEL" => env_level = Some(PathBuf::from(value)),
                "STEALTH_SECONDS" => match value.parse::<f64>() {
                    Ok(seconds) if seconds > 0.0 => {
                        log::info!("Duration from env: {}s", seconds);
                        config.duration = seconds;
                    }
                    _ => log::warn!("Ignoring STEALTH_SECONDS={}", value),
                },
                "STEALTH_TICK_RATE" => match value.parse::<f64>() {
                    Ok(rate) if rate > 0.0 => {
                        log::info!("Tick rate from env: {}", rate);
                        config.tick_rate = rate;
                    }
                    _ => log::warn!("Ignoring STEALTH_TICK_RATE={}", value),
                },
                _ => {}
            }
        }

        if let Some(level) = env_level {
            log::info!("Level from env: {:?}", level);
            config.level = Some(level);
        } else if let Some(arg) = args.into_iter().find(|arg| !arg.starts_with("--")) {
            log::info!("Level from command line: {}", arg);
            config.level = Some(PathBuf::from(arg));
        }

        config
    }

    /// Load the configured level, or the demo level when none is set
    pub fn level_desc(&self) -> Result<LevelDesc> {
        match &self.level {
            Some(path) => LevelDesc::load(path),
            None => {
                log::info!("No level given, using the demo level");
                LevelDesc::from_toml(DEMO_LEVEL)
            }
        }
    }
}
