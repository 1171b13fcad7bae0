//! Agent configuration

use crate::decay::DecayProfile;
use crate::error::{AiError, Result};
use serde::{Deserialize, Serialize};
use stealth_perception::SensorConfig;

/// Behavior tuning for one enemy agent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Never patrol, even with a route
    pub roam_only: bool,
    /// Allow the patrol state
    pub enable_patrol: bool,
    /// Nodes this close are marked visited; also the roam reach distance
    pub perception_radius: f32,
    /// Arrival threshold for patrol and roam targets
    pub node_arrive_distance: f32,
    /// Minimum seconds between move commands
    pub repath_cooldown: f64,
    /// Search window around a disturbance
    pub investigate_radius: f32,
    /// Seconds spent investigating before resuming patrol or roam
    pub investigate_duration: f64,
    /// Seconds without sight before a hunt turns into an investigation
    pub lose_sight_delay: f64,
    /// Random draws per candidate pick
    pub max_pick_attempts: usize,
    /// Drive the sensor's decay rate from the current state
    pub drive_suspicion_decay: bool,
    pub decay: DecayProfile,
    pub sensor: SensorConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            roam_only: false,
            enable_patrol: true,
            perception_radius: 6.0,
            node_arrive_distance: 1.1,
            repath_cooldown: 0.2,
            investigate_radius: 18.0,
            investigate_duration: 8.0,
            lose_sight_delay: 2.0,
            max_pick_attempts: 12,
            drive_suspicion_decay: true,
            decay: DecayProfile::default(),
            sensor: SensorConfig::default(),
        }
    }
}

impl AgentConfig {
    /// Roam only, never patrol
    pub fn roam_only(mut self) -> Self {
        self.roam_only = true;
        self
    }

    /// Enable or disable patrolling
    pub fn with_patrol(mut self, enabled: bool) -> Self {
        self.enable_patrol = enabled;
        self
    }

    /// Set the investigate window
    pub fn with_investigate(mut self, radius: f32, duration: f64) -> Self {
        self.investigate_radius = radius;
        self.investigate_duration = duration;
        self
    }

    /// Set the lose sight delay
    pub fn with_lose_sight_delay(mut self, delay: f64) -> Self {
        self.lose_sight_delay = delay;
        self
    }

    /// Set the sensor configuration
    pub fn with_sensor(mut self, sensor: SensorConfig) -> Self {
        self.sensor = sensor;
        self
    }

    /// Set the decay profile
    pub fn with_decay(mut self, decay: DecayProfile) -> Self {
        self.decay = decay;
        self
    }

    /// Whether patrolling is allowed by the toggles
    pub fn patrol_allowed(&self) -> bool {
        self.enable_patrol && !self.roam_only
    }

    /// Check parameter ranges
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("perception_radius", self.perception_radius),
            ("node_arrive_distance", self.node_arrive_distance),
            ("investigate_radius", self.investigate_radius),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(AiError::InvalidConfig(format!("{name} must be positive, got {value}")));
            }
        }

        let non_negative = [
            ("repath_cooldown", self.repath_cooldown),
            ("investigate_duration", self.investigate_duration),
            ("lose_sight_delay", self.lose_sight_delay),
        ];
        for (name, value) in non_negative {
            if !(value >= 0.0) {
                return Err(AiError::InvalidConfig(format!("{name} must not be negative, got {value}")));
            }
        }

        if self.max_pick_attempts == 0 {
            return Err(AiError::InvalidConfig("max_pick_attempts must be at least 1".to_string()));
        }

        self.sensor.validate()?;
        Ok(())
    }
}
