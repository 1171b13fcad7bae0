//! Per-state suspicion decay multipliers

use crate::state::AgentState;
use serde::{Deserialize, Serialize};

/// Multipliers applied to the sensor's baseline decay rate in each state
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayProfile {
    pub patrol: f32,
    pub roam: f32,
    pub investigate: f32,
    /// 0 keeps suspicion from falling while hunting
    pub hunt: f32,
}

impl Default for DecayProfile {
    fn default() -> Self {
        Self {
            patrol: 2.0,
            roam: 2.0,
            investigate: 0.35,
            hunt: 0.0,
        }
    }
}

impl DecayProfile {
    /// Multiplier for a state
    pub fn multiplier(&self, state: AgentState) -> f32 {
        match state {
            AgentState::Patrol => self.patrol,
            AgentState::RoamMap => self.roam,
            AgentState::Investigate => self.investigate,
            AgentState::Hunt => self.hunt,
        }
    }

    /// Decay rate for a state given the sensor's baseline
    pub fn rate_for(&self, baseline: f32, state: AgentState) -> f32 {
        baseline * self.multiplier(state)
    }
}
