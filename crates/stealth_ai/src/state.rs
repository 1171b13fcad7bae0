//! Agent behavior states and transition bookkeeping

use serde::{Deserialize, Serialize};
use stealth_nav::NodeId;
use std::fmt;

/// High-level behavior of an enemy agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentState {
    /// Following a fixed route
    Patrol,
    /// Wandering the whole graph
    RoamMap,
    /// Chasing the player's last known position
    Hunt,
    /// Searching around a disturbance for a limited time
    Investigate,
}

impl AgentState {
    /// Whether the state moves using the roam planner
    pub fn uses_roam(self) -> bool {
        matches!(self, AgentState::RoamMap | AgentState::Investigate)
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AgentState::Patrol => "Patrol",
            AgentState::RoamMap => "RoamMap",
            AgentState::Hunt => "Hunt",
            AgentState::Investigate => "Investigate",
        };
        f.write_str(name)
    }
}

/// Notable things an agent did during a tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AgentEvent {
    /// The agent switched behavior
    StateChanged { from: Option<AgentState>, to: AgentState },
    /// The agent picked a new roam target
    TargetPicked { node: NodeId },
    /// The agent's sensor saw the player
    Spotted,
    /// The agent's sensor lost the player
    LostSight,
}

/// Current and previous state with the time of the last switch
#[derive(Debug, Clone)]
pub struct StateMachine {
    current: AgentState,
    previous: Option<AgentState>,
    entered_at: f64,
}

impl StateMachine {
    /// Start in `initial` at time `now`
    pub fn new(initial: AgentState, now: f64) -> Self {
        Self {
            current: initial,
            previous: None,
            entered_at: now,
        }
    }

    pub fn current(&self) -> AgentState {
        self.current
    }

    pub fn previous(&self) -> Option<AgentState> {
        self.previous
    }

    /// Time the current state was entered
    pub fn entered_at(&self) -> f64 {
        self.entered_at
    }

    pub fn is_in(&self, state: AgentState) -> bool {
        self.current == state
    }

    /// Switch to `to`; re-entering the current state is allowed and counts as a switch
    pub fn force_transition(&mut self, to: AgentState, now: f64) -> AgentEvent {
        let from = self.current;
        self.previous = Some(from);
        self.current = to;
        self.entered_at = now;
        AgentEvent::StateChanged { from: Some(from), to }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_records_previous() {
        let mut machine = StateMachine::new(AgentState::Patrol, 0.0);
        assert!(machine.is_in(AgentState::Patrol));
        assert_eq!(machine.previous(), None);

        let event = machine.force_transition(AgentState::Hunt, 1.5);
        assert_eq!(
            event,
            AgentEvent::StateChanged {
                from: Some(AgentState::Patrol),
                to: AgentState::Hunt
            }
        );
        assert_eq!(machine.current(), AgentState::Hunt);
        assert_eq!(machine.previous(), Some(AgentState::Patrol));
        assert_eq!(machine.entered_at(), 1.5);
    }

    #[test]
    fn test_reentry() {
        let mut machine = StateMachine::new(AgentState::Investigate, 0.0);
        machine.force_transition(AgentState::Investigate, 3.0);
        assert!(machine.is_in(AgentState::Investigate));
        assert_eq!(machine.entered_at(), 3.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(AgentState::RoamMap.to_string(), "RoamMap");
        assert!(AgentState::Investigate.uses_roam());
        assert!(!AgentState::Hunt.uses_roam());
    }
}
