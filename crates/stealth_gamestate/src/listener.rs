//! Game-state notifications

use serde::{Deserialize, Serialize};

/// Receives level-wide game-state changes
///
/// Every method has an empty default so listeners only implement what they
/// care about.
pub trait GameStateListener {
    /// The detection meter filled up
    fn on_player_caught(&mut self) {}

    /// A gift was planted or a tree registered
    fn on_objective_progress(&mut self, _planted: u32, _total: u32) {}

    /// Every tree has a gift; the escape zone is open
    fn on_escape_unlocked(&mut self) {}

    /// The player reached the open escape zone
    fn on_escaped(&mut self) {}
}

/// Listener that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullListener;

impl GameStateListener for NullListener {}

/// Recorded game-state notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    PlayerCaught,
    ObjectiveProgress { planted: u32, total: u32 },
    EscapeUnlocked,
    Escaped,
}

/// Listener that records every notification in order
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<GameEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Take the recorded events
    pub fn drain(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// How many times an event was recorded
    pub fn count(&self, event: GameEvent) -> usize {
        self.events.iter().filter(|e| **e == event).count()
    }
}

impl GameStateListener for EventLog {
    fn on_player_caught(&mut self) {
        self.events.push(GameEvent::PlayerCaught);
    }

    fn on_objective_progress(&mut self, planted: u32, total: u32) {
        self.events.push(GameEvent::ObjectiveProgress { planted, total });
    }

    fn on_escape_unlocked(&mut self) {
        self.events.push(GameEvent::EscapeUnlocked);
    }

    fn on_escaped(&mut self) {
        self.events.push(GameEvent::Escaped);
    }
}
