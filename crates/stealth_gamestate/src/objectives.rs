//! Level objectives and outcome latching
//!
//! Trees register themselves at load time. Planting a gift on each one opens
//! the escape zone; reaching it wins the level. Getting caught loses it. The
//! first outcome sticks: later win or lose requests are ignored.

use crate::listener::GameStateListener;
use crate::timer::LevelTimer;
use serde::{Deserialize, Serialize};

/// How a level ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Won,
    Lost,
}

/// Tracks gift planting, the escape unlock and the level outcome
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectiveTracker {
    total_trees: u32,
    gifts_planted: u32,
    escape_unlocked: bool,
    outcome: Option<Outcome>,
    timer: LevelTimer,
}

impl ObjectiveTracker {
    /// Create a tracker with the timer running
    pub fn new() -> Self {
        let mut tracker = Self::default();
        tracker.timer.start();
        tracker
    }

    pub fn total_trees(&self) -> u32 {
        self.total_trees
    }

    pub fn gifts_planted(&self) -> u32 {
        self.gifts_planted
    }

    pub fn escape_unlocked(&self) -> bool {
        self.escape_unlocked
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn timer(&self) -> &LevelTimer {
        &self.timer
    }

    /// HUD line for gift progress
    pub fn progress_text(&self) -> String {
        format!("Gifts Planted: {}/{}", self.gifts_planted, self.total_trees)
    }

    /// Advance the level timer
    pub fn tick(&mut self, delta_time: f64) {
        self.timer.tick(delta_time);
    }

    /// Add a tree to the objective
    pub fn register_tree<G: GameStateListener + ?Sized>(&mut self, listener: &mut G) {
        self.total_trees += 1;
        listener.on_objective_progress(self.gifts_planted, self.total_trees);
    }

    /// Plant a gift; unlocks the escape once every tree has one
    pub fn plant_gift<G: GameStateListener + ?Sized>(&mut self, listener: &mut G) {
        if self.is_finished() {
            return;
        }
        self.gifts_planted += 1;

        if !self.escape_unlocked && self.gifts_planted >= self.total_trees {
            self.escape_unlocked = true;
            log::info!("All gifts planted, escape unlocked");
            listener.on_escape_unlocked();
        }
        listener.on_objective_progress(self.gifts_planted, self.total_trees);
    }

    /// The player entered the escape zone; returns true if this won the level
    pub fn reach_escape<G: GameStateListener + ?Sized>(&mut self, listener: &mut G) -> bool {
        if !self.escape_unlocked || self.is_finished() {
            return false;
        }
        self.outcome = Some(Outcome::Won);
        self.timer.stop();
        log::info!("Player escaped in {}", self.timer.formatted());
        listener.on_escaped();
        true
    }

    /// The player was caught; returns true if this lost the level
    pub fn player_caught<G: GameStateListener + ?Sized>(&mut self, listener: &mut G) -> bool {
        if self.is_finished() {
            return false;
        }
        self.outcome = Some(Outcome::Lost);
        self.timer.stop();
        log::info!("Player caught after {}", self.timer.formatted());
        listener.on_player_caught();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::{EventLog, GameEvent};

    #[test]
    fn test_escape_unlocks_once() {
        let mut log = EventLog::new();
        let mut tracker = ObjectiveTracker::new();
        tracker.register_tree(&mut log);
        tracker.register_tree(&mut log);

        tracker.plant_gift(&mut log);
        assert!(!tracker.escape_unlocked());
        tracker.plant_gift(&mut log);
        assert!(tracker.escape_unlocked());
        tracker.plant_gift(&mut log);

        assert_eq!(log.count(GameEvent::EscapeUnlocked), 1);
        assert_eq!(tracker.progress_text(), "Gifts Planted: 3/2");
        assert_eq!(
            log.events().last(),
            Some(&GameEvent::ObjectiveProgress { planted: 3, total: 2 })
        );
    }

    #[test]
    fn test_escape_requires_unlock() {
        let mut log = EventLog::new();
        let mut tracker = ObjectiveTracker::new();
        tracker.register_tree(&mut log);

        assert!(!tracker.reach_escape(&mut log));
        tracker.plant_gift(&mut log);
        assert!(tracker.reach_escape(&mut log));
        assert_eq!(tracker.outcome(), Some(Outcome::Won));
        assert!(!tracker.reach_escape(&mut log));
        assert_eq!(log.count(GameEvent::Escaped), 1);
    }

    #[test]
    fn test_loss_latched() {
        let mut log = EventLog::new();
        let mut tracker = ObjectiveTracker::new();
        tracker.tick(2.0);

        assert!(tracker.player_caught(&mut log));
        assert!(!tracker.player_caught(&mut log));
        tracker.tick(5.0);

        assert_eq!(tracker.outcome(), Some(Outcome::Lost));
        assert_eq!(log.count(GameEvent::PlayerCaught), 1);
        assert_eq!(tracker.timer().elapsed(), 2.0);
    }

    #[test]
    fn test_no_win_after_loss() {
        let mut log = EventLog::new();
        let mut tracker = ObjectiveTracker::new();
        tracker.register_tree(&mut log);
        tracker.plant_gift(&mut log);
        tracker.player_caught(&mut log);

        assert!(!tracker.reach_escape(&mut log));
        assert_eq!(tracker.outcome(), Some(Outcome::Lost));
    }
}
