//! Headless simulation
//!
//! Drives a [`Level`] at a fixed step with a scripted player walking a list
//! of points. Used by the `stealth-sim` binary and by scenario tests.

use crate::authoring::LevelDesc;
use crate::error::Result;
use crate::level::{Level, TickReport};
use glam::Vec3;
use stealth_ai::AgentEvent;
use stealth_gamestate::{EventLog, Outcome};
use stealth_perception::Gait;

/// Distance at which a scripted point counts as reached
const POINT_REACHED: f32 = 0.05;

/// Player that walks a fixed list of points once
#[derive(Debug, Clone)]
pub struct ScriptedPlayer {
    path: Vec<Vec3>,
    index: usize,
    speed: f32,
    gait: Gait,
}

impl ScriptedPlayer {
    pub fn new(path: Vec<Vec3>, speed: f32, gait: Gait) -> Self {
        Self {
            path,
            index: 0,
            speed,
            gait,
        }
    }

    pub fn gait(&self) -> Gait {
        self.gait
    }

    pub fn set_gait(&mut self, gait: Gait) {
        self.gait = gait;
    }

    /// Every point has been reached
    pub fn is_finished(&self) -> bool {
        self.index >= self.path.len()
    }

    /// Move from `from` toward the next point; returns the new position and
    /// whether the player moved
    pub fn step(&mut self, from: Vec3, delta_time: f32) -> (Vec3, bool) {
        let mut position = from;
        let mut budget = self.speed * delta_time;
        let mut moved = false;

        while budget > 0.0 {
            let Some(&target) = self.path.get(self.index) else {
                break;
            };
            let offset = target - position;
            let distance = offset.length();
            if distance <= POINT_REACHED {
                self.index += 1;
                continue;
            }
            let travel = budget.min(distance);
            position += offset / distance * travel;
            budget -= travel;
            moved = true;
        }

        (position, moved)
    }
}

/// Totals over a simulation run
#[derive(Debug, Clone, Default)]
pub struct SimulationSummary {
    pub ticks: u64,
    pub elapsed: f64,
    pub outcome: Option<Outcome>,
    pub peak_alert: f32,
    pub state_changes: usize,
    pub footsteps: usize,
    pub gifts_planted: u32,
}

/// A level plus its scripted player and recorded game events
pub struct Simulation {
    level: Level,
    player: Option<ScriptedPlayer>,
    events: EventLog,
}

impl Simulation {
    /// Build the level and script from a description
    pub fn from_desc(desc: &LevelDesc) -> Result<Self> {
        let mut events = EventLog::new();
        let level = Level::from_desc(desc, &mut events)?;
        let player = desc
            .player
            .as_ref()
            .map(|player| ScriptedPlayer::new(player.path.clone(), player.speed, player.gait));
        Ok(Self { level, player, events })
    }

    /// Wrap an existing level with an optional script
    pub fn new(level: Level, player: Option<ScriptedPlayer>) -> Self {
        Self {
            level,
            player,
            events: EventLog::new(),
        }
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn level_mut(&mut self) -> &mut Level {
        &mut self.level
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Move the scripted player, then tick the level
    pub fn step(&mut self, delta_time: f32) -> TickReport {
        if let (Some(script), Some(from)) = (self.player.as_mut(), self.level.player_position()) {
            let (position, moving) = script.step(from, delta_time);
            self.level.move_player(position, script.gait(), moving, delta_time);
        }
        self.level.tick(delta_time, &mut self.events)
    }

    /// Run for up to `seconds` at `tick_rate` steps per second, stopping early
    /// once the level is decided
    pub fn run(&mut self, seconds: f64, tick_rate: f64) -> SimulationSummary {
        let delta_time = (1.0 / tick_rate) as f32;
        let mut summary = SimulationSummary::default();

        while summary.elapsed < seconds && !self.level.objectives().is_finished() {
            let report = self.step(delta_time);
            summary.ticks += 1;
            summary.elapsed += f64::from(delta_time);
            summary.peak_alert = summary.peak_alert.max(report.alert_level);
            summary.footsteps += usize::from(report.footstep.is_some());
            summary.gifts_planted += report.gifts_planted;

            for (id, event) in report.state_changes() {
                summary.state_changes += 1;
                if let AgentEvent::StateChanged { from, to } = event {
                    log::info!("[{:>7.2}] {} {:?} -> {}", self.level.now(), id, from, to);
                }
            }
        }

        summary.outcome = self.level.objectives().outcome();
        summary
    }
}
