//! Global detection meter
//!
//! Every enemy registers its [`SharedPerception`]; the aggregator keeps only
//! weak references and turns the worst-case suspicion ratio into a single
//! alert level. Crossing 1.0 latches the "caught" signal.

use crate::ids::AgentId;
use crate::sensor::{PerceptionState, SharedPerception};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

/// Signal raised when the alert level reaches 1.0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerCaught {
    /// Alert level at the moment of capture
    pub alert_level: f32,
}

/// Tracks all live sensors and decides when the player is caught
#[derive(Debug, Default)]
pub struct DetectionAggregator {
    sensors: HashMap<AgentId, Weak<RwLock<PerceptionState>>>,
    alert_level: f32,
    caught: bool,
}

impl DetectionAggregator {
    /// Create an empty aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sensor; registering the same agent again replaces the entry
    pub fn register(&mut self, agent: AgentId, perception: &SharedPerception) {
        if self
            .sensors
            .insert(agent, Arc::downgrade(perception))
            .is_none()
        {
            log::debug!("Detection registered {}", agent);
        }
    }

    /// Remove a sensor; unknown agents are ignored
    pub fn unregister(&mut self, agent: AgentId) {
        if self.sensors.remove(&agent).is_some() {
            log::debug!("Detection unregistered {}", agent);
        }
    }

    /// Number of registered sensors, dead ones included until the next update
    pub fn sensor_count(&self) -> usize {
        self.sensors.len()
    }

    /// Current alert level in `[0, 1]`
    pub fn alert_level(&self) -> f32 {
        self.alert_level
    }

    /// Whether the caught signal has fired
    pub fn is_caught(&self) -> bool {
        self.caught
    }

    /// Recompute the alert level; returns the caught signal the first time it fires
    pub fn update(&mut self) -> Option<PlayerCaught> {
        if self.caught {
            return None;
        }

        self.sensors.retain(|_, weak| weak.strong_count() > 0);
        if self.sensors.is_empty() {
            return None;
        }

        let (max_suspicion, max_time_to_lose) = self
            .sensors
            .values()
            .filter_map(Weak::upgrade)
            .fold((0.0f32, 0.0f32), |(suspicion, time_to_lose), state| {
                let state = state.read();
                (suspicion.max(state.suspicion), time_to_lose.max(state.time_to_lose))
            });

        self.alert_level = if max_time_to_lose > 0.0 {
            (max_suspicion / max_time_to_lose).clamp(0.0, 1.0)
        } else {
            0.0
        };

        if self.alert_level >= 1.0 {
            self.caught = true;
            log::info!("Player caught (alert level {:.2})", self.alert_level);
            return Some(PlayerCaught {
                alert_level: self.alert_level,
            });
        }

        None
    }

    /// Clear the latch and alert level (level restart)
    pub fn reset(&mut self) {
        self.caught = false;
        self.alert_level = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::SensorConfig;
    use approx::assert_relative_eq;

    fn shared(suspicion: f32, time_to_lose: f32) -> SharedPerception {
        let mut state = PerceptionState {
            visible: false,
            suspicion: 0.0,
            decay_rate: 1.0,
            time_to_lose,
            vision_radius: SensorConfig::default().vision_radius,
            fov_degrees: 90.0,
            target_distance: None,
        };
        state.suspicion = suspicion;
        Arc::new(RwLock::new(state))
    }

    #[test]
    fn test_alert_is_worst_ratio() {
        let a = shared(2.0, 10.0);
        let b = shared(5.0, 10.0);
        let mut aggregator = DetectionAggregator::new();
        aggregator.register(AgentId(0), &a);
        aggregator.register(AgentId(1), &b);

        assert_eq!(aggregator.update(), None);
        assert_relative_eq!(aggregator.alert_level(), 0.5);
    }

    #[test]
    fn test_alert_monotonic_in_suspicion() {
        let a = shared(2.0, 10.0);
        let b = shared(5.0, 10.0);
        let mut aggregator = DetectionAggregator::new();
        aggregator.register(AgentId(0), &a);
        aggregator.register(AgentId(1), &b);

        let mut last = 0.0;
        for step in 0..10 {
            a.write().suspicion = step as f32;
            aggregator.update();
            assert!(aggregator.alert_level() >= last);
            last = aggregator.alert_level();
        }
    }

    #[test]
    fn test_caught_fires_once() {
        let a = shared(10.0, 10.0);
        let mut aggregator = DetectionAggregator::new();
        aggregator.register(AgentId(0), &a);

        assert!(aggregator.update().is_some());
        assert!(aggregator.is_caught());
        assert_eq!(aggregator.update(), None);

        a.write().suspicion = 0.0;
        assert_eq!(aggregator.update(), None);
        assert_relative_eq!(aggregator.alert_level(), 1.0);

        aggregator.reset();
        assert!(!aggregator.is_caught());
        assert_eq!(aggregator.update(), None);
        assert_relative_eq!(aggregator.alert_level(), 0.0);
    }

    #[test]
    fn test_registration_idempotent() {
        let a = shared(1.0, 10.0);
        let mut aggregator = DetectionAggregator::new();
        aggregator.register(AgentId(0), &a);
        aggregator.register(AgentId(0), &a);
        assert_eq!(aggregator.sensor_count(), 1);

        aggregator.unregister(AgentId(0));
        aggregator.unregister(AgentId(0));
        assert_eq!(aggregator.sensor_count(), 0);
    }

    #[test]
    fn test_dead_sensors_pruned() {
        let a = shared(9.0, 10.0);
        let b = shared(1.0, 10.0);
        let mut aggregator = DetectionAggregator::new();
        aggregator.register(AgentId(0), &a);
        aggregator.register(AgentId(1), &b);

        drop(a);
        aggregator.update();
        assert_eq!(aggregator.sensor_count(), 1);
        assert_relative_eq!(aggregator.alert_level(), 0.1);
    }

    #[test]
    fn test_no_sensors_is_noop() {
        let mut aggregator = DetectionAggregator::new();
        assert_eq!(aggregator.update(), None);
        assert_eq!(aggregator.alert_level(), 0.0);
    }

    #[test]
    fn test_non_positive_time_to_lose() {
        let a = shared(0.0, 0.0);
        let mut aggregator = DetectionAggregator::new();
        aggregator.register(AgentId(0), &a);
        assert_eq!(aggregator.update(), None);
        assert_eq!(aggregator.alert_level(), 0.0);
    }
}
