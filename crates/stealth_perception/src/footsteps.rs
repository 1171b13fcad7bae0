//! Footstep cadence and the noises it produces

use crate::noise::NoiseEvent;
use crate::player::{Gait, PlayerBody};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Step timing and hearing radii per gait
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FootstepConfig {
    pub walk_interval: f64,
    pub run_interval: f64,
    pub crouch_interval: f64,
    /// Minimum time between two steps regardless of gait
    pub min_step_cooldown: f64,
    /// Minimum travel between two steps
    pub min_distance_per_step: f32,
    pub walk_noise_radius: f32,
    pub run_noise_radius: f32,
    pub crouch_noise_radius: f32,
}

impl Default for FootstepConfig {
    fn default() -> Self {
        Self {
            walk_interval: 0.5,
            run_interval: 0.3,
            crouch_interval: 0.7,
            min_step_cooldown: 0.2,
            min_distance_per_step: 0.88,
            walk_noise_radius: 5.0,
            run_noise_radius: 10.0,
            crouch_noise_radius: 2.0,
        }
    }
}

impl FootstepConfig {
    /// Seconds between steps for a gait
    pub fn interval_for(&self, gait: Gait) -> f64 {
        match gait {
            Gait::Walk => self.walk_interval,
            Gait::Run => self.run_interval,
            Gait::Crouch => self.crouch_interval,
        }
    }

    /// Hearing radius of a step for a gait
    pub fn radius_for(&self, gait: Gait) -> f32 {
        match gait {
            Gait::Walk => self.walk_noise_radius,
            Gait::Run => self.run_noise_radius,
            Gait::Crouch => self.crouch_noise_radius,
        }
    }
}

/// Turns player movement into footstep noises
#[derive(Debug, Clone)]
pub struct FootstepEmitter {
    config: FootstepConfig,
    next_step_at: f64,
    last_step_at: f64,
    last_step_position: Vec3,
    was_moving: bool,
}

impl FootstepEmitter {
    /// Create an emitter with the player standing at `position` at time `now`
    pub fn new(config: FootstepConfig, position: Vec3, now: f64) -> Self {
        Self {
            config,
            next_step_at: now,
            last_step_at: now,
            last_step_position: position,
            was_moving: false,
        }
    }

    pub fn config(&self) -> &FootstepConfig {
        &self.config
    }

    /// Advance the cadence; returns a noise when a step lands
    pub fn update(&mut self, player: &PlayerBody, now: f64) -> Option<NoiseEvent> {
        if !player.moving {
            self.was_moving = false;
            return None;
        }

        if !self.was_moving {
            self.next_step_at = now;
        }
        self.was_moving = true;

        if now < self.next_step_at {
            return None;
        }

        let moved = player.position.distance(self.last_step_position);
        let since_last = now - self.last_step_at;
        if moved < self.config.min_distance_per_step || since_last < self.config.min_step_cooldown {
            return None;
        }

        self.last_step_at = now;
        self.last_step_position = player.position;
        self.next_step_at = now + self.config.interval_for(player.gait);

        Some(NoiseEvent::new(player.position, self.config.radius_for(player.gait)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::EntityId;

    fn walk(emitter: &mut FootstepEmitter, gait: Gait, speed: f32, seconds: f64) -> Vec<NoiseEvent> {
        let mut body = PlayerBody::new(EntityId(1), Vec3::ZERO);
        let dt = 0.05;
        let mut now = 0.0;
        let mut steps = Vec::new();
        while now < seconds {
            now += dt;
            let position = body.position + Vec3::X * speed * dt as f32;
            body.apply_movement(position, gait, true, dt as f32);
            steps.extend(emitter.update(&body, now));
        }
        steps
    }

    #[test]
    fn test_running_is_louder_and_faster() {
        let mut walker = FootstepEmitter::new(FootstepConfig::default(), Vec3::ZERO, 0.0);
        let mut runner = FootstepEmitter::new(FootstepConfig::default(), Vec3::ZERO, 0.0);

        let walk_steps = walk(&mut walker, Gait::Walk, 4.0, 5.0);
        let run_steps = walk(&mut runner, Gait::Run, 6.0, 5.0);

        assert!(run_steps.len() > walk_steps.len());
        assert!(walk_steps.iter().all(|s| s.radius == 5.0));
        assert!(run_steps.iter().all(|s| s.radius == 10.0));
    }

    #[test]
    fn test_no_steps_without_distance() {
        let mut emitter = FootstepEmitter::new(FootstepConfig::default(), Vec3::ZERO, 0.0);
        // Shuffling in place is silent
        let steps = walk(&mut emitter, Gait::Walk, 0.1, 3.0);
        assert!(steps.is_empty());
    }

    #[test]
    fn test_standing_still_is_silent() {
        let mut emitter = FootstepEmitter::new(FootstepConfig::default(), Vec3::ZERO, 0.0);
        let mut body = PlayerBody::new(EntityId(1), Vec3::new(10.0, 0.0, 0.0));
        body.moving = false;
        assert_eq!(emitter.update(&body, 1.0), None);
    }

    #[test]
    fn test_step_origin_is_player_position() {
        let mut emitter = FootstepEmitter::new(FootstepConfig::default(), Vec3::ZERO, 0.0);
        let mut body = PlayerBody::new(EntityId(1), Vec3::ZERO);
        body.apply_movement(Vec3::new(2.0, 0.0, 0.0), Gait::Crouch, true, 0.1);
        let step = emitter.update(&body, 1.0).unwrap();
        assert_eq!(step.origin, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(step.radius, 2.0);
    }
}
