//! Player identity as seen by the AI
//!
//! The player controller registers a [`PlayerHandle`] when it spawns. Agents
//! and sensors only keep a [`PlayerRef`], so a despawned player shows up as a
//! dead reference instead of a dangling lookup.

use crate::ids::EntityId;
use glam::Vec3;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};

/// Owning handle held by the player controller
pub type PlayerHandle = Arc<RwLock<PlayerBody>>;

/// Non-owning reference held by agents
pub type PlayerRef = Weak<RwLock<PlayerBody>>;

/// How the player is currently moving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gait {
    #[default]
    Walk,
    Run,
    Crouch,
}

/// Noise level targets per gait
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseProfile {
    pub walk: f32,
    pub run: f32,
    /// Crouched movement is silent by default
    pub crouch: f32,
    /// Exponential smoothing speed toward the target level
    pub smoothing: f32,
}

impl Default for NoiseProfile {
    fn default() -> Self {
        Self {
            walk: 0.4,
            run: 1.0,
            crouch: 0.0,
            smoothing: 10.0,
        }
    }
}

impl NoiseProfile {
    /// Target noise level for a gait while moving
    pub fn level_for(&self, gait: Gait) -> f32 {
        match gait {
            Gait::Walk => self.walk,
            Gait::Run => self.run,
            Gait::Crouch => self.crouch,
        }
    }
}

/// Player state consumed by the AI: position, movement and noise
#[derive(Debug, Clone)]
pub struct PlayerBody {
    /// Entity id used by physics queries
    pub entity: EntityId,
    /// World position
    pub position: Vec3,
    /// Current gait
    pub gait: Gait,
    /// Whether the player is moving this frame
    pub moving: bool,
    noise_level: f32,
    noise: NoiseProfile,
}

impl PlayerBody {
    /// Create a stationary player
    pub fn new(entity: EntityId, position: Vec3) -> Self {
        Self {
            entity,
            position,
            gait: Gait::Walk,
            moving: false,
            noise_level: 0.0,
            noise: NoiseProfile::default(),
        }
    }

    /// Use a custom noise profile
    pub fn with_noise_profile(mut self, noise: NoiseProfile) -> Self {
        self.noise = noise;
        self
    }

    /// Wrap into a shared handle
    pub fn into_handle(self) -> PlayerHandle {
        Arc::new(RwLock::new(self))
    }

    /// Smoothed noise level (0 silent, 1 loudest)
    pub fn noise_level(&self) -> f32 {
        self.noise_level
    }

    /// Record this frame's movement and smooth the noise level toward its target
    pub fn apply_movement(&mut self, position: Vec3, gait: Gait, moving: bool, delta_time: f32) {
        self.position = position;
        self.gait = gait;
        self.moving = moving;

        let target = if moving { self.noise.level_for(gait) } else { 0.0 };
        let t = (self.noise.smoothing * delta_time).clamp(0.0, 1.0);
        self.noise_level += (target - self.noise_level) * t;
    }
}
