//! Vision cone sensor with suspicion accumulation
//!
//! Two cadences run inside [`PerceptionSensor::update`]:
//!
//! - the visibility test (overlap query, view cone, occlusion ray) runs only
//!   when the internal timer reaches [`SensorConfig::check_interval`];
//! - suspicion accumulates or decays every tick from the cached result.

use crate::error::{PerceptionError, Result};
use crate::ids::EntityId;
use crate::layers::{LayerMask, QueryLayer};
use crate::player::PlayerRef;
use crate::query::{PhysicsQuery, QueryHit};
use glam::Vec3;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Suspicion gain per second at the edge of vision range
pub const FAR_GAIN: f32 = 0.4;
/// Suspicion gain per second at point blank range
pub const NEAR_GAIN: f32 = 8.0;

/// Sensor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Maximum sight distance
    pub vision_radius: f32,
    /// Full view cone angle in degrees
    pub fov_degrees: f32,
    /// Suspicion at which this sensor alone catches the player
    pub time_to_lose: f32,
    /// Suspicion lost per second while the target is hidden
    pub decay_rate: f32,
    /// Seconds between visibility tests
    pub check_interval: f32,
    /// Eye offset above the agent's position
    pub eye_height: f32,
    /// Layers that hold sensor targets
    pub target_layers: LayerMask,
    /// Layers that block line of sight
    pub obstruction_layers: LayerMask,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            vision_radius: 10.0,
            fov_degrees: 90.0,
            time_to_lose: 5.0,
            decay_rate: 1.0,
            check_interval: 0.2,
            eye_height: 0.0,
            target_layers: LayerMask::single(QueryLayer::TARGET),
            obstruction_layers: LayerMask::from_layers(&[QueryLayer::OBSTRUCTION, QueryLayer::DOORS]),
        }
    }
}

impl SensorConfig {
    /// Set vision radius and cone angle
    pub fn with_vision(mut self, radius: f32, fov_degrees: f32) -> Self {
        self.vision_radius = radius;
        self.fov_degrees = fov_degrees;
        self
    }

    /// Set time to lose
    pub fn with_time_to_lose(mut self, time_to_lose: f32) -> Self {
        self.time_to_lose = time_to_lose;
        self
    }

    /// Set base decay rate
    pub fn with_decay_rate(mut self, decay_rate: f32) -> Self {
        self.decay_rate = decay_rate;
        self
    }

    /// Set the visibility test interval
    pub fn with_check_interval(mut self, interval: f32) -> Self {
        self.check_interval = interval;
        self
    }

    /// Check parameter ranges
    pub fn validate(&self) -> Result<()> {
        if !(self.vision_radius > 0.0) {
            return Err(PerceptionError::InvalidConfig(format!(
                "vision_radius must be positive, got {}",
                self.vision_radius
            )));
        }
        if !(self.fov_degrees > 0.0 && self.fov_degrees <= 360.0) {
            return Err(PerceptionError::InvalidConfig(format!(
                "fov_degrees must be in (0, 360], got {}",
                self.fov_degrees
            )));
        }
        if !(self.time_to_lose > 0.0) {
            return Err(PerceptionError::InvalidConfig(format!(
                "time_to_lose must be positive, got {}",
                self.time_to_lose
            )));
        }
        if self.decay_rate < 0.0 || self.check_interval < 0.0 {
            return Err(PerceptionError::InvalidConfig(
                "decay_rate and check_interval must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Per-agent perception state shared with the detection aggregator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerceptionState {
    /// Result of the most recent visibility test
    pub visible: bool,
    /// Accumulated suspicion, always within `[0, time_to_lose]`
    pub suspicion: f32,
    /// Current decay rate (driven by the owning agent's behavior)
    pub decay_rate: f32,
    pub time_to_lose: f32,
    pub vision_radius: f32,
    pub fov_degrees: f32,
    /// Distance to the target at the last successful sighting
    pub target_distance: Option<f32>,
}

impl PerceptionState {
    fn from_config(config: &SensorConfig) -> Self {
        Self {
            visible: false,
            suspicion: 0.0,
            decay_rate: config.decay_rate,
            time_to_lose: config.time_to_lose,
            vision_radius: config.vision_radius,
            fov_degrees: config.fov_degrees,
            target_distance: None,
        }
    }

    /// Suspicion as a fraction of `time_to_lose`
    pub fn alert_ratio(&self) -> f32 {
        if self.time_to_lose > 0.0 {
            (self.suspicion / self.time_to_lose).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Advance suspicion by one tick
    pub fn accumulate(&mut self, delta_time: f32, distance: Option<f32>) {
        if self.visible {
            let distance = distance.unwrap_or(self.vision_radius);
            let closeness = (1.0 - distance / self.vision_radius).clamp(0.0, 1.0);
            self.suspicion += delta_time * (FAR_GAIN + (NEAR_GAIN - FAR_GAIN) * closeness);
        } else {
            self.suspicion -= delta_time * self.decay_rate;
        }
        self.suspicion = self.suspicion.clamp(0.0, self.time_to_lose);
    }
}

/// Shared handle to a sensor's state
pub type SharedPerception = Arc<RwLock<PerceptionState>>;

/// Visibility edges reported by a sensor
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorEvent {
    /// The target became visible
    Spotted { entity: EntityId, distance: f32 },
    /// The target is no longer visible
    Lost,
}

/// Where the sensor looks from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Eye {
    pub position: Vec3,
    pub forward: Vec3,
}

/// Vision cone sensor
#[derive(Debug)]
pub struct PerceptionSensor {
    config: SensorConfig,
    state: SharedPerception,
    check_timer: f32,
    target: Option<PlayerRef>,
    last_sighting: Option<QueryHit>,
}

impl PerceptionSensor {
    /// Create a sensor from a validated configuration
    pub fn new(config: SensorConfig) -> Result<Self> {
        config.validate()?;
        let state = Arc::new(RwLock::new(PerceptionState::from_config(&config)));
        Ok(Self {
            config,
            state,
            check_timer: 0.0,
            target: None,
            last_sighting: None,
        })
    }

    /// Sensor configuration
    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    /// Handle to the shared state, for registration with the aggregator
    pub fn shared(&self) -> SharedPerception {
        Arc::clone(&self.state)
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> PerceptionState {
        self.state.read().clone()
    }

    /// Follow a specific target; a dead reference makes the sensor blind to it
    pub fn track_target(&mut self, target: PlayerRef) {
        self.target = Some(target);
    }

    /// Whether the target was visible at the last test
    pub fn visible(&self) -> bool {
        self.state.read().visible
    }

    /// Current suspicion
    pub fn suspicion(&self) -> f32 {
        self.state.read().suspicion
    }

    /// Suspicion ceiling
    pub fn time_to_lose(&self) -> f32 {
        self.state.read().time_to_lose
    }

    /// Current decay rate
    pub fn decay_rate(&self) -> f32 {
        self.state.read().decay_rate
    }

    /// Override the decay rate
    pub fn set_decay_rate(&mut self, rate: f32) {
        self.state.write().decay_rate = rate.max(0.0);
    }

    /// Entity seen at the last successful test
    pub fn last_sighting(&self) -> Option<QueryHit> {
        self.last_sighting
    }

    fn eye_at(&self, position: Vec3, forward: Vec3) -> Eye {
        Eye {
            position: position + Vec3::Y * self.config.eye_height,
            forward,
        }
    }

    fn target_lost(&self) -> bool {
        self.target
            .as_ref()
            .map_or(false, |target| target.strong_count() == 0)
    }

    /// Run one tick: maybe test visibility, then accumulate or decay suspicion
    pub fn update<Q: PhysicsQuery + ?Sized>(
        &mut self,
        delta_time: f32,
        position: Vec3,
        forward: Vec3,
        physics: &Q,
    ) -> Option<SensorEvent> {
        self.check_timer += delta_time;
        let mut event = None;
        if self.check_timer >= self.config.check_interval {
            self.check_timer = if self.config.check_interval > 0.0 {
                self.check_timer % self.config.check_interval
            } else {
                0.0
            };
            event = self.check_visibility(position, forward, physics);
        }

        let eye = self.eye_at(position, forward);
        let live_distance = self
            .target
            .as_ref()
            .and_then(|t| t.upgrade())
            .map(|body| body.read().position.distance(eye.position));

        let mut state = self.state.write();
        let distance = live_distance.or(state.target_distance);
        state.accumulate(delta_time, distance);
        event
    }

    /// Run the visibility test now
    pub fn check_visibility<Q: PhysicsQuery + ?Sized>(
        &mut self,
        position: Vec3,
        forward: Vec3,
        physics: &Q,
    ) -> Option<SensorEvent> {
        let eye = self.eye_at(position, forward);
        let sighting = if self.target_lost() {
            None
        } else {
            self.find_visible_target(eye, physics)
        };

        let was_visible = self.state.read().visible;
        self.last_sighting = sighting;

        let mut state = self.state.write();
        match sighting {
            Some(hit) => {
                let distance = hit.position.distance(eye.position);
                state.visible = true;
                state.target_distance = Some(distance);
                if !was_visible {
                    log::debug!("Sensor spotted {} at {:.2}", hit.entity, distance);
                    return Some(SensorEvent::Spotted {
                        entity: hit.entity,
                        distance,
                    });
                }
                None
            }
            None => {
                state.visible = false;
                if was_visible {
                    log::debug!("Sensor lost sight of its target");
                    return Some(SensorEvent::Lost);
                }
                None
            }
        }
    }

    fn find_visible_target<Q: PhysicsQuery + ?Sized>(&self, eye: Eye, physics: &Q) -> Option<QueryHit> {
        let candidates = physics.overlap_sphere(eye.position, self.config.vision_radius, self.config.target_layers);
        let nearest = candidates.into_iter().min_by(|a, b| {
            a.position
                .distance_squared(eye.position)
                .total_cmp(&b.position.distance_squared(eye.position))
        })?;

        let to_target = nearest.position - eye.position;
        let distance = to_target.length();
        if distance <= f32::EPSILON {
            return Some(nearest);
        }
        let direction = to_target / distance;

        if !within_cone(eye.forward, direction, self.config.fov_degrees) {
            return None;
        }

        if physics.raycast(eye.position, direction, distance, self.config.obstruction_layers) {
            return None;
        }

        Some(nearest)
    }
}

/// Whether `direction` lies within a cone of `fov_degrees` around `forward`
pub fn within_cone(forward: Vec3, direction: Vec3, fov_degrees: f32) -> bool {
    if fov_degrees >= 360.0 {
        return true;
    }
    let forward = forward.normalize_or_zero();
    let direction = direction.normalize_or_zero();
    if forward == Vec3::ZERO || direction == Vec3::ZERO {
        return true;
    }
    let cos = forward.dot(direction).clamp(-1.0, 1.0);
    cos.acos().to_degrees() <= fov_degrees * 0.5
}
