//! Stealth Perception - what enemy agents see and hear
//!
//! # Features
//!
//! - Vision cone sensor with interval-based visibility tests and
//!   distance-weighted suspicion
//! - Global detection aggregator with a latched "caught" signal
//! - Radius-based noise routing to registered listeners
//! - Footstep cadence that turns player movement into noise
//! - Physics query trait with a brute-force reference scene
//!
//! # Example
//!
//! ```ignore
//! use stealth_perception::prelude::*;
//!
//! let sensor = PerceptionSensor::new(SensorConfig::default().with_vision(12.0, 90.0))?;
//! let mut detection = DetectionAggregator::new();
//! detection.register(AgentId(0), &sensor.shared());
//!
//! if let Some(caught) = detection.update() {
//!     println!("caught at {:.2}", caught.alert_level);
//! }
//! ```

pub mod detection;
pub mod error;
pub mod footsteps;
pub mod ids;
pub mod layers;
pub mod noise;
pub mod player;
pub mod query;
pub mod sensor;

pub mod prelude {
    pub use crate::detection::{DetectionAggregator, PlayerCaught};
    pub use crate::error::{PerceptionError, Result};
    pub use crate::footsteps::{FootstepConfig, FootstepEmitter};
    pub use crate::ids::{AgentId, EntityId, IdGenerator};
    pub use crate::layers::{LayerMask, LayerRegistry, QueryLayer};
    pub use crate::noise::{NoiseEvent, NoiseListener, NoiseRouter};
    pub use crate::player::{Gait, NoiseProfile, PlayerBody, PlayerHandle, PlayerRef};
    pub use crate::query::{Obstacle, PhysicsQuery, QueryHit, SceneBody, SceneQuery};
    pub use crate::sensor::{
        within_cone, Eye, PerceptionSensor, PerceptionState, SensorConfig, SensorEvent, SharedPerception,
    };
}

pub use prelude::*;
