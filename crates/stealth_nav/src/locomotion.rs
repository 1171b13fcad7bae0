//! Movement and pathfinding collaborator contracts
//!
//! Agents never move themselves. They hand destinations to a [`Locomotion`]
//! implementation and ask a [`PathQuery`] whether a target is reachable.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Outcome of a path calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathStatus {
    /// A full path to the target exists
    Complete,
    /// Only a path to somewhere near the target exists
    Partial,
    /// No path could be computed
    Invalid,
}

impl PathStatus {
    /// Only complete paths count as reachable
    pub fn is_complete(self) -> bool {
        matches!(self, PathStatus::Complete)
    }
}

/// Pathfinding collaborator
pub trait PathQuery {
    /// Compute the path status between two world positions
    fn calculate_path(&self, from: Vec3, to: Vec3) -> PathStatus;
}

/// Movement collaborator owned by a single agent
pub trait Locomotion {
    /// Current world position of the agent
    fn position(&self) -> Vec3;

    /// Facing direction of the agent
    fn forward(&self) -> Vec3;

    /// Request movement toward a destination, superseding any previous request
    fn set_destination(&mut self, destination: Vec3);

    /// Remaining path distance, or `None` while unknown (no path or path pending)
    fn remaining_distance(&self) -> Option<f32>;

    /// Whether the agent currently stands on navigable ground
    fn is_on_navigable_surface(&self) -> bool;

    /// Distance at which the mover considers itself stopped
    fn stopping_distance(&self) -> f32 {
        0.0
    }
}

/// Reachability test: the agent must be on navigable ground and a complete
/// path must exist
pub fn is_reachable<L, P>(locomotion: &L, paths: &P, target: Vec3) -> bool
where
    L: Locomotion + ?Sized,
    P: PathQuery + ?Sized,
{
    if !locomotion.is_on_navigable_surface() {
        return false;
    }
    paths
        .calculate_path(locomotion.position(), target)
        .is_complete()
}

impl<T: PathQuery + ?Sized> PathQuery for std::sync::Arc<T> {
    fn calculate_path(&self, from: Vec3, to: Vec3) -> PathStatus {
        (**self).calculate_path(from, to)
    }
}

impl<T: PathQuery + ?Sized> PathQuery for &T {
    fn calculate_path(&self, from: Vec3, to: Vec3) -> PathStatus {
        (**self).calculate_path(from, to)
    }
}

impl<T: Locomotion + ?Sized> Locomotion for Box<T> {
    fn position(&self) -> Vec3 {
        (**self).position()
    }

    fn forward(&self) -> Vec3 {
        (**self).forward()
    }

    fn set_destination(&mut self, destination: Vec3) {
        (**self).set_destination(destination)
    }

    fn remaining_distance(&self) -> Option<f32> {
        (**self).remaining_distance()
    }

    fn is_on_navigable_surface(&self) -> bool {
        (**self).is_on_navigable_surface()
    }

    fn stopping_distance(&self) -> f32 {
        (**self).stopping_distance()
    }
}
