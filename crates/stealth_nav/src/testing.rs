//! Stub collaborators for tests

use crate::locomotion::{Locomotion, PathQuery, PathStatus};
use glam::Vec3;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Path query that reports every target as reachable
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenPaths;

impl PathQuery for OpenPaths {
    fn calculate_path(&self, _from: Vec3, _to: Vec3) -> PathStatus {
        PathStatus::Complete
    }
}

/// Path query that rejects targets inside listed X/Z discs
#[derive(Debug, Default)]
pub struct BlockedPaths {
    blocked: Vec<(Vec3, f32)>,
    calls: AtomicUsize,
}

impl BlockedPaths {
    /// Create with no blocked areas
    pub fn new() -> Self {
        Self::default()
    }

    /// Block targets within `radius` of `center`
    pub fn block(mut self, center: Vec3, radius: f32) -> Self {
        self.blocked.push((center, radius));
        self
    }

    /// Number of path calculations performed
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl PathQuery for BlockedPaths {
    fn calculate_path(&self, _from: Vec3, to: Vec3) -> PathStatus {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let blocked = self
            .blocked
            .iter()
            .any(|(center, radius)| crate::graph::horizontal_distance_squared(*center, to) <= radius * radius);
        if blocked {
            PathStatus::Invalid
        } else {
            PathStatus::Complete
        }
    }
}

/// Locomotion that records destinations and teleports on request
#[derive(Debug, Clone)]
pub struct StubLocomotion {
    /// Current position
    pub position: Vec3,
    /// Facing direction
    pub forward: Vec3,
    /// Every destination requested, in order
    pub destinations: Vec<Vec3>,
    /// Reported remaining distance
    pub remaining: Option<f32>,
    /// Reported navigable-surface flag
    pub on_surface: bool,
}

impl StubLocomotion {
    /// Create at a position facing +Z
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            forward: Vec3::Z,
            destinations: Vec::new(),
            remaining: None,
            on_surface: true,
        }
    }

    /// Most recent destination
    pub fn last_destination(&self) -> Option<Vec3> {
        self.destinations.last().copied()
    }

    /// Move straight to the last requested destination
    pub fn arrive(&mut self) {
        if let Some(destination) = self.last_destination() {
            self.position = destination;
        }
    }
}

impl Locomotion for StubLocomotion {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn forward(&self) -> Vec3 {
        self.forward
    }

    fn set_destination(&mut self, destination: Vec3) {
        self.destinations.push(destination);
    }

    fn remaining_distance(&self) -> Option<f32> {
        self.remaining
    }

    fn is_on_navigable_surface(&self) -> bool {
        self.on_surface
    }
}
