//! Spatial and physics queries (overlap, raycast)
//!
//! Sensors only depend on the [`PhysicsQuery`] trait. [`SceneQuery`] is a
//! small brute-force implementation with sphere bodies and box obstacles,
//! used by the headless runtime and tests.

use crate::ids::EntityId;
use crate::layers::{LayerMask, QueryLayer};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Result of an overlap query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryHit {
    /// Entity whose collider overlapped
    pub entity: EntityId,
    /// Entity position
    pub position: Vec3,
}

/// Physics/query collaborator
pub trait PhysicsQuery {
    /// All entities on `layers` whose colliders intersect the sphere
    fn overlap_sphere(&self, center: Vec3, radius: f32, layers: LayerMask) -> Vec<QueryHit>;

    /// Whether a ray hits anything on `layers` within `max_distance`
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32, layers: LayerMask) -> bool;
}

/// Sphere collider on a dynamic entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneBody {
    pub entity: EntityId,
    pub position: Vec3,
    pub radius: f32,
    pub layer: QueryLayer,
}

/// Axis-aligned box obstacle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub min: Vec3,
    pub max: Vec3,
    pub layer: QueryLayer,
    /// Disabled obstacles are skipped by queries (open doors)
    pub enabled: bool,
}

impl Obstacle {
    /// Create an enabled obstacle
    pub fn new(min: Vec3, max: Vec3, layer: QueryLayer) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
            layer,
            enabled: true,
        }
    }

    /// Slab test; returns the entry distance along a unit-length direction
    fn ray_entry(&self, origin: Vec3, direction: Vec3) -> Option<f32> {
        let mut t_min = 0.0f32;
        let mut t_max = f32::MAX;

        for axis in 0..3 {
            let o = origin[axis];
            let d = direction[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);

            if d.abs() < 1e-8 {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / d;
            let mut t0 = (lo - o) * inv;
            let mut t1 = (hi - o) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }

        Some(t_min)
    }
}

/// Brute-force query world
#[derive(Debug, Clone, Default)]
pub struct SceneQuery {
    bodies: Vec<SceneBody>,
    obstacles: Vec<Obstacle>,
}

impl SceneQuery {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sphere body
    pub fn add_body(&mut self, entity: EntityId, position: Vec3, radius: f32, layer: QueryLayer) {
        self.bodies.push(SceneBody {
            entity,
            position,
            radius,
            layer,
        });
    }

    /// Remove a body
    pub fn remove_body(&mut self, entity: EntityId) {
        self.bodies.retain(|b| b.entity != entity);
    }

    /// Move a body; returns false if it is unknown
    pub fn set_body_position(&mut self, entity: EntityId, position: Vec3) -> bool {
        match self.bodies.iter_mut().find(|b| b.entity == entity) {
            Some(body) => {
                body.position = position;
                true
            }
            None => false,
        }
    }

    /// Add a box obstacle and return its index
    pub fn add_obstacle(&mut self, obstacle: Obstacle) -> usize {
        self.obstacles.push(obstacle);
        self.obstacles.len() - 1
    }

    /// Enable or disable an obstacle
    pub fn set_obstacle_enabled(&mut self, index: usize, enabled: bool) {
        if let Some(obstacle) = self.obstacles.get_mut(index) {
            obstacle.enabled = enabled;
        }
    }

    /// Registered obstacles
    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }
}

impl PhysicsQuery for SceneQuery {
    fn overlap_sphere(&self, center: Vec3, radius: f32, layers: LayerMask) -> Vec<QueryHit> {
        self.bodies
            .iter()
            .filter(|b| layers.contains(b.layer))
            .filter(|b| b.position.distance(center) <= radius + b.radius)
            .map(|b| QueryHit {
                entity: b.entity,
                position: b.position,
            })
            .collect()
    }

    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32, layers: LayerMask) -> bool {
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO {
            return false;
        }
        self.obstacles
            .iter()
            .filter(|o| o.enabled && layers.contains(o.layer))
            .filter_map(|o| o.ray_entry(origin, direction))
            .any(|t| t <= max_distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wall_scene() -> SceneQuery {
        let mut scene = SceneQuery::new();
        scene.add_body(EntityId(1), Vec3::new(10.0, 0.0, 0.0), 0.5, QueryLayer::TARGET);
        scene.add_body(EntityId(2), Vec3::new(3.0, 0.0, 0.0), 0.5, QueryLayer::ENEMIES);
        scene.add_obstacle(Obstacle::new(
            Vec3::new(5.0, -1.0, -1.0),
            Vec3::new(6.0, 1.0, 1.0),
            QueryLayer::OBSTRUCTION,
        ));
        scene
    }

    #[test]
    fn test_overlap_filters_layers() {
        let scene = wall_scene();
        let hits = scene.overlap_sphere(Vec3::ZERO, 20.0, LayerMask::single(QueryLayer::TARGET));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].entity, EntityId(1));

        let all = scene.overlap_sphere(Vec3::ZERO, 20.0, LayerMask::ALL);
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_overlap_counts_body_radius() {
        let scene = wall_scene();
        let mask = LayerMask::single(QueryLayer::TARGET);
        assert_eq!(scene.overlap_sphere(Vec3::ZERO, 9.5, mask).len(), 1);
        assert!(scene.overlap_sphere(Vec3::ZERO, 9.4, mask).is_empty());
    }

    #[test]
    fn test_raycast_hits_wall() {
        let scene = wall_scene();
        let mask = LayerMask::single(QueryLayer::OBSTRUCTION);
        assert!(scene.raycast(Vec3::ZERO, Vec3::X, 10.0, mask));
        // Clipped before the wall
        assert!(!scene.raycast(Vec3::ZERO, Vec3::X, 4.0, mask));
        // Pointing away
        assert!(!scene.raycast(Vec3::ZERO, -Vec3::X, 10.0, mask));
        // Passing beside it
        assert!(!scene.raycast(Vec3::new(0.0, 0.0, 3.0), Vec3::X, 10.0, mask));
    }

    #[test]
    fn test_disabled_obstacle() {
        let mut scene = wall_scene();
        scene.set_obstacle_enabled(0, false);
        assert!(!scene.raycast(Vec3::ZERO, Vec3::X, 10.0, LayerMask::ALL));
    }

    #[test]
    fn test_move_body() {
        let mut scene = wall_scene();
        assert!(scene.set_body_position(EntityId(1), Vec3::new(0.0, 0.0, 2.0)));
        assert!(!scene.set_body_position(EntityId(99), Vec3::ZERO));
        let hits = scene.overlap_sphere(Vec3::ZERO, 3.0, LayerMask::single(QueryLayer::TARGET));
        assert_eq!(hits[0].position, Vec3::new(0.0, 0.0, 2.0));
    }
}
