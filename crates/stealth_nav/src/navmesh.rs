//! Grid navigation mesh and a simple path-following agent
//!
//! These are reference collaborators: [`NavMesh`] answers reachability
//! queries with A* over a walkable cell grid, and [`NavAgent`] follows the
//! resulting paths. Game integrations can substitute their own engine's
//! navigation through the [`PathQuery`] and [`Locomotion`] traits.

use crate::locomotion::{Locomotion, PathQuery, PathStatus};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;

/// Slack on cell edges so points exactly on the outer border still resolve
const EDGE_EPSILON: f32 = 1e-4;

/// One square of the grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavCell {
    pub center: Vec3,
    /// Traversal cost multiplier (higher = avoided)
    pub cost: f32,
    pub walkable: bool,
}

/// Flat grid of walkable cells on the X/Z plane
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavMesh {
    origin: Vec3,
    cell_size: f32,
    cols: usize,
    rows: usize,
    cells: Vec<NavCell>,
}

impl NavMesh {
    /// Grid covering `[origin.x, origin.x + width]` by `[origin.z, origin.z + depth]`
    pub fn create_grid(origin: Vec3, width: f32, depth: f32, cell_size: f32) -> Self {
        let cell_size = cell_size.max(f32::EPSILON);
        let cols = (width / cell_size).ceil().max(1.0) as usize;
        let rows = (depth / cell_size).ceil().max(1.0) as usize;

        let cells = (0..rows)
            .flat_map(|row| (0..cols).map(move |col| (row, col)))
            .map(|(row, col)| NavCell {
                center: origin + Vec3::new((col as f32 + 0.5) * cell_size, 0.0, (row as f32 + 0.5) * cell_size),
                cost: 1.0,
                walkable: true,
            })
            .collect();

        Self {
            origin,
            cell_size,
            cols,
            rows,
            cells,
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// `(columns, rows)`
    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    pub fn cells(&self) -> &[NavCell] {
        &self.cells
    }

    pub fn cell(&self, index: usize) -> Option<&NavCell> {
        self.cells.get(index)
    }

    fn axis_index(&self, offset: f32, count: usize) -> Option<usize> {
        let extent = count as f32 * self.cell_size;
        if offset < -EDGE_EPSILON || offset > extent + EDGE_EPSILON {
            return None;
        }
        Some(((offset / self.cell_size).floor().max(0.0) as usize).min(count - 1))
    }

    /// Index of the cell under `point`, walkable or not
    pub fn cell_index(&self, point: Vec3) -> Option<usize> {
        let col = self.axis_index(point.x - self.origin.x, self.cols)?;
        let row = self.axis_index(point.z - self.origin.z, self.rows)?;
        Some(row * self.cols + col)
    }

    /// Walkable cell under `point`
    pub fn find_cell(&self, point: Vec3) -> Option<usize> {
        self.cell_index(point).filter(|&index| self.cells[index].walkable)
    }

    fn neighbors(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        let (row, col) = (index / self.cols, index % self.cols);
        let left = (col > 0).then(|| index - 1);
        let right = (col + 1 < self.cols).then(|| index + 1);
        let down = (row > 0).then(|| index - self.cols);
        let up = (row + 1 < self.rows).then(|| index + self.cols);
        [left, right, down, up]
            .into_iter()
            .flatten()
            .filter(move |&n| self.cells[n].walkable)
    }

    /// Shortest path from `start` to `end`, `None` when either end is off the
    /// walkable grid or no route connects them
    pub fn find_path(&self, start: Vec3, end: Vec3) -> Option<NavPath> {
        let from = self.find_cell(start)?;
        let to = self.find_cell(end)?;

        let mut waypoints = vec![start];
        if from != to {
            let cells = self.search(from, to)?;
            let interior = &cells[1..cells.len() - 1];
            waypoints.extend(interior.iter().map(|&index| self.cells[index].center));
        }
        waypoints.push(end);
        Some(NavPath::new(waypoints))
    }

    /// A* over cell centers; returns the cell sequence including both ends
    fn search(&self, start: usize, goal: usize) -> Option<Vec<usize>> {
        let goal_center = self.cells[goal].center;
        let heuristic = |index: usize| self.cells[index].center.distance(goal_center);

        let mut best = vec![f32::INFINITY; self.cells.len()];
        let mut parent: Vec<Option<usize>> = vec![None; self.cells.len()];
        let mut frontier = BinaryHeap::new();

        best[start] = 0.0;
        frontier.push(Frontier {
            index: start,
            estimate: heuristic(start),
        });

        while let Some(Frontier { index, estimate }) = frontier.pop() {
            if index == goal {
                let mut cells = vec![goal];
                let mut cursor = goal;
                while let Some(previous) = parent[cursor] {
                    cells.push(previous);
                    cursor = previous;
                }
                cells.reverse();
                return Some(cells);
            }
            // Stale heap entry
            if estimate > best[index] + heuristic(index) + EDGE_EPSILON {
                continue;
            }

            let here = self.cells[index].center;
            for next in self.neighbors(index) {
                let cell = &self.cells[next];
                let cost = best[index] + here.distance(cell.center) * cell.cost;
                if cost < best[next] {
                    best[next] = cost;
                    parent[next] = Some(index);
                    frontier.push(Frontier {
                        index: next,
                        estimate: cost + heuristic(next),
                    });
                }
            }
        }

        None
    }

    pub fn set_walkable(&mut self, index: usize, walkable: bool) {
        if let Some(cell) = self.cells.get_mut(index) {
            cell.walkable = walkable;
        }
    }

    /// Block every cell whose center lies within the X/Z box `[min, max]`;
    /// returns how many cells changed
    pub fn block_area(&mut self, min: Vec3, max: Vec3) -> usize {
        let mut blocked = 0;
        for cell in self.cells.iter_mut().filter(|cell| cell.walkable) {
            let c = cell.center;
            if (min.x..=max.x).contains(&c.x) && (min.z..=max.z).contains(&c.z) {
                cell.walkable = false;
                blocked += 1;
            }
        }
        blocked
    }

    pub fn set_cost(&mut self, index: usize, cost: f32) {
        if let Some(cell) = self.cells.get_mut(index) {
            cell.cost = cost;
        }
    }
}

/// Open-set entry, ordered so the heap pops the lowest estimate first
#[derive(Debug, Clone, Copy)]
struct Frontier {
    index: usize,
    estimate: f32,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other.estimate.total_cmp(&self.estimate)
    }
}

impl PathQuery for NavMesh {
    fn calculate_path(&self, from: Vec3, to: Vec3) -> PathStatus {
        if self.find_cell(from).is_none() {
            return PathStatus::Invalid;
        }
        if self.find_cell(to).is_none() {
            return PathStatus::Partial;
        }
        if self.find_path(from, to).is_some() {
            PathStatus::Complete
        } else {
            PathStatus::Invalid
        }
    }
}

/// Polyline an agent walks, with a cursor on the next waypoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NavPath {
    pub waypoints: Vec<Vec3>,
    /// Index of the waypoint being walked to
    pub current_index: usize,
}

impl NavPath {
    pub fn new(waypoints: Vec<Vec3>) -> Self {
        Self {
            waypoints,
            current_index: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Every waypoint has been passed
    pub fn is_complete(&self) -> bool {
        self.current_index >= self.waypoints.len()
    }

    pub fn current_waypoint(&self) -> Option<Vec3> {
        self.waypoints.get(self.current_index).copied()
    }

    pub fn destination(&self) -> Option<Vec3> {
        self.waypoints.last().copied()
    }

    pub fn advance(&mut self) {
        self.current_index = (self.current_index + 1).min(self.waypoints.len());
    }

    /// Distance from `position` through the remaining waypoints
    pub fn remaining_distance_from(&self, position: Vec3) -> f32 {
        let rest = &self.waypoints[self.current_index.min(self.waypoints.len())..];
        let Some(&next) = rest.first() else {
            return 0.0;
        };
        position.distance(next) + polyline_length(rest)
    }

    pub fn total_length(&self) -> f32 {
        polyline_length(&self.waypoints)
    }
}

fn polyline_length(points: &[Vec3]) -> f32 {
    points.windows(2).map(|pair| pair[0].distance(pair[1])).sum()
}

/// Path-following mover on a [`NavMesh`]
#[derive(Debug, Clone)]
pub struct NavAgent {
    mesh: Arc<NavMesh>,
    pub position: Vec3,
    /// Unit facing on the X/Z plane
    pub forward: Vec3,
    pub path: Option<NavPath>,
    /// Units per second
    pub speed: f32,
    /// Distance at which a waypoint counts as passed
    pub arrival_threshold: f32,
    pub stopping_distance: f32,
}

impl NavAgent {
    pub fn new(mesh: Arc<NavMesh>, position: Vec3, speed: f32) -> Self {
        Self {
            mesh,
            position,
            forward: Vec3::Z,
            path: None,
            speed,
            arrival_threshold: 0.1,
            stopping_distance: 0.0,
        }
    }

    pub fn with_forward(mut self, forward: Vec3) -> Self {
        self.forward = forward.normalize_or_zero();
        self
    }

    pub fn mesh(&self) -> &Arc<NavMesh> {
        &self.mesh
    }

    /// Still has waypoints ahead
    pub fn is_moving(&self) -> bool {
        self.path.as_ref().is_some_and(|path| !path.is_complete())
    }

    pub fn stop(&mut self) {
        self.path = None;
    }

    /// Walk `speed * delta_time` along the path, passing waypoints as needed
    pub fn update(&mut self, delta_time: f32) {
        let Some(path) = self.path.as_mut() else {
            return;
        };

        let mut budget = self.speed * delta_time;
        while budget > 0.0 {
            let Some(waypoint) = path.current_waypoint() else {
                break;
            };
            let offset = waypoint - self.position;
            let distance = offset.length();
            if distance <= self.arrival_threshold {
                path.advance();
                continue;
            }

            let travel = distance.min(budget);
            self.position += offset * (travel / distance);
            budget -= travel;

            let heading = Vec3::new(offset.x, 0.0, offset.z).normalize_or_zero();
            if heading != Vec3::ZERO {
                self.forward = heading;
            }
        }
    }

    /// Path finished or none set
    pub fn has_arrived(&self) -> bool {
        self.path.as_ref().map_or(true, NavPath::is_complete)
    }
}

impl Locomotion for NavAgent {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn forward(&self) -> Vec3 {
        self.forward
    }

    /// Replans from the current position; an unreachable destination leaves
    /// the agent without a path
    fn set_destination(&mut self, destination: Vec3) {
        self.path = self.mesh.find_path(self.position, destination);
    }

    fn remaining_distance(&self) -> Option<f32> {
        let path = self.path.as_ref()?;
        Some(path.remaining_distance_from(self.position))
    }

    fn is_on_navigable_surface(&self) -> bool {
        self.mesh.find_cell(self.position).is_some()
    }

    fn stopping_distance(&self) -> f32 {
        self.stopping_distance
    }
}
