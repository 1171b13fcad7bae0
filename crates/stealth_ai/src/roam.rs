//! Node-to-node roaming with a visited memory
//!
//! The planner keeps a current target, a pre-selected queued target and the
//! set of nodes already visited. Candidate selection is bounded: random picks
//! are capped by [`RoamQuery::max_attempts`] and unreachable nodes are simply
//! skipped, so a planner that finds nothing just tries again next tick.

use glam::Vec3;
use rand::{Rng, RngCore};
use stealth_nav::{NodeId, SpatialGraph};
use std::collections::HashSet;

/// Area a roam is restricted to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoamScope {
    /// Window center, `None` for the whole map
    pub center: Option<Vec3>,
    pub radius: f32,
}

impl RoamScope {
    /// No restriction
    pub const WHOLE_MAP: Self = Self {
        center: None,
        radius: 0.0,
    };

    /// Nodes within `radius` of `center`
    pub fn around(center: Vec3, radius: f32) -> Self {
        Self {
            center: Some(center),
            radius,
        }
    }

    /// Whether a position is inside the window (3D distance, boundary inclusive)
    pub fn contains(&self, position: Vec3) -> bool {
        match self.center {
            Some(center) => position.distance_squared(center) <= self.radius * self.radius,
            None => true,
        }
    }
}

/// Everything candidate selection needs from the outside world
pub struct RoamQuery<'a> {
    pub graph: &'a SpatialGraph,
    pub scope: RoamScope,
    pub max_attempts: usize,
    pub rng: &'a mut dyn RngCore,
    pub reachable: &'a dyn Fn(Vec3) -> bool,
}

/// Roam working data
#[derive(Debug, Clone, Default)]
pub struct RoamPlanner {
    current: Option<NodeId>,
    queued: Option<NodeId>,
    visited: HashSet<NodeId>,
}

impl RoamPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget targets and visited nodes
    pub fn clear(&mut self) {
        self.current = None;
        self.queued = None;
        self.visited.clear();
    }

    pub fn current(&self) -> Option<NodeId> {
        self.current
    }

    pub fn queued(&self) -> Option<NodeId> {
        self.queued
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn is_visited(&self, id: NodeId) -> bool {
        self.visited.contains(&id)
    }

    pub fn mark_visited(&mut self, id: NodeId) {
        self.visited.insert(id);
    }

    /// Mark every node within `radius` (horizontal) of `position` as visited
    pub fn sweep(&mut self, graph: &SpatialGraph, position: Vec3, radius: f32) -> usize {
        let before = self.visited.len();
        self.visited
            .extend(graph.nodes_within_radius(position, radius).into_iter().map(|n| n.id));
        self.visited.len() - before
    }

    /// Clear the visited set once every node in scope has been visited
    pub fn relieve_stall(&mut self, graph: &SpatialGraph, scope: RoamScope) -> bool {
        let (total, visited) = graph
            .all_nodes()
            .iter()
            .filter(|n| scope.contains(n.position))
            .fold((0usize, 0usize), |(total, visited), n| {
                (total + 1, visited + usize::from(self.visited.contains(&n.id)))
            });

        if total > 0 && visited >= total {
            log::debug!("Roam visited all {} nodes in scope, resetting memory", total);
            self.visited.clear();
            return true;
        }
        false
    }

    /// Up to `max_attempts` uniform draws over all nodes; the first unvisited,
    /// in-scope, reachable node wins
    pub fn pick_random_candidate(&self, query: &mut RoamQuery<'_>) -> Option<NodeId> {
        let graph = query.graph;
        let nodes = graph.all_nodes();
        if nodes.is_empty() {
            return None;
        }

        for _ in 0..query.max_attempts {
            let node = &nodes[query.rng.gen_range(0..nodes.len())];
            if self.visited.contains(&node.id) || !query.scope.contains(node.position) {
                continue;
            }
            if (query.reachable)(node.position) {
                return Some(node.id);
            }
        }
        None
    }

    /// Nearest valid follow-up to `from`, preferring its neighbors
    ///
    /// When nothing qualifies the visited set is cleared and a random
    /// candidate is drawn instead.
    pub fn pick_next_queued(&mut self, from: NodeId, query: &mut RoamQuery<'_>) -> Option<NodeId> {
        let graph = query.graph;
        let origin = graph.node(from)?;

        let options: Vec<_> = if origin.has_neighbors() {
            graph.neighbors_of(from).collect()
        } else {
            graph.all_nodes().iter().collect()
        };

        let mut best: Option<(NodeId, f32)> = None;
        for node in options {
            if node.id == from || self.visited.contains(&node.id) || !query.scope.contains(node.position) {
                continue;
            }
            let distance = node.position.distance_squared(origin.position);
            let closer = best.map_or(true, |(_, best_distance)| distance < best_distance);
            if closer && (query.reachable)(node.position) {
                best = Some((node.id, distance));
            }
        }

        match best {
            Some((id, _)) => Some(id),
            None => {
                self.visited.clear();
                self.pick_random_candidate(query)
            }
        }
    }

    /// Choose a current target and a queued follow-up; returns the new target
    pub fn initialize(&mut self, query: &mut RoamQuery<'_>) -> Option<NodeId> {
        let candidate = self.pick_random_candidate(query).or_else(|| {
            query
                .graph
                .random_node(&mut *query.rng)
                .ok()
                .map(|node| node.id)
        });

        self.current = candidate;
        self.queued = match candidate {
            Some(id) => self.pick_next_queued(id, query),
            None => None,
        };
        self.current
    }

    /// Current target reached: remember it and move on; returns the new target
    pub fn advance(&mut self, query: &mut RoamQuery<'_>) -> Option<NodeId> {
        if let Some(current) = self.current {
            self.visited.insert(current);
        }

        match self.queued.take() {
            Some(next) => {
                self.current = Some(next);
                self.queued = self.pick_next_queued(next, query);
                self.current
            }
            None => self.initialize(query),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// A and B linked both ways, C unlinked but closer to A than B is
    fn abc() -> (SpatialGraph, NodeId, NodeId, NodeId) {
        let mut builder = SpatialGraph::builder();
        let a = builder.add_node("A", Vec3::new(0.0, 0.0, 0.0));
        let b = builder.add_node("B", Vec3::new(10.0, 0.0, 0.0));
        let c = builder.add_node("C", Vec3::new(3.0, 0.0, 0.0));
        builder.link_bidirectional(a, b);
        (builder.build().unwrap(), a, b, c)
    }

    fn line(count: usize) -> SpatialGraph {
        let mut builder = SpatialGraph::builder();
        let ids: Vec<_> = (0..count)
            .map(|i| builder.add_node(format!("n{i}"), Vec3::new(i as f32 * 10.0, 0.0, 0.0)))
            .collect();
        for pair in ids.windows(2) {
            builder.link_bidirectional(pair[0], pair[1]);
        }
        builder.build().unwrap()
    }

    fn open(_: Vec3) -> bool {
        true
    }

    #[test]
    fn test_neighbor_locality() {
        let (graph, a, b, _c) = abc();
        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut planner = RoamPlanner::new();
            let mut query = RoamQuery {
                graph: &graph,
                scope: RoamScope::WHOLE_MAP,
                max_attempts: 12,
                rng: &mut rng,
                reachable: &open,
            };
            let current = planner.initialize(&mut query);
            assert!(current.is_some());
            if current == Some(a) {
                // C is nearer to A, but A's neighbor list wins
                assert_eq!(planner.queued(), Some(b));
            }
            if current == Some(b) {
                assert_eq!(planner.queued(), Some(a));
            }
        }
    }

    #[test]
    fn test_isolated_node_uses_all_nodes() {
        let (graph, a, _b, c) = abc();
        let mut rng = StdRng::seed_from_u64(1);
        let mut planner = RoamPlanner::new();
        let mut query = RoamQuery {
            graph: &graph,
            scope: RoamScope::WHOLE_MAP,
            max_attempts: 12,
            rng: &mut rng,
            reachable: &open,
        };
        // C has no neighbors, so the nearest other node is picked
        assert_eq!(planner.pick_next_queued(c, &mut query), Some(a));
    }

    #[test]
    fn test_unreachable_nodes_skipped() {
        let (graph, _a, b, _c) = abc();
        let only_b = |p: Vec3| p == Vec3::new(10.0, 0.0, 0.0);
        for seed in 0..16 {
            let mut rng = StdRng::seed_from_u64(seed);
            let planner = RoamPlanner::new();
            let mut query = RoamQuery {
                graph: &graph,
                scope: RoamScope::WHOLE_MAP,
                max_attempts: 12,
                rng: &mut rng,
                reachable: &only_b,
            };
            let pick = planner.pick_random_candidate(&mut query);
            assert!(pick.is_none() || pick == Some(b));
        }
    }

    #[test]
    fn test_attempts_are_bounded() {
        let graph = line(5);
        let calls = std::cell::Cell::new(0);
        let never = |_: Vec3| {
            calls.set(calls.get() + 1);
            false
        };
        let mut rng = StdRng::seed_from_u64(3);
        let planner = RoamPlanner::new();
        let mut query = RoamQuery {
            graph: &graph,
            scope: RoamScope::WHOLE_MAP,
            max_attempts: 12,
            rng: &mut rng,
            reachable: &never,
        };
        assert_eq!(planner.pick_random_candidate(&mut query), None);
        assert_eq!(calls.get(), 12);
    }

    #[test]
    fn test_fallback_to_unconstrained_pick() {
        let graph = line(3);
        let never = |_: Vec3| false;
        let mut rng = StdRng::seed_from_u64(9);
        let mut planner = RoamPlanner::new();
        let mut query = RoamQuery {
            graph: &graph,
            scope: RoamScope::WHOLE_MAP,
            max_attempts: 4,
            rng: &mut rng,
            reachable: &never,
        };
        assert!(planner.initialize(&mut query).is_some());
        assert_eq!(planner.queued(), None);
    }

    #[test]
    fn test_scope_filters_candidates() {
        let graph = line(10);
        let mut rng = StdRng::seed_from_u64(5);
        let planner = RoamPlanner::new();
        let scope = RoamScope::around(Vec3::ZERO, 15.0);
        let mut query = RoamQuery {
            graph: &graph,
            scope,
            max_attempts: 200,
            rng: &mut rng,
            reachable: &open,
        };
        for _ in 0..20 {
            let id = planner.pick_random_candidate(&mut query).unwrap();
            assert!(scope.contains(graph.position(id).unwrap()));
        }
    }

    #[test]
    fn test_advance_promotes_queued() {
        let graph = line(4);
        let mut rng = StdRng::seed_from_u64(11);
        let mut planner = RoamPlanner::new();
        let mut query = RoamQuery {
            graph: &graph,
            scope: RoamScope::WHOLE_MAP,
            max_attempts: 12,
            rng: &mut rng,
            reachable: &open,
        };
        let first = planner.initialize(&mut query).unwrap();
        let queued = planner.queued().unwrap();
        let next = planner.advance(&mut query).unwrap();
        assert_eq!(next, queued);
        assert!(planner.is_visited(first));
    }

    #[test]
    fn test_stall_relief_after_full_visit() {
        let graph = line(6);
        let mut planner = RoamPlanner::new();
        for node in graph.all_nodes() {
            planner.mark_visited(node.id);
        }
        let mut rng = StdRng::seed_from_u64(2);
        {
            let mut query = RoamQuery {
                graph: &graph,
                scope: RoamScope::WHOLE_MAP,
                max_attempts: 12,
                rng: &mut rng,
                reachable: &open,
            };
            assert_eq!(planner.pick_random_candidate(&mut query), None);
        }

        assert!(planner.relieve_stall(&graph, RoamScope::WHOLE_MAP));
        assert_eq!(planner.visited_count(), 0);

        let mut query = RoamQuery {
            graph: &graph,
            scope: RoamScope::WHOLE_MAP,
            max_attempts: 12,
            rng: &mut rng,
            reachable: &open,
        };
        assert!(planner.pick_random_candidate(&mut query).is_some());
    }

    #[test]
    fn test_stall_relief_counts_scope_only() {
        let graph = line(6);
        let scope = RoamScope::around(Vec3::ZERO, 12.0);
        let mut planner = RoamPlanner::new();
        planner.mark_visited(NodeId(0));
        assert!(!planner.relieve_stall(&graph, scope));
        planner.mark_visited(NodeId(1));
        assert!(planner.relieve_stall(&graph, scope));
    }

    #[test]
    fn test_sweep_marks_nearby() {
        let graph = line(5);
        let mut planner = RoamPlanner::new();
        assert_eq!(planner.sweep(&graph, Vec3::new(5.0, 3.0, 0.0), 6.0), 2);
        assert!(planner.is_visited(NodeId(0)));
        assert!(planner.is_visited(NodeId(1)));
        assert!(!planner.is_visited(NodeId(2)));
    }

    #[test]
    fn test_empty_graph() {
        let graph = SpatialGraph::default();
        let mut rng = StdRng::seed_from_u64(0);
        let mut planner = RoamPlanner::new();
        let mut query = RoamQuery {
            graph: &graph,
            scope: RoamScope::WHOLE_MAP,
            max_attempts: 12,
            rng: &mut rng,
            reachable: &open,
        };
        assert_eq!(planner.initialize(&mut query), None);
        assert!(!planner.relieve_stall(&graph, RoamScope::WHOLE_MAP));
    }
}
