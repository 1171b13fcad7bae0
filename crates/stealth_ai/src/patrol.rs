//! Fixed patrol routes

use serde::{Deserialize, Serialize};
use stealth_nav::{NodeId, SpatialGraph};

/// Ordered, cyclic list of waypoints
///
/// Entries may be `None` (a waypoint removed from the level) or point at an
/// unknown node; both are skipped while patrolling.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatrolRoute {
    waypoints: Vec<Option<NodeId>>,
    #[serde(skip)]
    index: usize,
}

impl PatrolRoute {
    pub fn new(waypoints: Vec<Option<NodeId>>) -> Self {
        Self { waypoints, index: 0 }
    }

    /// Route with every entry present
    pub fn from_nodes(nodes: impl IntoIterator<Item = NodeId>) -> Self {
        Self::new(nodes.into_iter().map(Some).collect())
    }

    pub fn waypoints(&self) -> &[Option<NodeId>] {
        &self.waypoints
    }

    /// Replace the waypoints; the index restarts at the first entry
    pub fn set_waypoints(&mut self, waypoints: Vec<Option<NodeId>>) {
        self.waypoints = waypoints;
        self.index = 0;
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Whether at least one entry resolves to a node in `graph`
    pub fn has_valid_waypoint(&self, graph: &SpatialGraph) -> bool {
        self.waypoints.iter().flatten().any(|id| graph.node(*id).is_some())
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Entry at the cyclic index, `None` if the route is empty
    pub fn current(&self) -> Option<Option<NodeId>> {
        self.waypoints.get(self.index).copied()
    }

    /// Step to the next entry, wrapping at the end
    pub fn advance(&mut self) {
        if !self.waypoints.is_empty() {
            self.index = (self.index + 1) % self.waypoints.len();
        }
    }

    /// Keep the index inside the route after edits
    pub fn clamp_index(&mut self) {
        if self.index >= self.waypoints.len() {
            self.index = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn graph() -> SpatialGraph {
        let mut builder = SpatialGraph::builder();
        builder.add_node("a", Vec3::ZERO);
        builder.add_node("b", Vec3::X);
        builder.build().unwrap()
    }

    #[test]
    fn test_cyclic_advance() {
        let mut route = PatrolRoute::from_nodes([NodeId(0), NodeId(1)]);
        assert_eq!(route.current(), Some(Some(NodeId(0))));
        route.advance();
        assert_eq!(route.current(), Some(Some(NodeId(1))));
        route.advance();
        assert_eq!(route.index(), 0);
    }

    #[test]
    fn test_validity() {
        let graph = graph();
        assert!(!PatrolRoute::default().has_valid_waypoint(&graph));
        assert!(!PatrolRoute::new(vec![None, Some(NodeId(7))]).has_valid_waypoint(&graph));
        assert!(PatrolRoute::new(vec![None, Some(NodeId(1))]).has_valid_waypoint(&graph));
    }

    #[test]
    fn test_empty_route_does_not_advance() {
        let mut route = PatrolRoute::default();
        route.advance();
        assert_eq!(route.current(), None);
    }

    #[test]
    fn test_clamp_after_edit() {
        let mut route = PatrolRoute::from_nodes([NodeId(0), NodeId(1), NodeId(0)]);
        route.advance();
        route.advance();
        route.waypoints.truncate(1);
        route.clamp_index();
        assert_eq!(route.index(), 0);
    }
}
