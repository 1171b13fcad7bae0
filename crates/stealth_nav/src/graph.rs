//! Waypoint graph used for patrol, roam and investigate movement
//!
//! The graph is built once when a level loads and is read-only afterwards.
//! Nodes reference their neighbors by [`NodeId`]; only the graph owns nodes.

use crate::error::{GraphError, Result};
use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifier of a node within its owning graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A named, positioned waypoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Identifier inside the owning graph
    pub id: NodeId,
    /// Authoring name
    pub name: String,
    /// World position
    pub position: Vec3,
    /// Explicit neighbor links (order irrelevant)
    pub neighbors: Vec<NodeId>,
}

impl Node {
    /// Whether this node has explicit neighbor links
    pub fn has_neighbors(&self) -> bool {
        !self.neighbors.is_empty()
    }
}

/// Squared distance on the X/Z plane, ignoring height
#[inline]
pub fn horizontal_distance_squared(a: Vec3, b: Vec3) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    dx * dx + dz * dz
}

/// Immutable set of waypoints for one level
#[derive(Debug, Clone, Default)]
pub struct SpatialGraph {
    nodes: Vec<Node>,
    by_name: HashMap<String, NodeId>,
}

impl SpatialGraph {
    /// Start building a graph
    pub fn builder() -> GraphBuilder {
        GraphBuilder::new()
    }

    /// All nodes in insertion order
    pub fn all_nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph holds no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Look up a node by authoring name
    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.by_name.get(name).and_then(|id| self.node(*id))
    }

    /// Resolve a node name to its id
    pub fn resolve(&self, name: &str) -> Result<NodeId> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::UnknownName(name.to_string()))
    }

    /// Position of a node
    pub fn position(&self, id: NodeId) -> Option<Vec3> {
        self.node(id).map(|n| n.position)
    }

    /// Explicit neighbors of a node, resolved
    pub fn neighbors_of(&self, id: NodeId) -> impl Iterator<Item = &Node> + '_ {
        self.node(id)
            .into_iter()
            .flat_map(|n| n.neighbors.iter())
            .filter_map(move |neighbor| self.node(*neighbor))
    }

    /// Nodes whose horizontal distance to `center` is at most `radius`
    ///
    /// Returns an empty set on an empty graph.
    pub fn nodes_within_radius(&self, center: Vec3, radius: f32) -> Vec<&Node> {
        let radius_sq = radius * radius;
        self.nodes
            .iter()
            .filter(|n| horizontal_distance_squared(n.position, center) <= radius_sq)
            .collect()
    }

    /// A uniformly chosen node
    pub fn random_node<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&Node> {
        if self.nodes.is_empty() {
            return Err(GraphError::Empty);
        }
        let index = rng.gen_range(0..self.nodes.len());
        Ok(&self.nodes[index])
    }

    fn rebuild_name_index(&mut self) {
        self.by_name = self
            .nodes
            .iter()
            .map(|n| (n.name.clone(), n.id))
            .collect();
    }
}

/// Level-load time construction of a [`SpatialGraph`]
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<Node>,
    links: Vec<(NodeId, NodeId)>,
}

impl GraphBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and return its id
    pub fn add_node(&mut self, name: impl Into<String>, position: Vec3) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            id,
            name: name.into(),
            position,
            neighbors: Vec::new(),
        });
        id
    }

    /// Add a one-way neighbor link from `from` to `to`
    pub fn link(&mut self, from: NodeId, to: NodeId) -> &mut Self {
        self.links.push((from, to));
        self
    }

    /// Add neighbor links in both directions
    pub fn link_bidirectional(&mut self, a: NodeId, b: NodeId) -> &mut Self {
        self.links.push((a, b));
        self.links.push((b, a));
        self
    }

    /// Validate links and freeze the graph
    pub fn build(mut self) -> Result<SpatialGraph> {
        let count = self.nodes.len();
        for (from, to) in std::mem::take(&mut self.links) {
            for id in [from, to] {
                if id.index() >= count {
                    return Err(GraphError::UnknownNode(id));
                }
            }
            if from == to {
                continue;
            }
            let neighbors = &mut self.nodes[from.index()].neighbors;
            if !neighbors.contains(&to) {
                neighbors.push(to);
            }
        }

        let mut graph = SpatialGraph {
            nodes: self.nodes,
            by_name: HashMap::new(),
        };
        graph.rebuild_name_index();
        if graph.by_name.len() != graph.nodes.len() {
            let mut seen = std::collections::HashSet::new();
            for node in &graph.nodes {
                if !seen.insert(node.name.as_str()) {
                    return Err(GraphError::DuplicateName(node.name.clone()));
                }
            }
        }

        log::debug!("Built waypoint graph with {} nodes", graph.len());
        Ok(graph)
    }
}
