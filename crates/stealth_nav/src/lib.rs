//! Stealth Nav - waypoint graph and navigation collaborators
//!
//! # Features
//!
//! - Immutable waypoint graph with neighbor links and radius queries
//! - Movement and pathfinding collaborator traits
//! - Reference grid nav mesh (A*) and path-following agent
//!
//! # Example
//!
//! ```ignore
//! use stealth_nav::prelude::*;
//!
//! let mut builder = SpatialGraph::builder();
//! let a = builder.add_node("hall", Vec3::new(0.0, 0.0, 0.0));
//! let b = builder.add_node("kitchen", Vec3::new(8.0, 0.0, 2.0));
//! builder.link_bidirectional(a, b);
//! let graph = builder.build()?;
//! ```

pub mod error;
pub mod graph;
pub mod locomotion;
pub mod navmesh;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub mod prelude {
    pub use crate::error::{GraphError, Result};
    pub use crate::graph::{horizontal_distance_squared, GraphBuilder, Node, NodeId, SpatialGraph};
    pub use crate::locomotion::{is_reachable, Locomotion, PathQuery, PathStatus};
    pub use crate::navmesh::{NavAgent, NavCell, NavMesh, NavPath};
    pub use glam::Vec3;
}

pub use prelude::*;
