//! Level definitions loaded from TOML
//!
//! A level file names its waypoints, links them, lays out the walkable grid
//! and sight blockers, then places the player, the enemies and the
//! objectives. Node references are by name; an unknown name in a link is an
//! error, while an unknown name in a patrol route only leaves a gap in it.

use crate::error::{LevelError, Result};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use stealth_ai::{AgentConfig, PatrolRoute};
use stealth_nav::{GraphError, NavMesh, SpatialGraph};
use stealth_perception::{FootstepConfig, Gait, LayerRegistry, NoiseProfile, PerceptionError};
use std::collections::HashMap;
use std::path::Path;

/// A complete level description
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelDesc {
    pub level: LevelInfo,
    pub navmesh: NavMeshDesc,
    pub nodes: Vec<NodeDesc>,
    pub links: Vec<LinkDesc>,
    pub obstacles: Vec<ObstacleDesc>,
    pub player: Option<PlayerDesc>,
    pub footsteps: FootstepConfig,
    pub enemies: Vec<EnemyDesc>,
    pub trees: Vec<TreeDesc>,
    pub escape: Option<EscapeDesc>,
}

/// Level metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelInfo {
    pub name: String,
    /// Base seed for enemy random streams
    pub seed: Option<u64>,
}

impl Default for LevelInfo {
    fn default() -> Self {
        Self {
            name: "Untitled".to_string(),
            seed: None,
        }
    }
}

/// Walkable grid
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavMeshDesc {
    pub origin: Vec3,
    pub width: f32,
    pub depth: f32,
    pub cell_size: f32,
    /// Areas removed from the walkable grid
    pub blocked: Vec<AreaDesc>,
}

impl Default for NavMeshDesc {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            width: 20.0,
            depth: 20.0,
            cell_size: 1.0,
            blocked: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaDesc {
    pub min: Vec3,
    pub max: Vec3,
}

/// A named waypoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDesc {
    pub name: String,
    pub position: Vec3,
}

/// A link between two named waypoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkDesc {
    pub from: String,
    pub to: String,
    #[serde(default = "default_bidirectional")]
    pub bidirectional: bool,
}

fn default_bidirectional() -> bool {
    true
}

/// Axis-aligned sight blocker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObstacleDesc {
    pub min: Vec3,
    pub max: Vec3,
    #[serde(default = "default_obstacle_layer")]
    pub layer: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_obstacle_layer() -> String {
    "walls".to_string()
}

fn default_enabled() -> bool {
    true
}

/// Player spawn and scripted movement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerDesc {
    pub position: Vec3,
    /// Points walked in order by the headless simulation
    pub path: Vec<Vec3>,
    pub gait: Gait,
    pub speed: f32,
    pub noise: NoiseProfile,
}

impl Default for PlayerDesc {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            path: Vec::new(),
            gait: Gait::Walk,
            speed: 3.0,
            noise: NoiseProfile::default(),
        }
    }
}

/// One enemy placement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyDesc {
    pub name: String,
    pub position: Vec3,
    pub facing: Option<Vec3>,
    pub speed: f32,
    /// Patrol waypoints by node name
    pub route: Vec<String>,
    /// Layer names the sensor looks for; empty keeps the sensor default
    pub vision_targets: Vec<String>,
    /// Layer names that block sight; empty keeps the sensor default
    pub vision_blockers: Vec<String>,
    /// Overrides the level seed for this enemy
    pub seed: Option<u64>,
    pub config: AgentConfig,
}

impl Default for EnemyDesc {
    fn default() -> Self {
        Self {
            name: "enemy".to_string(),
            position: Vec3::ZERO,
            facing: None,
            speed: 3.5,
            route: Vec::new(),
            vision_targets: Vec::new(),
            vision_blockers: Vec::new(),
            seed: None,
            config: AgentConfig::default(),
        }
    }
}

/// A tree the player plants a gift under
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeDesc {
    pub position: Vec3,
}

/// Exit zone
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EscapeDesc {
    pub center: Vec3,
    pub radius: f32,
}

impl LevelDesc {
    /// Parse a level from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let desc: LevelDesc = toml::from_str(content)?;
        desc.validate()?;
        Ok(desc)
    }

    /// Load a level file from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Loading level from {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    fn validate(&self) -> Result<()> {
        let grid = &self.navmesh;
        if !(grid.cell_size > 0.0) || !(grid.width > 0.0) || !(grid.depth > 0.0) {
            return Err(LevelError::Invalid(format!(
                "navmesh needs positive width, depth and cell size, got {}x{} @ {}",
                grid.width, grid.depth, grid.cell_size
            )));
        }
        if let Some(escape) = &self.escape {
            if !(escape.radius > 0.0) {
                return Err(LevelError::Invalid(format!(
                    "escape radius must be positive, got {}",
                    escape.radius
                )));
            }
        }
        if let Some(player) = &self.player {
            if !(player.speed > 0.0) {
                return Err(LevelError::Invalid(format!(
                    "player speed must be positive, got {}",
                    player.speed
                )));
            }
        }
        Ok(())
    }

    /// Build the waypoint graph; links must name existing nodes
    pub fn build_graph(&self) -> Result<SpatialGraph> {
        let mut builder = SpatialGraph::builder();
        let mut ids = HashMap::new();
        for node in &self.nodes {
            let id = builder.add_node(node.name.clone(), node.position);
            ids.insert(node.name.as_str(), id);
        }

        for link in &self.links {
            let lookup = |name: &str| {
                ids.get(name)
                    .copied()
                    .ok_or_else(|| GraphError::UnknownName(name.to_string()))
            };
            let from = lookup(&link.from)?;
            let to = lookup(&link.to)?;
            if link.bidirectional {
                builder.link_bidirectional(from, to);
            } else {
                builder.link(from, to);
            }
        }

        Ok(builder.build()?)
    }

    /// Build the walkable grid with blocked areas removed
    pub fn build_navmesh(&self) -> NavMesh {
        let grid = &self.navmesh;
        let mut mesh = NavMesh::create_grid(grid.origin, grid.width, grid.depth, grid.cell_size);
        for area in &grid.blocked {
            let blocked = mesh.block_area(area.min, area.max);
            log::debug!("Blocked {} cells in {:?}..{:?}", blocked, area.min, area.max);
        }
        mesh
    }
}

impl EnemyDesc {
    /// Resolve route names against `graph`; unknown names become gaps
    pub fn resolve_route(&self, graph: &SpatialGraph) -> PatrolRoute {
        let waypoints = self
            .route
            .iter()
            .map(|name| {
                let id = graph.node_by_name(name).map(|node| node.id);
                if id.is_none() {
                    log::warn!("{}: patrol waypoint '{}' does not exist, skipping it", self.name, name);
                }
                id
            })
            .collect();
        PatrolRoute::new(waypoints)
    }

    /// Agent config with the sensor layer names applied
    pub fn agent_config(&self, layers: &LayerRegistry) -> Result<AgentConfig> {
        let mut config = self.config.clone();
        if !self.vision_targets.is_empty() {
            config.sensor.target_layers = layers
                .mask_from_names(&self.vision_targets)
                .map_err(PerceptionError::UnknownLayer)?;
        }
        if !self.vision_blockers.is_empty() {
            config.sensor.obstruction_layers = layers
                .mask_from_names(&self.vision_blockers)
                .map_err(PerceptionError::UnknownLayer)?;
        }
        Ok(config)
    }
}
