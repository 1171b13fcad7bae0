//! Level facade
//!
//! [`Level`] owns everything one stealth level needs at run time: the
//! waypoint graph, the walkable grid, the sight query scene, the enemies and
//! the objectives. A frame is driven by [`Level::tick`], which runs in this
//! order:
//!
//! 1. Footstep noises are routed to the enemies in range.
//! 2. Every enemy moves along its path and then runs its behavior.
//! 3. The shared alert level is updated; crossing 1 catches the player.
//! 4. Gifts in reach are planted and the escape zone is checked.
//!
//! Once the level is won or lost, ticks stop advancing the simulation.

use crate::authoring::{EnemyDesc, LevelDesc};
use crate::error::Result;
use glam::Vec3;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use stealth_ai::{AgentBuilder, AgentConfig, AgentController, AgentEvent, PatrolRoute, SharedPaths};
use stealth_gamestate::{GameStateListener, ObjectiveTracker};
use stealth_nav::{NavAgent, NavMesh, SpatialGraph};
use stealth_perception::{
    AgentId, DetectionAggregator, EntityId, FootstepConfig, FootstepEmitter, Gait, IdGenerator, LayerRegistry,
    NoiseEvent, NoiseRouter, Obstacle, PerceptionError, PlayerBody, PlayerHandle, QueryLayer, SceneQuery,
};
use std::sync::Arc;

/// Collision radius of the player body in sight queries
pub const PLAYER_RADIUS: f32 = 0.4;

/// How close the player must be to a tree to plant a gift
pub const PLANT_REACH: f32 = 1.5;

/// Enemy as driven by the level
pub type LevelAgent = AgentController<NavAgent>;

/// Shared handle to a level enemy
pub type AgentHandle = Arc<Mutex<LevelAgent>>;

/// Spawn parameters for one enemy
#[derive(Debug, Clone)]
pub struct AgentSpawn {
    pub name: String,
    pub position: Vec3,
    pub facing: Option<Vec3>,
    pub speed: f32,
    pub config: AgentConfig,
    pub route: PatrolRoute,
    pub seed: Option<u64>,
}

impl AgentSpawn {
    pub fn new(name: impl Into<String>, position: Vec3) -> Self {
        Self {
            name: name.into(),
            position,
            facing: None,
            speed: 3.5,
            config: AgentConfig::default(),
            route: PatrolRoute::default(),
            seed: None,
        }
    }

    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_route(mut self, route: PatrolRoute) -> Self {
        self.route = route;
        self
    }

    pub fn with_facing(mut self, facing: Vec3) -> Self {
        self.facing = Some(facing);
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// A gift target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub position: Vec3,
    pub planted: bool,
}

/// Exit zone, a sphere around `center`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EscapeZone {
    pub center: Vec3,
    pub radius: f32,
}

impl EscapeZone {
    pub fn contains(&self, position: Vec3) -> bool {
        position.distance_squared(self.center) <= self.radius * self.radius
    }
}

/// What happened during one tick
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    /// Events emitted by each enemy this tick
    pub agent_events: Vec<(AgentId, AgentEvent)>,
    /// Footstep the player made this tick
    pub footstep: Option<NoiseEvent>,
    /// Enemies that heard the footstep
    pub listeners_reached: usize,
    /// Alert level after this tick
    pub alert_level: f32,
    /// The player was caught this tick
    pub caught: bool,
    /// Gifts planted this tick
    pub gifts_planted: u32,
    /// The player escaped this tick
    pub escaped: bool,
}

impl TickReport {
    /// State changes recorded this tick
    pub fn state_changes(&self) -> impl Iterator<Item = &(AgentId, AgentEvent)> {
        self.agent_events
            .iter()
            .filter(|(_, event)| matches!(event, AgentEvent::StateChanged { .. }))
    }
}

/// Runtime state of one level
pub struct Level {
    name: String,
    graph: Arc<SpatialGraph>,
    navmesh: Arc<NavMesh>,
    scene: SceneQuery,
    layers: LayerRegistry,
    detection: DetectionAggregator,
    noise: NoiseRouter,
    agents: Vec<AgentHandle>,
    ids: IdGenerator,
    player: Option<PlayerHandle>,
    footstep_config: FootstepConfig,
    footsteps: Option<FootstepEmitter>,
    objectives: ObjectiveTracker,
    trees: Vec<Tree>,
    escape: Option<EscapeZone>,
    now: f64,
}

impl std::fmt::Debug for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Level")
            .field("name", &self.name)
            .field("nodes", &self.graph.len())
            .field("agents", &self.agents.len())
            .field("now", &self.now)
            .field("outcome", &self.objectives.outcome())
            .finish()
    }
}

impl Level {
    /// Create an empty level over a graph and walkable grid
    pub fn new(name: impl Into<String>, graph: SpatialGraph, navmesh: NavMesh) -> Self {
        Self {
            name: name.into(),
            graph: Arc::new(graph),
            navmesh: Arc::new(navmesh),
            scene: SceneQuery::new(),
            layers: LayerRegistry::default(),
            detection: DetectionAggregator::new(),
            noise: NoiseRouter::new(),
            agents: Vec::new(),
            ids: IdGenerator::default(),
            player: None,
            footstep_config: FootstepConfig::default(),
            footsteps: None,
            objectives: ObjectiveTracker::new(),
            trees: Vec::new(),
            escape: None,
            now: 0.0,
        }
    }

    /// Build a level from its description, spawning the player and enemies
    pub fn from_desc<G: GameStateListener + ?Sized>(desc: &LevelDesc, listener: &mut G) -> Result<Self> {
        let graph = desc.build_graph()?;
        let navmesh = desc.build_navmesh();
        let mut level = Level::new(desc.level.name.clone(), graph, navmesh);
        level.footstep_config = desc.footsteps.clone();

        for obstacle in &desc.obstacles {
            let layer = level
                .layers
                .get_layer(&obstacle.layer)
                .ok_or_else(|| PerceptionError::UnknownLayer(obstacle.layer.clone()))?;
            let index = level.scene.add_obstacle(Obstacle::new(obstacle.min, obstacle.max, layer));
            level.scene.set_obstacle_enabled(index, obstacle.enabled);
        }

        if let Some(player) = &desc.player {
            let entity = level.ids.next_entity();
            let body = PlayerBody::new(entity, player.position).with_noise_profile(player.noise.clone());
            level.register_player(body);
        }

        for (index, enemy) in desc.enemies.iter().enumerate() {
            let seed = enemy.seed.or(desc.level.seed.map(|base| base.wrapping_add(index as u64)));
            level.spawn_enemy(enemy, seed)?;
        }

        for tree in &desc.trees {
            level.register_tree(tree.position, listener);
        }

        if let Some(escape) = desc.escape {
            level.set_escape(EscapeZone {
                center: escape.center,
                radius: escape.radius,
            });
        }

        log::info!(
            "Level '{}' ready: {} nodes, {} enemies, {} trees",
            level.name,
            level.graph.len(),
            level.agents.len(),
            level.trees.len()
        );
        Ok(level)
    }

    fn spawn_enemy(&mut self, enemy: &EnemyDesc, seed: Option<u64>) -> Result<AgentHandle> {
        let mut spawn = AgentSpawn::new(enemy.name.clone(), enemy.position)
            .with_config(enemy.agent_config(&self.layers)?)
            .with_route(enemy.resolve_route(&self.graph))
            .with_speed(enemy.speed);
        spawn.facing = enemy.facing;
        spawn.seed = seed;
        self.spawn_agent(spawn)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Game time in seconds since the level started
    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn graph(&self) -> &Arc<SpatialGraph> {
        &self.graph
    }

    pub fn navmesh(&self) -> &Arc<NavMesh> {
        &self.navmesh
    }

    pub fn scene(&self) -> &SceneQuery {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneQuery {
        &mut self.scene
    }

    pub fn layers(&self) -> &LayerRegistry {
        &self.layers
    }

    pub fn detection(&self) -> &DetectionAggregator {
        &self.detection
    }

    pub fn objectives(&self) -> &ObjectiveTracker {
        &self.objectives
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    pub fn escape(&self) -> Option<EscapeZone> {
        self.escape
    }

    pub fn agents(&self) -> &[AgentHandle] {
        &self.agents
    }

    /// Find an enemy by id
    pub fn agent(&self, id: AgentId) -> Option<AgentHandle> {
        self.agents.iter().find(|agent| agent.lock().id() == id).cloned()
    }

    /// Find an enemy by name
    pub fn agent_by_name(&self, name: &str) -> Option<AgentHandle> {
        self.agents.iter().find(|agent| agent.lock().name() == name).cloned()
    }

    /// Allocate an entity id for a scene body
    pub fn next_entity(&self) -> EntityId {
        self.ids.next_entity()
    }

    /// Spawn an enemy and register it with detection and noise routing
    pub fn spawn_agent(&mut self, spawn: AgentSpawn) -> Result<AgentHandle> {
        let id = self.ids.next_agent();

        let mut locomotion = NavAgent::new(Arc::clone(&self.navmesh), spawn.position, spawn.speed);
        if let Some(facing) = spawn.facing {
            locomotion = locomotion.with_forward(facing);
        }

        let paths: SharedPaths = self.navmesh.clone();
        let mut builder = AgentBuilder::new(id, Arc::clone(&self.graph), paths)
            .name(spawn.name)
            .config(spawn.config)
            .route(spawn.route);
        if let Some(seed) = spawn.seed {
            builder = builder.seed(seed);
        }
        if let Some(player) = &self.player {
            builder = builder.player(Arc::downgrade(player));
        }

        let agent = builder.spawn(locomotion, self.now)?;
        let perception = agent.perception();
        log::info!("Spawned {} ({}) in {}", agent.name(), id, agent.state());

        let handle = Arc::new(Mutex::new(agent));
        self.detection.register(id, &perception);
        self.noise.register_listener(id, &handle);
        self.agents.push(Arc::clone(&handle));
        Ok(handle)
    }

    /// Remove an enemy; its sensor stops contributing to the alert level
    pub fn remove_agent(&mut self, id: AgentId) -> bool {
        let Some(index) = self.agents.iter().position(|agent| agent.lock().id() == id) else {
            return false;
        };
        self.agents.remove(index);
        self.detection.unregister(id);
        self.noise.unregister(id);
        log::info!("Removed enemy {}", id);
        true
    }

    /// Register the player; every enemy starts tracking it
    pub fn register_player(&mut self, body: PlayerBody) -> PlayerHandle {
        let entity = body.entity;
        let position = body.position;
        let handle = body.into_handle();

        self.scene.remove_body(entity);
        self.scene.add_body(entity, position, PLAYER_RADIUS, QueryLayer::TARGET);
        for agent in &self.agents {
            agent.lock().set_player(Arc::downgrade(&handle));
        }
        self.footsteps = Some(FootstepEmitter::new(self.footstep_config.clone(), position, self.now));
        self.player = Some(Arc::clone(&handle));
        log::info!("Player registered at {:?}", position);
        handle
    }

    /// Drop the level's hold on the player; enemies see a dead reference
    pub fn unregister_player(&mut self) -> Option<PlayerHandle> {
        let handle = self.player.take()?;
        let entity = handle.read().entity;
        self.scene.remove_body(entity);
        self.footsteps = None;
        log::info!("Player unregistered");
        Some(handle)
    }

    pub fn player(&self) -> Option<&PlayerHandle> {
        self.player.as_ref()
    }

    pub fn player_position(&self) -> Option<Vec3> {
        self.player.as_ref().map(|player| player.read().position)
    }

    /// Record the player's movement for this frame
    pub fn move_player(&mut self, position: Vec3, gait: Gait, moving: bool, delta_time: f32) {
        let Some(player) = &self.player else {
            return;
        };
        let entity = {
            let mut body = player.write();
            body.apply_movement(position, gait, moving, delta_time);
            body.entity
        };
        self.scene.set_body_position(entity, position);
    }

    /// Route a noise to every enemy in range; returns how many heard it
    pub fn emit_noise(&mut self, event: NoiseEvent) -> usize {
        self.noise.emit(event, self.now)
    }

    /// Add a gift target
    pub fn register_tree<G: GameStateListener + ?Sized>(&mut self, position: Vec3, listener: &mut G) {
        self.trees.push(Tree {
            position,
            planted: false,
        });
        self.objectives.register_tree(listener);
    }

    pub fn set_escape(&mut self, zone: EscapeZone) {
        self.escape = Some(zone);
    }

    /// Advance the level by one frame
    pub fn tick<G: GameStateListener + ?Sized>(&mut self, delta_time: f32, listener: &mut G) -> TickReport {
        let mut report = TickReport {
            alert_level: self.detection.alert_level(),
            ..TickReport::default()
        };
        if self.objectives.is_finished() {
            return report;
        }

        self.now += f64::from(delta_time);
        self.objectives.tick(f64::from(delta_time));

        // No agent lock may be held while routing
        if let (Some(player), Some(footsteps)) = (&self.player, self.footsteps.as_mut()) {
            let step = footsteps.update(&player.read(), self.now);
            if let Some(event) = step {
                report.footstep = Some(event);
                report.listeners_reached = self.noise.emit(event, self.now);
            }
        }

        for handle in &self.agents {
            let mut agent = handle.lock();
            agent.locomotion_mut().update(delta_time);
            let id = agent.id();
            let events = agent.tick(delta_time, self.now, &self.scene);
            report.agent_events.extend(events.into_iter().map(|event| (id, event)));
        }

        if self.detection.update().is_some() {
            report.caught = self.objectives.player_caught(listener);
        }
        report.alert_level = self.detection.alert_level();

        if !self.objectives.is_finished() {
            report.gifts_planted = self.plant_gifts_in_reach(listener);
            if let (Some(position), Some(zone)) = (self.player_position(), self.escape) {
                if zone.contains(position) {
                    report.escaped = self.objectives.reach_escape(listener);
                }
            }
        }

        report
    }

    fn plant_gifts_in_reach<G: GameStateListener + ?Sized>(&mut self, listener: &mut G) -> u32 {
        let Some(position) = self.player_position() else {
            return 0;
        };

        let mut planted = 0;
        for tree in self.trees.iter_mut().filter(|tree| !tree.planted) {
            if tree.position.distance_squared(position) <= PLANT_REACH * PLANT_REACH {
                tree.planted = true;
                self.objectives.plant_gift(listener);
                planted += 1;
            }
        }
        planted
    }
}
