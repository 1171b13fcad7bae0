//! Enemy agent controller
//!
//! One controller per enemy. It owns the agent's sensor and movement
//! collaborator, consumes sight and noise events, and runs the
//! Patrol / RoamMap / Hunt / Investigate state machine:
//!
//! | State       | Leaves when                                                        |
//! |-------------|--------------------------------------------------------------------|
//! | Patrol      | player seen (Hunt), noise heard (Investigate), no usable route      |
//! | RoamMap     | player seen (Hunt), noise heard (Investigate)                       |
//! | Hunt        | player gone, or unseen for `lose_sight_delay` (Investigate)         |
//! | Investigate | player seen (Hunt), deadline passed (Patrol or RoamMap)             |

use crate::config::AgentConfig;
use crate::error::Result;
use crate::patrol::PatrolRoute;
use crate::roam::{RoamPlanner, RoamQuery, RoamScope};
use crate::state::{AgentEvent, AgentState, StateMachine};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use stealth_nav::{is_reachable, Locomotion, NodeId, PathQuery, SpatialGraph};
use stealth_perception::{
    AgentId, NoiseEvent, NoiseListener, PerceptionSensor, PhysicsQuery, PlayerRef, SensorEvent, SharedPerception,
};
use std::sync::Arc;

/// Pathfinding collaborator shared by every agent of a level
pub type SharedPaths = Arc<dyn PathQuery + Send + Sync>;

/// Assembles an [`AgentController`]
pub struct AgentBuilder {
    id: AgentId,
    name: Option<String>,
    config: AgentConfig,
    graph: Arc<SpatialGraph>,
    paths: SharedPaths,
    route: PatrolRoute,
    seed: Option<u64>,
    player: Option<PlayerRef>,
}

impl AgentBuilder {
    pub fn new(id: AgentId, graph: Arc<SpatialGraph>, paths: SharedPaths) -> Self {
        Self {
            id,
            name: None,
            config: AgentConfig::default(),
            graph,
            paths,
            route: PatrolRoute::default(),
            seed: None,
            player: None,
        }
    }

    /// Display name used in logs
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn route(mut self, route: PatrolRoute) -> Self {
        self.route = route;
        self
    }

    /// Seed the agent's random source for reproducible roaming
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn player(mut self, player: PlayerRef) -> Self {
        self.player = Some(player);
        self
    }

    /// Build the controller and enter its initial state at time `now`
    pub fn spawn<L: Locomotion>(self, locomotion: L, now: f64) -> Result<AgentController<L>> {
        self.config.validate()?;

        let mut sensor = PerceptionSensor::new(self.config.sensor.clone())?;
        if let Some(player) = &self.player {
            sensor.track_target(player.clone());
        }
        let baseline_decay = sensor.decay_rate();

        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let initial = if self.config.patrol_allowed() && self.route.has_valid_waypoint(&self.graph) {
            AgentState::Patrol
        } else {
            AgentState::RoamMap
        };

        let mut controller = AgentController {
            id: self.id,
            name: self.name.unwrap_or_else(|| self.id.to_string()),
            config: self.config,
            locomotion,
            sensor,
            graph: self.graph,
            paths: self.paths,
            rng,
            machine: StateMachine::new(initial, now),
            route: self.route,
            roam: RoamPlanner::new(),
            player: self.player,
            hunt_target: None,
            last_known_position: None,
            last_seen_at: None,
            investigate_deadline: None,
            next_repath_at: now,
            last_destination: None,
            baseline_decay,
            events: Vec::new(),
        };

        controller.on_enter(initial, now);
        controller.events.push(AgentEvent::StateChanged {
            from: None,
            to: initial,
        });
        log::debug!("{} spawned in state: {}", controller.name, initial);
        Ok(controller)
    }
}

/// Behavior controller for one enemy agent
pub struct AgentController<L: Locomotion> {
    id: AgentId,
    name: String,
    config: AgentConfig,
    locomotion: L,
    sensor: PerceptionSensor,
    graph: Arc<SpatialGraph>,
    paths: SharedPaths,
    rng: StdRng,
    machine: StateMachine,
    route: PatrolRoute,
    roam: RoamPlanner,
    /// Registered player, used for controller-driven sightings
    player: Option<PlayerRef>,
    /// Player being hunted
    hunt_target: Option<PlayerRef>,
    last_known_position: Option<Vec3>,
    last_seen_at: Option<f64>,
    investigate_deadline: Option<f64>,
    next_repath_at: f64,
    last_destination: Option<Vec3>,
    baseline_decay: f32,
    events: Vec<AgentEvent>,
}

impl<L: Locomotion> std::fmt::Debug for AgentController<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentController")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("state", &self.machine.current())
            .field("roam", &self.roam)
            .field("last_known_position", &self.last_known_position)
            .finish()
    }
}

impl<L: Locomotion> AgentController<L> {
    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Active state
    pub fn state(&self) -> AgentState {
        self.machine.current()
    }

    pub fn previous_state(&self) -> Option<AgentState> {
        self.machine.previous()
    }

    pub fn locomotion(&self) -> &L {
        &self.locomotion
    }

    pub fn locomotion_mut(&mut self) -> &mut L {
        &mut self.locomotion
    }

    pub fn sensor(&self) -> &PerceptionSensor {
        &self.sensor
    }

    /// Shared perception state for the detection aggregator
    pub fn perception(&self) -> SharedPerception {
        self.sensor.shared()
    }

    pub fn roam(&self) -> &RoamPlanner {
        &self.roam
    }

    pub fn route(&self) -> &PatrolRoute {
        &self.route
    }

    /// Replace the patrol route; takes effect on the next patrol tick
    pub fn set_route(&mut self, route: PatrolRoute) {
        self.route = route;
    }

    pub fn last_known_position(&self) -> Option<Vec3> {
        self.last_known_position
    }

    pub fn last_seen_at(&self) -> Option<f64> {
        self.last_seen_at
    }

    pub fn investigate_deadline(&self) -> Option<f64> {
        self.investigate_deadline
    }

    /// Register the player this agent looks for
    pub fn set_player(&mut self, player: PlayerRef) {
        self.sensor.track_target(player.clone());
        self.player = Some(player);
    }

    /// Events recorded since the last tick
    pub fn drain_events(&mut self) -> Vec<AgentEvent> {
        std::mem::take(&mut self.events)
    }

    /// The player was seen: remember where and start hunting
    pub fn on_see_player(&mut self, player: &PlayerRef, now: f64) {
        let Some(body) = player.upgrade() else {
            return;
        };
        self.last_known_position = Some(body.read().position);
        self.last_seen_at = Some(now);
        self.hunt_target = Some(player.clone());

        if !self.machine.is_in(AgentState::Hunt) {
            self.switch_state(AgentState::Hunt, now);
        }
    }

    /// A noise reached the agent: investigate it unless already hunting
    pub fn on_hear_noise(&mut self, origin: Vec3, now: f64) {
        if self.machine.is_in(AgentState::Hunt) {
            return;
        }
        self.last_known_position = Some(origin);
        self.switch_state(AgentState::Investigate, now);
    }

    /// Advance the agent by one tick; returns the events recorded since the last tick
    pub fn tick<Q: PhysicsQuery + ?Sized>(&mut self, delta_time: f32, now: f64, physics: &Q) -> Vec<AgentEvent> {
        let position = self.locomotion.position();
        let forward = self.locomotion.forward();
        match self.sensor.update(delta_time, position, forward, physics) {
            Some(SensorEvent::Spotted { .. }) => self.events.push(AgentEvent::Spotted),
            Some(SensorEvent::Lost) => self.events.push(AgentEvent::LostSight),
            None => {}
        }

        if self.sensor.visible() {
            if let Some(player) = self.player.clone() {
                self.on_see_player(&player, now);
            }
        }

        match self.machine.current() {
            AgentState::Patrol => {
                self.update_patrol(now);
                self.sweep_nodes();
            }
            AgentState::RoamMap => self.update_roam(RoamScope::WHOLE_MAP, now),
            AgentState::Hunt => self.update_hunt(now),
            AgentState::Investigate => self.update_investigate(now),
        }

        self.drain_events()
    }

    fn patrol_available(&self) -> bool {
        self.config.patrol_allowed() && self.route.has_valid_waypoint(&self.graph)
    }

    fn waypoint_position(&self) -> Option<Vec3> {
        self.route
            .current()
            .flatten()
            .and_then(|id| self.graph.position(id))
    }

    fn update_patrol(&mut self, now: f64) {
        if !self.patrol_available() {
            if self.config.patrol_allowed() && !self.route.is_empty() {
                log::warn!("{} has no usable patrol waypoint, roaming instead", self.name);
            }
            self.switch_state(AgentState::RoamMap, now);
            return;
        }

        self.route.clamp_index();
        let Some(target) = self.waypoint_position() else {
            self.route.advance();
            return;
        };

        self.set_destination_if_ready(target, now);

        if self.has_reached(target) {
            self.route.advance();
            if let Some(next) = self.waypoint_position() {
                self.move_now(next, now);
            }
        }
    }

    fn sweep_nodes(&mut self) {
        let position = self.locomotion.position();
        self.roam.sweep(&self.graph, position, self.config.perception_radius);
    }

    fn with_roam_query<T>(
        &mut self,
        scope: RoamScope,
        f: impl FnOnce(&mut RoamPlanner, &mut RoamQuery<'_>) -> T,
    ) -> T {
        let locomotion = &self.locomotion;
        let paths = self.paths.as_ref();
        let reachable = |target: Vec3| is_reachable(locomotion, paths, target);
        let mut query = RoamQuery {
            graph: &self.graph,
            scope,
            max_attempts: self.config.max_pick_attempts,
            rng: &mut self.rng,
            reachable: &reachable,
        };
        f(&mut self.roam, &mut query)
    }

    fn target_picked(&mut self, node: NodeId) -> Option<Vec3> {
        self.events.push(AgentEvent::TargetPicked { node });
        let position = self.graph.position(node);
        if let Some(position) = position {
            log::debug!("{} heading to node {:?} at {}", self.name, node, position);
        }
        position
    }

    fn update_roam(&mut self, scope: RoamScope, now: f64) {
        self.sweep_nodes();
        self.roam.relieve_stall(&self.graph, scope);

        let Some(current) = self.roam.current() else {
            if let Some(node) = self.with_roam_query(scope, |roam, query| roam.initialize(query)) {
                if let Some(target) = self.target_picked(node) {
                    self.set_destination_if_ready(target, now);
                }
            }
            return;
        };

        let Some(target) = self.graph.position(current) else {
            self.roam.clear();
            return;
        };

        if self.has_reached(target) || self.within_perception(target) {
            if let Some(node) = self.with_roam_query(scope, |roam, query| roam.advance(query)) {
                if let Some(next) = self.target_picked(node) {
                    self.move_now(next, now);
                }
            }
            return;
        }

        self.set_destination_if_ready(target, now);
    }

    fn update_hunt(&mut self, now: f64) {
        let Some(player) = self.hunt_target.as_ref().and_then(|target| target.upgrade()) else {
            log::debug!("{} lost its hunt target", self.name);
            self.switch_state(AgentState::Investigate, now);
            return;
        };

        // Only refresh while actually visible, never through walls
        let sees_now = self.sensor.visible();
        if sees_now {
            self.last_known_position = Some(player.read().position);
            self.last_seen_at = Some(now);
        }
        drop(player);

        if let Some(target) = self.last_known_position {
            self.set_destination_if_ready(target, now);
        }

        let unseen_too_long = self
            .last_seen_at
            .map_or(true, |seen| now - seen > self.config.lose_sight_delay);
        if !sees_now && unseen_too_long {
            self.switch_state(AgentState::Investigate, now);
        }
    }

    fn update_investigate(&mut self, now: f64) {
        let expired = self.investigate_deadline.map_or(true, |deadline| now >= deadline);
        if expired {
            let next = if self.patrol_available() {
                AgentState::Patrol
            } else {
                AgentState::RoamMap
            };
            self.switch_state(next, now);
            return;
        }

        let center = self
            .last_known_position
            .unwrap_or_else(|| self.locomotion.position());
        self.update_roam(RoamScope::around(center, self.config.investigate_radius), now);
    }

    fn switch_state(&mut self, to: AgentState, now: f64) {
        let event = self.machine.force_transition(to, now);
        log::debug!("{} switched to state: {}", self.name, to);
        self.events.push(event);
        self.on_enter(to, now);
    }

    fn on_enter(&mut self, state: AgentState, now: f64) {
        match state {
            AgentState::Patrol => self.route.clamp_index(),
            AgentState::RoamMap => self.roam.clear(),
            AgentState::Investigate => {
                self.roam.clear();
                self.investigate_deadline = Some(now + self.config.investigate_duration);
            }
            AgentState::Hunt => {}
        }
        self.apply_decay(state);
    }

    fn apply_decay(&mut self, state: AgentState) {
        if self.config.drive_suspicion_decay {
            let rate = self.config.decay.rate_for(self.baseline_decay, state);
            self.sensor.set_decay_rate(rate);
        }
    }

    /// Arrival test: remaining path distance when the mover is heading to
    /// `target`, else direct distance
    fn has_reached(&self, target: Vec3) -> bool {
        let heading_there = self
            .last_destination
            .map_or(false, |destination| destination.distance_squared(target) <= 1e-6);
        if heading_there {
            let threshold = self
                .locomotion
                .stopping_distance()
                .max(self.config.node_arrive_distance);
            if let Some(remaining) = self.locomotion.remaining_distance() {
                if remaining <= threshold {
                    return true;
                }
            }
        }

        let arrive = self.config.node_arrive_distance;
        self.locomotion.position().distance_squared(target) <= arrive * arrive
    }

    fn within_perception(&self, target: Vec3) -> bool {
        let radius = self.config.perception_radius;
        self.locomotion.position().distance_squared(target) <= radius * radius
    }

    fn set_destination_if_ready(&mut self, target: Vec3, now: f64) {
        if now < self.next_repath_at {
            return;
        }
        self.move_now(target, now);
    }

    fn move_now(&mut self, target: Vec3, now: f64) {
        self.next_repath_at = now + self.config.repath_cooldown;
        if self.locomotion.is_on_navigable_surface() {
            self.locomotion.set_destination(target);
            self.last_destination = Some(target);
        }
    }
}

impl<L: Locomotion> NoiseListener for AgentController<L> {
    fn listener_position(&self) -> Vec3 {
        self.locomotion.position()
    }

    fn hear_noise(&mut self, event: NoiseEvent, now: f64) {
        self.on_hear_noise(event.origin, now);
    }
}
