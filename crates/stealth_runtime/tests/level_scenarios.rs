//! End-to-end level scenarios driven through the public runtime API

use glam::Vec3;
use stealth_ai::{AgentConfig, AgentEvent, AgentState, PatrolRoute};
use stealth_gamestate::{EventLog, GameEvent, NullListener, Outcome};
use stealth_nav::{GraphError, NavMesh, SpatialGraph};
use stealth_perception::{Gait, NoiseEvent, PerceptionError, PlayerBody, SensorConfig};
use stealth_runtime::prelude::*;

const DT: f32 = 0.05;

/// Open 20x20 yard with four corner waypoints in a ring
fn yard() -> Level {
    let mut builder = SpatialGraph::builder();
    let sw = builder.add_node("sw", Vec3::new(2.5, 0.0, 2.5));
    let se = builder.add_node("se", Vec3::new(17.5, 0.0, 2.5));
    let ne = builder.add_node("ne", Vec3::new(17.5, 0.0, 17.5));
    let nw = builder.add_node("nw", Vec3::new(2.5, 0.0, 17.5));
    builder
        .link_bidirectional(sw, se)
        .link_bidirectional(se, ne)
        .link_bidirectional(ne, nw)
        .link_bidirectional(nw, sw);
    let graph = builder.build().unwrap();
    Level::new("yard", graph, NavMesh::create_grid(Vec3::ZERO, 20.0, 20.0, 1.0))
}

fn states_seen(level: &mut Level, seconds: f32) -> Vec<AgentState> {
    let mut states = Vec::new();
    let mut elapsed = 0.0;
    while elapsed < seconds {
        let report = level.tick(DT, &mut NullListener);
        for (_, event) in report.state_changes() {
            if let AgentEvent::StateChanged { to, .. } = event {
                states.push(*to);
            }
        }
        elapsed += DT;
    }
    states
}

fn add_player(level: &mut Level, position: Vec3) -> stealth_perception::PlayerHandle {
    let entity = level.next_entity();
    level.register_player(PlayerBody::new(entity, position))
}

#[test]
fn test_demo_level_runs() {
    let desc = LevelDesc::from_toml(DEMO_LEVEL).unwrap();
    let mut sim = Simulation::from_desc(&desc).unwrap();

    assert_eq!(sim.level().agents().len(), 2);
    assert_eq!(sim.level().trees().len(), 2);
    assert_eq!(sim.level().objectives().total_trees(), 2);
    assert!(sim.level().player().is_some());

    let guard = sim.level().agent_by_name("guard").unwrap();
    assert_eq!(guard.lock().state(), AgentState::Patrol);
    let elf = sim.level().agent_by_name("elf").unwrap();
    assert_eq!(elf.lock().state(), AgentState::RoamMap);

    let summary = sim.run(20.0, 30.0);
    assert!(summary.ticks > 0);
    assert!(summary.elapsed <= 20.0 + 1.0 / 30.0);
    if summary.outcome.is_none() {
        assert!(summary.ticks >= 599);
    }
}

#[test]
fn test_roaming_agent_moves_between_nodes() {
    let mut level = yard();
    let handle = level
        .spawn_agent(AgentSpawn::new("elf", Vec3::new(2.5, 0.0, 2.5)).with_seed(11))
        .unwrap();

    let mut picked = 0;
    for _ in 0..400 {
        let report = level.tick(DT, &mut NullListener);
        picked += report
            .agent_events
            .iter()
            .filter(|(_, e)| matches!(e, AgentEvent::TargetPicked { .. }))
            .count();
    }

    let agent = handle.lock();
    assert_eq!(agent.state(), AgentState::RoamMap);
    assert!(picked >= 2, "only picked {} targets", picked);
    assert!(agent.locomotion().position.distance(Vec3::new(2.5, 0.0, 2.5)) > 0.0);
}

#[test]
fn test_patrol_follows_route() {
    let mut level = yard();
    let route = PatrolRoute::from_nodes([
        level.graph().resolve("se").unwrap(),
        level.graph().resolve("ne").unwrap(),
    ]);
    let handle = level
        .spawn_agent(AgentSpawn::new("guard", Vec3::new(2.5, 0.0, 2.5)).with_route(route).with_speed(5.0))
        .unwrap();
    assert_eq!(handle.lock().state(), AgentState::Patrol);

    states_seen(&mut level, 4.0);
    let agent = handle.lock();
    assert_eq!(agent.state(), AgentState::Patrol);
    assert!(agent.route().index() >= 1);
}

#[test]
fn test_noise_starts_investigation_then_resumes() {
    let mut level = yard();
    let config = AgentConfig::default().with_investigate(6.0, 1.0);
    let handle = level
        .spawn_agent(AgentSpawn::new("elf", Vec3::new(2.5, 0.0, 2.5)).with_config(config).with_seed(5))
        .unwrap();

    level.tick(DT, &mut NullListener);
    let heard = level.emit_noise(NoiseEvent::new(Vec3::new(4.0, 0.0, 4.0), 3.0));
    assert_eq!(heard, 1);
    assert_eq!(handle.lock().state(), AgentState::Investigate);
    assert_eq!(handle.lock().last_known_position(), Some(Vec3::new(4.0, 0.0, 4.0)));

    let states = states_seen(&mut level, 1.5);
    assert_eq!(states, vec![AgentState::Investigate, AgentState::RoamMap]);
}

#[test]
fn test_footsteps_alert_agent_behind_player() {
    let mut level = yard();
    let handle = level
        .spawn_agent(
            AgentSpawn::new("guard", Vec3::new(5.5, 0.0, 10.5))
                .with_facing(Vec3::NEG_X)
                .with_speed(0.0)
                .with_config(AgentConfig::default().roam_only()),
        )
        .unwrap();
    let player = add_player(&mut level, Vec3::new(8.5, 0.0, 10.5));

    let mut script = ScriptedPlayer::new(vec![Vec3::new(8.5, 0.0, 16.5)], 4.0, Gait::Run);
    let mut heard = 0;
    for _ in 0..20 {
        let from = player.read().position;
        let (position, moving) = script.step(from, DT);
        level.move_player(position, Gait::Run, moving, DT);
        let report = level.tick(DT, &mut NullListener);
        heard += report.listeners_reached;
    }

    assert!(heard >= 1);
    assert_eq!(handle.lock().state(), AgentState::Investigate);
}

#[test]
fn test_crouching_is_silent_at_range() {
    let mut level = yard();
    let handle = level
        .spawn_agent(
            AgentSpawn::new("guard", Vec3::new(2.5, 0.0, 2.5))
                .with_facing(Vec3::NEG_X)
                .with_speed(0.0)
                .with_config(AgentConfig::default().roam_only()),
        )
        .unwrap();
    let player = add_player(&mut level, Vec3::new(12.5, 0.0, 12.5));

    let mut script = ScriptedPlayer::new(vec![Vec3::new(12.5, 0.0, 17.5)], 2.0, Gait::Crouch);
    for _ in 0..40 {
        let from = player.read().position;
        let (position, moving) = script.step(from, DT);
        level.move_player(position, Gait::Crouch, moving, DT);
        assert_eq!(level.tick(DT, &mut NullListener).listeners_reached, 0);
    }
    assert_eq!(handle.lock().state(), AgentState::RoamMap);
}

#[test]
fn test_player_in_view_is_caught_once() {
    let mut level = yard();
    let handle = level
        .spawn_agent(
            AgentSpawn::new("guard", Vec3::new(2.5, 0.0, 10.5))
                .with_facing(Vec3::X)
                .with_config(AgentConfig::default().roam_only()),
        )
        .unwrap();
    let _player = add_player(&mut level, Vec3::new(6.5, 0.0, 10.5));

    let mut log = EventLog::new();
    let mut caught_ticks = 0;
    let mut hunted = false;
    for _ in 0..100 {
        let report = level.tick(DT, &mut log);
        caught_ticks += usize::from(report.caught);
        hunted |= report
            .state_changes()
            .any(|(_, e)| matches!(e, AgentEvent::StateChanged { to: AgentState::Hunt, .. }));
    }

    assert!(hunted);
    assert_eq!(caught_ticks, 1);
    assert_eq!(log.count(GameEvent::PlayerCaught), 1);
    assert_eq!(level.objectives().outcome(), Some(Outcome::Lost));
    assert!(level.detection().is_caught());
    assert!(handle.lock().last_seen_at().is_some());
}

#[test]
fn test_wall_blocks_sight() {
    let desc = LevelDesc::from_toml(
        r#"
        [navmesh]
        width = 20.0
        depth = 20.0
        cell_size = 1.0

        [[nodes]]
        name = "post"
        position = [2.5, 0.0, 10.5]

        [[obstacles]]
        min = [4.0, 0.0, 8.0]
        max = [5.0, 3.0, 13.0]

        [player]
        position = [8.5, 0.0, 10.5]

        [[enemies]]
        name = "guard"
        position = [2.5, 0.0, 10.5]
        facing = [1.0, 0.0, 0.0]
        speed = 0.0

        [enemies.config]
        roam_only = true
        "#,
    )
    .unwrap();
    let mut level = Level::from_desc(&desc, &mut NullListener).unwrap();

    for _ in 0..60 {
        level.tick(DT, &mut NullListener);
    }
    let guard = level.agent_by_name("guard").unwrap();
    assert_eq!(guard.lock().state(), AgentState::RoamMap);
    assert_eq!(level.detection().alert_level(), 0.0);
}

#[test]
fn test_losing_the_player_ends_the_hunt() {
    let mut level = yard();
    let sensor = SensorConfig::default().with_time_to_lose(100.0);
    let handle = level
        .spawn_agent(
            AgentSpawn::new("guard", Vec3::new(2.5, 0.0, 10.5))
                .with_facing(Vec3::X)
                .with_config(AgentConfig::default().roam_only().with_sensor(sensor)),
        )
        .unwrap();
    let player = add_player(&mut level, Vec3::new(6.5, 0.0, 10.5));

    states_seen(&mut level, 0.5);
    assert_eq!(handle.lock().state(), AgentState::Hunt);

    drop(level.unregister_player());
    drop(player);
    let states = states_seen(&mut level, 0.3);
    assert_eq!(states.first(), Some(&AgentState::Investigate));
    assert!(!level.detection().is_caught());
}

#[test]
fn test_removed_agent_stops_counting() {
    let mut level = yard();
    let handle = level
        .spawn_agent(
            AgentSpawn::new("guard", Vec3::new(2.5, 0.0, 10.5))
                .with_facing(Vec3::X)
                .with_config(AgentConfig::default().roam_only()),
        )
        .unwrap();
    let _player = add_player(&mut level, Vec3::new(6.5, 0.0, 10.5));

    states_seen(&mut level, 0.5);
    assert!(level.detection().alert_level() > 0.0);

    let id = handle.lock().id();
    drop(handle);
    assert!(level.remove_agent(id));
    for _ in 0..200 {
        let report = level.tick(DT, &mut NullListener);
        assert!(!report.caught);
    }
    assert!(level.objectives().outcome().is_none());
}

#[test]
fn test_gifts_unlock_escape_once() {
    let desc = LevelDesc::from_toml(
        r#"
        [navmesh]
        width = 20.0
        depth = 20.0

        [[nodes]]
        name = "a"
        position = [1.5, 0.0, 1.5]

        [player]
        position = [1.0, 0.0, 10.0]
        speed = 6.0
        gait = "crouch"
        path = [[5.0, 0.0, 10.0], [10.0, 0.0, 10.0], [18.0, 0.0, 18.0]]

        [[trees]]
        position = [5.0, 0.0, 11.0]

        [[trees]]
        position = [10.0, 0.0, 9.0]

        [escape]
        center = [18.0, 0.0, 18.0]
        radius = 1.0
        "#,
    )
    .unwrap();
    let mut sim = Simulation::from_desc(&desc).unwrap();

    let summary = sim.run(10.0, 20.0);
    assert_eq!(summary.outcome, Some(Outcome::Won));
    assert_eq!(summary.gifts_planted, 2);
    assert_eq!(sim.events().count(GameEvent::EscapeUnlocked), 1);
    assert_eq!(sim.events().count(GameEvent::Escaped), 1);
    assert_eq!(sim.level().objectives().progress_text(), "Gifts Planted: 2/2");
    assert!(summary.elapsed < 10.0);
}

#[test]
fn test_escape_stays_locked_without_gifts() {
    let mut level = yard();
    let mut log = EventLog::new();
    level.register_tree(Vec3::new(2.5, 0.0, 2.5), &mut log);
    level.set_escape(EscapeZone {
        center: Vec3::new(15.0, 0.0, 15.0),
        radius: 2.0,
    });
    add_player(&mut level, Vec3::new(15.0, 0.0, 15.0));

    for _ in 0..10 {
        assert!(!level.tick(DT, &mut log).escaped);
    }
    assert!(!level.objectives().escape_unlocked());
    assert!(level.objectives().outcome().is_none());
}

#[test]
fn test_unknown_link_fails_to_load() {
    let result = LevelDesc::from_toml(
        r#"
        [[nodes]]
        name = "a"
        position = [0.0, 0.0, 0.0]

        [[links]]
        from = "a"
        to = "b"
        "#,
    )
    .and_then(|desc| Level::from_desc(&desc, &mut NullListener));
    assert!(matches!(result, Err(LevelError::Graph(GraphError::UnknownName(_)))));
}

#[test]
fn test_unknown_obstacle_layer_fails_to_load() {
    let result = LevelDesc::from_toml(
        r#"
        [[nodes]]
        name = "a"
        position = [0.5, 0.0, 0.5]

        [[obstacles]]
        min = [1.0, 0.0, 1.0]
        max = [2.0, 2.0, 2.0]
        layer = "lava"
        "#,
    )
    .and_then(|desc| Level::from_desc(&desc, &mut NullListener));
    assert!(matches!(
        result,
        Err(LevelError::Perception(PerceptionError::UnknownLayer(name))) if name == "lava"
    ));
}

#[test]
fn test_enemy_without_waypoints_idles() {
    let desc = LevelDesc::from_toml("[level]\nname = \"empty\"\n\n[[enemies]]\nname = \"lost\"\nposition = [1.5, 0.0, 1.5]\n")
        .unwrap();
    let mut level = Level::from_desc(&desc, &mut NullListener).unwrap();
    assert!(level.graph().is_empty());

    let states = states_seen(&mut level, 1.0);
    assert_eq!(states, vec![AgentState::RoamMap]);
}

#[test]
fn test_bad_agent_config_fails_to_spawn() {
    let mut level = yard();
    let mut config = AgentConfig::default();
    config.max_pick_attempts = 0;
    let result = level.spawn_agent(AgentSpawn::new("broken", Vec3::ONE).with_config(config));
    assert!(matches!(result, Err(LevelError::Agent(_))));
    assert_eq!(level.detection().sensor_count(), 0);
}
