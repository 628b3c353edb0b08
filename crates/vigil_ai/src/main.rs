//! Headless VIGIL AI run
//!
//! One agent patrols two waypoints behind a wall while an adversary walks
//! back and forth across the arena. Prints state changes and periodic
//! snapshots; same seed, same output.

use bevy::prelude::*;
use vigil_ai::sandbox::{
    add_target_collider, add_wall, Arena, FlatNavAgent, RecordingWeapon, SandboxBody, SandboxCollider, SandboxPlugin,
};
use vigil_ai::{
    create_headless_app, log_error, log_info, world_snapshot, AgentController, AiStateChanged, BehaviorConfig,
    BehaviorSet, DeterministicRng, SpawnPoint, Targetable,
};

const TICKS: usize = 1800;

/// Walks between two points at constant speed.
#[derive(Component, Debug)]
struct Wander {
    from: Vec3,
    to: Vec3,
    speed: f32,
}

fn wander(time: Res<Time<Fixed>>, mut walkers: Query<(&mut Wander, &mut Transform)>) {
    let delta = time.delta_secs();
    for (mut walk, mut transform) in walkers.iter_mut() {
        let to_goal = walk.to - transform.translation;
        let step = walk.speed * delta;
        if to_goal.length() <= step {
            transform.translation = walk.to;
            let (from, to) = (walk.from, walk.to);
            walk.from = to;
            walk.to = from;
        } else {
            transform.translation += to_goal.normalize() * step;
        }
    }
}

fn report_state_changes(mut events: EventReader<AiStateChanged>) {
    for event in events.read() {
        log_info(&format!("{:?}: {:?} -> {:?}", event.agent, event.from, event.to));
    }
}

fn main() {
    let seed = 42;
    println!("Starting VIGIL AI headless run (seed: {})", seed);

    let mut app = create_headless_app(seed);
    app.add_plugins(SandboxPlugin)
        .add_systems(FixedUpdate, wander.before(BehaviorSet::RosterSync))
        .add_systems(FixedUpdate, report_state_changes.after(BehaviorSet::Tick));

    let world = app.world_mut();
    let arena = world.resource::<Arena>().clone();
    add_wall(&arena, Vec3::new(0.0, 1.5, -12.0), Vec3::new(4.0, 1.5, 0.5));

    let adversary_start = Vec3::new(-20.0, 0.0, -25.0);
    let adversary = world
        .spawn((
            Transform::from_translation(adversary_start),
            Targetable,
            Wander {
                from: adversary_start,
                to: Vec3::new(20.0, 0.0, -25.0),
                speed: 2.0,
            },
            SandboxCollider(add_target_collider(&arena, adversary_start)),
        ))
        .id();

    let mut config = BehaviorConfig::default();
    config.seed = world.resource_mut::<DeterministicRng>().next_seed();
    config.movement.patrol_waypoints = vec![Vec3::new(-6.0, 0.0, 0.0), Vec3::new(6.0, 0.0, 0.0)];
    config.attack.spawn_points = vec![
        SpawnPoint::new("muzzle_left", Vec3::new(-0.3, 1.4, -0.5)),
        SpawnPoint::new("muzzle_right", Vec3::new(0.3, 1.4, -0.5)),
    ];

    let nav = FlatNavAgent::new(Vec3::ZERO);
    let agent = world.spawn(Transform::default()).id();
    let controller = AgentController::builder(agent)
        .config(config)
        .nav_agent(nav.clone())
        .spatial_query(arena.clone())
        .weapon(RecordingWeapon::new("left"))
        .weapon(RecordingWeapon::new("right"))
        .primary_adversary(adversary, adversary_start)
        .build();

    match controller {
        Ok(controller) => {
            world.entity_mut(agent).insert((controller, SandboxBody(nav)));
        }
        Err(err) => {
            log_error(&format!("failed to build agent: {}", err));
            return;
        }
    }

    for tick in 0..TICKS {
        app.update();

        if tick % 300 == 0 {
            for line in world_snapshot(app.world_mut()) {
                println!("Tick {}: {}", tick, line);
            }
        }
    }

    println!("Run complete!");
}
