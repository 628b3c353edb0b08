//! Behavior integration tests
//!
//! Agents run through `BehaviorPlugin` + `SandboxPlugin` in a headless app:
//! - patrol between waypoints
//! - detection → TakeRange → Attack, with state change events
//! - despawned or hidden adversary → SearchForTarget
//! - late targetables join the roster
//! - a failing step disables the agent and reports it

use bevy::prelude::*;
use vigil_ai::sandbox::{
    add_target_collider, add_wall, Arena, FlatNavAgent, RecordingWeapon, SandboxBody, SandboxCollider, SandboxPlugin,
};
use vigil_ai::*;

/// State changes and faults seen so far.
#[derive(Resource, Default)]
struct Journal {
    changes: Vec<AiStateChanged>,
    faults: Vec<AgentFaulted>,
}

fn record_events(
    mut journal: ResMut<Journal>,
    mut changes: EventReader<AiStateChanged>,
    mut faults: EventReader<AgentFaulted>,
) {
    journal.changes.extend(changes.read().cloned());
    journal.faults.extend(faults.read().cloned());
}

fn create_sandbox_app() -> App {
    let mut app = create_headless_app(42);
    app.add_plugins(SandboxPlugin)
        .init_resource::<Journal>()
        .add_systems(FixedUpdate, record_events.after(BehaviorSet::Tick));
    app
}

fn spawn_adversary(app: &mut App, position: Vec3) -> Entity {
    let world = app.world_mut();
    let arena = world.resource::<Arena>().clone();
    world
        .spawn((
            Transform::from_translation(position),
            Targetable,
            SandboxCollider(add_target_collider(&arena, position)),
        ))
        .id()
}

struct SpawnedAgent {
    entity: Entity,
    nav: FlatNavAgent,
    weapon: RecordingWeapon,
}

fn spawn_agent(app: &mut App, config: BehaviorConfig, adversary: Entity) -> SpawnedAgent {
    let world = app.world_mut();
    let arena = world.resource::<Arena>().clone();
    let adversary_at = world
        .get::<Transform>(adversary)
        .map(|t| t.translation)
        .unwrap_or_default();

    let nav = FlatNavAgent::new(Vec3::ZERO);
    let weapon = RecordingWeapon::new("rifle");
    let entity = world.spawn(Transform::default()).id();
    let controller = AgentController::builder(entity)
        .config(config)
        .nav_agent(nav.clone())
        .spatial_query(arena)
        .weapon(weapon.clone())
        .primary_adversary(adversary, adversary_at)
        .build()
        .expect("agent builds");
    world.entity_mut(entity).insert((controller, SandboxBody(nav.clone())));

    SpawnedAgent { entity, nav, weapon }
}

fn armed_config() -> BehaviorConfig {
    let mut config = BehaviorConfig::default();
    config.attack.spawn_points = vec![SpawnPoint::new("muzzle", Vec3::new(0.3, 1.4, -0.5))];
    config
}

fn controller(app: &App, agent: Entity) -> &AgentController {
    app.world().get::<AgentController>(agent).expect("agent has a controller")
}

/// Updates until `agent` is in `kind`; false on timeout.
fn run_until(app: &mut App, agent: Entity, kind: AiStateKind, max_updates: usize) -> bool {
    for _ in 0..max_updates {
        if controller(app, agent).state_kind() == Some(kind) {
            return true;
        }
        app.update();
    }
    controller(app, agent).state_kind() == Some(kind)
}

#[test]
fn test_patrol_cycles_between_waypoints() {
    let a = Vec3::new(5.0, 0.0, 0.0);
    let b = Vec3::new(-5.0, 0.0, 0.0);
    let mut config = BehaviorConfig::default();
    config.movement.patrol_waypoints = vec![a, b];

    let mut app = create_sandbox_app();
    let adversary = spawn_adversary(&mut app, Vec3::new(0.0, 0.0, 40.0));
    let agent = spawn_agent(&mut app, config, adversary);

    let mut visits: Vec<Vec3> = Vec::new();
    for _ in 0..900 {
        app.update();
        let position = agent.nav.position();
        for waypoint in [a, b] {
            if position.distance(waypoint) < 0.05 && visits.last() != Some(&waypoint) {
                visits.push(waypoint);
            }
        }
    }

    assert!(visits.len() >= 3, "visited {:?}", visits);
    assert_ne!(visits[0], visits[1]);
    assert_eq!(visits[0], visits[2]);
    assert_eq!(controller(&app, agent.entity).state_kind(), Some(AiStateKind::Idle));
    assert!(agent.weapon.calls().is_empty());
}

#[test]
fn test_visible_adversary_is_engaged() {
    let mut app = create_sandbox_app();
    let adversary = spawn_adversary(&mut app, Vec3::new(0.0, 0.0, -10.0));
    let agent = spawn_agent(&mut app, armed_config(), adversary);

    assert!(run_until(&mut app, agent.entity, AiStateKind::Attack, 60));

    let ctrl = controller(&app, agent.entity);
    assert!(ctrl.is_active());
    assert_eq!(ctrl.perception().target_on_sight(), Some(adversary));
    assert!(ctrl.attack().is_attacking());
    assert!(agent.weapon.is_firing());

    let journal = app.world().resource::<Journal>();
    assert!(journal.changes.iter().all(|c| c.agent == agent.entity));
    let transitions: Vec<_> = journal.changes.iter().map(|c| (c.from, c.to)).collect();
    assert_eq!(
        transitions,
        vec![
            (None, AiStateKind::Idle),
            (Some(AiStateKind::Idle), AiStateKind::TakeRange),
            (Some(AiStateKind::TakeRange), AiStateKind::Attack),
        ]
    );
    assert!(journal.faults.is_empty());
}

#[test]
fn test_despawned_adversary_goes_inactive_and_agent_searches() {
    let mut app = create_sandbox_app();
    let adversary = spawn_adversary(&mut app, Vec3::new(0.0, 0.0, -10.0));
    let agent = spawn_agent(&mut app, armed_config(), adversary);
    assert!(run_until(&mut app, agent.entity, AiStateKind::Attack, 60));

    let collider = app.world().get::<SandboxCollider>(adversary).map(|c| c.0);
    if let Some(id) = collider {
        app.world().resource::<Arena>().remove(id);
    }
    app.world_mut().despawn(adversary);

    assert!(run_until(&mut app, agent.entity, AiStateKind::SearchForTarget, 120));

    let ctrl = controller(&app, agent.entity);
    let entry = ctrl.roster().get(adversary).expect("entry is kept");
    assert!(!entry.active);
    assert_eq!(ctrl.perception().target_on_sight(), None);
    assert!(!agent.weapon.is_firing());
}

#[test]
fn test_wall_between_agent_and_adversary_triggers_search() {
    let adversary_at = Vec3::new(0.0, 0.0, -10.0);
    let mut app = create_sandbox_app();
    let adversary = spawn_adversary(&mut app, adversary_at);
    let agent = spawn_agent(&mut app, armed_config(), adversary);
    assert!(run_until(&mut app, agent.entity, AiStateKind::Attack, 60));

    let arena = app.world().resource::<Arena>().clone();
    add_wall(&arena, Vec3::new(0.0, 1.0, -5.0), Vec3::new(6.0, 3.0, 0.25));

    assert!(run_until(&mut app, agent.entity, AiStateKind::SearchForTarget, 300));

    let ctrl = controller(&app, agent.entity);
    assert_eq!(ctrl.perception().last_known_position(), Some(adversary_at));
    assert!(ctrl.perception().is_searching_for_target());
    assert!(!agent.weapon.is_firing());
}

#[test]
fn test_late_targetable_is_registered_and_spotted() {
    let mut app = create_sandbox_app();
    let far_adversary = spawn_adversary(&mut app, Vec3::new(0.0, 0.0, 60.0));
    let agent = spawn_agent(&mut app, armed_config(), far_adversary);

    for _ in 0..30 {
        app.update();
    }
    assert_eq!(controller(&app, agent.entity).state_kind(), Some(AiStateKind::Idle));

    let newcomer = spawn_adversary(&mut app, Vec3::new(0.0, 0.0, -10.0));
    assert!(run_until(&mut app, agent.entity, AiStateKind::TakeRange, 60));

    let ctrl = controller(&app, agent.entity);
    assert!(ctrl.roster().contains(newcomer));
    assert!(!ctrl.roster().contains(agent.entity));
    assert_eq!(ctrl.perception().target_on_sight(), Some(newcomer));
}

#[test]
fn test_failing_step_is_reported_and_disables_agent() {
    let mut config = armed_config();
    config.perception.on_sight_interval = 100.0;

    let mut app = create_sandbox_app();
    let adversary = spawn_adversary(&mut app, Vec3::new(0.0, 0.0, -18.0));
    let agent = spawn_agent(&mut app, config, adversary);
    assert!(run_until(&mut app, agent.entity, AiStateKind::TakeRange, 60));
    // First sight check passes while the adversary is still known.
    app.update();

    app.world_mut()
        .get_mut::<AgentController>(agent.entity)
        .expect("agent has a controller")
        .roster_mut()
        .remove(adversary);

    for _ in 0..30 {
        app.update();
    }

    let journal = app.world().resource::<Journal>();
    assert_eq!(
        journal.faults,
        vec![AgentFaulted {
            agent: agent.entity,
            error: BehaviorError::NoTargetOnSight {
                operation: "attack range check"
            },
        }]
    );
    assert!(!controller(&app, agent.entity).is_active());
    assert_eq!(controller(&app, agent.entity).lifecycle(), Lifecycle::Disabled);
    assert!(!agent.nav.is_enabled());
    assert!(!agent.weapon.is_firing());
}
