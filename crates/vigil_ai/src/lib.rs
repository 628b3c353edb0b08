//! VIGIL AI: agent behavior engine
//!
//! Drives a hostile agent through Idle → TakeRange → Attack → SearchForTarget
//! using three subsystems (Perception, Movement, Attack) advanced as
//! cooperative tasks by the agent's controller.
//!
//! The engine never owns the world: pathfinding, raycasts and weapons are
//! services behind traits (`services`). A host either steps controllers
//! itself (`AgentController::step`) or lets `BehaviorPlugin` do it in
//! FixedUpdate. `sandbox` provides headless implementations of the services.

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub mod ai;
pub mod body;
pub mod collision_layers;
pub mod combat;
pub mod config;
pub mod error;
pub mod logger;
pub mod movement;
pub mod perception;
pub mod roster;
pub mod sandbox;
pub mod services;
pub mod tasks;

pub use ai::{
    AgentController, AgentControllerBuilder, AgentFaulted, AiState, AiStateChanged, AiStateKind, BehaviorPlugin,
    BehaviorSet, Lifecycle,
};
pub use body::AgentBody;
pub use collision_layers::LayerMask;
pub use combat::Attack;
pub use config::{AttackConfig, BehaviorConfig, EngagementBand, MovementConfig, PerceptionConfig, SpawnPoint};
pub use error::{BehaviorError, BehaviorResult};
pub use logger::{
    init_logger, log, log_error, log_info, log_warning, set_log_level, set_logger, LogLevel, LogPrinter,
};
pub use movement::Movement;
pub use perception::{Perception, PerceptionState, SightProfile};
pub use roster::{Roster, RosterEntry, Targetable};
pub use services::{NavAgent, PathStatus, RayHit, SpatialQuery, Weapon};

/// Fixed simulation rate.
pub const TICK_HZ: f64 = 60.0;

/// Main simulation plugin: fixed timestep, seeded RNG, behavior systems.
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(Time::<Fixed>::from_hz(TICK_HZ))
            .add_plugins(BehaviorPlugin);

        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }
    }
}

/// Seeded RNG resource. Agents spawned through the app draw their controller
/// seeds from it, so a whole run is reproducible from one seed.
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    pub fn next_seed(&mut self) -> u64 {
        self.rng.gen()
    }
}

/// Minimal headless app: one FixedUpdate step per `app.update()`.
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
            1.0 / TICK_HZ,
        )))
        .add_plugins(SimulationPlugin);

    app
}

/// Deterministic text snapshot of every agent (state, position, perception),
/// sorted by entity index. Used to compare runs.
pub fn world_snapshot(world: &mut World) -> Vec<String> {
    let mut query = world.query::<(Entity, &AgentController)>();
    let mut agents: Vec<_> = query.iter(world).collect();
    agents.sort_by_key(|(entity, _)| entity.index());

    agents
        .into_iter()
        .map(|(entity, agent)| {
            format!(
                "{}: {:?} {:?} pos={:.4} {:?}",
                entity.index(),
                agent.lifecycle(),
                agent.state(),
                agent.nav().position(),
                agent.perception().state()
            )
        })
        .collect()
}
