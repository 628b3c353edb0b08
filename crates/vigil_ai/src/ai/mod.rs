//! Agent behavior: states, state machine, controller and ECS systems.
//!
//! Один `AgentController` компонент = один агент. `BehaviorPlugin` шагает
//! все контроллеры в FixedUpdate (детерминизм).

use bevy::prelude::*;

pub mod controller;
pub mod events;
pub mod state_machine;
pub mod states;
pub mod systems;

#[cfg(test)]
mod controller_tests;

pub use controller::{AgentController, AgentControllerBuilder, Lifecycle};
pub use events::{AgentFaulted, AiStateChanged};
pub use state_machine::StateMachine;
pub use states::{AiState, AiStateKind, Rig};

/// Порядок behavior систем внутри FixedUpdate.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum BehaviorSet {
    /// Регистрация в roster + синк позиций.
    RosterSync,
    /// Активация и шаг контроллеров.
    Tick,
}

/// Behavior Plugin
///
/// Порядок выполнения (FixedUpdate):
/// 1. register_new_targetables / sync_roster_from_targetables
/// 2. enable_new_controllers
/// 3. tick_agent_controllers (генерирует AiStateChanged, AgentFaulted)
pub struct BehaviorPlugin;

impl Plugin for BehaviorPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<AiStateChanged>()
            .add_event::<AgentFaulted>()
            .configure_sets(FixedUpdate, (BehaviorSet::RosterSync, BehaviorSet::Tick).chain())
            .add_systems(
                FixedUpdate,
                (
                    systems::register_new_targetables,
                    systems::sync_roster_from_targetables,
                )
                    .chain()
                    .in_set(BehaviorSet::RosterSync),
            )
            .add_systems(
                FixedUpdate,
                (
                    systems::enable_new_controllers,
                    systems::tick_agent_controllers,
                )
                    .chain()
                    .in_set(BehaviorSet::Tick),
            );
    }
}
