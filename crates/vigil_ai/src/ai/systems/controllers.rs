//! Controller stepping.

use bevy::prelude::*;

use crate::ai::controller::AgentController;
use crate::ai::events::{AgentFaulted, AiStateChanged};

/// Steps every controller by the fixed delta and reports each state change
/// it made, in order.
pub fn tick_agent_controllers(
    time: Res<Time<Fixed>>,
    mut agents: Query<(Entity, &mut AgentController)>,
    mut state_changed: EventWriter<AiStateChanged>,
    mut faulted: EventWriter<AgentFaulted>,
) {
    let delta = time.delta_secs();

    for (entity, mut agent) in agents.iter_mut() {
        let result = agent.step(delta);

        for (from, to) in agent.drain_transitions() {
            state_changed.write(AiStateChanged {
                agent: entity,
                from,
                to,
            });
        }

        if let Err(error) = result {
            faulted.write(AgentFaulted {
                agent: entity,
                error,
            });
        }
    }
}

/// Starts activation for controllers that were just inserted.
pub fn enable_new_controllers(mut added: Query<&mut AgentController, Added<AgentController>>) {
    for mut agent in added.iter_mut() {
        agent.enable();
    }
}
