//! Roster sync: `Targetable` transforms → every agent's roster.

use bevy::prelude::*;

use crate::ai::controller::AgentController;
use crate::roster::Targetable;

/// Обновляет позиции roster из `Targetable` entities и деактивирует записи,
/// чьих entity больше нет (despawn или сняли Targetable).
pub fn sync_roster_from_targetables(
    targets: Query<&Transform, With<Targetable>>,
    mut agents: Query<&mut AgentController>,
) {
    for mut agent in agents.iter_mut() {
        for entry in agent.roster_mut().iter_mut() {
            match targets.get(entry.entity) {
                Ok(transform) => {
                    entry.position = transform.translation;
                    entry.active = true;
                }
                Err(_) => entry.active = false,
            }
        }
    }
}

/// Adds newly spawned `Targetable` entities to every agent's roster.
pub fn register_new_targetables(
    added: Query<(Entity, &Transform), Added<Targetable>>,
    mut agents: Query<&mut AgentController>,
) {
    for (entity, transform) in added.iter() {
        for mut agent in agents.iter_mut() {
            if agent.owner() != entity && !agent.roster().contains(entity) {
                agent.roster_mut().insert(entity, transform.translation);
            }
        }
    }
}
