//! AI states.
//!
//! States только оркеструют: запускают/останавливают задачи подсистем
//! на enter/exit и выбирают следующий state на каждом tick. Переход это
//! значение из `update`, states друг на друга не ссылаются.

use bevy::prelude::*;

use crate::body::AgentBody;
use crate::combat::Attack;
use crate::error::{BehaviorError, BehaviorResult};
use crate::movement::Movement;
use crate::perception::Perception;

/// Everything a state hook may drive, borrowed from the controller.
pub struct Rig<'a> {
    pub body: &'a mut AgentBody,
    pub perception: &'a mut Perception,
    pub movement: &'a mut Movement,
    pub attack: &'a mut Attack,
}

/// Discriminant of `AiState`, for events and queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum AiStateKind {
    Idle,
    SearchForTarget,
    TakeRange,
    Attack,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AiState {
    /// Патруль (или стоим с расширенным обзором), пока кто-то не появится.
    Idle,

    /// Цель потеряна: идём к last known position, потом random patrol.
    SearchForTarget {
        /// Investigate ещё в процессе.
        investigating: bool,
    },

    /// Get into the engagement band while facing and firing at the target.
    TakeRange,

    /// В band: strafe вокруг цели и стрельба.
    Attack,
}

impl AiState {
    pub fn search_for_target() -> Self {
        AiState::SearchForTarget {
            investigating: false,
        }
    }

    pub fn kind(&self) -> AiStateKind {
        match self {
            AiState::Idle => AiStateKind::Idle,
            AiState::SearchForTarget { .. } => AiStateKind::SearchForTarget,
            AiState::TakeRange => AiStateKind::TakeRange,
            AiState::Attack => AiStateKind::Attack,
        }
    }

    pub fn enter(&mut self, rig: &mut Rig) -> BehaviorResult<()> {
        match self {
            AiState::Idle => {
                let patrolling = rig.movement.start_patrolling(rig.body);
                rig.perception.start_looking_for_target(patrolling, rig.body);
            }

            AiState::SearchForTarget { investigating } => {
                rig.perception.start_search_for_target(rig.body);
                match rig.perception.last_known_position() {
                    Some(point) => rig.movement.start_investigate_target(point, rig.body),
                    None => crate::log("search: no last known position to investigate"),
                }
                *investigating = true;
            }

            AiState::TakeRange => {
                let target = require_target(rig, "entering TakeRange")?;
                rig.movement.start_taking_range(target, rig.body);
                rig.movement.start_looking_to_target(target);
                rig.perception.start_following_target_sight();
                rig.attack.start_attacking_target(target);
            }

            AiState::Attack => {
                let target = require_target(rig, "entering Attack")?;
                rig.perception.start_following_target_sight();
                rig.movement.start_looking_to_target(target);
                rig.movement.start_strafing(target, rig.body);
                rig.attack.start_attacking_target(target);
            }
        }
        Ok(())
    }

    pub fn exit(&mut self, rig: &mut Rig) {
        match self {
            AiState::Idle => {
                rig.movement.stop_patrolling();
            }

            AiState::SearchForTarget { investigating } => {
                rig.movement.stop_patrolling();
                rig.movement.stop_investigate_target();
                *investigating = false;
            }

            AiState::TakeRange => {
                rig.attack.stop_attacking();
                rig.movement.stop_taking_range(rig.body);
                rig.movement.stop_looking_to_target();
            }

            AiState::Attack => {
                rig.movement.stop_strafing();
                rig.attack.stop_attacking();
                rig.movement.stop_looking_to_target();
            }
        }
    }

    /// One tick. Returns the state to switch to, if any.
    pub fn update(&mut self, rig: &mut Rig) -> BehaviorResult<Option<AiState>> {
        match self {
            AiState::Idle => {
                if rig.perception.target_on_sight().is_some() {
                    return Ok(Some(AiState::TakeRange));
                }
            }

            AiState::SearchForTarget { investigating } => {
                if *investigating && !rig.movement.is_investigating() {
                    rig.movement.start_random_patrol(rig.body);
                    *investigating = false;
                }
                if rig.perception.target_on_sight().is_some() {
                    return Ok(Some(AiState::TakeRange));
                }
            }

            AiState::TakeRange => {
                let Some(target) = rig.perception.target_on_sight() else {
                    return Ok(Some(AiState::search_for_target()));
                };
                if rig.perception.is_target_in_attack_range(rig.body)? {
                    return Ok(Some(AiState::Attack));
                }
                rig.movement.start_taking_range(target, rig.body);
            }

            AiState::Attack => {
                if rig.perception.target_on_sight().is_none() {
                    return Ok(Some(AiState::search_for_target()));
                }
                if !rig.perception.is_target_in_attack_range(rig.body)? {
                    return Ok(Some(AiState::TakeRange));
                }
            }
        }
        Ok(None)
    }
}

fn require_target(rig: &Rig, operation: &'static str) -> BehaviorResult<Entity> {
    rig.perception
        .target_on_sight()
        .ok_or(BehaviorError::NoTargetOnSight { operation })
}
