//! AI events emitted by the behavior systems.

use bevy::prelude::*;

use super::states::AiStateKind;
use crate::error::BehaviorError;

/// State machine агента сменила state. Одно событие на переход, поэтому
/// за один fixed step их может быть несколько (активация сразу в TakeRange
/// сначала репортит Idle).
#[derive(Event, Debug, Clone, PartialEq)]
pub struct AiStateChanged {
    pub agent: Entity,
    /// `None` on the first activation or after a failed enter.
    pub from: Option<AiStateKind>,
    pub to: AiStateKind,
}

/// Шаг агента упал, агент выключен.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct AgentFaulted {
    pub agent: Entity,
    pub error: BehaviorError,
}
