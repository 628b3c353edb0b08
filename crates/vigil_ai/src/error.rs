//! Behavior engine errors.
//!
//! Ошибки только для фатального: нет collaborators при создании, невалидный
//! конфиг, нарушение инвариантов state machine. Ожидаемо пустой результат
//! (нет pathable точки, нет strafe offset) возвращается как `None`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BehaviorError {
    /// A required collaborator was not provided to the controller builder.
    #[error("agent controller is missing its {0}")]
    MissingCollaborator(&'static str),

    /// The roster must contain the agent's primary adversary.
    #[error("agent controller has no primary adversary")]
    MissingPrimaryAdversary,

    /// An operation that needs a tracked target ran without one.
    #[error("{operation} requires a target on sight")]
    NoTargetOnSight { operation: &'static str },

    #[error("invalid behavior config: {0}")]
    InvalidConfig(String),
}

pub type BehaviorResult<T> = Result<T, BehaviorError>;
