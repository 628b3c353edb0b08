//! Single-slot state machine.

use super::states::{AiState, AiStateKind, Rig};
use crate::error::BehaviorResult;

/// Максимум один state. Пусто только до первой активации или после
/// неудачного enter.
#[derive(Debug, Default)]
pub struct StateMachine {
    current: Option<AiState>,
    /// Завершённые переходы (from, to), ещё не забранные `drain_transitions`.
    transitions: Vec<(Option<AiStateKind>, AiStateKind)>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&AiState> {
        self.current.as_ref()
    }

    pub fn current_kind(&self) -> Option<AiStateKind> {
        self.current.as_ref().map(AiState::kind)
    }

    /// Exit текущего, затем enter `next`. Если enter упал, машина остаётся
    /// пустой и ошибка возвращается.
    pub fn change_state(&mut self, next: AiState, rig: &mut Rig) -> BehaviorResult<()> {
        let from = self.current_kind();
        if let Some(mut previous) = self.current.take() {
            previous.exit(rig);
        }

        crate::log_info(&format!(
            "{:?}: {} -> {:?}",
            rig.body.owner,
            from.map_or("none".to_string(), |k| format!("{:?}", k)),
            next.kind()
        ));

        let to = next.kind();
        let state = self.current.insert(next);
        if let Err(err) = state.enter(rig) {
            self.current = None;
            return Err(err);
        }
        self.transitions.push((from, to));
        Ok(())
    }

    /// Takes every transition recorded since the last call, oldest first.
    pub fn drain_transitions(&mut self) -> Vec<(Option<AiStateKind>, AiStateKind)> {
        std::mem::take(&mut self.transitions)
    }

    /// Ticks the current state and applies the transition it returns.
    pub fn update(&mut self, rig: &mut Rig) -> BehaviorResult<()> {
        let Some(state) = self.current.as_mut() else {
            return Ok(());
        };
        if let Some(next) = state.update(rig)? {
            self.change_state(next, rig)?;
        }
        Ok(())
    }
}
