//! Agent controller: owns the subsystems, the state machine and the tick.
//!
//! Lifecycle:
//! `Disabled` --enable--> `Activating` (pathfinding agent выключен несколько шагов)
//! --> `Active` (вошли в Idle, периодический tick запущен), либо `Stranded`
//! если тело не на pathable поверхности. `disable` отменяет всё из любой фазы.
//! Задачи подсистем двигаются каждый `step`; state machine тикает сразу после
//! активации, дальше раз в `update_interval`.

use bevy::prelude::*;

use super::state_machine::StateMachine;
use super::states::{AiState, AiStateKind, Rig};
use crate::body::AgentBody;
use crate::combat::Attack;
use crate::config::BehaviorConfig;
use crate::error::{BehaviorError, BehaviorResult};
use crate::movement::{Movement, SightLine};
use crate::perception::Perception;
use crate::roster::Roster;
use crate::services::{NavAgent, SpatialQuery, Weapon};
use crate::tasks::Wait;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum Lifecycle {
    Disabled,
    Activating { remaining_steps: u32 },
    Active,
    /// При активации тело оказалось вне pathable поверхности.
    Stranded,
}

#[derive(Component)]
pub struct AgentController {
    config: BehaviorConfig,
    body: AgentBody,
    perception: Perception,
    movement: Movement,
    attack: Attack,
    state_machine: StateMachine,
    lifecycle: Lifecycle,
    tick: Option<Wait>,
}

impl AgentController {
    pub fn builder(owner: Entity) -> AgentControllerBuilder {
        AgentControllerBuilder::new(owner)
    }

    pub fn owner(&self) -> Entity {
        self.body.owner
    }

    pub fn config(&self) -> &BehaviorConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle == Lifecycle::Active
    }

    pub fn state(&self) -> Option<&AiState> {
        self.state_machine.current()
    }

    pub fn state_kind(&self) -> Option<AiStateKind> {
        self.state_machine.current_kind()
    }

    pub fn perception(&self) -> &Perception {
        &self.perception
    }

    pub fn movement(&self) -> &Movement {
        &self.movement
    }

    pub fn attack(&self) -> &Attack {
        &self.attack
    }

    pub fn nav(&self) -> &dyn NavAgent {
        self.body.nav.as_ref()
    }

    pub fn roster(&self) -> &Roster {
        &self.body.roster
    }

    pub fn roster_mut(&mut self) -> &mut Roster {
        &mut self.body.roster
    }

    /// Starts activation: the pathfinding agent stays disabled for
    /// `activation_grace_steps` steps, then the agent comes alive.
    pub fn enable(&mut self) {
        self.body.nav.set_enabled(false);
        self.tick = None;
        self.lifecycle = Lifecycle::Activating {
            remaining_steps: self.config.activation_grace_steps,
        };
        crate::log(&format!("{:?}: activating", self.body.owner));
    }

    /// Выключает pathfinding agent и отменяет все задачи.
    /// Текущий state остаётся; `enable` заново входит в Idle.
    pub fn disable(&mut self) {
        self.body.nav.set_enabled(false);
        self.perception.stop_all();
        self.movement.stop_all(&mut self.body);
        self.attack.stop_attacking();
        self.tick = None;
        self.lifecycle = Lifecycle::Disabled;
        crate::log(&format!("{:?}: disabled", self.body.owner));
    }

    /// Шаг агента на `dt` секунд. При ошибке контроллер выключается.
    pub fn step(&mut self, dt: f32) -> BehaviorResult<()> {
        let result = self.step_inner(dt.max(0.0));
        if let Err(err) = &result {
            crate::log_error(&format!("{:?}: {}", self.body.owner, err));
            self.disable();
        }
        result
    }

    fn step_inner(&mut self, dt: f32) -> BehaviorResult<()> {
        match self.lifecycle {
            Lifecycle::Disabled | Lifecycle::Stranded => Ok(()),
            Lifecycle::Activating { remaining_steps } if remaining_steps > 1 => {
                self.lifecycle = Lifecycle::Activating {
                    remaining_steps: remaining_steps - 1,
                };
                Ok(())
            }
            Lifecycle::Activating { .. } => self.activate(),
            Lifecycle::Active => self.run(dt),
        }
    }

    fn activate(&mut self) -> BehaviorResult<()> {
        self.body.nav.set_enabled(true);
        if !self.body.nav.is_on_nav_mesh() {
            crate::log_warning(&format!(
                "{:?}: not on a pathable surface at {:?}, staying dormant",
                self.body.owner,
                self.body.position()
            ));
            self.lifecycle = Lifecycle::Stranded;
            return Ok(());
        }

        self.lifecycle = Lifecycle::Active;
        crate::log_info(&format!("{:?}: active", self.body.owner));

        // Цель до disable больше никто не трекает, Idle должен увидеть её заново
        self.perception.forget_target();

        // После disable старый state всё ещё текущий, exit будет здесь
        let mut rig = Rig {
            body: &mut self.body,
            perception: &mut self.perception,
            movement: &mut self.movement,
            attack: &mut self.attack,
        };
        self.state_machine.change_state(AiState::Idle, &mut rig)?;

        self.state_machine.update(&mut rig)?;
        self.tick = Some(Wait::seconds(self.config.update_interval));
        Ok(())
    }

    fn run(&mut self, dt: f32) -> BehaviorResult<()> {
        self.perception.advance(&self.body, dt);
        self.movement.advance(&mut self.body, dt);

        if !self.body.nav.is_enabled() {
            return Ok(());
        }
        let Some(tick) = self.tick.as_mut() else {
            return Ok(());
        };
        if !tick.tick(dt) {
            return Ok(());
        }
        *tick = Wait::seconds(self.config.update_interval);

        let mut rig = Rig {
            body: &mut self.body,
            perception: &mut self.perception,
            movement: &mut self.movement,
            attack: &mut self.attack,
        };
        self.state_machine.update(&mut rig)
    }

    /// Replaces the current state right away (exit, then enter).
    pub fn change_state(&mut self, next: AiState) -> BehaviorResult<()> {
        let mut rig = Rig {
            body: &mut self.body,
            perception: &mut self.perception,
            movement: &mut self.movement,
            attack: &mut self.attack,
        };
        self.state_machine.change_state(next, &mut rig)
    }

    /// Переходы (from, to) с прошлого drain, от старых к новым.
    /// `BehaviorPlugin` забирает их каждый шаг; хост с ручным `step` тоже должен.
    pub fn drain_transitions(&mut self) -> Vec<(Option<AiStateKind>, AiStateKind)> {
        self.state_machine.drain_transitions()
    }
}

/// Собирает collaborators и валидирует их в `AgentController`.
pub struct AgentControllerBuilder {
    owner: Entity,
    config: BehaviorConfig,
    nav: Option<Box<dyn NavAgent>>,
    space: Option<Box<dyn SpatialQuery>>,
    weapons: Vec<Box<dyn Weapon>>,
    primary_adversary: Option<(Entity, Vec3)>,
    targetables: Vec<(Entity, Vec3)>,
}

impl AgentControllerBuilder {
    pub fn new(owner: Entity) -> Self {
        Self {
            owner,
            config: BehaviorConfig::default(),
            nav: None,
            space: None,
            weapons: Vec::new(),
            primary_adversary: None,
            targetables: Vec::new(),
        }
    }

    pub fn config(mut self, config: BehaviorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn nav_agent(mut self, nav: impl NavAgent + 'static) -> Self {
        self.nav = Some(Box::new(nav));
        self
    }

    pub fn spatial_query(mut self, space: impl SpatialQuery + 'static) -> Self {
        self.space = Some(Box::new(space));
        self
    }

    pub fn weapon(mut self, weapon: impl Weapon + 'static) -> Self {
        self.weapons.push(Box::new(weapon));
        self
    }

    /// Главный противник агента (обычно игрок).
    pub fn primary_adversary(mut self, entity: Entity, position: Vec3) -> Self {
        self.primary_adversary = Some((entity, position));
        self
    }

    /// Additional roster entry, after the primary adversary.
    pub fn targetable(mut self, entity: Entity, position: Vec3) -> Self {
        self.targetables.push((entity, position));
        self
    }

    pub fn build(self) -> BehaviorResult<AgentController> {
        self.config.validate()?;
        let nav = self
            .nav
            .ok_or(BehaviorError::MissingCollaborator("pathfinding agent"))?;
        let space = self
            .space
            .ok_or(BehaviorError::MissingCollaborator("spatial query"))?;
        let (adversary, adversary_position) = self
            .primary_adversary
            .ok_or(BehaviorError::MissingPrimaryAdversary)?;

        let mut body = AgentBody::new(self.owner, nav, space, self.config.seed);
        body.roster.insert(adversary, adversary_position);
        for (entity, position) in self.targetables {
            if entity != self.owner && !body.roster.contains(entity) {
                body.roster.insert(entity, position);
            }
        }

        let config = self.config;
        let sight = SightLine {
            eye_height: config.perception.eye_height,
            obstacle_layers: config.perception.obstacle_layers,
        };
        let perception = Perception::new(config.perception.clone(), config.band);
        let movement = Movement::new(config.movement.clone(), config.band, sight);
        let attack = Attack::new(self.owner, self.weapons, &config.attack.spawn_points);

        Ok(AgentController {
            config,
            body,
            perception,
            movement,
            attack,
            state_machine: StateMachine::new(),
            lifecycle: Lifecycle::Disabled,
            tick: None,
        })
    }
}
