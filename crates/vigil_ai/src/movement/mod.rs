//! Movement subsystem.
//!
//! Шесть независимых режимов, по `TaskSlot` на каждый:
//! patrol (waypoints или random), take-range, look-at, investigate,
//! strafe, push. Повторный start ничего не делает; stop всегда безопасен.
//! Patrol и take-range вместе не работают: их запускают разные states.

mod routines;
mod sampling;


use bevy::prelude::*;

pub use routines::{CycleRoutine, LookAtRoutine, Route, TravelRoutine};
pub use sampling::{
    facing, has_arrived, rotate_towards, sample_point_in_arc, sample_random_point, strafe_position,
    SightLine,
};

use crate::body::AgentBody;
use crate::config::{EngagementBand, MovementConfig};
use crate::tasks::TaskSlot;

pub struct Movement {
    config: MovementConfig,
    band: EngagementBand,
    sight: SightLine,
    patrol: TaskSlot<CycleRoutine>,
    take_range: TaskSlot<TravelRoutine>,
    look_at: TaskSlot<LookAtRoutine>,
    investigate: TaskSlot<TravelRoutine>,
    strafe: TaskSlot<CycleRoutine>,
    push: TaskSlot<TravelRoutine>,
}

impl Movement {
    pub fn new(config: MovementConfig, band: EngagementBand, sight: SightLine) -> Self {
        Self {
            config,
            band,
            sight,
            patrol: TaskSlot::new("patrol"),
            take_range: TaskSlot::new("take range"),
            look_at: TaskSlot::new("look at target"),
            investigate: TaskSlot::new("investigate"),
            strafe: TaskSlot::new("strafe"),
            push: TaskSlot::new("push"),
        }
    }

    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    // ------------------------------------------------------------------------
    // Patrol
    // ------------------------------------------------------------------------

    /// Цикл по waypoints. Меньше двух точек → false, ничего не делаем.
    pub fn start_patrolling(&mut self, body: &mut AgentBody) -> bool {
        if self.config.patrol_waypoints.len() < 2 {
            return false;
        }
        body.nav.set_update_rotation(true);
        body.nav.set_update_position(true);

        let points = self.config.patrol_waypoints.clone();
        if self
            .patrol
            .start(|| CycleRoutine::new(Route::Waypoints { points, next: 0 }))
            .is_some()
        {
            let config = &self.config;
            self.patrol.advance(|patrol| patrol.resume(body, config, 0.0));
        }
        true
    }

    /// Случайные pathable точки вокруг агента. Слот общий с patrol, поэтому
    /// no-op пока идёт любой патруль.
    pub fn start_random_patrol(&mut self, body: &mut AgentBody) {
        body.nav.set_update_rotation(true);
        body.nav.set_update_position(true);

        let radius = self.config.random_patrol_radius;
        if self
            .patrol
            .start(|| CycleRoutine::new(Route::Random { radius }))
            .is_some()
        {
            let config = &self.config;
            self.patrol.advance(|patrol| patrol.resume(body, config, 0.0));
        }
    }

    pub fn stop_patrolling(&mut self) {
        self.patrol.stop();
    }

    pub fn is_patrolling(&self) -> bool {
        self.patrol.is_running()
    }

    pub fn is_random_patrolling(&self) -> bool {
        matches!(self.patrol.get().map(|p| p.route()), Some(Route::Random { .. }))
    }

    // ------------------------------------------------------------------------
    // Take range
    // ------------------------------------------------------------------------

    /// Moves one step toward the engagement band around `target`.
    ///
    /// Слишком близко: отходим от цели. Слишком далеко: подходим.
    /// Если линию перекрывает препятствие, берём случайную pathable точку в
    /// дуге reposition. Возвращает выданную точку; `None` если в band, если
    /// прошлый take-range ещё идёт, или точку найти не удалось.
    pub fn start_taking_range(&mut self, target: Entity, body: &mut AgentBody) -> Option<Vec3> {
        body.nav.set_update_rotation(false);
        if self.take_range.is_running() {
            return None;
        }

        let position = body.position();
        let offset = body.roster.position_of(target)? - position;
        let distance = offset.length();

        let direction = if distance < self.band.min {
            (-offset).try_normalize().unwrap_or(-body.nav.forward())
        } else if distance > self.band.max {
            offset / distance
        } else {
            return None;
        };

        let step = self.config.range_step;
        let blocked = body
            .space
            .raycast(self.sight.eye(position), direction, step, self.sight.obstacle_layers)
            .is_some();

        let goal = if blocked {
            let fallback = sample_point_in_arc(
                body,
                direction,
                self.config.reposition_radius,
                self.config.reposition_half_arc,
                self.config.sample_attempts,
            );
            if fallback.is_none() {
                crate::log(&format!(
                    "take range: line {:?} blocked and no pathable fallback point",
                    direction
                ));
            }
            fallback?
        } else {
            position + direction * step
        };

        self.take_range.start(|| TravelRoutine::new(goal));
        let slack = self.config.arrival_slack;
        self.take_range.advance(|travel| travel.resume(body, slack));
        Some(goal)
    }

    pub fn stop_taking_range(&mut self, body: &mut AgentBody) {
        body.nav.set_update_rotation(true);
        self.take_range.stop();
    }

    pub fn is_taking_range(&self) -> bool {
        self.take_range.is_running()
    }

    // ------------------------------------------------------------------------
    // Look at target
    // ------------------------------------------------------------------------

    /// Starts turning toward `target`; the first turn happens on the next step.
    pub fn start_looking_to_target(&mut self, target: Entity) {
        self.look_at.start(|| LookAtRoutine::new(target));
    }

    pub fn stop_looking_to_target(&mut self) {
        self.look_at.stop();
    }

    pub fn is_looking_at_target(&self) -> bool {
        self.look_at.is_running()
    }

    pub fn look_target(&self) -> Option<Entity> {
        self.look_at.get().map(LookAtRoutine::target)
    }

    // ------------------------------------------------------------------------
    // Investigate
    // ------------------------------------------------------------------------

    /// Travels once to `point`; the mode clears itself on arrival.
    pub fn start_investigate_target(&mut self, point: Vec3, body: &mut AgentBody) {
        if self.investigate.start(|| TravelRoutine::new(point)).is_some() {
            let slack = self.config.arrival_slack;
            self.investigate.advance(|travel| travel.resume(body, slack));
        }
    }

    pub fn stop_investigate_target(&mut self) {
        self.investigate.stop();
    }

    pub fn is_investigating(&self) -> bool {
        self.investigate.is_running()
    }

    pub fn investigate_point(&self) -> Option<Vec3> {
        self.investigate.get().map(TravelRoutine::destination)
    }

    // ------------------------------------------------------------------------
    // Strafe
    // ------------------------------------------------------------------------

    pub fn start_strafing(&mut self, target: Entity, body: &mut AgentBody) {
        let sight = self.sight;
        if self
            .strafe
            .start(|| CycleRoutine::new(Route::Strafe { target, sight }))
            .is_some()
        {
            let config = &self.config;
            self.strafe.advance(|strafe| strafe.resume(body, config, 0.0));
        }
    }

    pub fn stop_strafing(&mut self) {
        self.strafe.stop();
    }

    pub fn is_strafing(&self) -> bool {
        self.strafe.is_running()
    }

    pub fn strafe_target(&self) -> Option<Entity> {
        match self.strafe.get()?.route() {
            Route::Strafe { target, .. } => Some(*target),
            _ => None,
        }
    }

    // ------------------------------------------------------------------------
    // Push
    // ------------------------------------------------------------------------

    /// Принудительное одноразовое движение к `point`, свой слот.
    pub fn push_to_target(&mut self, point: Vec3, body: &mut AgentBody) {
        if self.push.start(|| TravelRoutine::new(point)).is_some() {
            let slack = self.config.arrival_slack;
            self.push.advance(|travel| travel.resume(body, slack));
        }
    }

    pub fn stop_push(&mut self) {
        self.push.stop();
    }

    pub fn is_pushing(&self) -> bool {
        self.push.is_running()
    }

    // ------------------------------------------------------------------------
    // Driver
    // ------------------------------------------------------------------------

    /// Advances every outstanding routine by `dt`.
    pub fn advance(&mut self, body: &mut AgentBody, dt: f32) {
        let config = &self.config;
        let slack = config.arrival_slack;

        self.patrol.advance(|patrol| patrol.resume(body, config, dt));
        self.take_range.advance(|travel| travel.resume(body, slack));
        self.look_at
            .advance(|look| look.resume(body, config.look_threshold, dt));
        self.investigate.advance(|travel| travel.resume(body, slack));
        self.strafe.advance(|strafe| strafe.resume(body, config, dt));
        self.push.advance(|travel| travel.resume(body, slack));
    }

    /// Cancels every mode and gives rotation control back to the pathfinding agent.
    pub fn stop_all(&mut self, body: &mut AgentBody) {
        self.stop_patrolling();
        self.stop_taking_range(body);
        self.stop_looking_to_target();
        self.stop_investigate_target();
        self.stop_strafing();
        self.stop_push();
    }

    pub fn active_modes(&self) -> usize {
        [
            self.patrol.is_running(),
            self.take_range.is_running(),
            self.look_at.is_running(),
            self.investigate.is_running(),
            self.strafe.is_running(),
            self.push.is_running(),
        ]
        .into_iter()
        .filter(|running| *running)
        .count()
    }
}
