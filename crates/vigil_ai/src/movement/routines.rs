//! Movement routines. Each one lives in its own `TaskSlot` of `Movement`.

use bevy::prelude::*;

use super::sampling::{facing, has_arrived, rotate_towards, sample_random_point, strafe_position, SightLine};
use crate::body::AgentBody;
use crate::config::MovementConfig;
use crate::tasks::{Poll, Wait};

fn issue_destination(body: &mut AgentBody, point: Vec3) {
    body.nav.set_stopped(false);
    body.nav.set_destination(point);
}

/// One-shot travel: issue the destination, then finish on arrival.
#[derive(Debug, Clone)]
pub struct TravelRoutine {
    destination: Vec3,
    issued: bool,
}

impl TravelRoutine {
    pub fn new(destination: Vec3) -> Self {
        Self {
            destination,
            issued: false,
        }
    }

    pub fn destination(&self) -> Vec3 {
        self.destination
    }

    pub fn resume(&mut self, body: &mut AgentBody, slack: f32) -> Poll {
        if !self.issued {
            issue_destination(body, self.destination);
            self.issued = true;
            return Poll::Pending;
        }
        if has_arrived(body.nav.as_ref(), slack) {
            Poll::Ready
        } else {
            Poll::Pending
        }
    }
}

/// Where a cycling routine gets its next point from.
#[derive(Debug, Clone)]
pub enum Route {
    Waypoints { points: Vec<Vec3>, next: usize },
    Random { radius: f32 },
    Strafe { target: Entity, sight: SightLine },
}

impl Route {
    fn next_point(&mut self, body: &mut AgentBody, config: &MovementConfig) -> Option<Vec3> {
        match self {
            Route::Waypoints { points, next } => {
                let point = points.get(*next).copied()?;
                *next = (*next + 1) % points.len();
                Some(point)
            }
            Route::Random { radius } => sample_random_point(body, *radius, config.sample_attempts),
            Route::Strafe { target, sight } => strafe_position(body, *target, config.strafe_offset, sight),
        }
    }
}

#[derive(Debug, Clone)]
enum Leg {
    Pick,
    Travel(Vec3),
    Dwell(Wait),
}

/// Endless pick → travel → dwell cycle (patrol, random patrol, strafe).
///
/// Если точку выбрать не удалось, ждём dwell и пробуем снова.
#[derive(Debug, Clone)]
pub struct CycleRoutine {
    route: Route,
    leg: Leg,
}

impl CycleRoutine {
    pub fn new(route: Route) -> Self {
        Self {
            route,
            leg: Leg::Pick,
        }
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn resume(&mut self, body: &mut AgentBody, config: &MovementConfig, dt: f32) -> Poll {
        loop {
            match self.leg {
                Leg::Pick => {
                    self.leg = match self.route.next_point(body, config) {
                        Some(point) => {
                            issue_destination(body, point);
                            Leg::Travel(point)
                        }
                        None => Leg::Dwell(Wait::seconds(config.patrol_dwell)),
                    };
                    return Poll::Pending;
                }
                Leg::Travel(_) => {
                    if has_arrived(body.nav.as_ref(), config.arrival_slack) {
                        self.leg = Leg::Dwell(Wait::seconds(config.patrol_dwell));
                    }
                    return Poll::Pending;
                }
                Leg::Dwell(ref mut wait) => {
                    if !wait.tick(dt) {
                        return Poll::Pending;
                    }
                    self.leg = Leg::Pick;
                }
            }
        }
    }
}

/// Поворачивает тело к горизонтальному направлению на цель, каждый шаг, бесконечно.
#[derive(Debug, Clone)]
pub struct LookAtRoutine {
    target: Entity,
}

impl LookAtRoutine {
    pub fn new(target: Entity) -> Self {
        Self { target }
    }

    pub fn target(&self) -> Entity {
        self.target
    }

    pub fn resume(&mut self, body: &mut AgentBody, threshold: f32, dt: f32) -> Poll {
        let Some(offset) = body.offset_to(self.target) else {
            return Poll::Pending;
        };
        let flat = Vec3::new(offset.x, 0.0, offset.z);
        if flat.length() <= threshold {
            return Poll::Pending;
        }
        if let Some(desired) = facing(flat) {
            let current = body.nav.transform().rotation;
            let max_step = body.nav.angular_speed().to_radians() * dt;
            body.nav.set_rotation(rotate_towards(current, desired, max_step));
        }
        Poll::Pending
    }
}
