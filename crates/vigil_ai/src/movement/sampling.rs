//! Point picking and orientation helpers shared by the movement routines.

use bevy::prelude::*;
use rand::Rng;

use crate::body::AgentBody;
use crate::collision_layers::LayerMask;
use crate::services::{NavAgent, PathStatus, SpatialQuery};

/// Eye line used to check that a candidate point keeps the target in sight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SightLine {
    pub eye_height: f32,
    pub obstacle_layers: LayerMask,
}

impl SightLine {
    pub fn eye(&self, position: Vec3) -> Vec3 {
        position + Vec3::Y * self.eye_height
    }

    /// No obstacle strictly between `from` and `to`.
    pub fn is_clear(&self, space: &dyn SpatialQuery, from: Vec3, to: Vec3) -> bool {
        let offset = to - from;
        let distance = offset.length();
        if distance <= f32::EPSILON {
            return true;
        }
        match space.raycast(self.eye(from), offset / distance, distance, self.obstacle_layers) {
            None => true,
            Some(hit) => hit.distance >= distance,
        }
    }
}

/// Только yaw: forward (-Z) смотрит вдоль горизонтальной части `direction`.
/// `None` для (почти) вертикального или нулевого направления.
pub fn facing(direction: Vec3) -> Option<Quat> {
    let flat = Vec3::new(direction.x, 0.0, direction.z).try_normalize()?;
    Some(Quat::from_rotation_y(f32::atan2(-flat.x, -flat.z)))
}

/// Turns `current` toward `target` by at most `max_radians`.
pub fn rotate_towards(current: Quat, target: Quat, max_radians: f32) -> Quat {
    let angle = current.angle_between(target);
    if angle <= max_radians || angle <= f32::EPSILON {
        return target;
    }
    current.slerp(target, max_radians / angle)
}

/// Arrival test for "travel until arrived" routines.
pub fn has_arrived(nav: &dyn NavAgent, slack: f32) -> bool {
    !nav.path_pending()
        && nav.remaining_distance() <= nav.stopping_distance() + slack
        && matches!(nav.path_status(), PathStatus::None | PathStatus::Complete)
}

fn random_in_unit_sphere(rng: &mut impl Rng) -> Vec3 {
    loop {
        let v = Vec3::new(
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
        );
        if v.length_squared() <= 1.0 {
            return v;
        }
    }
}

/// Random pathable point within `radius` of the agent.
pub fn sample_random_point(body: &mut AgentBody, radius: f32, attempts: u32) -> Option<Vec3> {
    let origin = body.position();
    for _ in 0..attempts {
        let candidate = origin + random_in_unit_sphere(&mut body.rng) * radius;
        if let Some(point) = body.nav.sample_position(candidate, radius) {
            return Some(point);
        }
    }
    None
}

/// Random pathable point `radius` away from the agent, at most `half_arc`
/// degrees off `direction`.
pub fn sample_point_in_arc(
    body: &mut AgentBody,
    direction: Vec3,
    radius: f32,
    half_arc: f32,
    attempts: u32,
) -> Option<Vec3> {
    let origin = body.position();
    let half_arc = half_arc.abs();
    for _ in 0..attempts {
        let angle: f32 = body.rng.gen_range(-half_arc..=half_arc);
        let heading = Quat::from_rotation_y(angle.to_radians()) * direction;
        if let Some(point) = body.nav.sample_position(origin + heading * radius, radius) {
            return Some(point);
        }
    }
    None
}

/// Боковая точка (сначала справа, потом слева): pathable и с чистой линией
/// до `target`.
pub fn strafe_position(body: &AgentBody, target: Entity, offset: f32, sight: &SightLine) -> Option<Vec3> {
    let target_position = body.roster.position_of(target)?;
    let right = body.nav.forward().cross(Vec3::Y).try_normalize()?;
    let origin = body.position();

    [right, -right].into_iter().find_map(|side| {
        let candidate = body.nav.sample_position(origin + side * offset, offset)?;
        sight
            .is_clear(body.space.as_ref(), candidate, target_position)
            .then_some(candidate)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_facing_points_forward_along_direction() {
        let rotation = facing(Vec3::new(1.0, 0.0, 0.0)).unwrap();
        let forward = rotation * Vec3::NEG_Z;
        assert!(forward.abs_diff_eq(Vec3::X, 1e-5));

        let rotation = facing(Vec3::new(0.0, 3.0, 2.0)).unwrap();
        assert!((rotation * Vec3::NEG_Z).abs_diff_eq(Vec3::Z, 1e-5));

        assert!(facing(Vec3::Y).is_none());
    }

    #[test]
    fn test_rotate_towards_is_bounded() {
        let from = Quat::IDENTITY;
        let to = Quat::from_rotation_y(FRAC_PI_2);

        let step = rotate_towards(from, to, 0.1);
        assert!((from.angle_between(step) - 0.1).abs() < 1e-4);

        let done = rotate_towards(from, to, 2.0);
        assert!(done.abs_diff_eq(to, 1e-6));
    }
}
