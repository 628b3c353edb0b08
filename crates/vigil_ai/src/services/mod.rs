//! External collaborators the behavior engine drives but does not own.
//!
//! - `NavAgent`: pathfinding agent (destination, path state, transform)
//! - `SpatialQuery`: layered raycasts for line-of-sight checks
//! - `Weapon`: fire/stop commands bound to a spawn point
//!
//! Хосты (bridge к движку, модуль `sandbox`, test doubles) реализуют эти
//! трейты; контроллер держит их как boxed trait objects.

use bevy::prelude::*;

use crate::collision_layers::LayerMask;
use crate::config::SpawnPoint;

/// State of the pathfinding agent's current path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathStatus {
    /// No path (never set, or cleared).
    #[default]
    None,
    /// Path ends short of the destination.
    Partial,
    /// Path reaches the destination.
    Complete,
}

/// Pathfinding agent moving the body over a pathable surface.
///
/// Angular speed в градусах в секунду.
pub trait NavAgent: Send + Sync {
    fn transform(&self) -> Transform;

    fn set_rotation(&mut self, rotation: Quat);

    fn set_destination(&mut self, point: Vec3);

    fn path_pending(&self) -> bool;

    fn remaining_distance(&self) -> f32;

    fn stopping_distance(&self) -> f32;

    fn path_status(&self) -> PathStatus;

    fn is_stopped(&self) -> bool;

    fn set_stopped(&mut self, stopped: bool);

    /// When off, the agent does not turn the body along its path.
    fn set_update_rotation(&mut self, enabled: bool);

    fn set_update_position(&mut self, enabled: bool);

    fn angular_speed(&self) -> f32;

    fn is_on_nav_mesh(&self) -> bool;

    fn is_enabled(&self) -> bool;

    fn set_enabled(&mut self, enabled: bool);

    /// Nearest pathable point within `radius` of `point`.
    fn sample_position(&self, point: Vec3, radius: f32) -> Option<Vec3>;

    fn position(&self) -> Vec3 {
        self.transform().translation
    }

    fn forward(&self) -> Vec3 {
        self.transform().rotation * Vec3::NEG_Z
    }

    fn has_path(&self) -> bool {
        self.path_status() != PathStatus::None
    }
}

/// Result of a successful raycast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Distance from the ray origin to the hit point.
    pub distance: f32,
    pub point: Vec3,
}

pub trait SpatialQuery: Send + Sync {
    /// Nearest hit among colliders on `mask` along `direction` (normalized by
    /// the implementation), within `max_distance`.
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RayHit>;
}

pub trait Weapon: Send + Sync {
    fn fire_weapon(&mut self);

    fn stop_firing_weapon(&mut self);

    /// Binds the weapon to a muzzle point of `owner`.
    fn set_spawn_point(&mut self, owner: Entity, point: &SpawnPoint);
}
