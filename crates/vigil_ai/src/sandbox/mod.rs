//! Headless collaborators for running agents without a game engine.
//!
//! - `FlatNavAgent`: straight-line pathfinding over a bounded plane
//! - `Arena`: sphere/box colliders on collision layers, answers raycasts
//! - `RecordingWeapon`: logs fire/stop/bind commands
//!
//! Все три это дешёвые shared handles. `SandboxPlugin` двигает `SandboxBody`
//! entities и держит их коллайдеры в arena на месте каждый fixed step,
//! до behavior систем.

pub mod arena;
pub mod nav;
pub mod weapon;

use bevy::prelude::*;

pub use arena::{Arena, Collider, ColliderId, ColliderShape};
pub use nav::{FlatNavAgent, FlatNavState};
pub use weapon::{RecordingWeapon, WeaponCall};

use crate::ai::BehaviorSet;
use crate::collision_layers::{COLLISION_LAYER_ENVIRONMENT, COLLISION_LAYER_TARGETS};
use crate::services::NavAgent;

/// Target colliders are spheres centered at eye height.
pub const TARGET_RADIUS: f32 = 0.5;
pub const TARGET_CENTER_HEIGHT: f32 = 1.0;

pub fn add_target_collider(arena: &Arena, position: Vec3) -> ColliderId {
    arena.add_sphere(
        position + Vec3::Y * TARGET_CENTER_HEIGHT,
        TARGET_RADIUS,
        COLLISION_LAYER_TARGETS,
    )
}

pub fn move_target_collider(arena: &Arena, id: ColliderId, position: Vec3) -> bool {
    arena.move_to(id, position + Vec3::Y * TARGET_CENTER_HEIGHT)
}

pub fn add_wall(arena: &Arena, center: Vec3, half_extents: Vec3) -> ColliderId {
    arena.add_cuboid(center, half_extents, COLLISION_LAYER_ENVIRONMENT)
}

/// Entity whose `Transform` follows a sandbox pathfinding agent.
#[derive(Component, Debug, Clone)]
pub struct SandboxBody(pub FlatNavAgent);

/// Entity whose `Transform` drives a target collider in the `Arena` resource.
#[derive(Component, Debug, Clone, Copy)]
pub struct SandboxCollider(pub ColliderId);

pub struct SandboxPlugin;

impl Plugin for SandboxPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Arena>().add_systems(
            FixedUpdate,
            (advance_sandbox_bodies, sync_sandbox_colliders)
                .chain()
                .before(BehaviorSet::RosterSync),
        );
    }
}

pub fn advance_sandbox_bodies(
    time: Res<Time<Fixed>>,
    mut bodies: Query<(&SandboxBody, &mut Transform)>,
) {
    let delta = time.delta_secs();
    for (body, mut transform) in bodies.iter_mut() {
        body.0.advance(delta);
        *transform = body.0.transform();
    }
}

pub fn sync_sandbox_colliders(
    arena: Res<Arena>,
    colliders: Query<(&SandboxCollider, &Transform), Changed<Transform>>,
) {
    for (collider, transform) in colliders.iter() {
        move_target_collider(&arena, collider.0, transform.translation);
    }
}
