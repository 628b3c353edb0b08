//! Layered collider set answering sight raycasts.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use bevy::prelude::*;

use crate::collision_layers::LayerMask;
use crate::services::{RayHit, SpatialQuery};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColliderId(u32);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColliderShape {
    Sphere { center: Vec3, radius: f32 },
    Cuboid { min: Vec3, max: Vec3 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub shape: ColliderShape,
    /// Single layer bit (see `collision_layers`).
    pub layer: u32,
}

#[derive(Debug, Default)]
struct ArenaColliders {
    next_id: u32,
    colliders: Vec<(ColliderId, Collider)>,
}

/// Shared collider set. Clones point at the same colliders, so the host can
/// move targets while a controller holds the arena as its spatial query.
#[derive(Resource, Debug, Clone, Default)]
pub struct Arena {
    inner: Arc<RwLock<ArenaColliders>>,
}

impl Arena {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, ArenaColliders> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ArenaColliders> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add(&self, collider: Collider) -> ColliderId {
        let mut arena = self.write();
        let id = ColliderId(arena.next_id);
        arena.next_id += 1;
        arena.colliders.push((id, collider));
        id
    }

    pub fn add_sphere(&self, center: Vec3, radius: f32, layer: u32) -> ColliderId {
        self.add(Collider {
            shape: ColliderShape::Sphere { center, radius },
            layer,
        })
    }

    /// Box collider from its center and half extents.
    pub fn add_cuboid(&self, center: Vec3, half_extents: Vec3, layer: u32) -> ColliderId {
        self.add(Collider {
            shape: ColliderShape::Cuboid {
                min: center - half_extents,
                max: center + half_extents,
            },
            layer,
        })
    }

    /// Re-centers a collider. Returns false for unknown ids.
    pub fn move_to(&self, id: ColliderId, center: Vec3) -> bool {
        let mut arena = self.write();
        let Some((_, collider)) = arena.colliders.iter_mut().find(|(i, _)| *i == id) else {
            return false;
        };
        collider.shape = match collider.shape {
            ColliderShape::Sphere { radius, .. } => ColliderShape::Sphere { center, radius },
            ColliderShape::Cuboid { min, max } => {
                let half = (max - min) * 0.5;
                ColliderShape::Cuboid {
                    min: center - half,
                    max: center + half,
                }
            }
        };
        true
    }

    pub fn remove(&self, id: ColliderId) -> bool {
        let mut arena = self.write();
        let before = arena.colliders.len();
        arena.colliders.retain(|(i, _)| *i != id);
        arena.colliders.len() != before
    }

    pub fn len(&self) -> usize {
        self.read().colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SpatialQuery for Arena {
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RayHit> {
        let direction = direction.try_normalize()?;

        self.read()
            .colliders
            .iter()
            .filter(|(_, c)| mask.includes(c.layer))
            .filter_map(|(_, c)| match c.shape {
                ColliderShape::Sphere { center, radius } => ray_sphere(origin, direction, center, radius),
                ColliderShape::Cuboid { min, max } => ray_cuboid(origin, direction, min, max),
            })
            .filter(|t| *t <= max_distance)
            .min_by(|a, b| a.total_cmp(b))
            .map(|distance| RayHit {
                distance,
                point: origin + direction * distance,
            })
    }
}

/// Entry distance along a normalized ray; 0 when the origin is inside.
fn ray_sphere(origin: Vec3, direction: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let oc = origin - center;
    let b = oc.dot(direction);
    let c = oc.length_squared() - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let root = discriminant.sqrt();
    let far = -b + root;
    if far < 0.0 {
        return None;
    }
    Some((-b - root).max(0.0))
}

// Slab test.
fn ray_cuboid(origin: Vec3, direction: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;

    for axis in 0..3 {
        let o = origin[axis];
        let d = direction[axis];
        if d.abs() < f32::EPSILON {
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }
        let t1 = (min[axis] - o) / d;
        let t2 = (max[axis] - o) / d;
        t_enter = t_enter.max(t1.min(t2));
        t_exit = t_exit.min(t1.max(t2));
    }

    if t_exit < t_enter.max(0.0) {
        return None;
    }
    Some(t_enter.max(0.0))
}
