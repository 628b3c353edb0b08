//! Straight-line pathfinding agent over a bounded flat plane.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bevy::prelude::*;

use crate::movement::facing;
use crate::services::{NavAgent, PathStatus};

/// Mutable state behind a `FlatNavAgent` handle.
#[derive(Debug, Clone)]
pub struct FlatNavState {
    pub transform: Transform,
    /// Reachable end of the current path (clamped to the plane).
    pub destination: Option<Vec3>,
    /// The requested destination lay outside the plane.
    pub partial: bool,
    pub destinations_issued: u32,
    pub speed: f32,
    pub stopping_distance: f32,
    pub angular_speed: f32,
    pub enabled: bool,
    pub stopped: bool,
    pub update_rotation: bool,
    pub update_position: bool,
    pub on_nav_mesh: bool,
    /// The plane spans `[-half_extent, half_extent]` on X and Z.
    pub half_extent: f32,
    /// Axis-aligned regions (min, max on XZ) that are not pathable.
    pub holes: Vec<(Vec2, Vec2)>,
}

impl FlatNavState {
    fn contains(&self, point: Vec3) -> bool {
        point.x.abs() <= self.half_extent && point.z.abs() <= self.half_extent
    }

    fn clamp(&self, point: Vec3) -> Vec3 {
        let e = self.half_extent;
        Vec3::new(point.x.clamp(-e, e), 0.0, point.z.clamp(-e, e))
    }

    fn in_hole(&self, point: Vec3) -> bool {
        let p = point.xz();
        self.holes
            .iter()
            .any(|(min, max)| p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y)
    }
}

/// Shared handle: один clone у контроллера, другой у хоста, чтобы двигать
/// тело (`advance`) и смотреть на него.
#[derive(Debug, Clone)]
pub struct FlatNavAgent {
    state: Arc<Mutex<FlatNavState>>,
}

impl FlatNavAgent {
    pub fn new(position: Vec3) -> Self {
        Self {
            state: Arc::new(Mutex::new(FlatNavState {
                transform: Transform::from_translation(Vec3::new(position.x, 0.0, position.z)),
                destination: None,
                partial: false,
                destinations_issued: 0,
                speed: 3.5,
                stopping_distance: 0.0,
                angular_speed: 120.0,
                enabled: true,
                stopped: false,
                update_rotation: true,
                update_position: true,
                on_nav_mesh: true,
                half_extent: 50.0,
                holes: Vec::new(),
            })),
        }
    }

    pub fn with_speed(self, speed: f32) -> Self {
        self.lock().speed = speed;
        self
    }

    pub fn with_half_extent(self, half_extent: f32) -> Self {
        self.lock().half_extent = half_extent;
        self
    }

    pub fn with_hole(self, min: Vec2, max: Vec2) -> Self {
        self.lock().holes.push((min, max));
        self
    }

    pub fn facing_towards(self, direction: Vec3) -> Self {
        if let Some(rotation) = facing(direction) {
            self.lock().transform.rotation = rotation;
        }
        self
    }

    fn lock(&self) -> MutexGuard<'_, FlatNavState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> FlatNavState {
        self.lock().clone()
    }

    pub fn destination(&self) -> Option<Vec3> {
        self.lock().destination
    }

    pub fn destinations_issued(&self) -> u32 {
        self.lock().destinations_issued
    }

    pub fn set_on_nav_mesh(&self, on_nav_mesh: bool) {
        self.lock().on_nav_mesh = on_nav_mesh;
    }

    /// Moves the body toward its destination at constant speed.
    pub fn advance(&self, dt: f32) {
        let mut state = self.lock();
        if !state.enabled || state.stopped || !state.update_position {
            return;
        }
        let Some(destination) = state.destination else {
            return;
        };

        let position = state.transform.translation;
        let to_goal = destination - position;
        let distance = to_goal.length();
        let step = state.speed * dt.max(0.0);

        if distance <= step {
            state.transform.translation = destination;
        } else {
            state.transform.translation = position + to_goal / distance * step;
        }

        if state.update_rotation {
            if let Some(rotation) = facing(to_goal) {
                state.transform.rotation = rotation;
            }
        }
    }
}

impl NavAgent for FlatNavAgent {
    fn transform(&self) -> Transform {
        self.lock().transform
    }

    fn set_rotation(&mut self, rotation: Quat) {
        self.lock().transform.rotation = rotation;
    }

    fn set_destination(&mut self, point: Vec3) {
        let mut state = self.lock();
        let reachable = state.clamp(point);
        state.partial = !state.contains(point);
        state.destination = Some(reachable);
        state.destinations_issued += 1;
    }

    fn path_pending(&self) -> bool {
        false
    }

    fn remaining_distance(&self) -> f32 {
        let state = self.lock();
        state
            .destination
            .map(|d| d.distance(state.transform.translation))
            .unwrap_or(0.0)
    }

    fn stopping_distance(&self) -> f32 {
        self.lock().stopping_distance
    }

    fn path_status(&self) -> PathStatus {
        let state = self.lock();
        match state.destination {
            None => PathStatus::None,
            Some(_) if state.partial => PathStatus::Partial,
            Some(_) => PathStatus::Complete,
        }
    }

    fn is_stopped(&self) -> bool {
        self.lock().stopped
    }

    fn set_stopped(&mut self, stopped: bool) {
        self.lock().stopped = stopped;
    }

    fn set_update_rotation(&mut self, enabled: bool) {
        self.lock().update_rotation = enabled;
    }

    fn set_update_position(&mut self, enabled: bool) {
        self.lock().update_position = enabled;
    }

    fn angular_speed(&self) -> f32 {
        self.lock().angular_speed
    }

    fn is_on_nav_mesh(&self) -> bool {
        let state = self.lock();
        state.on_nav_mesh && state.contains(state.transform.translation)
    }

    fn is_enabled(&self) -> bool {
        self.lock().enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.lock().enabled = enabled;
    }

    fn sample_position(&self, point: Vec3, radius: f32) -> Option<Vec3> {
        let state = self.lock();
        let candidate = state.clamp(point);
        if candidate.distance(point) > radius || state.in_hole(candidate) {
            return None;
        }
        Some(candidate)
    }
}
