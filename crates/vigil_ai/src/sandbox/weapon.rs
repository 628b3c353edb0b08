//! Weapon double that records every command it receives.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bevy::prelude::*;

use crate::config::SpawnPoint;
use crate::services::Weapon;

#[derive(Debug, Clone, PartialEq)]
pub enum WeaponCall {
    Bind(String),
    Fire,
    Stop,
}

/// Clones share one call log, so a host can hand the weapon to a controller
/// and keep a handle to inspect it.
#[derive(Debug, Clone)]
pub struct RecordingWeapon {
    name: String,
    calls: Arc<Mutex<Vec<WeaponCall>>>,
}

impl RecordingWeapon {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<WeaponCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn calls(&self) -> Vec<WeaponCall> {
        self.lock().clone()
    }

    pub fn is_firing(&self) -> bool {
        self.lock()
            .iter()
            .rev()
            .find(|c| !matches!(c, WeaponCall::Bind(_)))
            .is_some_and(|c| *c == WeaponCall::Fire)
    }

    pub fn count(&self, call: &WeaponCall) -> usize {
        self.lock().iter().filter(|c| *c == call).count()
    }
}

impl Weapon for RecordingWeapon {
    fn fire_weapon(&mut self) {
        crate::log(&format!("weapon '{}': fire", self.name));
        self.lock().push(WeaponCall::Fire);
    }

    fn stop_firing_weapon(&mut self) {
        crate::log(&format!("weapon '{}': stop", self.name));
        self.lock().push(WeaponCall::Stop);
    }

    fn set_spawn_point(&mut self, owner: Entity, point: &SpawnPoint) {
        crate::log(&format!("weapon '{}' bound to {:?}/{}", self.name, owner, point.name));
        self.lock().push(WeaponCall::Bind(point.name.clone()));
    }
}
