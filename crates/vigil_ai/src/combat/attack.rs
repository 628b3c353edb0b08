//! Attack subsystem: fires and stops the agent's weapons as a group.

use bevy::prelude::*;

use crate::config::SpawnPoint;
use crate::services::Weapon;

/// Weapon plus whether it got a spawn point at initialization.
struct WeaponMount {
    weapon: Box<dyn Weapon>,
    bound: bool,
}

/// Fires every bound weapon at the current target.
///
/// Оружие связывается со spawn points по порядку. Оружие без spawn point
/// остаётся unbound: не стреляет и не останавливается.
pub struct Attack {
    owner: Entity,
    mounts: Vec<WeaponMount>,
    engaged: Option<Entity>,
}

impl Attack {
    pub fn new(owner: Entity, weapons: Vec<Box<dyn Weapon>>, spawn_points: &[SpawnPoint]) -> Self {
        if spawn_points.len() < weapons.len() {
            crate::log_warning(&format!(
                "{:?}: {} weapons but only {} spawn points, {} weapon(s) stay unbound",
                owner,
                weapons.len(),
                spawn_points.len(),
                weapons.len() - spawn_points.len()
            ));
        }

        let mounts = weapons
            .into_iter()
            .enumerate()
            .map(|(index, mut weapon)| {
                let bound = match spawn_points.get(index) {
                    Some(point) => {
                        weapon.set_spawn_point(owner, point);
                        true
                    }
                    None => false,
                };
                WeaponMount { weapon, bound }
            })
            .collect();

        Self {
            owner,
            mounts,
            engaged: None,
        }
    }

    fn bound_mut(&mut self) -> impl Iterator<Item = &mut WeaponMount> {
        self.mounts.iter_mut().filter(|m| m.bound)
    }

    /// Стреляют все bound weapons. Если атака уже идёт, меняется только цель.
    pub fn start_attacking_target(&mut self, target: Entity) {
        if self.engaged.replace(target).is_some() {
            return;
        }
        crate::log(&format!("{:?}: open fire on {:?}", self.owner, target));
        for mount in self.bound_mut() {
            mount.weapon.fire_weapon();
        }
    }

    /// Stops every bound weapon. No-op when not attacking.
    pub fn stop_attacking(&mut self) {
        let Some(target) = self.engaged.take() else {
            return;
        };
        crate::log(&format!("{:?}: cease fire on {:?}", self.owner, target));
        for mount in self.bound_mut() {
            mount.weapon.stop_firing_weapon();
        }
    }

    pub fn is_attacking(&self) -> bool {
        self.engaged.is_some()
    }

    pub fn target(&self) -> Option<Entity> {
        self.engaged
    }

    pub fn weapon_count(&self) -> usize {
        self.mounts.len()
    }

    pub fn bound_weapon_count(&self) -> usize {
        self.mounts.iter().filter(|m| m.bound).count()
    }
}
