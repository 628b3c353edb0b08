//! Roster of entities an agent can perceive and engage.
//!
//! Записи хранят последнюю известную позицию entity. Roster только ссылается
//! на entities, не владеет ими. В ECS позиции синкаются каждый fixed step из
//! `Targetable` transforms.

use bevy::prelude::*;

/// Marker: entity shows up in every agent's roster (player, hostile NPC).
#[derive(Component, Debug, Default, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Targetable;

#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    pub entity: Entity,
    pub position: Vec3,

    /// Неактивные записи (dead, despawned) пропускаются всеми сканами.
    pub active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Roster {
    entries: Vec<RosterEntry>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `entity` at the end of the roster, or refreshes its position.
    pub fn insert(&mut self, entity: Entity, position: Vec3) {
        match self.entry_mut(entity) {
            Some(entry) => {
                entry.position = position;
                entry.active = true;
            }
            None => self.entries.push(RosterEntry {
                entity,
                position,
                active: true,
            }),
        }
    }

    pub fn remove(&mut self, entity: Entity) -> Option<RosterEntry> {
        let index = self.entries.iter().position(|e| e.entity == entity)?;
        Some(self.entries.remove(index))
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.get(entity).is_some()
    }

    pub fn get(&self, entity: Entity) -> Option<&RosterEntry> {
        self.entries.iter().find(|e| e.entity == entity)
    }

    fn entry_mut(&mut self, entity: Entity) -> Option<&mut RosterEntry> {
        self.entries.iter_mut().find(|e| e.entity == entity)
    }

    /// Position of an active entry.
    pub fn position_of(&self, entity: Entity) -> Option<Vec3> {
        self.get(entity).filter(|e| e.active).map(|e| e.position)
    }

    /// Returns false if `entity` is not in the roster.
    pub fn set_position(&mut self, entity: Entity, position: Vec3) -> bool {
        match self.entry_mut(entity) {
            Some(entry) => {
                entry.position = position;
                true
            }
            None => false,
        }
    }

    pub fn set_active(&mut self, entity: Entity, active: bool) -> bool {
        match self.entry_mut(entity) {
            Some(entry) => {
                entry.active = active;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &RosterEntry> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut RosterEntry> {
        self.entries.iter_mut()
    }

    /// Active entries in roster order.
    pub fn active(&self) -> impl Iterator<Item = &RosterEntry> {
        self.entries.iter().filter(|e| e.active)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_order_and_refreshes() {
        let a = Entity::from_raw(1);
        let b = Entity::from_raw(2);

        let mut roster = Roster::new();
        roster.insert(a, Vec3::ZERO);
        roster.insert(b, Vec3::X);
        roster.insert(a, Vec3::Z);

        assert_eq!(roster.len(), 2);
        let order: Vec<Entity> = roster.iter().map(|e| e.entity).collect();
        assert_eq!(order, vec![a, b]);
        assert_eq!(roster.position_of(a), Some(Vec3::Z));
    }

    #[test]
    fn test_inactive_entries_hidden_from_scans() {
        let a = Entity::from_raw(1);
        let mut roster = Roster::new();
        roster.insert(a, Vec3::ONE);

        assert!(roster.set_active(a, false));
        assert_eq!(roster.position_of(a), None);
        assert_eq!(roster.active().count(), 0);
        assert!(roster.contains(a));

        assert!(!roster.set_active(Entity::from_raw(9), false));
    }
}
