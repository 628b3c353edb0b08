//! Agent body: the collaborators every subsystem reads or drives.

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::roster::Roster;
use crate::services::{NavAgent, SpatialQuery};

/// Shared context handed to Perception, Movement and state hooks.
///
/// Perception только читает (roster, transform, raycasts). Movement управляет
/// pathfinding agent и берёт случайность из `rng`.
pub struct AgentBody {
    pub owner: Entity,
    pub nav: Box<dyn NavAgent>,
    pub space: Box<dyn SpatialQuery>,
    pub roster: Roster,
    pub rng: ChaCha8Rng,
}

impl AgentBody {
    /// Body with an empty roster and a random source seeded with `seed`.
    pub fn new(owner: Entity, nav: Box<dyn NavAgent>, space: Box<dyn SpatialQuery>, seed: u64) -> Self {
        Self {
            owner,
            nav,
            space,
            roster: Roster::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn position(&self) -> Vec3 {
        self.nav.position()
    }

    /// Vector from the agent to `entity`, if the entity is active.
    pub fn offset_to(&self, entity: Entity) -> Option<Vec3> {
        self.roster.position_of(entity).map(|p| p - self.position())
    }
}
