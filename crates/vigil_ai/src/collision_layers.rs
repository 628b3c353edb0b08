//! Collision layer constants and the `LayerMask` used by sight raycasts.
//!
//! ## Layers (bit masks):
//! - Layer 1 (0b1 = 1): Reserved
//! - Layer 2 (0b10 = 2): Targets (anything the agent can perceive/engage)
//! - Layer 3 (0b100 = 4): Environment (walls, obstacles, terrain)
//!
//! Perception casts two rays on the same line: one restricted to the target
//! layer, one restricted to the obstacle layer. A target is visible when the
//! obstacle ray misses or lands strictly farther than the target ray.

use serde::{Deserialize, Serialize};

// ============================================================================
// Layers
// ============================================================================

/// Layer 2: Targets (players, hostile NPCs)
pub const COLLISION_LAYER_TARGETS: u32 = 0b10; // 2

/// Layer 3: Environment (walls, obstacles, terrain)
pub const COLLISION_LAYER_ENVIRONMENT: u32 = 0b100; // 4

// ============================================================================
// Masks
// ============================================================================

/// Mask for the target-layer sight ray.
pub const COLLISION_MASK_TARGETS: u32 = COLLISION_LAYER_TARGETS;

/// Mask for the obstacle-layer sight ray.
pub const COLLISION_MASK_SIGHT_BLOCKERS: u32 = COLLISION_LAYER_ENVIRONMENT;

/// Set of collision layers a raycast is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const ALL: LayerMask = LayerMask(u32::MAX);
    pub const TARGETS: LayerMask = LayerMask(COLLISION_MASK_TARGETS);
    pub const SIGHT_BLOCKERS: LayerMask = LayerMask(COLLISION_MASK_SIGHT_BLOCKERS);

    /// True if a collider on `layer` is included in this mask.
    pub fn includes(self, layer: u32) -> bool {
        self.0 & layer != 0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::ALL
    }
}
