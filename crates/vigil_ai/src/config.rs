//! Behavior tunables.
//!
//! У каждой секции `Default` стандартного агента, все поля `#[serde(default)]`,
//! частичный конфиг десериализуется без ошибок.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::collision_layers::LayerMask;
use crate::error::{BehaviorError, BehaviorResult};

/// Full configuration of one agent controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Seconds between state machine ticks.
    pub update_interval: f32,

    /// Сколько шагов pathfinding agent выключен после `enable`.
    pub activation_grace_steps: u32,

    /// Seed for the controller's random source (random patrol, reposition arcs).
    pub seed: u64,

    pub band: EngagementBand,
    pub perception: PerceptionConfig,
    pub movement: MovementConfig,
    pub attack: AttackConfig,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            update_interval: 0.2,
            activation_grace_steps: 2,
            seed: 42,
            band: EngagementBand::default(),
            perception: PerceptionConfig::default(),
            movement: MovementConfig::default(),
            attack: AttackConfig::default(),
        }
    }
}

impl BehaviorConfig {
    /// Rejects configurations the controller cannot run with.
    pub fn validate(&self) -> BehaviorResult<()> {
        if !(self.update_interval > 0.0) {
            return Err(invalid(format!(
                "update_interval must be positive, got {}",
                self.update_interval
            )));
        }

        if self.band.min < 0.0 || self.band.min > self.band.max {
            return Err(invalid(format!(
                "engagement band [{}, {}] is empty",
                self.band.min, self.band.max
            )));
        }

        let p = &self.perception;
        if !(p.scan_interval > 0.0) || !(p.on_sight_interval > 0.0) {
            return Err(invalid("perception intervals must be positive".into()));
        }
        if !(p.max_view_distance > 0.0) {
            return Err(invalid("max_view_distance must be positive".into()));
        }
        if p.sample_divider == 0 {
            return Err(invalid("sample_divider must be at least 1".into()));
        }
        if p.lost_sight_confirmations == 0 {
            return Err(invalid("lost_sight_confirmations must be at least 1".into()));
        }

        let m = &self.movement;
        if m.patrol_dwell < 0.0 {
            return Err(invalid("patrol_dwell must not be negative".into()));
        }
        if !(m.range_step > 0.0) {
            return Err(invalid("range_step must be positive".into()));
        }

        Ok(())
    }
}

fn invalid(message: String) -> BehaviorError {
    BehaviorError::InvalidConfig(message)
}

/// Distance band the agent tries to hold from its target. Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementBand {
    pub min: f32,
    pub max: f32,
}

impl Default for EngagementBand {
    fn default() -> Self {
        Self { min: 8.0, max: 15.0 }
    }
}

impl EngagementBand {
    pub fn contains(&self, distance: f32) -> bool {
        distance >= self.min && distance <= self.max
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptionConfig {
    /// Seconds between ambient visibility scans.
    pub scan_interval: f32,

    /// Seconds between target-tracking and search passes.
    pub on_sight_interval: f32,

    pub max_view_distance: f32,

    /// Half-angle of the view cone, degrees.
    pub view_half_angle: f32,

    /// Half-angle used once the search profile is engaged, degrees.
    pub search_half_angle: f32,

    /// Multiplier applied to `max_view_distance` by the search profile.
    pub search_distance_factor: f32,

    /// Sight rays start this far above the agent's position.
    pub eye_height: f32,

    pub target_layers: LayerMask,
    pub obstacle_layers: LayerMask,

    /// Every n-th tracking sample writes the last known position.
    pub sample_divider: u32,

    /// Сколько подряд заблокированных проходов до сброса цели.
    pub lost_sight_confirmations: u32,

    /// Tracking ray length, as a multiple of `max_view_distance`.
    pub follow_range_factor: f32,

    /// Search ray length, as a multiple of `max_view_distance`.
    pub search_range_factor: f32,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            scan_interval: 0.05,
            on_sight_interval: 0.5,
            max_view_distance: 20.0,
            view_half_angle: 60.0,
            search_half_angle: 80.0,
            search_distance_factor: 2.0,
            eye_height: 1.0,
            target_layers: LayerMask::TARGETS,
            obstacle_layers: LayerMask::SIGHT_BLOCKERS,
            sample_divider: 2,
            lost_sight_confirmations: 2,
            follow_range_factor: 2.0,
            search_range_factor: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Fixed patrol route; fewer than two points means no fixed patrol.
    pub patrol_waypoints: Vec<Vec3>,

    /// Seconds spent at each patrol or strafe point.
    pub patrol_dwell: f32,

    pub random_patrol_radius: f32,

    /// Distance covered by a single range-holding move.
    pub range_step: f32,

    /// Радиус запасной точки, когда линия отхода заблокирована.
    pub reposition_radius: f32,

    /// Half of the arc (degrees) the fallback point is picked from.
    pub reposition_half_arc: f32,

    pub strafe_offset: f32,

    /// Added to the pathfinding agent's stopping distance for arrival checks.
    pub arrival_slack: f32,

    /// Bounded retries when sampling a pathable point.
    pub sample_attempts: u32,

    /// Горизонтальная дистанция, ближе которой look-at не поворачивает.
    pub look_threshold: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            patrol_waypoints: Vec::new(),
            patrol_dwell: 0.9,
            random_patrol_radius: 9.0,
            range_step: 2.0,
            reposition_radius: 4.0,
            reposition_half_arc: 85.0,
            strafe_offset: 1.5,
            arrival_slack: 0.1,
            sample_attempts: 10,
            look_threshold: 0.05,
        }
    }
}

/// Named muzzle offset a weapon fires from, relative to the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    pub name: String,
    pub offset: Vec3,
}

impl SpawnPoint {
    pub fn new(name: impl Into<String>, offset: Vec3) -> Self {
        Self {
            name: name.into(),
            offset,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackConfig {
    pub spawn_points: Vec<SpawnPoint>,
}
