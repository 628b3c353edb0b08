//! Perception subsystem.
//!
//! Владеет `PerceptionState` (target on sight + last known position), больше
//! никто его не пишет. Три задачи, по слоту на каждую:
//! - line-of-sight scan: быстрая проверка конуса обзора
//! - follow target sight: более редкий трекинг текущей цели
//! - search: редкий скан без конуса после потери цели
//!
//! Лучи идут от глаз (position + eye height). Кандидат виден, если он в
//! радиусе и в конусе, луч по target layer попал, а луч по obstacle layer
//! промахнулся или попал строго дальше.

mod scans;


use bevy::prelude::*;

pub use scans::{FollowTargetSight, LineOfSightScan, SearchScan};

use crate::body::AgentBody;
use crate::collision_layers::LayerMask;
use crate::config::{EngagementBand, PerceptionConfig};
use crate::error::{BehaviorError, BehaviorResult};
use crate::tasks::TaskSlot;

/// What the agent currently knows about its target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerceptionState {
    pub target_on_sight: Option<Entity>,
    /// Пишется, когда цель увидели; остаётся после потери цели.
    pub last_known_position: Option<Vec3>,
}

/// Профиль обзора. Переход в `Search` односторонний.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum SightProfile {
    #[default]
    Patrol,
    /// Дальше обзор, шире конус.
    Search,
}

/// Sight parameters resolved for the current profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sight {
    pub max_distance: f32,
    /// Cosine of the view half-angle.
    pub min_dot: f32,
    pub eye_height: f32,
    pub target_layers: LayerMask,
    pub obstacle_layers: LayerMask,
}

impl Sight {
    pub fn from_config(config: &PerceptionConfig, profile: SightProfile) -> Self {
        let (max_distance, half_angle) = match profile {
            SightProfile::Patrol => (config.max_view_distance, config.view_half_angle),
            SightProfile::Search => (
                config.max_view_distance * config.search_distance_factor,
                config.search_half_angle,
            ),
        };
        Self {
            max_distance,
            min_dot: half_angle.to_radians().cos(),
            eye_height: config.eye_height,
            target_layers: config.target_layers,
            obstacle_layers: config.obstacle_layers,
        }
    }

    fn eye(&self, body: &AgentBody) -> Vec3 {
        body.position() + Vec3::Y * self.eye_height
    }

    /// Direction and distance from the agent to `target`; `None` when they coincide.
    fn line_to(body: &AgentBody, target: Vec3) -> Option<(Vec3, f32)> {
        let offset = target - body.position();
        let distance = offset.length();
        (distance > f32::EPSILON).then(|| (offset / distance, distance))
    }

    /// Full visibility test (range, view cone, target ray, obstacle ray).
    pub fn can_see(&self, body: &AgentBody, target: Vec3) -> bool {
        let Some((direction, distance)) = Self::line_to(body, target) else {
            return false;
        };
        if distance > self.max_distance {
            return false;
        }
        if body.nav.forward().dot(direction) < self.min_dot {
            return false;
        }

        let eye = self.eye(body);
        let Some(target_hit) = body
            .space
            .raycast(eye, direction, self.max_distance, self.target_layers)
        else {
            return false;
        };

        match body
            .space
            .raycast(eye, direction, self.max_distance, self.obstacle_layers)
        {
            None => true,
            Some(obstacle) => obstacle.distance > target_hit.distance,
        }
    }

    /// An obstacle within `range` sits closer than the target.
    pub fn is_obstructed(&self, body: &AgentBody, target: Vec3, range: f32) -> bool {
        let Some((direction, distance)) = Self::line_to(body, target) else {
            return false;
        };
        body.space
            .raycast(self.eye(body), direction, range, self.obstacle_layers)
            .is_some_and(|hit| hit.distance < distance)
    }

    /// Target within `range` and no obstacle in front of it.
    pub fn has_clear_line(&self, body: &AgentBody, target: Vec3, range: f32) -> bool {
        let Some((direction, distance)) = Self::line_to(body, target) else {
            return false;
        };
        if distance > range {
            return false;
        }
        match body
            .space
            .raycast(self.eye(body), direction, range, self.obstacle_layers)
        {
            None => true,
            Some(hit) => hit.distance > distance,
        }
    }
}

pub struct Perception {
    config: PerceptionConfig,
    band: EngagementBand,
    profile: SightProfile,
    state: PerceptionState,
    looking: TaskSlot<LineOfSightScan>,
    following: TaskSlot<FollowTargetSight>,
    searching: TaskSlot<SearchScan>,
}

impl Perception {
    pub fn new(config: PerceptionConfig, band: EngagementBand) -> Self {
        Self {
            config,
            band,
            profile: SightProfile::Patrol,
            state: PerceptionState::default(),
            looking: TaskSlot::new("line of sight scan"),
            following: TaskSlot::new("follow target sight"),
            searching: TaskSlot::new("search for target"),
        }
    }

    pub fn state(&self) -> &PerceptionState {
        &self.state
    }

    pub fn target_on_sight(&self) -> Option<Entity> {
        self.state.target_on_sight
    }

    pub fn last_known_position(&self) -> Option<Vec3> {
        self.state.last_known_position
    }

    pub fn profile(&self) -> SightProfile {
        self.profile
    }

    pub fn sight(&self) -> Sight {
        Sight::from_config(&self.config, self.profile)
    }

    pub fn engage_search_profile(&mut self) {
        if self.profile == SightProfile::Patrol {
            self.profile = SightProfile::Search;
            crate::log("perception: search profile engaged");
        }
    }

    /// Запускает ambient scan, первый проход сразу. Без патруля сначала
    /// включается search profile.
    pub fn start_looking_for_target(&mut self, is_patrolling: bool, body: &AgentBody) {
        if !is_patrolling {
            self.engage_search_profile();
        }
        if self.looking.start(LineOfSightScan::new).is_some() {
            let sight = self.sight();
            let interval = self.config.scan_interval;
            let state = &mut self.state;
            self.looking
                .advance(|scan| scan.resume(body, &sight, interval, state, 0.0));
        }
    }

    pub fn stop_looking_for_target(&mut self) {
        self.looking.stop();
    }

    pub fn is_looking_for_target(&self) -> bool {
        self.looking.is_running()
    }

    /// Starts tracking the current target; the first pass runs on the next step.
    pub fn start_following_target_sight(&mut self) {
        let Some(target) = self.state.target_on_sight else {
            crate::log("follow target sight: no target on sight");
            return;
        };
        let every = self.config.sample_divider;
        self.following
            .start(|| FollowTargetSight::new(target, every));
    }

    pub fn stop_following_target_sight(&mut self) {
        self.following.stop();
    }

    pub fn is_following_target_sight(&self) -> bool {
        self.following.is_running()
    }

    /// Target tracked by the follow task, if it is running.
    pub fn followed_target(&self) -> Option<Entity> {
        self.following.get().map(FollowTargetSight::target)
    }

    /// Starts the active search and runs its first pass right away.
    pub fn start_search_for_target(&mut self, body: &AgentBody) {
        if self.searching.start(SearchScan::new).is_some() {
            let sight = self.sight();
            let config = &self.config;
            let state = &mut self.state;
            self.searching
                .advance(|search| search.resume(body, &sight, config, state, 0.0));
        }
    }

    pub fn stop_search_for_target(&mut self) {
        self.searching.stop();
    }

    pub fn is_searching_for_target(&self) -> bool {
        self.searching.is_running()
    }

    /// `min <= distance <= max` to the target on sight.
    pub fn is_target_in_attack_range(&self, body: &AgentBody) -> BehaviorResult<bool> {
        let no_target = BehaviorError::NoTargetOnSight {
            operation: "attack range check",
        };
        let target = self.state.target_on_sight.ok_or(no_target.clone())?;
        let entry = body.roster.get(target).ok_or(no_target)?;
        Ok(self.band.contains(entry.position.distance(body.position())))
    }

    /// Сбрасывает target on sight, last known position не трогает.
    /// Только когда follow задача её не трекает.
    pub fn forget_target(&mut self) {
        if let Some(target) = self.state.target_on_sight.take() {
            crate::log(&format!("perception: forgot {:?}", target));
        }
    }

    /// Advances every outstanding task by `dt`.
    pub fn advance(&mut self, body: &AgentBody, dt: f32) {
        let sight = self.sight();
        let config = &self.config;
        let state = &mut self.state;

        self.looking
            .advance(|scan| scan.resume(body, &sight, config.scan_interval, state, dt));
        self.following
            .advance(|follow| follow.resume(body, &sight, config, state, dt));
        self.searching
            .advance(|search| search.resume(body, &sight, config, state, dt));
    }

    pub fn stop_all(&mut self) {
        self.stop_looking_for_target();
        self.stop_following_target_sight();
        self.stop_search_for_target();
    }
}
