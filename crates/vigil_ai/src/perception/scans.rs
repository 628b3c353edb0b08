//! Perception tasks: ambient scan, target tracking, active search.

use bevy::prelude::*;

use super::{PerceptionState, Sight};
use crate::body::AgentBody;
use crate::config::PerceptionConfig;
use crate::tasks::{Poll, SampleDivider, Wait};

/// Ambient visibility scan. Ends once a target is on sight.
#[derive(Debug, Clone)]
pub struct LineOfSightScan {
    wait: Wait,
}

impl LineOfSightScan {
    pub fn new() -> Self {
        Self { wait: Wait::ready() }
    }

    pub fn resume(
        &mut self,
        body: &AgentBody,
        sight: &Sight,
        interval: f32,
        state: &mut PerceptionState,
        dt: f32,
    ) -> Poll {
        if !self.wait.tick(dt) {
            return Poll::Pending;
        }

        if let Some(found) = body.roster.active().find(|e| sight.can_see(body, e.position)) {
            crate::log_info(&format!(
                "{:?} spotted {:?} at {:.1}m",
                body.owner,
                found.entity,
                found.position.distance(body.position())
            ));
            state.target_on_sight = Some(found.entity);
            state.last_known_position = Some(found.position);
            return Poll::Ready;
        }

        self.wait = Wait::seconds(interval);
        Poll::Pending
    }
}

/// Трекинг target on sight: пишет её позицию в last known position (через
/// divider) и сбрасывает цель после нескольких подряд заблокированных проходов.
#[derive(Debug, Clone)]
pub struct FollowTargetSight {
    target: Entity,
    wait: Wait,
    divider: SampleDivider,
    obstructed_passes: u32,
}

impl FollowTargetSight {
    pub fn new(target: Entity, sample_every: u32) -> Self {
        Self {
            target,
            wait: Wait::ready(),
            divider: SampleDivider::new(sample_every),
            obstructed_passes: 0,
        }
    }

    pub fn target(&self) -> Entity {
        self.target
    }

    fn lose(&self, state: &mut PerceptionState, body: &AgentBody, reason: &str) -> Poll {
        if state.target_on_sight == Some(self.target) {
            state.target_on_sight = None;
        }
        crate::log_info(&format!("{:?} lost {:?}: {}", body.owner, self.target, reason));
        Poll::Ready
    }

    pub fn resume(
        &mut self,
        body: &AgentBody,
        sight: &Sight,
        config: &PerceptionConfig,
        state: &mut PerceptionState,
        dt: f32,
    ) -> Poll {
        if !self.wait.tick(dt) {
            return Poll::Pending;
        }

        let Some(target_position) = body.roster.position_of(self.target) else {
            return self.lose(state, body, "no longer active");
        };

        if self.divider.should_sample() {
            state.last_known_position = Some(target_position);
        }

        let range = sight.max_distance * config.follow_range_factor;
        if sight.is_obstructed(body, target_position, range) {
            self.obstructed_passes += 1;
            crate::log(&format!(
                "{:?}: sight of {:?} obstructed ({}/{})",
                body.owner, self.target, self.obstructed_passes, config.lost_sight_confirmations
            ));
            if self.obstructed_passes >= config.lost_sight_confirmations {
                return self.lose(state, body, "line of sight blocked");
            }
        } else {
            self.obstructed_passes = 0;
        }

        self.wait = Wait::seconds(config.on_sight_interval);
        Poll::Pending
    }
}

/// Active search: the first roster entry with an unobstructed line becomes
/// the target. View cone does not apply.
#[derive(Debug, Clone)]
pub struct SearchScan {
    wait: Wait,
}

impl SearchScan {
    pub fn new() -> Self {
        Self { wait: Wait::ready() }
    }

    pub fn resume(
        &mut self,
        body: &AgentBody,
        sight: &Sight,
        config: &PerceptionConfig,
        state: &mut PerceptionState,
        dt: f32,
    ) -> Poll {
        if !self.wait.tick(dt) {
            return Poll::Pending;
        }

        let range = sight.max_distance * config.search_range_factor;
        if let Some(found) = body
            .roster
            .active()
            .find(|e| sight.has_clear_line(body, e.position, range))
        {
            crate::log_info(&format!("{:?} found {:?} while searching", body.owner, found.entity));
            state.target_on_sight = Some(found.entity);
            state.last_known_position = Some(found.position);
            return Poll::Ready;
        }

        self.wait = Wait::seconds(config.on_sight_interval);
        Poll::Pending
    }
}
