//! Tests for the agent controller lifecycle and state transitions.

#[cfg(test)]
mod tests {
    use bevy::prelude::*;

    use crate::ai::{AgentController, AiState, AiStateKind, Lifecycle};
    use crate::config::{BehaviorConfig, SpawnPoint};
    use crate::error::BehaviorError;
    use crate::perception::SightProfile;
    use crate::sandbox::{
        add_target_collider, add_wall, move_target_collider, Arena, ColliderId, FlatNavAgent, RecordingWeapon,
        WeaponCall,
    };
    use crate::services::NavAgent;

    const DT: f32 = 1.0 / 60.0;

    struct Fixture {
        controller: AgentController,
        nav: FlatNavAgent,
        arena: Arena,
        adversary: Entity,
        collider: ColliderId,
        weapon: RecordingWeapon,
    }

    impl Fixture {
        fn new(config: BehaviorConfig, adversary_at: Vec3) -> Self {
            let arena = Arena::new();
            let nav = FlatNavAgent::new(Vec3::ZERO);
            let weapon = RecordingWeapon::new("rifle");
            let adversary = Entity::from_raw(10);
            let collider = add_target_collider(&arena, adversary_at);

            let controller = AgentController::builder(Entity::from_raw(1))
                .config(config)
                .nav_agent(nav.clone())
                .spatial_query(arena.clone())
                .weapon(weapon.clone())
                .primary_adversary(adversary, adversary_at)
                .build()
                .unwrap();

            Self {
                controller,
                nav,
                arena,
                adversary,
                collider,
                weapon,
            }
        }

        /// Enabled and stepped through the activation grace period.
        fn activated(config: BehaviorConfig, adversary_at: Vec3) -> Self {
            let mut fixture = Self::new(config, adversary_at);
            fixture.controller.enable();
            fixture.run(2);
            fixture
        }

        fn run(&mut self, steps: usize) {
            for _ in 0..steps {
                self.nav.advance(DT);
                self.controller.step(DT).unwrap();
            }
        }

        /// Steps until `kind` is current; returns false on timeout.
        fn run_until(&mut self, kind: AiStateKind, max_steps: usize) -> bool {
            for _ in 0..max_steps {
                if self.controller.state_kind() == Some(kind) {
                    return true;
                }
                self.run(1);
            }
            self.controller.state_kind() == Some(kind)
        }

        fn move_adversary(&mut self, to: Vec3) {
            self.controller.roster_mut().set_position(self.adversary, to);
            move_target_collider(&self.arena, self.collider, to);
        }
    }

    fn armed_config() -> BehaviorConfig {
        let mut config = BehaviorConfig::default();
        config.attack.spawn_points = vec![SpawnPoint::new("muzzle", Vec3::new(0.3, 1.4, -0.5))];
        config
    }

    #[test]
    fn test_builder_requires_collaborators() {
        let owner = Entity::from_raw(1);
        let adversary = Entity::from_raw(2);

        let missing_nav = AgentController::builder(owner)
            .spatial_query(Arena::new())
            .primary_adversary(adversary, Vec3::ZERO)
            .build();
        assert!(matches!(
            missing_nav,
            Err(BehaviorError::MissingCollaborator("pathfinding agent"))
        ));

        let missing_space = AgentController::builder(owner)
            .nav_agent(FlatNavAgent::new(Vec3::ZERO))
            .primary_adversary(adversary, Vec3::ZERO)
            .build();
        assert!(matches!(
            missing_space,
            Err(BehaviorError::MissingCollaborator("spatial query"))
        ));

        let missing_adversary = AgentController::builder(owner)
            .nav_agent(FlatNavAgent::new(Vec3::ZERO))
            .spatial_query(Arena::new())
            .build();
        assert!(matches!(missing_adversary, Err(BehaviorError::MissingPrimaryAdversary)));

        let mut config = BehaviorConfig::default();
        config.update_interval = -1.0;
        let invalid = AgentController::builder(owner)
            .config(config)
            .nav_agent(FlatNavAgent::new(Vec3::ZERO))
            .spatial_query(Arena::new())
            .primary_adversary(adversary, Vec3::ZERO)
            .build();
        assert!(matches!(invalid, Err(BehaviorError::InvalidConfig(_))));
    }

    #[test]
    fn test_roster_starts_with_primary_adversary() {
        let owner = Entity::from_raw(1);
        let adversary = Entity::from_raw(2);
        let other = Entity::from_raw(3);

        let controller = AgentController::builder(owner)
            .nav_agent(FlatNavAgent::new(Vec3::ZERO))
            .spatial_query(Arena::new())
            .targetable(owner, Vec3::ZERO)
            .targetable(adversary, Vec3::ONE)
            .targetable(other, Vec3::X)
            .primary_adversary(adversary, Vec3::Z)
            .build()
            .unwrap();

        let order: Vec<Entity> = controller.roster().iter().map(|e| e.entity).collect();
        assert_eq!(order, vec![adversary, other]);
        assert_eq!(controller.roster().position_of(adversary), Some(Vec3::Z));
        assert_eq!(controller.lifecycle(), Lifecycle::Disabled);
    }

    #[test]
    fn test_activation_waits_grace_steps() {
        let mut f = Fixture::new(BehaviorConfig::default(), Vec3::new(0.0, 0.0, 10.0));

        f.controller.step(DT).unwrap();
        assert_eq!(f.controller.state_kind(), None);

        f.controller.enable();
        assert!(!f.nav.is_enabled());

        f.run(1);
        assert_eq!(f.controller.lifecycle(), Lifecycle::Activating { remaining_steps: 1 });
        assert_eq!(f.controller.state_kind(), None);
        assert!(!f.nav.is_enabled());

        f.run(1);
        assert_eq!(f.controller.lifecycle(), Lifecycle::Active);
        assert_eq!(f.controller.state_kind(), Some(AiStateKind::Idle));
        assert!(f.nav.is_enabled());
    }

    #[test]
    fn test_off_surface_agent_stays_dormant() {
        let mut f = Fixture::new(BehaviorConfig::default(), Vec3::new(0.0, 0.0, -10.0));
        f.nav.set_on_nav_mesh(false);
        f.controller.enable();
        f.run(30);

        assert_eq!(f.controller.lifecycle(), Lifecycle::Stranded);
        assert_eq!(f.controller.state_kind(), None);
        assert!(!f.weapon.is_firing());
    }

    #[test]
    fn test_idle_patrols_with_waypoints_and_widens_view_without() {
        let mut config = BehaviorConfig::default();
        config.movement.patrol_waypoints = vec![Vec3::new(5.0, 0.0, 0.0), Vec3::new(-5.0, 0.0, 0.0)];
        let f = Fixture::activated(config, Vec3::new(0.0, 0.0, 10.0));
        assert_eq!(f.controller.state_kind(), Some(AiStateKind::Idle));
        assert!(f.controller.movement().is_patrolling());
        assert!(f.controller.perception().is_looking_for_target());
        assert_eq!(f.controller.perception().profile(), SightProfile::Patrol);

        let f = Fixture::activated(BehaviorConfig::default(), Vec3::new(0.0, 0.0, 10.0));
        assert!(!f.controller.movement().is_patrolling());
        assert_eq!(f.controller.perception().profile(), SightProfile::Search);
    }

    #[test]
    fn test_idle_forever_without_targets() {
        let mut f = Fixture::activated(BehaviorConfig::default(), Vec3::new(0.0, 0.0, 30.0));
        f.run(600);
        assert_eq!(f.controller.state_kind(), Some(AiStateKind::Idle));
        assert!(f.weapon.calls().is_empty());
    }

    #[test]
    fn test_visible_target_goes_take_range_then_attack() {
        let mut f = Fixture::activated(armed_config(), Vec3::new(0.0, 0.0, -10.0));

        // Detection on the first scan pass, transition on the immediate tick.
        assert_eq!(f.controller.state_kind(), Some(AiStateKind::TakeRange));
        assert_eq!(f.controller.perception().target_on_sight(), Some(f.adversary));
        assert!(f.weapon.is_firing());

        assert!(f.run_until(AiStateKind::Attack, 20));
        assert!(f.controller.movement().is_strafing());
        assert!(f.controller.movement().is_looking_at_target());

        // TakeRange exit (stop) runs before Attack enter (fire).
        assert_eq!(
            f.weapon.calls(),
            vec![
                WeaponCall::Bind("muzzle".into()),
                WeaponCall::Fire,
                WeaponCall::Stop,
                WeaponCall::Fire,
            ]
        );
    }

    #[test]
    fn test_every_transition_is_recorded_in_order() {
        let mut f = Fixture::activated(armed_config(), Vec3::new(0.0, 0.0, -10.0));

        assert_eq!(
            f.controller.drain_transitions(),
            vec![
                (None, AiStateKind::Idle),
                (Some(AiStateKind::Idle), AiStateKind::TakeRange),
            ]
        );
        assert!(f.controller.drain_transitions().is_empty());

        assert!(f.run_until(AiStateKind::Attack, 20));
        assert_eq!(
            f.controller.drain_transitions(),
            vec![(Some(AiStateKind::TakeRange), AiStateKind::Attack)]
        );
    }

    #[test]
    fn test_close_target_makes_agent_retreat_into_band() {
        let adversary_at = Vec3::new(0.0, 0.0, -5.0);
        let mut f = Fixture::activated(armed_config(), adversary_at);
        assert_eq!(f.controller.state_kind(), Some(AiStateKind::TakeRange));

        let issued = f.nav.destination().unwrap();
        assert!(issued.distance(adversary_at) > 5.0);

        assert!(f.run_until(AiStateKind::Attack, 600));
        let distance = f.nav.position().distance(adversary_at);
        assert!((8.0..=15.0).contains(&distance), "distance {}", distance);
    }

    #[test]
    fn test_blocked_sight_switches_to_search_and_investigates() {
        let adversary_at = Vec3::new(0.0, 0.0, -10.0);
        let mut f = Fixture::activated(armed_config(), adversary_at);
        assert!(f.run_until(AiStateKind::Attack, 20));

        add_wall(&f.arena, Vec3::new(0.0, 1.0, -5.0), Vec3::new(6.0, 3.0, 0.25));

        assert!(f.run_until(AiStateKind::SearchForTarget, 300));
        assert_eq!(f.controller.perception().target_on_sight(), None);

        let last_known = f.controller.perception().last_known_position().unwrap();
        assert_eq!(last_known, adversary_at);
        assert!(f.controller.movement().is_investigating());
        assert_eq!(f.nav.destination(), Some(last_known));
        assert!(!f.weapon.is_firing());
        assert!(f.controller.perception().is_searching_for_target());
    }

    #[test]
    fn test_search_falls_back_to_random_patrol() {
        let mut f = Fixture::activated(armed_config(), Vec3::new(0.0, 0.0, -10.0));
        assert!(f.run_until(AiStateKind::Attack, 20));

        let adversary = f.adversary;
        f.controller.roster_mut().set_active(adversary, false);
        assert!(f.run_until(AiStateKind::SearchForTarget, 120));

        f.run(500);
        assert_eq!(f.controller.state_kind(), Some(AiStateKind::SearchForTarget));
        assert!(!f.controller.movement().is_investigating());
        assert!(f.controller.movement().is_random_patrolling());
        match f.controller.state() {
            Some(AiState::SearchForTarget { investigating }) => assert!(!investigating),
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[test]
    fn test_disable_in_take_range_cancels_everything() {
        let mut f = Fixture::activated(armed_config(), Vec3::new(0.0, 0.0, -18.0));
        assert_eq!(f.controller.state_kind(), Some(AiStateKind::TakeRange));
        assert!(f.controller.movement().is_taking_range());

        f.controller.disable();

        assert_eq!(f.controller.lifecycle(), Lifecycle::Disabled);
        assert!(!f.nav.is_enabled());
        assert!(!f.controller.movement().is_taking_range());
        assert!(!f.controller.movement().is_looking_at_target());
        assert!(!f.controller.perception().is_following_target_sight());
        assert!(!f.controller.attack().is_attacking());
        assert!(!f.weapon.is_firing());

        let snapshot = f.controller.perception().state().clone();
        let parked = f.nav.position();
        f.move_adversary(Vec3::new(4.0, 0.0, -12.0));
        f.run(120);

        assert_eq!(f.controller.perception().state(), &snapshot);
        assert_eq!(f.nav.position(), parked);
    }

    #[test]
    fn test_reenable_restarts_from_idle() {
        let mut f = Fixture::activated(armed_config(), Vec3::new(0.0, 0.0, -18.0));
        assert_eq!(f.controller.state_kind(), Some(AiStateKind::TakeRange));
        f.controller.disable();
        f.move_adversary(Vec3::new(0.0, 0.0, 30.0));
        let calls_before = f.weapon.calls().len();

        f.controller.enable();
        f.run(2);

        assert_eq!(f.controller.lifecycle(), Lifecycle::Active);
        assert_eq!(f.controller.state_kind(), Some(AiStateKind::Idle));
        assert_eq!(f.controller.perception().target_on_sight(), None);
        assert_eq!(
            f.controller.perception().last_known_position(),
            Some(Vec3::new(0.0, 0.0, -18.0))
        );
        assert!(f.controller.perception().is_looking_for_target());

        // Adversary stays out of view: no tick may resurrect the old target.
        f.run(120);
        assert_eq!(f.controller.state_kind(), Some(AiStateKind::Idle));
        assert_eq!(f.controller.perception().target_on_sight(), None);
        assert_eq!(f.weapon.calls().len(), calls_before);
    }

    #[test]
    fn test_attack_without_target_is_an_error() {
        let mut f = Fixture::activated(armed_config(), Vec3::new(0.0, 0.0, 10.0));
        assert_eq!(f.controller.state_kind(), Some(AiStateKind::Idle));

        let result = f.controller.change_state(AiState::Attack);

        assert_eq!(
            result,
            Err(BehaviorError::NoTargetOnSight {
                operation: "entering Attack"
            })
        );
        assert_eq!(f.controller.state_kind(), None);
        assert!(!f.weapon.is_firing());
    }

    #[test]
    fn test_failed_step_disables_controller() {
        let mut config = armed_config();
        config.perception.on_sight_interval = 100.0;
        let mut f = Fixture::activated(config, Vec3::new(0.0, 0.0, -18.0));
        assert_eq!(f.controller.state_kind(), Some(AiStateKind::TakeRange));
        f.run(1);

        let adversary = f.adversary;
        f.controller.roster_mut().remove(adversary);

        let mut failure = None;
        for _ in 0..30 {
            f.nav.advance(DT);
            if let Err(err) = f.controller.step(DT) {
                failure = Some(err);
                break;
            }
        }

        assert_eq!(
            failure,
            Some(BehaviorError::NoTargetOnSight {
                operation: "attack range check"
            })
        );
        assert_eq!(f.controller.lifecycle(), Lifecycle::Disabled);
        assert!(!f.weapon.is_firing());
    }
}
