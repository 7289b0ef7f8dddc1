//! Capture, erosion and absorption played out through full ticks.

use siege_core::prelude::*;
use siege_test_utils::fixtures::{run_ticks, tick_dt, vec2, LevelBuilder};

const RIVAL: PlayerId = PlayerId(2);
const TARGET: BaseId = BaseId(0);

/// Target base at the origin owned by `owner`, human and rival homes far away.
fn arena(owner: u32) -> World {
    LevelBuilder::new("arena")
        .base(owner, 0.0, 0.0)
        .base(1, -10.0, 0.0)
        .base(2, 10.0, 0.0)
        .world(21)
}

/// Place `count` units of `owner` touching the target and send them at its centre.
fn launch(world: &mut World, owner: PlayerId, count: usize, x: f64) -> Vec<UnitId> {
    (0..count)
        .map(|_| {
            let unit = world.spawn_unit_at(owner, vec2(x, 0.0)).unwrap();
            world.command_move(unit, Vec2Fixed::ZERO).unwrap();
            unit
        })
        .collect()
}

#[test]
fn neutral_base_captured_after_five_hits() {
    let mut world = arena(0);
    launch(&mut world, PlayerId::HUMAN, 4, 0.3);
    world.tick(tick_dt()).unwrap();

    let base = world.base(TARGET).unwrap();
    assert_eq!(base.owner(), PlayerId::NEUTRAL);
    assert_eq!(base.damage_from(PlayerId::HUMAN), 4);

    launch(&mut world, PlayerId::HUMAN, 1, 0.3);
    let events = world.tick(tick_dt()).unwrap();

    assert_eq!(events.captures().count(), 1);
    let base = world.base(TARGET).unwrap();
    assert_eq!(base.owner(), PlayerId::HUMAN);
    assert!(base.damage().is_empty());
    assert!(world.player(PlayerId::HUMAN).unwrap().bases().contains(&TARGET));
    assert!(world.player(PlayerId::NEUTRAL).unwrap().bases().is_empty());
}

#[test]
fn attackers_are_spent_on_impact() {
    let mut world = arena(0);
    let units = launch(&mut world, PlayerId::HUMAN, 3, 0.3);

    let events = world.tick(tick_dt()).unwrap();

    assert_eq!(events.destroyed_by(DestructionCause::StruckBase), 3);
    for unit in units {
        assert!(world.unit(unit).is_none(), "{unit} should be reaped");
    }
}

#[test]
fn owned_base_passes_through_neutral() {
    let mut world = LevelBuilder::new("arena")
        .base(2, 0.0, 0.0)
        .base(1, -10.0, 0.0)
        .base(2, 10.0, 0.0)
        .world(4);

    for hit in 1..5 {
        launch(&mut world, PlayerId::HUMAN, 1, 0.3);
        world.tick(tick_dt()).unwrap();
        let base = world.base(TARGET).unwrap();
        assert_eq!(base.damage_from(PlayerId::HUMAN), hit);
        assert_eq!(base.owner(), RIVAL, "captured early at hit {hit}");
    }

    launch(&mut world, PlayerId::HUMAN, 1, 0.3);
    world.tick(tick_dt()).unwrap();
    assert_eq!(world.base(TARGET).unwrap().owner(), PlayerId::NEUTRAL);
    assert_eq!(world.player(RIVAL).unwrap().bases(), &[BaseId(2)]);

    launch(&mut world, PlayerId::HUMAN, 5, 0.3);
    world.tick(tick_dt()).unwrap();
    assert_eq!(world.base(TARGET).unwrap().owner(), PlayerId::HUMAN);
}

#[test]
fn contested_neutral_base_erodes_rival_progress() {
    let mut world = arena(0);
    launch(&mut world, PlayerId::HUMAN, 3, 0.3);
    world.tick(tick_dt()).unwrap();

    launch(&mut world, RIVAL, 1, -0.3);
    world.tick(tick_dt()).unwrap();

    let base = world.base(TARGET).unwrap();
    assert_eq!(base.damage_from(PlayerId::HUMAN), 2);
    assert_eq!(base.damage_from(RIVAL), 0);

    // two more erode the human entry away, the next one counts
    launch(&mut world, RIVAL, 3, -0.3);
    world.tick(tick_dt()).unwrap();

    let base = world.base(TARGET).unwrap();
    assert_eq!(base.damage_from(PlayerId::HUMAN), 0);
    assert_eq!(base.damage_from(RIVAL), 1);
    assert_eq!(base.damage().len(), 1);
}

#[test]
fn orbiting_defender_absorbs_the_hit() {
    let mut world = arena(2);
    let defender = world.spawn_unit_at(RIVAL, vec2(0.0, 0.5)).unwrap();
    assert_eq!(world.unit(defender).unwrap().location(), Some(TARGET));

    launch(&mut world, PlayerId::HUMAN, 1, 0.3);
    let events = world.tick(tick_dt()).unwrap();

    assert_eq!(events.destroyed_by(DestructionCause::Sacrificed), 1);
    assert!(world.unit(defender).is_none());
    assert!(world.base(TARGET).unwrap().damage().is_empty());
    assert!(world.base(TARGET).unwrap().orbiting_units().is_empty());
}

#[test]
fn friendly_unit_heals_before_it_upgrades() {
    let mut world = arena(1);
    launch(&mut world, RIVAL, 2, -0.3);
    world.tick(tick_dt()).unwrap();
    assert_eq!(world.base(TARGET).unwrap().damage_from(RIVAL), 2);

    launch(&mut world, PlayerId::HUMAN, 1, 0.3);
    let events = world.tick(tick_dt()).unwrap();
    assert!(events.events.contains(&GameEvent::BaseRepaired { base: TARGET }));

    let base = world.base(TARGET).unwrap();
    assert_eq!(base.damage_from(RIVAL), 1);
    assert_eq!(base.upgrade_progress(), 0);

    launch(&mut world, PlayerId::HUMAN, 2, 0.3);
    world.tick(tick_dt()).unwrap();

    let base = world.base(TARGET).unwrap();
    assert!(!base.is_damaged());
    assert_eq!(base.upgrade_progress(), 1);
}

#[test]
fn five_absorbed_units_level_the_base() {
    let mut world = arena(1);
    launch(&mut world, PlayerId::HUMAN, 5, 0.3);

    let events = world.tick(tick_dt()).unwrap();

    assert!(events.events.contains(&GameEvent::BaseUpgraded {
        base: TARGET,
        level: 2
    }));
    let base = world.base(TARGET).unwrap();
    assert_eq!(base.level(), 2);
    assert_eq!(base.upgrade_progress(), 0);
}

#[test]
fn orbiting_friendly_units_are_not_absorbed() {
    let mut world = arena(1);
    let orbiter = world.spawn_unit_at(PlayerId::HUMAN, vec2(0.0, 0.5)).unwrap();

    run_ticks(&mut world, 30);

    let unit = world.unit(orbiter).unwrap();
    assert!(unit.is_alive());
    assert_eq!(unit.location(), Some(TARGET));
    assert_eq!(world.base(TARGET).unwrap().upgrade_progress(), 0);
}

#[test]
fn level_two_base_spawns_twice_as_often() {
    let spawns_at_target = |world: &mut World| {
        run_ticks(world, 200)
            .iter()
            .flat_map(|tick| tick.events.iter())
            .filter(|event| matches!(event, GameEvent::UnitSpawned { base, .. } if *base == TARGET))
            .count()
    };

    let mut plain = arena(1);
    assert_eq!(spawns_at_target(&mut plain), 2);

    let mut upgraded = arena(1);
    launch(&mut upgraded, PlayerId::HUMAN, 5, 0.3);
    assert_eq!(spawns_at_target(&mut upgraded), 4);
    assert_eq!(upgraded.base(TARGET).unwrap().level(), 2);
}

#[test]
fn capture_in_the_sacrifice_tick_keeps_orbit_index_consistent() {
    let mut world = arena(2);
    let defender = world.spawn_unit_at(RIVAL, vec2(0.0, 0.5)).unwrap();

    // one hit spends the defender, five more take the base
    launch(&mut world, PlayerId::HUMAN, 6, 0.3);
    let events = world.tick(tick_dt()).unwrap();

    assert_eq!(events.destroyed_by(DestructionCause::Sacrificed), 1);
    assert_eq!(
        events.captures().collect::<Vec<_>>(),
        vec![(TARGET, RIVAL, PlayerId::NEUTRAL)]
    );
    assert!(world.unit(defender).is_none());
    assert!(world.base(TARGET).unwrap().orbiting_units().is_empty());
    assert!(world.player(RIVAL).unwrap().units_at(TARGET).is_empty());
    assert!(world.check_integrity().is_ok());
}

#[test]
fn losing_the_last_base_defeats_the_human() {
    let mut world = LevelBuilder::new("last stand")
        .base(1, 0.0, 0.0)
        .base(2, 10.0, 0.0)
        .world(8);

    launch(&mut world, RIVAL, 5, -0.3);
    world.tick(tick_dt()).unwrap();

    assert_eq!(
        world.outcome(),
        MatchOutcome::Defeat {
            player: PlayerId::HUMAN
        }
    );
    assert!(matches!(world.tick(tick_dt()), Err(GameError::MatchOver)));
}
