//! AI decision cycles on hand-built positions.

use siege_core::ai::run_cycle;
use siege_core::prelude::*;
use siege_core::queries;
use siege_test_utils::fixtures::{fixed_f, tick_dt, vec2, LevelBuilder};

const AI: PlayerId = PlayerId(2);

fn spawn_orbiters(world: &mut World, owner: PlayerId, at: Vec2Fixed, count: usize) -> Vec<UnitId> {
    (0..count)
        .map(|_| world.spawn_unit_at(owner, at).unwrap())
        .collect()
}

fn with_behavior(world: &World, player: PlayerId, behavior: UnitBehavior) -> Vec<UnitId> {
    world
        .live_units(player)
        .filter(|unit| unit.behavior() == behavior)
        .map(Unit::id)
        .collect()
}

#[test]
fn repair_sends_one_orbiter_per_point_of_damage() {
    let mut world = LevelBuilder::new("repair")
        .base(2, 0.0, 0.0)
        .base(1, -10.0, 0.0)
        .world(1);

    for _ in 0..2 {
        let unit = world.spawn_unit_at(PlayerId::HUMAN, vec2(0.3, 0.0)).unwrap();
        world.command_move(unit, Vec2Fixed::ZERO).unwrap();
    }
    world.tick(tick_dt()).unwrap();
    assert_eq!(world.base(BaseId(0)).unwrap().damage_from(PlayerId::HUMAN), 2);

    spawn_orbiters(&mut world, AI, vec2(0.0, 0.5), 3);

    assert_eq!(run_cycle(&mut world, AI), AiAction::Repair);
    let repairing = with_behavior(&world, AI, UnitBehavior::Repairing);
    assert_eq!(repairing.len(), 2);
    for id in &repairing {
        let unit = world.unit(*id).unwrap();
        assert_eq!(unit.destination(), Vec2Fixed::ZERO);
        assert_eq!(unit.location(), None);
    }
    assert_eq!(queries::live_orbiters(&world, BaseId(0)).len(), 1);

    world.tick(tick_dt()).unwrap();
    assert!(!world.base(BaseId(0)).unwrap().is_damaged());
}

#[test]
fn hopeless_base_is_not_repaired() {
    let mut world = LevelBuilder::new("evacuate")
        .base(2, 0.0, 0.0)
        .base(2, 4.0, 4.0)
        .base(1, -10.0, 0.0)
        .world(2);

    for _ in 0..4 {
        let unit = world.spawn_unit_at(PlayerId::HUMAN, vec2(0.3, 0.0)).unwrap();
        world.command_move(unit, Vec2Fixed::ZERO).unwrap();
    }
    world.tick(tick_dt()).unwrap();
    spawn_orbiters(&mut world, AI, vec2(0.0, 0.5), 1);

    // three inbound against one hit of margin plus one orbiter
    for _ in 0..3 {
        let unit = world.spawn_unit_at(PlayerId::HUMAN, vec2(-5.0, 0.0)).unwrap();
        world.command_move(unit, Vec2Fixed::ZERO).unwrap();
    }

    let action = run_cycle(&mut world, AI);

    assert_ne!(action, AiAction::Repair);
    assert!(with_behavior(&world, AI, UnitBehavior::Repairing).is_empty());
}

#[test]
fn defense_matches_each_inbound_enemy() {
    let mut world = LevelBuilder::new("defend")
        .base(2, 0.0, 0.0)
        .base(2, 2.0, 0.0)
        .base(1, -10.0, 0.0)
        .world(3);
    spawn_orbiters(&mut world, AI, vec2(2.0, 0.5), 3);

    let raider = world.spawn_unit_at(PlayerId::HUMAN, vec2(-5.0, 0.0)).unwrap();
    world.command_move(raider, Vec2Fixed::ZERO).unwrap();
    assert_eq!(queries::attacked_bases(&world, AI), vec![(BaseId(0), 1)]);

    assert_eq!(run_cycle(&mut world, AI), AiAction::Defend);

    let defenders = with_behavior(&world, AI, UnitBehavior::Defending);
    assert_eq!(defenders.len(), 1);
    let defender = world.unit(defenders[0]).unwrap();
    let reach = defender.destination().distance(Vec2Fixed::ZERO);
    assert!((reach - fixed_f(0.5)).abs() < fixed_f(0.001));
}

#[test]
fn units_already_attacking_are_recalled_to_defend() {
    let mut world = LevelBuilder::new("recall")
        .base(2, 0.0, 0.0)
        .base(0, 1.0, 0.0)
        .base(1, -10.0, 0.0)
        .world(3);
    spawn_orbiters(&mut world, AI, vec2(0.0, 0.5), 5);
    assert_eq!(run_cycle(&mut world, AI), AiAction::Attack);
    assert_eq!(with_behavior(&world, AI, UnitBehavior::Attacking).len(), 5);

    let raider = world.spawn_unit_at(PlayerId::HUMAN, vec2(-5.0, 0.0)).unwrap();
    world.command_move(raider, Vec2Fixed::ZERO).unwrap();

    assert_eq!(run_cycle(&mut world, AI), AiAction::Defend);

    let defenders = with_behavior(&world, AI, UnitBehavior::Defending);
    assert_eq!(defenders.len(), 1);
    assert_eq!(with_behavior(&world, AI, UnitBehavior::Attacking).len(), 4);
    let reach = world.unit(defenders[0]).unwrap().destination().distance(Vec2Fixed::ZERO);
    assert!((reach - fixed_f(0.5)).abs() < fixed_f(0.001));
}

#[test]
fn defenders_are_released_next_cycle() {
    let mut world = LevelBuilder::new("defend")
        .base(2, 0.0, 0.0)
        .base(2, 2.0, 0.0)
        .base(1, -10.0, 0.0)
        .world(3);
    spawn_orbiters(&mut world, AI, vec2(2.0, 0.5), 1);
    let raider = world.spawn_unit_at(PlayerId::HUMAN, vec2(-5.0, 0.0)).unwrap();
    world.command_move(raider, Vec2Fixed::ZERO).unwrap();
    run_cycle(&mut world, AI);
    assert_eq!(with_behavior(&world, AI, UnitBehavior::Defending).len(), 1);

    world.command_move(raider, vec2(-5.0, 5.0)).unwrap();
    run_cycle(&mut world, AI);

    assert!(with_behavior(&world, AI, UnitBehavior::Defending).is_empty());
}

#[test]
fn attack_commits_exactly_the_needed_units() {
    let mut world = LevelBuilder::new("attack")
        .base(2, -1.0, 0.0)
        .base(0, 1.0, 0.0)
        .base(3, 10.0, 10.0)
        .world(4);
    spawn_orbiters(&mut world, AI, vec2(-1.0, 0.5), 6);

    let target = queries::determine_target(&world, AI).unwrap();
    assert_eq!(target.target, BaseId(1));
    assert_eq!(target.units_needed, 5);

    assert_eq!(run_cycle(&mut world, AI), AiAction::Attack);

    let attackers = with_behavior(&world, AI, UnitBehavior::Attacking);
    assert_eq!(attackers.len(), 5);
    for id in attackers {
        assert_eq!(world.unit(id).unwrap().destination(), vec2(1.0, 0.0));
    }
    assert_eq!(queries::live_orbiters(&world, BaseId(0)).len(), 1);
}

#[test]
fn attack_waits_for_enough_units() {
    let mut world = LevelBuilder::new("attack")
        .base(2, -1.0, 0.0)
        .base(0, 1.0, 0.0)
        .base(3, 10.0, 10.0)
        .world(4);
    spawn_orbiters(&mut world, AI, vec2(-1.0, 0.5), 4);

    assert_eq!(run_cycle(&mut world, AI), AiAction::Hold);
    assert!(with_behavior(&world, AI, UnitBehavior::Attacking).is_empty());
}

#[test]
fn upgrade_spends_surplus_over_the_reserve() {
    let mut world = LevelBuilder::new("upgrade")
        .base(2, 0.0, 0.0)
        .base(3, 20.0, 0.0)
        .world(5);
    spawn_orbiters(&mut world, AI, vec2(0.0, 0.5), 10);

    assert_eq!(queries::best_upgradable_base(&world, AI), Some(BaseId(0)));
    assert_eq!(run_cycle(&mut world, AI), AiAction::Upgrade);

    let upgraders = with_behavior(&world, AI, UnitBehavior::Upgrading);
    assert_eq!(upgraders.len(), 5);
    assert_eq!(queries::live_orbiters(&world, BaseId(0)).len(), 5);

    world.tick(tick_dt()).unwrap();
    assert_eq!(world.base(BaseId(0)).unwrap().level(), 2);
}

#[test]
fn stranded_unit_is_sent_back_into_orbit() {
    let mut world = LevelBuilder::new("orphan")
        .base(2, 0.0, 0.0)
        .base(3, 20.0, 0.0)
        .world(6);
    let stray = world.spawn_unit_at(AI, vec2(5.0, 5.0)).unwrap();
    assert_eq!(world.unit(stray).unwrap().location(), None);

    run_cycle(&mut world, AI);

    let unit = world.unit(stray).unwrap();
    assert_eq!(unit.behavior(), UnitBehavior::Moving);
    let reach = unit.destination().distance(Vec2Fixed::ZERO);
    assert!((reach - fixed_f(0.5)).abs() < fixed_f(0.001));
}

#[test]
fn ai_cycles_run_on_their_cadence() {
    let mut world = LevelBuilder::new("orphan")
        .base(2, 0.0, 0.0)
        .base(3, 20.0, 0.0)
        .world(6);
    let stray = world.spawn_unit_at(AI, vec2(5.0, 5.0)).unwrap();

    for _ in 0..9 {
        world.tick(tick_dt()).unwrap();
    }
    assert_eq!(world.unit(stray).unwrap().behavior(), UnitBehavior::Stopped);

    world.tick(tick_dt()).unwrap();
    assert_eq!(world.unit(stray).unwrap().behavior(), UnitBehavior::Moving);
}

#[test]
fn human_units_are_never_ordered_by_the_ai() {
    let mut world = LevelBuilder::new("human")
        .base(1, 0.0, 0.0)
        .base(2, 20.0, 0.0)
        .world(7);
    let stray = world.spawn_unit_at(PlayerId::HUMAN, vec2(5.0, 5.0)).unwrap();

    for _ in 0..30 {
        world.tick(tick_dt()).unwrap();
    }

    let unit = world.unit(stray).unwrap();
    assert_eq!(unit.behavior(), UnitBehavior::Stopped);
    assert_eq!(unit.position(), vec2(5.0, 5.0));
}
