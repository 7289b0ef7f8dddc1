//! Seeded matches replay exactly.

use siege_core::prelude::*;
use siege_test_utils::determinism::{find_first_divergence, run_parallel_worlds, verify_world_determinism};
use siege_test_utils::fixtures::{four_corners_level, human_vs_ai_level, run_ticks, tick_dt, vec2};

fn corners(seed: u64) -> impl Fn() -> World {
    move || World::from_level(&four_corners_level(), SimConfig::default(), seed).unwrap()
}

#[test]
fn four_player_match_replays_exactly() {
    verify_world_determinism(corners(2024), 3, 1800).assert_deterministic();
}

#[test]
fn replays_agree_tick_by_tick() {
    assert_eq!(find_first_divergence(corners(77), 1200), None);
}

#[test]
fn matches_on_separate_threads_agree() {
    run_parallel_worlds(corners(13), 4, 900).assert_deterministic();
}

#[test]
fn different_seeds_place_units_differently() {
    let mut first = corners(1)();
    let mut second = corners(2)();
    run_ticks(&mut first, 120);
    run_ticks(&mut second, 120);

    assert_ne!(first.state_hash(), second.state_hash());
}

#[test]
fn identical_orders_replay_identically() {
    let play = || {
        let mut world = World::from_level(&human_vs_ai_level(), SimConfig::default(), 5).unwrap();
        let mut events = Vec::new();
        for tick in 0..600u32 {
            if world.outcome().is_over() {
                break;
            }
            if tick % 120 == 100 {
                let mine: Vec<UnitId> = world.live_units(PlayerId::HUMAN).map(Unit::id).collect();
                world.order_move(&mine, vec2(0.0, 1.5)).unwrap();
            }
            events.push(world.tick(tick_dt()).unwrap());
        }
        (world.state_hash(), events)
    };

    let (hash_a, events_a) = play();
    let (hash_b, events_b) = play();
    assert_eq!(hash_a, hash_b);
    assert_eq!(events_a, events_b);
}
