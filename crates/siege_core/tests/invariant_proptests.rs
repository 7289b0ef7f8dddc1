//! Property tests: random levels, seeds and human orders never break the
//! orbit index, ownership records or base state ranges.

use proptest::prelude::*;
use siege_core::prelude::*;
use siege_test_utils::determinism::strategies::{arb_level, arb_position, arb_seed};
use siege_test_utils::fixtures::{tick_dt, LevelBuilder};

fn assert_world_consistent(world: &World) -> std::result::Result<(), TestCaseError> {
    prop_assert!(world.check_integrity().is_ok(), "{:?}", world.check_integrity());
    for base in world.bases() {
        prop_assert!(base.level() >= 1 && base.level() <= world.config().max_base_level);
        prop_assert!(base.damage().values().all(|value| *value > 0));
        prop_assert!(base
            .damage()
            .values()
            .all(|value| *value < world.config().units_to_capture));
    }
    for player in world.players() {
        let owned = world.bases().iter().filter(|b| b.owner() == player.id()).count();
        prop_assert_eq!(owned, player.bases().len());
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn ai_matches_keep_invariants(level in arb_level(7), seed in arb_seed()) {
        let mut world = World::from_level(&level, SimConfig::default(), seed).unwrap();
        for _ in 0..20 {
            for _ in 0..30 {
                if world.outcome().is_over() {
                    break;
                }
                world.tick(tick_dt()).unwrap();
            }
            assert_world_consistent(&world)?;
        }
    }

    #[test]
    fn human_orders_keep_invariants(
        seed in arb_seed(),
        orders in proptest::collection::vec((0u32..60, arb_position()), 1..12),
    ) {
        let mut world = LevelBuilder::new("orders")
            .base(1, -3.0, 0.0)
            .base(0, 0.0, 0.0)
            .base(0, 0.0, 2.0)
            .base(2, 3.0, 0.0)
            .world(seed);

        for (wait, destination) in orders {
            for _ in 0..wait {
                if world.outcome().is_over() {
                    return Ok(());
                }
                world.tick(tick_dt()).unwrap();
            }
            if world.outcome().is_over() {
                return Ok(());
            }
            let mine: Vec<UnitId> = world.live_units(PlayerId::HUMAN).map(Unit::id).collect();
            let ordered = world.order_move(&mine, destination).unwrap();
            prop_assert_eq!(ordered, mine.len());
            assert_world_consistent(&world)?;
        }
    }

    #[test]
    fn rect_selection_only_returns_live_human_units(
        a in arb_position(),
        b in arb_position(),
        seed in arb_seed(),
    ) {
        let mut world = LevelBuilder::new("select")
            .base(1, -1.0, 0.0)
            .base(2, 1.0, 0.0)
            .world(seed);
        for _ in 0..400 {
            if world.outcome().is_over() {
                break;
            }
            world.tick(tick_dt()).unwrap();
        }

        let selected = world.units_in_rect(a, b);
        let mut sorted = selected.clone();
        sorted.sort_unstable();
        prop_assert_eq!(&selected, &sorted);
        for id in selected {
            let unit = world.unit(id).unwrap();
            prop_assert_eq!(unit.owner(), PlayerId::HUMAN);
            prop_assert!(unit.is_alive());
        }
    }
}
