//! Simulation benchmarks for siege_core.
//!
//! Run with: `cargo bench -p siege_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use siege_core::prelude::*;

const FOUR_CORNERS: &str = r#"
    LevelData(
        title: "Four Corners",
        bases: [
            (player: 2, position: (-3.0, -3.0)),
            (player: 3, position: (3.0, -3.0)),
            (player: 4, position: (3.0, 3.0)),
            (player: 5, position: (-3.0, 3.0)),
            (player: 0, position: (0.0, 0.0)),
            (player: 0, position: (0.0, -3.0)),
            (player: 0, position: (0.0, 3.0)),
            (player: 0, position: (-3.0, 0.0)),
            (player: 0, position: (3.0, 0.0)),
        ],
    )
"#;

fn dt() -> Fixed {
    Fixed::from_num(1) / Fixed::from_num(30)
}

/// A world after `ticks` ticks, so benchmarks measure a populated map.
fn warmed_world(ticks: u32) -> World {
    let level = LevelData::from_ron_str(FOUR_CORNERS).expect("benchmark level parses");
    let mut world = World::from_level(&level, SimConfig::default(), 42).expect("benchmark world");
    for _ in 0..ticks {
        if world.tick(dt()).is_err() {
            break;
        }
    }
    world
}

pub fn simulation_benchmark(c: &mut Criterion) {
    c.bench_function("tick_populated_four_player", |b| {
        b.iter_batched(
            || warmed_world(900),
            |mut world| {
                let _ = black_box(world.tick(dt()));
            },
            BatchSize::SmallInput,
        )
    });

    c.bench_function("hundred_ticks_from_start", |b| {
        b.iter_batched(
            || warmed_world(0),
            |mut world| {
                for _ in 0..100 {
                    let _ = world.tick(dt());
                }
                black_box(world.state_hash())
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, simulation_benchmark);
criterion_main!(benches);
