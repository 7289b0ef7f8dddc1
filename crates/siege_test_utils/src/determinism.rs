//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a match produces identical results
//! given the same level, rules and seed.
//!
//! # Testing Strategy
//!
//! Replays, AI-versus-AI batches and regression tests all assume a seeded
//! match is fully reproducible. Sources of non-determinism include:
//!
//! - **Floating-point math**: we use fixed-point arithmetic via
//!   [`siege_core::math::Fixed`] throughout.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Systems always iterate units in sorted id order.
//!
//! - **System randomness**: orbit points come from the world's own seeded
//!   `ChaCha8` stream, never from the OS.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: individual systems (spawning, movement, collision)
//! 2. **Property tests**: random levels and seeds still replay exactly
//! 3. **Integration tests**: full AI matches are reproducible
//! 4. **Parallel tests**: running N matches on N threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use siege_core::prelude::*;

use crate::fixtures::tick_dt;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic match).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the runs were deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial simulation state
/// * `step` - Function to advance simulation by one tick
/// * `hash` - Function to compute state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Advance a world one frame, ignoring the refusal after the match ends.
fn step_world(world: &mut World) {
    if !world.outcome().is_over() {
        let _ = world.tick(tick_dt());
    }
}

/// Run a world `runs` times from the same setup and compare final hashes.
///
/// # Example
///
/// ```ignore
/// use siege_test_utils::determinism::verify_world_determinism;
/// use siege_test_utils::fixtures::duel_level;
///
/// let result = verify_world_determinism(
///     || World::from_level(&duel_level(), SimConfig::default(), 7).unwrap(),
///     3,
///     600,
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_world_determinism<F>(setup_fn: F, runs: usize, num_ticks: u64) -> DeterminismResult
where
    F: Fn() -> World,
{
    verify_determinism(runs, num_ticks, setup_fn, step_world, World::state_hash)
}

/// Run N worlds on N scoped threads and collect the final hashes.
///
/// Catches non-determinism that only shows up under thread scheduling or
/// allocation differences.
///
/// # Panics
///
/// Panics if a worker thread panics.
pub fn run_parallel_worlds<F>(setup_fn: F, num_sims: usize, num_ticks: u64) -> DeterminismResult
where
    F: Fn() -> World + Sync,
{
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut world = setup_fn();
                    for _ in 0..num_ticks {
                        step_world(&mut world);
                    }
                    world.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("simulation thread panicked"))
            .collect()
    });

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    DeterminismResult {
        is_deterministic,
        hashes,
        ticks: num_ticks,
    }
}

/// Compare two runs tick-by-tick, finding the first divergence.
///
/// # Returns
///
/// `None` if the runs agree throughout, `Some(tick)` for the first tick
/// whose state hashes differ (0 for the initial state).
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> World,
{
    let mut first = setup_fn();
    let mut second = setup_fn();

    if first.state_hash() != second.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        step_world(&mut first);
        step_world(&mut second);

        if first.state_hash() != second.state_hash() {
            return Some(tick);
        }
    }

    None
}

/// Verify that a cloned world continues exactly like the original.
///
/// The headless runner forks worlds by cloning, so a clone must carry the
/// random stream position along with everything else.
pub fn verify_clone_determinism<F>(setup_fn: F, warmup: u64, num_ticks: u64) -> bool
where
    F: Fn() -> World,
{
    let mut original = setup_fn();
    for _ in 0..warmup {
        step_world(&mut original);
    }

    let mut fork = original.clone();
    for _ in 0..num_ticks {
        step_world(&mut original);
        step_world(&mut fork);
    }

    original.state_hash() == fork.state_hash()
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for determinism testing.
///
/// These strategies generate random but reproducible inputs for
/// property-based testing of the simulation.
pub mod strategies {
    use proptest::prelude::*;
    use siege_core::level::{BaseSpawn, LevelData};
    use siege_core::math::{Fixed, Vec2Fixed};

    /// Generate a coordinate on a typical map, in tenths.
    ///
    /// Range: -5.0 to 5.0
    pub fn arb_coordinate() -> impl Strategy<Value = Fixed> {
        (-50i32..=50i32).prop_map(|tenths| Fixed::from_num(tenths) / Fixed::from_num(10))
    }

    /// Generate a point on a typical map.
    pub fn arb_position() -> impl Strategy<Value = Vec2Fixed> {
        (arb_coordinate(), arb_coordinate()).prop_map(|(x, y)| Vec2Fixed::new(x, y))
    }

    /// Generate a match seed.
    pub fn arb_seed() -> impl Strategy<Value = u64> {
        any::<u64>()
    }

    /// Generate a starting owner: neutral, or one of three AI players.
    pub fn arb_owner() -> impl Strategy<Value = u32> {
        prop_oneof![Just(0u32), 2u32..=4u32]
    }

    /// Generate one starting base.
    pub fn arb_base_spawn() -> impl Strategy<Value = BaseSpawn> {
        (arb_owner(), arb_position()).prop_map(|(player, position)| BaseSpawn { player, position })
    }

    /// Generate a level with between 2 and `max_bases` bases.
    ///
    /// The first two bases always belong to two different AI players so
    /// every generated match has a contest.
    pub fn arb_level(max_bases: usize) -> impl Strategy<Value = LevelData> {
        (
            arb_position(),
            arb_position(),
            proptest::collection::vec(arb_base_spawn(), 0..max_bases.saturating_sub(1)),
        )
            .prop_map(|(first, second, rest)| {
                let mut bases = vec![
                    BaseSpawn {
                        player: 2,
                        position: first,
                    },
                    BaseSpawn {
                        player: 3,
                        position: second,
                    },
                ];
                bases.extend(rest);
                LevelData {
                    title: "Generated".to_string(),
                    bases,
                }
            })
    }
}
