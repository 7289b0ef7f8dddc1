//! Single-match runner.
//!
//! Plays one AI-only match at a fixed [`TICK_RATE`] until an outcome is
//! decided or the tick limit is reached, feeding every tick's events to a
//! [`MetricsCollector`].

use std::time::{Duration, Instant};

use siege_core::error::GameError;
use siege_core::math::Fixed;
use siege_core::world::World;
use tracing::{debug, error, info, warn};

use crate::metrics::{MatchReport, MetricsCollector};
use crate::scenario::{Scenario, ScenarioError};

/// Simulated ticks per second.
pub const TICK_RATE: u32 = 30;

/// Default tick limit: ten minutes of simulated time.
pub const DEFAULT_MAX_TICKS: u64 = 10 * 60 * TICK_RATE as u64;

/// Maximum units alive at once before a run is aborted.
/// A healthy match stays far below this.
const MAX_UNITS: usize = 20_000;

/// Progress logging interval (ticks).
const PROGRESS_LOG_INTERVAL: u64 = 1800;

/// Wall-clock time after which a single tick is reported as slow.
const SLOW_TICK: Duration = Duration::from_millis(50);

/// Seconds per tick at [`TICK_RATE`].
#[must_use]
pub fn tick_dt() -> Fixed {
    Fixed::from_num(1) / Fixed::from_num(TICK_RATE)
}

/// Settings for one match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchConfig {
    /// Random seed for determinism.
    pub seed: u64,
    /// Maximum ticks before the match is stopped undecided.
    pub max_ticks: u64,
    /// Match id for tracking.
    pub game_id: String,
}

impl MatchConfig {
    /// A match on `seed` with the default tick limit.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            max_ticks: DEFAULT_MAX_TICKS,
            game_id: format!("game_{seed}"),
        }
    }

    /// Set the tick limit.
    #[must_use]
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = max_ticks;
        self
    }
}

/// Play one match and report on it.
///
/// # Errors
///
/// Returns [`ScenarioError::Game`] if the scenario cannot start or a tick
/// fails its integrity check.
pub fn run_match(scenario: &Scenario, config: &MatchConfig) -> Result<MatchReport, ScenarioError> {
    let started = Instant::now();
    info!(
        game_id = %config.game_id,
        seed = config.seed,
        max_ticks = config.max_ticks,
        level = %scenario.name,
        "Starting match"
    );

    let mut world = scenario.world(config.seed)?;
    let mut collector = MetricsCollector::new(&world);
    run_world(&mut world, &mut collector, config.max_ticks)?;
    let report = collector.finish(&world, config.game_id.clone(), scenario.name.clone());

    info!(
        game_id = %config.game_id,
        ticks = report.duration_ticks,
        outcome = ?report.outcome,
        elapsed_ms = started.elapsed().as_millis(),
        "Match finished"
    );
    Ok(report)
}

/// Tick `world` until it is decided or `max_ticks` have been played.
///
/// # Errors
///
/// Propagates the first failing tick.
pub fn run_world(
    world: &mut World,
    collector: &mut MetricsCollector,
    max_ticks: u64,
) -> Result<(), GameError> {
    let dt = tick_dt();

    while world.get_tick() < max_ticks && !world.outcome().is_over() {
        if world.units().len() > MAX_UNITS {
            error!(
                tick = world.get_tick(),
                units = world.units().len(),
                max = MAX_UNITS,
                "Unit count exceeded maximum, stopping match"
            );
            break;
        }

        let tick_start = Instant::now();
        let events = world.tick(dt)?;
        collector.observe(world.get_tick(), &events);

        let tick_duration = tick_start.elapsed();
        if tick_duration > SLOW_TICK {
            warn!(
                tick = world.get_tick(),
                duration_ms = tick_duration.as_millis(),
                units = world.units().len(),
                "Slow tick"
            );
        }
        if world.get_tick() % PROGRESS_LOG_INTERVAL == 0 {
            debug!(
                tick = world.get_tick(),
                units = world.units().len(),
                "Match progress"
            );
        }
    }
    Ok(())
}
