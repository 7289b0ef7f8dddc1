//! Batch match runner.
//!
//! Runs many seeds of one scenario in parallel using rayon and aggregates
//! the reports.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::metrics::{BatchSummary, MatchReport};
use crate::runner::{run_match, MatchConfig, DEFAULT_MAX_TICKS};
use crate::scenario::{Scenario, ScenarioError};

/// Configuration for a batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Built-in level id or level file path
    pub level: String,
    /// Optional rules file
    pub rules: Option<PathBuf>,
    /// Number of matches to run
    pub game_count: u32,
    /// Maximum parallel matches (0 = use rayon default)
    pub parallel_games: u32,
    /// Output directory for results
    pub output_dir: PathBuf,
    /// Starting seed; match `i` uses `seed_start + i`
    pub seed_start: u64,
    /// Maximum ticks per match
    pub max_ticks: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            level: "duel".to_string(),
            rules: None,
            game_count: 100,
            parallel_games: 0,
            output_dir: PathBuf::from("results"),
            seed_start: 0,
            max_ticks: DEFAULT_MAX_TICKS,
        }
    }
}

impl BatchConfig {
    /// Create config for a specific level
    pub fn new(level: &str, game_count: u32) -> Self {
        Self {
            level: level.to_string(),
            game_count,
            ..Default::default()
        }
    }

    /// Set output directory
    pub fn with_output(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    /// Set seed start
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set the tick limit per match
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    /// Resolve the level and rules this batch plays.
    pub fn scenario(&self) -> Result<Scenario, ScenarioError> {
        let scenario = Scenario::resolve(&self.level)?;
        match &self.rules {
            Some(path) => scenario.with_rules_file(path),
            None => Ok(scenario),
        }
    }
}

/// Results from a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used
    pub config: BatchConfig,
    /// Individual match reports, in seed order
    pub games: Vec<MatchReport>,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Total runtime
    pub duration_seconds: f64,
    /// Errors encountered
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Error during batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    /// Match index
    pub game_index: u32,
    /// Seed used
    pub seed: u64,
    /// Error message
    pub message: String,
}

/// Run a batch of matches.
///
/// # Errors
///
/// Fails only if the scenario cannot be resolved; individual match
/// failures are collected in [`BatchResults::errors`].
pub fn run_batch(config: BatchConfig) -> Result<BatchResults, ScenarioError> {
    let start = Instant::now();
    let scenario = config.scenario()?;
    let completed = AtomicU32::new(0);

    info!(
        level = %config.level,
        games = config.game_count,
        seed_start = config.seed_start,
        "Starting batch run"
    );

    let play = |index: u32| -> Result<MatchReport, BatchError> {
        let seed = config.seed_start.wrapping_add(u64::from(index));
        let match_config = MatchConfig::new(seed).with_max_ticks(config.max_ticks);
        let result = run_match(&scenario, &match_config).map_err(|e| {
            warn!(game = index, seed, error = %e, "Match failed");
            BatchError {
                game_index: index,
                seed,
                message: e.to_string(),
            }
        });

        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
        if done % 10 == 0 {
            debug!("Progress: {}/{}", done, config.game_count);
        }
        result
    };

    let results: Vec<Result<MatchReport, BatchError>> = if config.parallel_games > 0 {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_games as usize)
            .build()
        {
            Ok(pool) => pool.install(|| (0..config.game_count).into_par_iter().map(play).collect()),
            Err(e) => {
                warn!(error = %e, "Could not build thread pool, using the global pool");
                (0..config.game_count).into_par_iter().map(play).collect()
            }
        }
    } else {
        (0..config.game_count).into_par_iter().map(play).collect()
    };

    let (games, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let games: Vec<MatchReport> = games.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let summary = BatchSummary::from_reports(&games);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        "Batch complete: {} games in {:.1}s ({:.1} games/sec)",
        games.len(),
        duration_seconds,
        games.len() as f64 / duration_seconds.max(0.001)
    );

    Ok(BatchResults {
        config,
        games,
        summary,
        duration_seconds,
        errors,
    })
}

/// Run one seed `runs` times and check every final state hash matches.
///
/// # Errors
///
/// Returns the first scenario or match failure.
pub fn verify_determinism(
    scenario: &Scenario,
    seed: u64,
    runs: u32,
    max_ticks: u64,
) -> Result<bool, ScenarioError> {
    let config = MatchConfig::new(seed).with_max_ticks(max_ticks);
    let mut hashes = Vec::with_capacity(runs as usize);
    for run in 0..runs {
        let report = run_match(scenario, &config)?;
        debug!(run, hash = report.final_state_hash, ticks = report.duration_ticks, "Verification run");
        hashes.push(report.final_state_hash);
    }
    Ok(hashes.windows(2).all(|w| w[0] == w[1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_config_default() {
        let config = BatchConfig::default();
        assert_eq!(config.game_count, 100);
        assert_eq!(config.level, "duel");
        assert_eq!(config.max_ticks, DEFAULT_MAX_TICKS);
    }

    #[test]
    fn test_batch_config_builder() {
        let config = BatchConfig::new("triangle", 500)
            .with_output(PathBuf::from("/tmp/results"))
            .with_seed(12345)
            .with_max_ticks(900);

        assert_eq!(config.level, "triangle");
        assert_eq!(config.game_count, 500);
        assert_eq!(config.seed_start, 12345);
        assert_eq!(config.max_ticks, 900);
    }

    #[test]
    fn test_run_batch_small() {
        let results = run_batch(BatchConfig::new("duel", 6).with_max_ticks(300)).unwrap();

        assert_eq!(results.games.len(), 6);
        assert!(results.errors.is_empty());
        assert_eq!(results.summary.total_games, 6);
        let seeds: Vec<u64> = results.games.iter().map(|g| g.seed).collect();
        assert_eq!(seeds, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_parallel_pool_matches_default_pool() {
        let default_pool = run_batch(BatchConfig::new("duel", 4).with_max_ticks(300)).unwrap();
        let mut config = BatchConfig::new("duel", 4).with_max_ticks(300);
        config.parallel_games = 2;
        let own_pool = run_batch(config).unwrap();

        let hashes = |r: &BatchResults| r.games.iter().map(|g| g.final_state_hash).collect::<Vec<_>>();
        assert_eq!(hashes(&default_pool), hashes(&own_pool));
    }

    #[test]
    fn test_unknown_level_fails_batch() {
        let result = run_batch(BatchConfig::new("missing.ron", 2));
        assert!(matches!(result, Err(ScenarioError::FileNotFound(_))));
    }

    #[test]
    fn test_verify_determinism() {
        let scenario = Scenario::builtin("crossroads").unwrap().unwrap();
        assert!(verify_determinism(&scenario, 12345, 3, 600).unwrap());
    }

    #[test]
    fn test_batch_results_save_load() {
        let results = run_batch(BatchConfig::new("duel", 3).with_max_ticks(200)).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("results.json");

        results.save(&path).unwrap();
        assert!(path.exists());

        let loaded = BatchResults::load(&path).unwrap();
        assert_eq!(loaded.games.len(), 3);
        assert_eq!(loaded.config, results.config);
        assert_eq!(loaded.summary.total_games, 3);
    }
}
