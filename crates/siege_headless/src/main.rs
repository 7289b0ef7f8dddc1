//! Headless Orbital Siege match runner.
//!
//! Runs AI-only matches without graphics. Designed for balance batches,
//! CI testing and determinism verification.
//!
//! # Usage
//!
//! ```bash
//! # Run a single match
//! cargo run -p siege_headless -- run --level duel --output report.json
//!
//! # Run batch balance test
//! cargo run -p siege_headless -- batch --level duel --count 1000 --output results/
//!
//! # Verify determinism
//! cargo run -p siege_headless -- verify --level crossroads --seed 42
//!
//! # List built-in levels
//! cargo run -p siege_headless -- levels
//! ```
//!
//! Reports are JSON on stdout or in the given file; logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use siege_headless::{
    batch::{run_batch, verify_determinism, BatchConfig},
    runner::{run_match, MatchConfig, DEFAULT_MAX_TICKS, TICK_RATE},
    scenario::{Scenario, ScenarioError},
};

#[derive(Parser)]
#[command(name = "siege_headless")]
#[command(about = "Headless Orbital Siege match runner for AI testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single match
    Run {
        /// Built-in level id or level file
        #[arg(short, long, default_value = "duel")]
        level: String,

        /// Rules file overriding the default rules
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Random seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Stop the match undecided after this many ticks
        #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
        max_ticks: u64,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run batch of matches for balance testing
    Batch {
        /// Built-in level id or level file
        #[arg(short, long, default_value = "duel")]
        level: String,

        /// Rules file overriding the default rules
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Number of matches to run
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Maximum parallel matches (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Starting random seed
        #[arg(long, default_value = "0")]
        seed_start: u64,

        /// Stop each match undecided after this many ticks
        #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
        max_ticks: u64,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,
    },

    /// Verify determinism by running same seed multiple times
    Verify {
        /// Built-in level id or level file
        #[arg(short, long, default_value = "duel")]
        level: String,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,

        /// Ticks per run
        #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
        max_ticks: u64,
    },

    /// List built-in levels
    Levels,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries reports
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    let result = match cli.command {
        Commands::Run {
            level,
            rules,
            seed,
            max_ticks,
            output,
        } => cmd_run(&level, rules, seed, max_ticks, output),
        Commands::Batch {
            level,
            rules,
            count,
            parallel,
            seed_start,
            max_ticks,
            output,
        } => cmd_batch(BatchConfig {
            level,
            rules,
            game_count: count,
            parallel_games: parallel,
            output_dir: output,
            seed_start,
            max_ticks,
        }),
        Commands::Verify {
            level,
            seed,
            runs,
            max_ticks,
        } => cmd_verify(&level, seed, runs, max_ticks),
        Commands::Levels => {
            cmd_levels();
            Ok(true)
        }
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("FATAL: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load_scenario(level: &str, rules: Option<PathBuf>) -> Result<Scenario, ScenarioError> {
    let scenario = Scenario::resolve(level)?;
    match rules {
        Some(path) => scenario.with_rules_file(path),
        None => Ok(scenario),
    }
}

/// Run a single match
fn cmd_run(
    level: &str,
    rules: Option<PathBuf>,
    seed: u64,
    max_ticks: u64,
    output: Option<PathBuf>,
) -> Result<bool, ScenarioError> {
    let scenario = load_scenario(level, rules)?;
    let report = run_match(&scenario, &MatchConfig::new(seed).with_max_ticks(max_ticks))?;

    match output {
        Some(path) => {
            report.save(&path)?;
            eprintln!("Report saved to: {}", path.display());
        }
        None => {
            let json = report.to_json().map_err(std::io::Error::other)?;
            println!("{json}");
        }
    }

    let seconds = report.duration_ticks / u64::from(TICK_RATE);
    eprintln!("Outcome: {:?} after {} ticks ({}s)", report.outcome, report.duration_ticks, seconds);
    Ok(true)
}

/// Run batch of matches for balance testing
fn cmd_batch(config: BatchConfig) -> Result<bool, ScenarioError> {
    let output = config.output_dir.clone();
    std::fs::create_dir_all(&output)?;

    tracing::info!(
        level = %config.level,
        count = config.game_count,
        parallel = config.parallel_games,
        seed_start = config.seed_start,
        max_ticks = config.max_ticks,
        output = %output.display(),
        "Batch configuration"
    );

    let results = run_batch(config)?;
    let results_path = output.join("batch_results.json");
    results.save(&results_path)?;

    let summary = &results.summary;
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Games played: {}", results.games.len());
    if !results.errors.is_empty() {
        eprintln!("Games FAILED: {}", results.errors.len());
    }
    eprintln!("Duration: {:.1}s", results.duration_seconds);
    eprintln!("Draws: {}  Unfinished: {}", summary.draws, summary.unfinished);
    eprintln!("\nWin Rates:");
    for (player, rate) in &summary.win_rates {
        eprintln!("  player {}: {:.1}%", player, rate * 100.0);
    }

    if !results.errors.is_empty() {
        eprintln!("\nGAME FAILURES:");
        for error in results.errors.iter().take(10) {
            eprintln!("  Game {} (seed {}): {}", error.game_index, error.seed, error.message);
        }
        if results.errors.len() > 10 {
            eprintln!("  ... and {} more failures", results.errors.len() - 10);
        }
    }

    eprintln!("\nResults saved to: {}", results_path.display());
    Ok(results.errors.is_empty())
}

/// Verify determinism
fn cmd_verify(level: &str, seed: u64, runs: u32, max_ticks: u64) -> Result<bool, ScenarioError> {
    tracing::info!("Verifying determinism: {} with seed {} ({} runs)", level, seed, runs);

    let scenario = load_scenario(level, None)?;
    let deterministic = verify_determinism(&scenario, seed, runs, max_ticks)?;

    if deterministic {
        eprintln!("PASS: All {runs} runs produced identical results");
    } else {
        eprintln!("FAIL: Non-determinism detected!");
    }
    Ok(deterministic)
}

fn cmd_levels() {
    for id in Scenario::builtin_ids() {
        match Scenario::builtin(id) {
            Some(Ok(scenario)) => println!(
                "{id:<12} {:<12} {} bases, {} players",
                scenario.level.title,
                scenario.level.bases.len(),
                scenario.level.player_ids().len() - 1
            ),
            Some(Err(e)) => println!("{id:<12} (invalid: {e})"),
            None => {}
        }
    }
}
