//! Headless match runner for AI testing and CI verification.
//!
//! Plays AI-only matches without any presentation layer. This enables:
//!
//! - **Balance testing**: batches of seeded AI-versus-AI matches
//! - **CI verification**: automated checks of game rules and determinism
//! - **Level authoring**: quick checks that a new level plays out
//!
//! # Example
//!
//! ```bash
//! # Play one match on a built-in level
//! cargo run -p siege_headless -- run --level duel --seed 7
//!
//! # Run a batch across 200 seeds
//! cargo run -p siege_headless -- batch --level crossroads --count 200 --output results/
//!
//! # Verify determinism
//! cargo run -p siege_headless -- verify --level triangle --seed 12345 --runs 5
//! ```

pub mod batch;
pub mod metrics;
pub mod runner;
pub mod scenario;

pub use batch::{run_batch, verify_determinism, BatchConfig, BatchResults};
pub use metrics::{BatchSummary, MatchReport, MetricsCollector};
pub use runner::{run_match, MatchConfig, TICK_RATE};
pub use scenario::{Scenario, ScenarioError};
