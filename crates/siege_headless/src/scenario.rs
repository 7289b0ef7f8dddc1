//! Scenario loading.
//!
//! A scenario pairs a level with the rules it is played under. Levels are
//! named by a built-in id (`duel`, `triangle`, `crossroads`) or by a path
//! to a RON file; rules default to [`SimConfig::default`] unless a RON rules
//! file is given.

use std::path::Path;

use siege_core::config::SimConfig;
use siege_core::error::GameError;
use siege_core::level::LevelData;
use siege_core::world::World;
use thiserror::Error;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The simulation rejected the level or rules.
    #[error("Invalid scenario: {0}")]
    Game(#[from] GameError),
}

/// Built-in levels embedded at compile time, by id.
pub const BUILTIN_LEVELS: &[(&str, &str)] = &[
    ("duel", include_str!("../levels/duel.ron")),
    ("triangle", include_str!("../levels/triangle.ron")),
    ("crossroads", include_str!("../levels/crossroads.ron")),
];

/// A level and the rules it is played under.
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Id the level was resolved from: a built-in id or a file path.
    pub name: String,
    /// Starting bases.
    pub level: LevelData,
    /// Simulation rules.
    pub rules: SimConfig,
}

impl Scenario {
    /// Wrap a level with default rules.
    #[must_use]
    pub fn new(name: impl Into<String>, level: LevelData) -> Self {
        Self {
            name: name.into(),
            level,
            rules: SimConfig::default(),
        }
    }

    /// A built-in level by id.
    pub fn builtin(id: &str) -> Option<Result<Self, ScenarioError>> {
        BUILTIN_LEVELS
            .iter()
            .find(|(name, _)| *name == id)
            .map(|(name, ron)| Self::from_ron_str(name, ron))
    }

    /// Ids of every built-in level.
    #[must_use]
    pub fn builtin_ids() -> Vec<&'static str> {
        BUILTIN_LEVELS.iter().map(|(name, _)| *name).collect()
    }

    /// Resolve a built-in id first, then fall back to a file path.
    pub fn resolve(level: &str) -> Result<Self, ScenarioError> {
        match Self::builtin(level) {
            Some(scenario) => scenario,
            None => Self::load(level),
        }
    }

    /// Load a level from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        let contents = read_existing(path)?;
        Self::from_ron_str(&path.display().to_string(), &contents)
    }

    /// Parse a level from a RON string.
    pub fn from_ron_str(name: &str, ron: &str) -> Result<Self, ScenarioError> {
        let level: LevelData = ron::from_str(ron)?;
        level.validate()?;
        Ok(Self::new(name, level))
    }

    /// Replace the rules with ones read from a RON file.
    pub fn with_rules_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ScenarioError> {
        let contents = read_existing(path.as_ref())?;
        let rules: SimConfig = ron::from_str(&contents)?;
        rules.validate()?;
        self.rules = rules;
        Ok(self)
    }

    /// Start a match on this scenario.
    pub fn world(&self, seed: u64) -> Result<World, ScenarioError> {
        Ok(World::from_level(&self.level, self.rules.clone(), seed)?)
    }
}

fn read_existing(path: &Path) -> Result<String, ScenarioError> {
    if !path.exists() {
        return Err(ScenarioError::FileNotFound(path.display().to_string()));
    }
    Ok(std::fs::read_to_string(path)?)
}
