//! Error types for the siege simulation.
//!
//! The simulation has no IO in its core, so every error here is either
//! bad input data (levels, rules, orders) or a broken internal invariant.

use thiserror::Error;

use crate::components::{BaseId, PlayerId, UnitId};

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all simulation errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// Rules configuration is unusable.
    #[error("Invalid rules configuration: {0}")]
    InvalidConfig(String),

    /// Level data cannot seed a match.
    #[error("Invalid level: {0}")]
    InvalidLevel(String),

    /// Player id not present in this match.
    #[error("Unknown player: {0}")]
    UnknownPlayer(PlayerId),

    /// Unit id not present in this match.
    #[error("Unknown unit: {0}")]
    UnknownUnit(UnitId),

    /// Base id not present in this match.
    #[error("Unknown base: {0}")]
    UnknownBase(BaseId),

    /// A move order named a unit the human player does not own.
    #[error("Unit {unit} is not controllable by the human player")]
    NotControllable {
        /// The offending unit.
        unit: UnitId,
    },

    /// The match has already been decided.
    #[error("The match is over")]
    MatchOver,

    /// A two-way index or ownership record disagrees with itself.
    #[error("World integrity check failed: {0}")]
    IntegrityViolation(String),

    /// RON text failed to parse.
    #[error("Failed to parse data: {message}")]
    DataParse {
        /// Parser error message.
        message: String,
    },
}

impl From<ron::error::SpannedError> for GameError {
    fn from(err: ron::error::SpannedError) -> Self {
        Self::DataParse {
            message: err.to_string(),
        }
    }
}
