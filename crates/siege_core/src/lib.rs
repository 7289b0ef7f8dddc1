//! # Siege Core
//!
//! Deterministic simulation core for Orbital Siege, a real-time
//! territory-control game: bases spawn units, units orbit, travel and crash
//! into bases to heal, upgrade, damage and capture them.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness (a seeded `ChaCha8` stream owned by the world)
//! - No floating-point math (uses fixed-point)
//!
//! This separation enables:
//! - Headless AI-versus-AI batch runs
//! - Determinism testing
//! - Any presentation layer, driven through [`events::PresentationHooks`]
//!
//! ## Crate Structure
//!
//! - [`math`] - Fixed-point math utilities
//! - [`components`] - Ids, behavior states and the shared piece record
//! - [`base`] / [`unit`] - Entity state and per-entity rules
//! - [`player`] - Ownership collections
//! - [`collision`] - Combat and capture resolution
//! - [`queries`] - Read-only queries used by the AI
//! - [`ai`] - AI strategic controller
//! - [`world`] - Match state and the tick loop
//! - [`config`] / [`level`] - Rules and level data

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod ai;
pub mod base;
pub mod collision;
pub mod components;
pub mod config;
pub mod error;
pub mod events;
pub mod level;
pub mod math;
pub mod player;
pub mod queries;
pub mod stats;
pub mod unit;
pub mod victory;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::ai::{AiAction, AiController};
    pub use crate::base::Base;
    pub use crate::components::*;
    pub use crate::config::SimConfig;
    pub use crate::error::{GameError, Result};
    pub use crate::events::{DestructionCause, GameEvent, NoopHooks, PresentationHooks, TickEvents};
    pub use crate::level::{BaseSpawn, LevelData};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::player::Player;
    pub use crate::stats::StatisticsRecorder;
    pub use crate::unit::Unit;
    pub use crate::victory::MatchOutcome;
    pub use crate::world::World;
}
