//! Rules configuration.
//!
//! Every tunable constant of the simulation lives in [`SimConfig`]. The
//! defaults reproduce the standard rules; rule variants are written as RON
//! files and parsed with [`SimConfig::from_ron_str`].
//!
//! # Example RON
//!
//! ```ron
//! SimConfig(
//!     units_to_capture: 7,
//!     time_between_spawns: 2.5,
//! )
//! ```
//!
//! Fields that are left out keep their default value.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::math::{fixed_decimal_serde, Fixed};

/// Simulation rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Highest level a base can reach.
    pub max_base_level: u32,
    /// Unanswered hits from one attacker that capture a base.
    pub units_to_capture: u32,
    /// Absorbed friendly units needed to gain a level.
    pub units_to_level: u32,
    /// Seconds between spawns at level 1; divided by the base level.
    #[serde(with = "fixed_decimal_serde")]
    pub time_between_spawns: Fixed,
    /// Unit travel speed in world units per second.
    #[serde(with = "fixed_decimal_serde")]
    pub movement_rate: Fixed,
    /// Angular speed of orbiting units.
    #[serde(with = "fixed_decimal_serde")]
    pub orbit_degrees_per_second: Fixed,
    /// An orbiting unit inside the orbit ring is pushed out by
    /// `offset / orbit_push_divisor` each tick.
    #[serde(with = "fixed_decimal_serde")]
    pub orbit_push_divisor: Fixed,
    /// Collision radius of a base.
    #[serde(with = "fixed_decimal_serde")]
    pub base_radius: Fixed,
    /// Collision radius of a unit.
    #[serde(with = "fixed_decimal_serde")]
    pub unit_radius: Fixed,
    /// A friendly unit is absorbed only if its destination is this close to
    /// the base centre.
    #[serde(with = "fixed_decimal_serde")]
    pub absorb_range: Fixed,
    /// A stopped unit enters the orbit of the first owned base within
    /// `orbit_entry_factor * base.size`.
    #[serde(with = "fixed_decimal_serde")]
    pub orbit_entry_factor: Fixed,
    /// Ticks between AI decision cycles.
    pub ai_update_interval: u32,
    /// Idle units the AI keeps back instead of spending on upgrades.
    pub reserve_units: u32,
    /// Radius around an opposing base within which its owner's units count
    /// as defenders when scoring attack targets.
    #[serde(with = "fixed_decimal_serde")]
    pub defender_scan_radius: Fixed,
    /// Simulated seconds between unit-count samples.
    #[serde(with = "fixed_decimal_serde")]
    pub stats_interval: Fixed,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_base_level: 3,
            units_to_capture: 5,
            units_to_level: 5,
            time_between_spawns: Fixed::from_num(3),
            movement_rate: Fixed::from_num(0.6),
            orbit_degrees_per_second: Fixed::from_num(60),
            orbit_push_divisor: Fixed::from_num(15),
            base_radius: Fixed::from_num(0.5),
            unit_radius: Fixed::from_num(0.05),
            absorb_range: Fixed::from_num(0.1),
            orbit_entry_factor: Fixed::from_num(2),
            ai_update_interval: 10,
            reserve_units: 5,
            defender_scan_radius: Fixed::from_num(0.5),
            stats_interval: Fixed::from_num(1),
        }
    }
}

impl SimConfig {
    /// Parse rules from RON text and validate them.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        let config: Self = ron::from_str(ron)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject rules the simulation cannot run with.
    pub fn validate(&self) -> Result<()> {
        let counts = [
            ("max_base_level", self.max_base_level),
            ("units_to_capture", self.units_to_capture),
            ("units_to_level", self.units_to_level),
            ("ai_update_interval", self.ai_update_interval),
        ];
        for (name, value) in counts {
            if value == 0 {
                return Err(GameError::InvalidConfig(format!("{name} must be at least 1")));
            }
        }

        let lengths = [
            ("time_between_spawns", self.time_between_spawns),
            ("movement_rate", self.movement_rate),
            ("orbit_push_divisor", self.orbit_push_divisor),
            ("base_radius", self.base_radius),
            ("unit_radius", self.unit_radius),
            ("absorb_range", self.absorb_range),
            ("orbit_entry_factor", self.orbit_entry_factor),
            ("defender_scan_radius", self.defender_scan_radius),
            ("stats_interval", self.stats_interval),
        ];
        for (name, value) in lengths {
            if value <= Fixed::ZERO {
                return Err(GameError::InvalidConfig(format!("{name} must be positive")));
            }
        }

        Ok(())
    }
}
