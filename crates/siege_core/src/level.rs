//! Level setup data.
//!
//! A level is an ordered list of bases, each tagged with the id of the
//! player that starts with it. Player 0 is neutral and player 1 is the
//! human; any other id is an AI opponent.
//!
//! # Example RON
//!
//! ```ron
//! LevelData(
//!     title: "Duel",
//!     bases: [
//!         (player: 2, position: (-3.0, 0.0)),
//!         (player: 0, position: (0.0, 0.0)),
//!         (player: 3, position: (3.0, 0.0)),
//!     ],
//! )
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::components::PlayerId;
use crate::error::{GameError, Result};
use crate::math::{Fixed, Vec2Fixed};

/// Largest absolute base coordinate a level may use.
pub const MAX_COORDINATE: i32 = 10_000;

/// One starting base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseSpawn {
    /// Id of the starting owner.
    pub player: u32,
    /// Centre of the base, written as a decimal `(x, y)` pair.
    #[serde(with = "decimal_point")]
    pub position: Vec2Fixed,
}

impl BaseSpawn {
    /// Starting owner.
    #[must_use]
    pub const fn owner(&self) -> PlayerId {
        PlayerId(self.player)
    }
}

/// A playable map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelData {
    /// Display name.
    #[serde(default)]
    pub title: String,
    /// Starting bases, in registry order.
    pub bases: Vec<BaseSpawn>,
}

impl LevelData {
    /// Parse a level from RON text.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        let level: Self = ron::from_str(ron)?;
        level.validate()?;
        Ok(level)
    }

    /// A level must place at least one base, and every base within
    /// [`MAX_COORDINATE`] of the origin on both axes.
    pub fn validate(&self) -> Result<()> {
        if self.bases.is_empty() {
            return Err(GameError::InvalidLevel(format!(
                "level '{}' has no bases",
                self.title
            )));
        }
        let bound = Fixed::from_num(MAX_COORDINATE);
        if let Some(spawn) = self
            .bases
            .iter()
            .find(|spawn| spawn.position.x.abs() > bound || spawn.position.y.abs() > bound)
        {
            return Err(GameError::InvalidLevel(format!(
                "level '{}' places a base at ({}, {}), outside +/-{MAX_COORDINATE}",
                self.title, spawn.position.x, spawn.position.y
            )));
        }
        Ok(())
    }

    /// Every player id in the match, ascending, always including neutral.
    #[must_use]
    pub fn player_ids(&self) -> Vec<PlayerId> {
        let mut ids: BTreeSet<PlayerId> = self.bases.iter().map(BaseSpawn::owner).collect();
        ids.insert(PlayerId::NEUTRAL);
        ids.into_iter().collect()
    }
}

mod decimal_point {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::math::{Fixed, Vec2Fixed};

    pub fn serialize<S>(value: &Vec2Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (value.x.to_num::<f64>(), value.y.to_num::<f64>()).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec2Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (x, y) = <(f64, f64)>::deserialize(deserializer)?;
        match (Fixed::checked_from_num(x), Fixed::checked_from_num(y)) {
            (Some(x), Some(y)) => Ok(Vec2Fixed::new(x, y)),
            _ => Err(D::Error::custom(format!(
                "({x}, {y}) is out of fixed-point range"
            ))),
        }
    }
}
