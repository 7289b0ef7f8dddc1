//! Shared data records for simulated pieces.
//!
//! Bases and units both carry a [`Piece`]: the geometry and identity
//! record the collision system works with. Everything here is plain data;
//! behavior lives in [`crate::base`], [`crate::unit`] and
//! [`crate::collision`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::math::{Fixed, Vec2Fixed};

/// Identifier of a player in a match.
///
/// Id 0 is always the neutral player and id 1 the human player; every
/// other id is AI-controlled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

impl PlayerId {
    /// The neutral player that owns unclaimed bases.
    pub const NEUTRAL: Self = Self(0);
    /// The human player.
    pub const HUMAN: Self = Self(1);

    /// Whether this id is reserved for the neutral player.
    #[must_use]
    pub const fn is_neutral(self) -> bool {
        self.0 == Self::NEUTRAL.0
    }

    /// Whether this id is reserved for the human player.
    #[must_use]
    pub const fn is_human(self) -> bool {
        self.0 == Self::HUMAN.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player#{}", self.0)
    }
}

/// Index of a base in the world's base registry.
///
/// Bases are never removed during a match, so the index is stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BaseId(pub u32);

impl BaseId {
    /// Position in the registry.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "base#{}", self.0)
    }
}

/// Unique identifier for units. Ids are never reused within a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId(pub u64);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit#{}", self.0)
    }
}

/// What a unit is currently doing.
///
/// `Stopped` and `Moving` are physical states. The remaining variants are
/// intents written by the AI controller on top of a move; a unit in any
/// state other than `Stopped` travels toward its destination and returns
/// to `Stopped` on arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UnitBehavior {
    /// Idle, orbiting a base if it has a location.
    #[default]
    Stopped,
    /// Travelling to a destination.
    Moving,
    /// Sent to be absorbed into a base's upgrade progress.
    Upgrading,
    /// Sent to be absorbed into a damaged base.
    Repairing,
    /// Sent at an opposing base.
    Attacking,
    /// Committed to defending a friendly base this AI cycle.
    Defending,
}

impl UnitBehavior {
    /// Whether the unit should advance toward its destination this tick.
    #[must_use]
    pub const fn is_travelling(self) -> bool {
        !matches!(self, Self::Stopped)
    }
}

/// Geometry and identity shared by every simulated piece.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    /// Owning player. Fixed for units; bases change owner on capture.
    pub owner: PlayerId,
    /// Current world position.
    pub position: Vec2Fixed,
    /// Where the piece is heading. Equals `position` for bases.
    pub destination: Vec2Fixed,
    /// Collision radius.
    #[serde(with = "crate::math::fixed_serde")]
    pub size: Fixed,
    /// Flagged during collision resolution, reaped at end of tick.
    pub destroyed: bool,
}

impl Piece {
    /// Create a stationary piece.
    #[must_use]
    pub const fn new(owner: PlayerId, position: Vec2Fixed, size: Fixed) -> Self {
        Self {
            owner,
            position,
            destination: position,
            size,
            destroyed: false,
        }
    }

    /// Current world position.
    #[must_use]
    pub const fn position(&self) -> Vec2Fixed {
        self.position
    }

    /// Where the piece is heading.
    #[must_use]
    pub const fn destination(&self) -> Vec2Fixed {
        self.destination
    }

    /// Collision radius.
    #[must_use]
    pub const fn size(&self) -> Fixed {
        self.size
    }

    /// Whether the piece has been flagged for removal.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Default collision eligibility: any piece that is still alive.
    #[must_use]
    pub const fn can_collide(&self) -> bool {
        !self.destroyed
    }

    /// Whether two circular pieces overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        let reach = self.size + other.size;
        self.position.distance_squared(other.position) < reach * reach
    }
}

/// Reference to either kind of piece, used to dispatch collisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceRef {
    /// A base.
    Base(BaseId),
    /// A unit.
    Unit(UnitId),
}
