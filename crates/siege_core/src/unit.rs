//! Units: travel, orbit and the behavior state machine.
//!
//! A unit's owner never changes. Its `location` is the base it is parked
//! at; the world keeps that forward reference and the reverse orbit index
//! in step, so the location is only ever written through
//! [`crate::world::World`].

use serde::{Deserialize, Serialize};

use crate::components::{BaseId, Piece, PlayerId, UnitBehavior, UnitId};
use crate::config::SimConfig;
use crate::math::{degrees_to_radians, Fixed, Vec2Fixed};

/// What a unit did during its movement step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Stopped without a location.
    Idle,
    /// Circled its base.
    Orbiting,
    /// Advanced toward its destination.
    Travelling,
    /// Reached its destination and stopped.
    Arrived,
}

/// The ring a stopped unit circles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrbitAnchor {
    /// Centre of the base.
    pub center: Vec2Fixed,
    /// Orbit ring radius.
    pub radius: Fixed,
}

/// A unit on the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    id: UnitId,
    piece: Piece,
    behavior: UnitBehavior,
    location: Option<BaseId>,
}

impl Unit {
    /// Create a stopped unit with no location.
    #[must_use]
    pub fn new(id: UnitId, owner: PlayerId, position: Vec2Fixed, size: Fixed) -> Self {
        Self {
            id,
            piece: Piece::new(owner, position, size),
            behavior: UnitBehavior::Stopped,
            location: None,
        }
    }

    /// Unique id.
    #[must_use]
    pub const fn id(&self) -> UnitId {
        self.id
    }

    /// Shared geometry record.
    #[must_use]
    pub const fn piece(&self) -> &Piece {
        &self.piece
    }

    /// Owning player.
    #[must_use]
    pub const fn owner(&self) -> PlayerId {
        self.piece.owner
    }

    /// Current position.
    #[must_use]
    pub const fn position(&self) -> Vec2Fixed {
        self.piece.position
    }

    /// Current destination.
    #[must_use]
    pub const fn destination(&self) -> Vec2Fixed {
        self.piece.destination
    }

    /// Current behavior state.
    #[must_use]
    pub const fn behavior(&self) -> UnitBehavior {
        self.behavior
    }

    /// Base this unit is parked at.
    #[must_use]
    pub const fn location(&self) -> Option<BaseId> {
        self.location
    }

    /// Whether the unit is flagged for removal.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.piece.destroyed
    }

    /// Whether the unit is alive.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        !self.piece.destroyed
    }

    /// Overwrite the behavior intent without touching the destination.
    pub fn set_behavior(&mut self, behavior: UnitBehavior) {
        self.behavior = behavior;
    }

    /// Flag the unit for removal at the end of the tick.
    pub fn mark_destroyed(&mut self) {
        self.piece.destroyed = true;
    }

    /// Point the unit at `destination` and start moving.
    ///
    /// The caller must also clear the location; see
    /// [`crate::world::World::set_unit_destination`].
    pub(crate) fn begin_move(&mut self, destination: Vec2Fixed) {
        self.piece.destination = destination;
        self.behavior = UnitBehavior::Moving;
    }

    pub(crate) fn set_location_field(&mut self, location: Option<BaseId>) {
        self.location = location;
    }

    /// Advance one tick.
    ///
    /// A stopped unit circles `anchor` at the configured angular rate and
    /// drifts outward while it is inside the orbit ring. A travelling unit
    /// moves at `movement_rate`; once the remaining distance is below one
    /// step it snaps onto the destination and stops.
    pub fn advance(
        &mut self,
        dt: Fixed,
        config: &SimConfig,
        anchor: Option<OrbitAnchor>,
    ) -> MoveOutcome {
        if !self.behavior.is_travelling() {
            let Some(anchor) = anchor else {
                return MoveOutcome::Idle;
            };
            let outward = self.piece.position - anchor.center;
            if outward.length_squared() < anchor.radius * anchor.radius {
                let push = Vec2Fixed::new(
                    outward.x / config.orbit_push_divisor,
                    outward.y / config.orbit_push_divisor,
                );
                self.piece.position = self.piece.position + push;
            }
            let angle = degrees_to_radians(config.orbit_degrees_per_second * dt);
            self.piece.position = self.piece.position.rotate_about(anchor.center, angle);
            return MoveOutcome::Orbiting;
        }

        let step = config.movement_rate * dt;
        let remaining = self.piece.destination - self.piece.position;
        if remaining.length_squared() < step * step {
            self.piece.position = self.piece.destination;
            self.behavior = UnitBehavior::Stopped;
            MoveOutcome::Arrived
        } else {
            self.piece.position = self.piece.position + remaining.normalize().scale(step);
            MoveOutcome::Travelling
        }
    }
}
