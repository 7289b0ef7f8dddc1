//! Bases: spawn timers, collision eligibility and the damage ledger.
//!
//! A base is the only piece that changes owner. Its damage map records,
//! per attacking player, the hits that have not been answered by healing;
//! the collision resolver in [`crate::collision`] drives the mutations
//! defined here and keeps the orbit index in step.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::components::{BaseId, Piece, PlayerId, UnitId};
use crate::config::SimConfig;
use crate::math::{Fixed, Vec2Fixed};

/// Outcome of absorbing a friendly unit into upgrade progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeStep {
    /// Progress advanced to the contained value.
    Progress(u32),
    /// The base reached the contained level; progress restarted at zero.
    LeveledUp(u32),
}

/// A base on the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Base {
    id: BaseId,
    piece: Piece,
    level: u32,
    upgrade_progress: u32,
    damage: BTreeMap<PlayerId, u32>,
    orbiting: Vec<UnitId>,
    #[serde(with = "crate::math::fixed_serde")]
    elapsed_spawn_time: Fixed,
}

impl Base {
    /// Create a level-1 base.
    #[must_use]
    pub fn new(id: BaseId, owner: PlayerId, position: Vec2Fixed, size: Fixed) -> Self {
        Self {
            id,
            piece: Piece::new(owner, position, size),
            level: 1,
            upgrade_progress: 0,
            damage: BTreeMap::new(),
            orbiting: Vec::new(),
            elapsed_spawn_time: Fixed::ZERO,
        }
    }

    /// Registry id of this base.
    #[must_use]
    pub const fn id(&self) -> BaseId {
        self.id
    }

    /// Shared geometry record.
    #[must_use]
    pub const fn piece(&self) -> &Piece {
        &self.piece
    }

    /// Current owner.
    #[must_use]
    pub const fn owner(&self) -> PlayerId {
        self.piece.owner
    }

    /// Centre of the base.
    #[must_use]
    pub const fn position(&self) -> Vec2Fixed {
        self.piece.position
    }

    /// Collision radius.
    #[must_use]
    pub const fn size(&self) -> Fixed {
        self.piece.size
    }

    /// Current level, starting at 1.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Units absorbed toward the next level.
    #[must_use]
    pub const fn upgrade_progress(&self) -> u32 {
        self.upgrade_progress
    }

    /// Unanswered hits per attacking player. Every stored value is positive.
    #[must_use]
    pub const fn damage(&self) -> &BTreeMap<PlayerId, u32> {
        &self.damage
    }

    /// Accumulated hits from one attacker.
    #[must_use]
    pub fn damage_from(&self, attacker: PlayerId) -> u32 {
        self.damage.get(&attacker).copied().unwrap_or(0)
    }

    /// Largest accumulated value across all attackers.
    #[must_use]
    pub fn max_damage(&self) -> u32 {
        self.damage.values().copied().max().unwrap_or(0)
    }

    /// Whether any attacker has an entry.
    #[must_use]
    pub fn is_damaged(&self) -> bool {
        !self.damage.is_empty()
    }

    /// Units currently parked at this base, in arrival order.
    #[must_use]
    pub fn orbiting_units(&self) -> &[UnitId] {
        &self.orbiting
    }

    /// Radius of the orbit ring: grows by a ninth of the size per level.
    #[must_use]
    pub fn orbit_distance(&self) -> Fixed {
        let level_steps = Fixed::from_num(self.level - 1) / Fixed::from_num(9);
        self.piece.size * (level_steps + Fixed::from_num(1))
    }

    /// Point on the orbit ring at `angle` radians.
    #[must_use]
    pub fn point_on_orbit(&self, angle: Fixed) -> Vec2Fixed {
        self.position() + Vec2Fixed::from_angle(angle).scale(self.orbit_distance())
    }

    /// Seconds accumulated toward the next spawn.
    #[must_use]
    pub const fn spawn_timer(&self) -> Fixed {
        self.elapsed_spawn_time
    }

    /// Seconds between spawns at the current level.
    #[must_use]
    pub fn spawn_interval(&self, config: &SimConfig) -> Fixed {
        config.time_between_spawns / Fixed::from_num(self.level)
    }

    /// Advance the spawn timer. Returns `true` when a unit should spawn.
    ///
    /// The remainder past the interval carries over, so the long-run rate is
    /// exactly `level / time_between_spawns`.
    pub fn advance_spawn_timer(&mut self, dt: Fixed, config: &SimConfig) -> bool {
        self.elapsed_spawn_time += dt;
        let interval = self.spawn_interval(config);
        if self.elapsed_spawn_time >= interval {
            self.elapsed_spawn_time -= interval;
            true
        } else {
            false
        }
    }

    /// Whether a unit heading here may collide with this base.
    ///
    /// Enemy units always may. A friendly unit may only if it was sent to
    /// the centre of the base and the base has damage to heal or a level
    /// to gain; otherwise it just orbits.
    #[must_use]
    pub fn can_collide(&self, unit: &Piece, config: &SimConfig) -> bool {
        if !self.piece.can_collide() {
            return false;
        }
        if unit.owner != self.owner() {
            return true;
        }
        let sent_to_centre = self.position().distance_squared(unit.destination)
            < config.absorb_range * config.absorb_range;
        sent_to_centre && (self.is_damaged() || self.level < config.max_base_level)
    }

    /// Reduce every attacker's entry by one, pruning emptied entries.
    pub fn heal(&mut self) {
        for value in self.damage.values_mut() {
            *value = value.saturating_sub(1);
        }
        self.prune_damage();
    }

    /// Add one absorbed unit to the upgrade progress.
    pub fn add_upgrade_progress(&mut self, config: &SimConfig) -> UpgradeStep {
        self.upgrade_progress += 1;
        if self.upgrade_progress >= config.units_to_level {
            self.upgrade_progress = 0;
            self.level += 1;
            UpgradeStep::LeveledUp(self.level)
        } else {
            UpgradeStep::Progress(self.upgrade_progress)
        }
    }

    /// On a neutral base, a hit from `attacker` first erodes every other
    /// attacker's progress by one. Returns whether any rival entry existed.
    pub fn erode_rival_damage(&mut self, attacker: PlayerId) -> bool {
        let mut eroded = false;
        for (player, value) in &mut self.damage {
            if *player != attacker {
                *value = value.saturating_sub(1);
                eroded = true;
            }
        }
        self.prune_damage();
        eroded
    }

    /// Record one hit from `attacker`. Returns `true` once the attacker's
    /// entry reaches the capture threshold.
    pub fn register_hit(&mut self, attacker: PlayerId, config: &SimConfig) -> bool {
        let entry = self.damage.entry(attacker).or_insert(0);
        *entry += 1;
        *entry >= config.units_to_capture
    }

    /// Hand the base to a new owner, restoring it to a fresh level-1 state.
    ///
    /// The position is kept. Returns the units that were in orbit; the
    /// caller must clear their location.
    pub fn reset(&mut self, new_owner: PlayerId) -> Vec<UnitId> {
        self.piece.owner = new_owner;
        self.level = 1;
        self.upgrade_progress = 0;
        self.elapsed_spawn_time = Fixed::ZERO;
        self.damage.clear();
        std::mem::take(&mut self.orbiting)
    }

    /// Add a unit to the orbit list. Only the world's location setter calls this.
    pub(crate) fn attach_unit(&mut self, unit: UnitId) {
        if !self.orbiting.contains(&unit) {
            self.orbiting.push(unit);
        }
    }

    /// Remove a unit from the orbit list. Only the world's location setter calls this.
    pub(crate) fn detach_unit(&mut self, unit: UnitId) {
        self.orbiting.retain(|id| *id != unit);
    }

    fn prune_damage(&mut self) {
        self.damage.retain(|_, value| *value > 0);
    }

    #[cfg(test)]
    pub(crate) fn set_level_for_test(&mut self, level: u32) {
        self.level = level;
    }
}
