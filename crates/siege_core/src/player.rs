//! Players and their ownership collections.
//!
//! A player owns a list of bases, a list of active units, a buffer of units
//! spawned this tick (merged at the end of the tick), and a mirror of the
//! orbit index keyed by base. The world is responsible for keeping the
//! mirror identical to each base's own orbit list.

use std::collections::BTreeMap;

use crate::ai::AiController;
use crate::components::{BaseId, PlayerId, UnitId};

/// A participant in the match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    id: PlayerId,
    bases: Vec<BaseId>,
    units: Vec<UnitId>,
    pending_units: Vec<UnitId>,
    units_at: BTreeMap<BaseId, Vec<UnitId>>,
    controller: Option<AiController>,
}

impl Player {
    /// Create a player. Ids 0 and 1 are neutral and human; every other id
    /// gets an AI controller.
    #[must_use]
    pub fn new(id: PlayerId) -> Self {
        let controller = if id.is_neutral() || id.is_human() {
            None
        } else {
            Some(AiController::new())
        };
        Self {
            id,
            bases: Vec::new(),
            units: Vec::new(),
            pending_units: Vec::new(),
            units_at: BTreeMap::new(),
            controller,
        }
    }

    /// Player id.
    #[must_use]
    pub const fn id(&self) -> PlayerId {
        self.id
    }

    /// Whether this is the human player.
    #[must_use]
    pub const fn is_human(&self) -> bool {
        self.id.is_human()
    }

    /// Whether this is the neutral player.
    #[must_use]
    pub const fn is_neutral(&self) -> bool {
        self.id.is_neutral()
    }

    /// Whether an AI controller plays for this player.
    #[must_use]
    pub const fn is_ai(&self) -> bool {
        self.controller.is_some()
    }

    /// Owned bases in acquisition order.
    #[must_use]
    pub fn bases(&self) -> &[BaseId] {
        &self.bases
    }

    /// Active units (spawned before this tick).
    #[must_use]
    pub fn units(&self) -> &[UnitId] {
        &self.units
    }

    /// Units spawned this tick, not yet active.
    #[must_use]
    pub fn pending_units(&self) -> &[UnitId] {
        &self.pending_units
    }

    /// Units of this player parked at `base`, from the player's mirror.
    #[must_use]
    pub fn units_at(&self, base: BaseId) -> &[UnitId] {
        self.units_at.get(&base).map_or(&[], Vec::as_slice)
    }

    /// Every base with a non-empty mirror entry.
    pub fn orbit_mirror(&self) -> impl Iterator<Item = (BaseId, &[UnitId])> {
        self.units_at
            .iter()
            .map(|(base, units)| (*base, units.as_slice()))
    }

    pub(crate) fn controller_mut(&mut self) -> Option<&mut AiController> {
        self.controller.as_mut()
    }

    pub(crate) fn add_base(&mut self, base: BaseId) {
        if !self.bases.contains(&base) {
            self.bases.push(base);
        }
    }

    pub(crate) fn remove_base(&mut self, base: BaseId) {
        self.bases.retain(|id| *id != base);
    }

    /// Buffer a freshly spawned unit until the end of the tick.
    pub(crate) fn queue_unit(&mut self, unit: UnitId) {
        self.pending_units.push(unit);
    }

    /// Make buffered units active.
    pub(crate) fn flush_pending(&mut self) -> usize {
        let count = self.pending_units.len();
        self.units.append(&mut self.pending_units);
        count
    }

    pub(crate) fn remove_unit(&mut self, unit: UnitId) {
        self.units.retain(|id| *id != unit);
        self.pending_units.retain(|id| *id != unit);
    }

    pub(crate) fn add_to_location(&mut self, unit: UnitId, base: BaseId) {
        let entry = self.units_at.entry(base).or_default();
        if !entry.contains(&unit) {
            entry.push(unit);
        }
    }

    pub(crate) fn remove_from_location(&mut self, unit: UnitId, base: BaseId) {
        if let Some(entry) = self.units_at.get_mut(&base) {
            entry.retain(|id| *id != unit);
            if entry.is_empty() {
                self.units_at.remove(&base);
            }
        }
    }
}
