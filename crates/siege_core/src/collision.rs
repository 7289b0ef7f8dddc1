//! Collision detection and combat/capture resolution.
//!
//! Every tick, each unit is tested against every base and every unit with
//! a higher id. A pair overlaps when the distance between centres is below
//! the sum of the radii. Overlaps are resolved on the spot, in sorted unit
//! order, and a unit flagged destroyed takes no further part in the tick.
//!
//! Resolution is asymmetric: the moving unit asks the target whether it
//! accepts the collision, and the target applies the outcome.
//!
//! | Target | Condition | Outcome |
//! |--------|-----------|---------|
//! | own base | damaged | unit absorbed, every damage entry -1 |
//! | own base | below max level | unit absorbed, upgrade progress +1 |
//! | neutral base | rival damage present | unit spent, every rival entry -1 |
//! | enemy base | live orbiter present | unit spent, one orbiter sacrificed |
//! | enemy base | otherwise | unit spent, damage +1, capture at threshold |
//! | enemy unit | | both destroyed |

use crate::base::{Base, UpgradeStep};
use crate::components::{BaseId, Piece, PieceRef, PlayerId, UnitId};
use crate::events::{DestructionCause, GameEvent, TickEvents};
use crate::unit::Unit;
use crate::world::World;

impl World {
    /// Find and resolve every overlapping pair.
    pub(crate) fn run_collision_system(&mut self, events: &mut TickEvents) {
        let unit_ids = self.units.sorted_ids();
        let base_ids: Vec<BaseId> = self.bases.iter().map(Base::id).collect();

        for (index, &unit) in unit_ids.iter().enumerate() {
            for &base in &base_ids {
                if self.overlapping(unit, PieceRef::Base(base)) {
                    self.on_collision(unit, PieceRef::Base(base), events);
                }
            }
            for &other in &unit_ids[index + 1..] {
                if self.overlapping(unit, PieceRef::Unit(other)) {
                    self.on_collision(unit, PieceRef::Unit(other), events);
                }
            }
        }
    }

    /// Entry point for one overlap: a live unit forwards to the target if
    /// the target accepts it.
    pub(crate) fn on_collision(&mut self, unit: UnitId, other: PieceRef, events: &mut TickEvents) {
        let alive = self.units.get(unit).is_some_and(Unit::is_alive);
        if alive && self.can_collide(other, unit) {
            self.did_collide(other, unit, events);
        }
    }

    fn piece(&self, piece: PieceRef) -> Option<&Piece> {
        match piece {
            PieceRef::Base(id) => self.bases.get(id.index()).map(Base::piece),
            PieceRef::Unit(id) => self.units.get(id).map(Unit::piece),
        }
    }

    fn overlapping(&self, unit: UnitId, other: PieceRef) -> bool {
        match (self.units.get(unit), self.piece(other)) {
            (Some(incoming), Some(target)) => {
                incoming.is_alive() && !target.is_destroyed() && incoming.piece().overlaps(target)
            }
            _ => false,
        }
    }

    /// Whether `target` accepts a collision from `unit`.
    ///
    /// Units of the same owner share a layer and never collide with each
    /// other.
    fn can_collide(&self, target: PieceRef, unit: UnitId) -> bool {
        let Some(incoming) = self.units.get(unit) else {
            return false;
        };
        match target {
            PieceRef::Base(id) => self
                .bases
                .get(id.index())
                .is_some_and(|base| base.can_collide(incoming.piece(), &self.config)),
            PieceRef::Unit(id) => self.units.get(id).is_some_and(|other| {
                other.piece().can_collide() && other.owner() != incoming.owner()
            }),
        }
    }

    fn did_collide(&mut self, target: PieceRef, unit: UnitId, events: &mut TickEvents) {
        match target {
            PieceRef::Base(id) => self.base_did_collide(id, unit, events),
            PieceRef::Unit(id) => self.unit_did_collide(id, unit, events),
        }
    }

    fn base_did_collide(&mut self, base: BaseId, unit: UnitId, events: &mut TickEvents) {
        let Some(attacker) = self.units.get(unit).map(Unit::owner) else {
            return;
        };
        let Some(owner) = self.bases.get(base.index()).map(Base::owner) else {
            return;
        };

        if attacker == owner {
            self.absorb_friendly(base, unit, events);
            return;
        }

        self.destroy_unit(unit, DestructionCause::StruckBase, events);

        if owner.is_neutral() {
            let eroded = self
                .bases
                .get_mut(base.index())
                .is_some_and(|target| target.erode_rival_damage(attacker));
            if eroded {
                tracing::debug!(%base, %attacker, "Rival capture progress eroded");
                return;
            }
        }

        if let Some(defender) = self.first_live_orbiter(base) {
            self.destroy_unit(defender, DestructionCause::Sacrificed, events);
            return;
        }

        let captured = self
            .bases
            .get_mut(base.index())
            .is_some_and(|target| target.register_hit(attacker, &self.config));
        if captured {
            let new_owner = if owner.is_neutral() {
                attacker
            } else {
                PlayerId::NEUTRAL
            };
            self.transfer_base(base, new_owner, events);
        }
    }

    /// A friendly unit heals a damaged base, otherwise upgrades it.
    fn absorb_friendly(&mut self, base: BaseId, unit: UnitId, events: &mut TickEvents) {
        let Some(target) = self.bases.get(base.index()) else {
            return;
        };
        let repairing = target.is_damaged();
        let upgrading = !repairing && target.level() < self.config.max_base_level;
        if !repairing && !upgrading {
            tracing::error!(%base, %unit, "Friendly unit accepted by a base with nothing to absorb it for");
            debug_assert!(
                repairing || upgrading,
                "absorb gate accepted {unit} at {base} without damage or upgrade room"
            );
            return;
        }

        self.destroy_unit(unit, DestructionCause::Absorbed, events);

        let Some(target) = self.bases.get_mut(base.index()) else {
            return;
        };
        if repairing {
            target.heal();
            events.push(GameEvent::BaseRepaired { base });
            return;
        }
        match target.add_upgrade_progress(&self.config) {
            UpgradeStep::Progress(progress) => {
                events.push(GameEvent::BaseUpgradeProgress { base, progress });
            }
            UpgradeStep::LeveledUp(level) => {
                tracing::info!(%base, level, "Base leveled up");
                events.push(GameEvent::BaseUpgraded { base, level });
            }
        }
    }

    /// Unit against unit: both are destroyed.
    fn unit_did_collide(&mut self, target: UnitId, unit: UnitId, events: &mut TickEvents) {
        self.destroy_unit(target, DestructionCause::UnitCollision, events);
        self.destroy_unit(unit, DestructionCause::UnitCollision, events);
    }

    fn first_live_orbiter(&self, base: BaseId) -> Option<UnitId> {
        self.bases
            .get(base.index())?
            .orbiting_units()
            .iter()
            .copied()
            .find(|id| self.units.get(*id).is_some_and(Unit::is_alive))
    }
}
