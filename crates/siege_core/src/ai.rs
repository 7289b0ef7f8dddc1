//! AI strategic controller.
//!
//! Each AI player runs a decision cycle every `ai_update_interval` ticks,
//! provided it has at least one live unit. A cycle first reassigns orphaned
//! units, then tries the action categories in priority order and stops at
//! the first one that fires:
//!
//! 1. **Repair**: heal a damaged base that can survive, or evacuate one
//!    that cannot
//! 2. **Defend**: pull the nearest non-defending units to bases with enemies
//!    inbound
//! 3. **Attack**: send orbiting units at the best-scoring opposing base
//! 4. **Upgrade**: spend spare orbiting units on the cheapest level-up
//!
//! All orders are destination and intent writes; nothing here touches
//! combat state directly.

use crate::components::{BaseId, PlayerId, UnitBehavior, UnitId};
use crate::math::Vec2Fixed;
use crate::queries;
use crate::world::World;

/// Per-player decision cadence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AiController {
    ticks_since_update: u32,
}

impl AiController {
    /// Create a controller that first decides after one full interval.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ticks_since_update: 0,
        }
    }

    /// Count one tick. Returns `true` when a decision cycle is due.
    pub fn tick(&mut self, interval: u32) -> bool {
        self.ticks_since_update += 1;
        if self.ticks_since_update >= interval {
            self.ticks_since_update = 0;
            true
        } else {
            false
        }
    }
}

/// Which category fired in a decision cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AiAction {
    /// Healed a damaged base.
    Repair,
    /// Sent defenders to attacked bases.
    Defend,
    /// Launched an attack.
    Attack,
    /// Started finishing a level-up.
    Upgrade,
    /// Nothing fired; only orphans and evacuations were handled.
    Hold,
}

/// Run one full decision cycle for `player`.
pub fn run_cycle(world: &mut World, player: PlayerId) -> AiAction {
    reassign_orphans(world, player);

    let damaged = queries::damaged_bases(world, player);
    let attacked = queries::attacked_bases(world, player);

    if determine_repair(world, &damaged, &attacked) {
        return AiAction::Repair;
    }
    if determine_defense(world, player, &attacked) {
        return AiAction::Defend;
    }
    if determine_attack(world, player) {
        return AiAction::Attack;
    }
    if determine_upgrade(world, player) {
        return AiAction::Upgrade;
    }
    AiAction::Hold
}

/// Send idle units without a friendly base back into orbit, and release
/// last cycle's defenders.
fn reassign_orphans(world: &mut World, player: PlayerId) {
    let units: Vec<UnitId> = world.live_units(player).map(|unit| unit.id()).collect();

    for id in units {
        let Some(unit) = world.unit(id) else {
            continue;
        };
        match unit.behavior() {
            UnitBehavior::Stopped => {
                let home = unit
                    .location()
                    .and_then(|location| world.base(location))
                    .is_some_and(|base| base.owner() == player);
                if home {
                    continue;
                }
                if let Some(base) = queries::nearest_player_base(world, player, unit.position()) {
                    let point = world.random_orbit_point(base);
                    world.set_unit_destination(id, point);
                }
            }
            UnitBehavior::Defending => world.set_unit_behavior(id, UnitBehavior::Stopped),
            _ => {}
        }
    }
}

/// Heal or evacuate damaged bases.
///
/// A base cannot be saved when more enemies are inbound than its remaining
/// capture margin plus its orbit shield; its orbiters flee to the nearest
/// other friendly base and scanning continues. The first savable base gets
/// as many of its orbiters as its worst damage entry and ends the cycle.
fn determine_repair(
    world: &mut World,
    damaged: &[(BaseId, u32)],
    attacked: &[(BaseId, usize)],
) -> bool {
    let capture = world.config().units_to_capture as usize;

    for &(base, damage) in damaged {
        let orbiters = queries::live_orbiters(world, base);
        let incoming = attacked
            .iter()
            .find(|(id, _)| *id == base)
            .map_or(0, |(_, count)| *count);
        let margin = capture.saturating_sub(damage as usize) + orbiters.len();

        if incoming > margin {
            if let Some(relocation) = queries::nearest_friendly_base(world, base) {
                tracing::debug!(%base, %relocation, incoming, units = orbiters.len(), "AI evacuating base");
                for unit in orbiters {
                    let point = world.random_orbit_point(relocation);
                    world.set_unit_destination(unit, point);
                }
            }
            continue;
        }

        let Some(centre) = world.base(base).map(crate::base::Base::position) else {
            continue;
        };
        let sent = orbiters.len().min(damage as usize);
        for &unit in orbiters.iter().take(sent) {
            send(world, unit, centre, UnitBehavior::Repairing);
        }
        tracing::debug!(%base, damage, sent, "AI repairing base");
        return true;
    }
    false
}

/// Match every inbound enemy with the nearest friendly unit not already
/// defending, most valuable bases first.
fn determine_defense(world: &mut World, player: PlayerId, attacked: &[(BaseId, usize)]) -> bool {
    if attacked.is_empty() {
        return false;
    }

    for (base, enemies) in queries::sort_by_base_value(world, attacked) {
        let Some(position) = world.base(base).map(crate::base::Base::position) else {
            continue;
        };
        let mut sent = 0;
        for (id, _) in queries::friendly_unit_distances(world, player, position) {
            if sent >= enemies {
                break;
            }
            let Some(unit) = world.unit(id) else {
                continue;
            };
            if unit.behavior() == UnitBehavior::Defending {
                continue;
            }
            if unit.location() != Some(base) {
                let point = world.random_orbit_point(base);
                world.set_unit_destination(id, point);
            }
            world.set_unit_behavior(id, UnitBehavior::Defending);
            sent += 1;
        }
        tracing::debug!(%base, enemies, sent, "AI defending base");
    }
    true
}

/// Attack the best target once enough units orbit friendly bases, pulling
/// from the bases nearest the target first.
fn determine_attack(world: &mut World, player: PlayerId) -> bool {
    let Some(info) = queries::determine_target(world, player) else {
        return false;
    };
    if info.units_needed > queries::total_base_units(world, player) {
        return false;
    }
    let Some(destination) = world.base(info.target).map(crate::base::Base::position) else {
        return false;
    };

    tracing::debug!(target = %info.target, units = info.units_needed, "AI attacking");
    let mut left = info.units_needed;
    for (base, _) in queries::friendly_base_distances(world, player, destination) {
        for unit in queries::live_orbiters(world, base) {
            send(world, unit, destination, UnitBehavior::Attacking);
            left = left.saturating_sub(1);
            if left == 0 {
                return true;
            }
        }
    }
    false
}

/// Spend spare orbiters finishing the cheapest upgrade.
fn determine_upgrade(world: &mut World, player: PlayerId) -> bool {
    let Some(base) = queries::best_upgradable_base(world, player) else {
        return false;
    };
    let Some(target) = world.base(base) else {
        return false;
    };
    let centre = target.position();
    let needed = world
        .config()
        .units_to_level
        .saturating_sub(target.upgrade_progress()) as usize;

    tracing::debug!(%base, needed, "AI upgrading base");
    for unit in queries::live_orbiters(world, base).into_iter().take(needed) {
        send(world, unit, centre, UnitBehavior::Upgrading);
    }
    true
}

fn send(world: &mut World, unit: UnitId, destination: Vec2Fixed, intent: UnitBehavior) {
    world.set_unit_destination(unit, destination);
    world.set_unit_behavior(unit, intent);
}
