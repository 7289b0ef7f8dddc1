//! Read-only queries over the world used by the AI controller.
//!
//! Every query returns its results in a deterministic order: player base
//! order, or ascending distance with ties kept in that order. Units
//! flagged destroyed this tick are never counted.

use crate::components::{BaseId, PlayerId, UnitId};
use crate::math::{fixed_sqrt, Fixed, Vec2Fixed};
use crate::unit::Unit;
use crate::world::World;

/// Attack-selection inputs for one opposing base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetAssessment {
    /// The opposing base.
    pub base: BaseId,
    /// Its owner.
    pub owner: PlayerId,
    /// Squared distance to the attacker's nearest base.
    pub distance_squared: Fixed,
    /// Owner's units near the base.
    pub defenders: u32,
    /// Base level.
    pub level: u32,
    /// Largest damage any other player has on it.
    pub max_rival_damage: u32,
    /// The attacker's own damage on it.
    pub own_damage: u32,
}

impl TargetAssessment {
    /// `level*5 - distance² - defenders + own damage - max rival damage`.
    #[must_use]
    pub fn score(&self) -> Fixed {
        Fixed::from_num(self.level * 5)
            .saturating_sub(self.distance_squared)
            .saturating_sub(Fixed::from_num(self.defenders))
            .saturating_add(Fixed::from_num(self.own_damage))
            .saturating_sub(Fixed::from_num(self.max_rival_damage))
    }
}

/// The chosen attack target and the force it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetInfo {
    /// Base to attack.
    pub target: BaseId,
    /// Orbiting units required to capture it.
    pub units_needed: usize,
}

/// Bases of `player` with unanswered damage, paired with the largest
/// entry.
#[must_use]
pub fn damaged_bases(world: &World, player: PlayerId) -> Vec<(BaseId, u32)> {
    owned_bases(world, player)
        .into_iter()
        .filter_map(|id| {
            let damage = world.base(id)?.max_damage();
            (damage > 0).then_some((id, damage))
        })
        .collect()
}

/// Bases of `player` that enemy units are heading for, paired with the
/// number of incoming units. A unit is incoming when its destination lies
/// inside the base's radius.
#[must_use]
pub fn attacked_bases(world: &World, player: PlayerId) -> Vec<(BaseId, usize)> {
    let enemies: Vec<&Unit> = world
        .players()
        .filter(|p| p.id() != player)
        .flat_map(|p| world.live_units(p.id()))
        .collect();

    owned_bases(world, player)
        .into_iter()
        .filter_map(|id| {
            let base = world.base(id)?;
            let radius_squared = base.size() * base.size();
            let incoming = enemies
                .iter()
                .filter(|unit| unit.destination().distance_squared(base.position()) < radius_squared)
                .count();
            (incoming > 0).then_some((id, incoming))
        })
        .collect()
}

/// Base of `player` closest to `location`; the first one wins ties.
#[must_use]
pub fn nearest_player_base(world: &World, player: PlayerId, location: Vec2Fixed) -> Option<BaseId> {
    nearest(world, owned_bases(world, player), location)
}

/// Another base of the same owner closest to `base`.
#[must_use]
pub fn nearest_friendly_base(world: &World, base: BaseId) -> Option<BaseId> {
    let origin = world.base(base)?;
    let others = owned_bases(world, origin.owner())
        .into_iter()
        .filter(|id| *id != base)
        .collect();
    nearest(world, others, origin.position())
}

/// Bases of `player` ordered nearest-first from `location`.
#[must_use]
pub fn friendly_base_distances(
    world: &World,
    player: PlayerId,
    location: Vec2Fixed,
) -> Vec<(BaseId, Fixed)> {
    let mut distances: Vec<(BaseId, Fixed)> = owned_bases(world, player)
        .into_iter()
        .filter_map(|id| Some((id, world.base(id)?.position().distance(location))))
        .collect();
    distances.sort_by_key(|(_, distance)| *distance);
    distances
}

/// Live units of `player` ordered nearest-first from `location`.
#[must_use]
pub fn friendly_unit_distances(
    world: &World,
    player: PlayerId,
    location: Vec2Fixed,
) -> Vec<(UnitId, Fixed)> {
    let mut distances: Vec<(UnitId, Fixed)> = world
        .live_units(player)
        .map(|unit| (unit.id(), unit.position().distance_squared(location)))
        .collect();
    distances.sort_by_key(|(_, distance)| *distance);
    distances
}

/// Each base of `player` with the number of its live units within
/// `radius`. A unit is counted at the first base it is near.
#[must_use]
pub fn player_base_info(world: &World, player: PlayerId, radius: Fixed) -> Vec<(BaseId, u32)> {
    let radius_squared = radius * radius;
    let mut info: Vec<(BaseId, Vec2Fixed, u32)> = owned_bases(world, player)
        .into_iter()
        .filter_map(|id| Some((id, world.base(id)?.position(), 0)))
        .collect();

    for unit in world.live_units(player) {
        if let Some(entry) = info
            .iter_mut()
            .find(|(_, position, _)| unit.position().distance_squared(*position) < radius_squared)
        {
            entry.2 += 1;
        }
    }

    info.into_iter().map(|(id, _, count)| (id, count)).collect()
}

/// Attack inputs for every base owned by an opponent of `player`,
/// including neutral bases. Empty when `player` owns no base.
#[must_use]
pub fn target_bases(world: &World, player: PlayerId) -> Vec<TargetAssessment> {
    if !world.owns_any_base(player) {
        return Vec::new();
    }
    let radius = world.config().defender_scan_radius;
    let mut targets = Vec::new();

    for opponent in world.players().filter(|p| p.id() != player) {
        for (id, defenders) in player_base_info(world, opponent.id(), radius) {
            let Some(base) = world.base(id) else {
                continue;
            };
            let distance_squared = nearest_player_base(world, player, base.position())
                .and_then(|closest| world.base(closest))
                .map_or(Fixed::MAX, |closest| {
                    closest.position().distance_squared(base.position())
                });

            let mut max_rival_damage = 0;
            let mut own_damage = 0;
            for (&attacker, &value) in base.damage() {
                if attacker == player {
                    own_damage = value;
                } else {
                    max_rival_damage = max_rival_damage.max(value);
                }
            }

            targets.push(TargetAssessment {
                base: id,
                owner: opponent.id(),
                distance_squared,
                defenders,
                level: base.level(),
                max_rival_damage,
                own_damage,
            });
        }
    }

    targets
}

/// Best-scoring attack target for `player` and the units it needs.
///
/// The requirement is the defenders plus the capture threshold minus the
/// attacker's existing damage. Owned (non-neutral) targets add the units
/// the defender will spawn while the attack travels.
#[must_use]
pub fn determine_target(world: &World, player: PlayerId) -> Option<TargetInfo> {
    let mut best: Option<(TargetAssessment, Fixed)> = None;
    for candidate in target_bases(world, player) {
        let score = candidate.score();
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((candidate, score));
        }
    }
    let (target, _) = best?;

    let config = world.config();
    let mut units_needed = (target.defenders + config.units_to_capture).saturating_sub(target.own_damage);
    if !target.owner.is_neutral() {
        let travel_time = fixed_sqrt(target.distance_squared) / config.movement_rate;
        let reinforcements =
            (travel_time / config.time_between_spawns * Fixed::from_num(target.level)).ceil();
        units_needed = units_needed.saturating_add(reinforcements.saturating_to_num::<u32>());
    }

    Some(TargetInfo {
        target: target.base,
        units_needed: usize::try_from(units_needed).unwrap_or(usize::MAX),
    })
}

/// Bases of `player` below max level with enough orbiting units to finish
/// the level and still keep the reserve, paired with their cost. Lower is
/// cheaper; more orbiting units break ties.
#[must_use]
pub fn upgradable_bases(world: &World, player: PlayerId) -> Vec<(BaseId, Fixed)> {
    let config = world.config();
    let required = config.units_to_level + config.reserve_units;

    owned_bases(world, player)
        .into_iter()
        .filter_map(|id| {
            let base = world.base(id)?;
            let orbiting = u32::try_from(live_orbiters(world, id).len()).unwrap_or(u32::MAX);
            if base.level() >= config.max_base_level
                || base.upgrade_progress().saturating_add(orbiting) < required
            {
                return None;
            }
            let cost = Fixed::from_num(config.units_to_level - base.upgrade_progress())
                - Fixed::from_num(orbiting) / Fixed::from_num(100);
            Some((id, cost))
        })
        .collect()
}

/// Cheapest base to upgrade; the first one wins ties.
#[must_use]
pub fn best_upgradable_base(world: &World, player: PlayerId) -> Option<BaseId> {
    let mut best: Option<(BaseId, Fixed)> = None;
    for (id, cost) in upgradable_bases(world, player) {
        if best.map_or(true, |(_, best_cost)| cost < best_cost) {
            best = Some((id, cost));
        }
    }
    best.map(|(id, _)| id)
}

/// Live units orbiting all bases of `player`.
#[must_use]
pub fn total_base_units(world: &World, player: PlayerId) -> usize {
    owned_bases(world, player)
        .into_iter()
        .map(|id| live_orbiters(world, id).len())
        .sum()
}

/// Live units parked at `base`, in arrival order.
#[must_use]
pub fn live_orbiters(world: &World, base: BaseId) -> Vec<UnitId> {
    world
        .base(base)
        .map(|b| {
            b.orbiting_units()
                .iter()
                .copied()
                .filter(|id| world.unit(*id).is_some_and(Unit::is_alive))
                .collect()
        })
        .unwrap_or_default()
}

/// Defense priority: higher level first, then more incoming enemies, then
/// the original order.
#[must_use]
pub fn sort_by_base_value(world: &World, attacked: &[(BaseId, usize)]) -> Vec<(BaseId, usize)> {
    let mut ranked = attacked.to_vec();
    ranked.sort_by(|(a, incoming_a), (b, incoming_b)| {
        let level_a = world.base(*a).map_or(0, crate::base::Base::level);
        let level_b = world.base(*b).map_or(0, crate::base::Base::level);
        level_b.cmp(&level_a).then(incoming_b.cmp(incoming_a))
    });
    ranked
}

fn owned_bases(world: &World, player: PlayerId) -> Vec<BaseId> {
    world
        .player(player)
        .map(|p| p.bases().to_vec())
        .unwrap_or_default()
}

fn nearest(world: &World, candidates: Vec<BaseId>, location: Vec2Fixed) -> Option<BaseId> {
    let mut best: Option<(BaseId, Fixed)> = None;
    for id in candidates {
        let Some(base) = world.base(id) else {
            continue;
        };
        let distance = base.position().distance_squared(location);
        if best.map_or(true, |(_, best_distance)| distance < best_distance) {
            best = Some((id, distance));
        }
    }
    best.map(|(id, _)| id)
}
