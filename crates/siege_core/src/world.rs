//! The match world and its tick loop.
//!
//! [`World`] owns every player, base and unit of one match and advances
//! them in lockstep. Units live in a [`UnitStorage`] keyed by id and are
//! always processed in sorted id order; bases live in a registry indexed
//! by [`BaseId`].
//!
//! # Tick order
//!
//! 1. **Players**: each non-neutral player's bases advance their spawn
//!    timers, then its active units move or orbit
//! 2. **Collisions**: every overlapping base/unit and unit/unit pair is
//!    resolved in place (see [`crate::collision`])
//! 3. **AI**: controllers of AI players run their decision cycle when due
//! 4. **Cleanup**: spawned units become active, destroyed units are reaped
//! 5. **Outcome**: victory rules are evaluated
//!
//! The orbit index is two-way: a unit's location points at a base, the
//! base lists the unit, and the unit's owner mirrors the list. Only
//! [`World::set_unit_location`] writes any of the three.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::ai;
use crate::base::Base;
use crate::components::{BaseId, PlayerId, UnitBehavior, UnitId};
use crate::config::SimConfig;
use crate::error::{GameError, Result};
use crate::events::{DestructionCause, GameEvent, TickEvents};
use crate::level::LevelData;
use crate::math::{Fixed, Vec2Fixed, TAU};
use crate::player::Player;
use crate::stats::StatisticsRecorder;
use crate::unit::{MoveOutcome, OrbitAnchor, Unit};
use crate::victory::MatchOutcome;

/// Storage for all units in a match.
///
/// Uses a `HashMap` for O(1) lookup by id, with deterministic iteration
/// via sorted keys when processing systems.
#[derive(Debug, Clone, Default)]
pub struct UnitStorage {
    units: HashMap<UnitId, Unit>,
    next_id: u64,
}

impl UnitStorage {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            units: HashMap::new(),
            next_id: 1,
        }
    }

    /// Create a unit and return its id. Ids are never reused.
    pub(crate) fn spawn(&mut self, owner: PlayerId, position: Vec2Fixed, size: Fixed) -> UnitId {
        let id = UnitId(self.next_id);
        self.next_id += 1;
        self.units.insert(id, Unit::new(id, owner, position, size));
        id
    }

    pub(crate) fn remove(&mut self, id: UnitId) -> Option<Unit> {
        self.units.remove(&id)
    }

    /// Get a unit by id.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    /// Check if a unit exists.
    #[must_use]
    pub fn contains(&self, id: UnitId) -> bool {
        self.units.contains_key(&id)
    }

    /// Number of stored units, including ones flagged destroyed this tick.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Check if storage is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Get sorted unit ids for deterministic iteration.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<UnitId> {
        let mut ids: Vec<_> = self.units.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Iterate over all units (not in deterministic order).
    pub fn iter(&self) -> impl Iterator<Item = (&UnitId, &Unit)> {
        self.units.iter()
    }
}

/// One match: players, bases, units and the rules they run under.
#[derive(Debug, Clone)]
pub struct World {
    pub(crate) config: SimConfig,
    seed: u64,
    tick: u64,
    rng: ChaCha8Rng,
    pub(crate) players: BTreeMap<PlayerId, Player>,
    pub(crate) bases: Vec<Base>,
    pub(crate) units: UnitStorage,
    outcome: MatchOutcome,
    stats: StatisticsRecorder,
    queued_events: Vec<GameEvent>,
}

impl World {
    /// Seed a match from level data.
    ///
    /// Creates the neutral player and one player per distinct id in the
    /// level, in ascending id order, and one level-1 base per entry.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] for unusable rules and
    /// [`GameError::InvalidLevel`] for a level without bases.
    pub fn from_level(level: &LevelData, config: SimConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        level.validate()?;

        let player_ids = level.player_ids();
        let mut players: BTreeMap<PlayerId, Player> = player_ids
            .iter()
            .map(|&id| (id, Player::new(id)))
            .collect();

        let mut bases = Vec::with_capacity(level.bases.len());
        for (index, spawn) in level.bases.iter().enumerate() {
            let id = u32::try_from(index)
                .map(BaseId)
                .map_err(|_| GameError::InvalidLevel("too many bases".to_string()))?;
            bases.push(Base::new(id, spawn.owner(), spawn.position, config.base_radius));
            if let Some(player) = players.get_mut(&spawn.owner()) {
                player.add_base(id);
            }
        }

        tracing::info!(
            title = %level.title,
            bases = bases.len(),
            players = players.len(),
            seed,
            "World created"
        );

        Ok(Self {
            stats: StatisticsRecorder::new(config.stats_interval, player_ids),
            config,
            seed,
            tick: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
            players,
            bases,
            units: UnitStorage::new(),
            outcome: MatchOutcome::Ongoing,
            queued_events: Vec::new(),
        })
    }

    /// Rules this match runs under.
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Seed of the world's random stream.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Get the current tick number.
    #[must_use]
    pub const fn get_tick(&self) -> u64 {
        self.tick
    }

    /// Outcome after the most recent tick.
    #[must_use]
    pub const fn outcome(&self) -> MatchOutcome {
        self.outcome
    }

    /// Unit-count history.
    #[must_use]
    pub const fn stats(&self) -> &StatisticsRecorder {
        &self.stats
    }

    /// Look up a player.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Every player, ascending by id.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Every player id, ascending.
    #[must_use]
    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.players.keys().copied().collect()
    }

    /// Base registry in level order.
    #[must_use]
    pub fn bases(&self) -> &[Base] {
        &self.bases
    }

    /// Look up a base.
    #[must_use]
    pub fn base(&self, id: BaseId) -> Option<&Base> {
        self.bases.get(id.index())
    }

    /// All stored units.
    #[must_use]
    pub const fn units(&self) -> &UnitStorage {
        &self.units
    }

    /// Look up a unit.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(id)
    }

    /// Whether `player` currently owns at least one base.
    #[must_use]
    pub fn owns_any_base(&self, player: PlayerId) -> bool {
        self.players
            .get(&player)
            .is_some_and(|p| !p.bases().is_empty())
    }

    /// Active units of `player` that are not flagged destroyed.
    pub fn live_units(&self, player: PlayerId) -> impl Iterator<Item = &Unit> + '_ {
        self.players
            .get(&player)
            .map(Player::units)
            .unwrap_or_default()
            .iter()
            .filter_map(|id| self.units.get(*id))
            .filter(|unit| unit.is_alive())
    }

    /// Advance the match by `dt` seconds.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::MatchOver`] once the outcome is decided, and
    /// [`GameError::IntegrityViolation`] if validation is compiled in and
    /// the orbit index or ownership records disagree after the tick.
    pub fn tick(&mut self, dt: Fixed) -> Result<TickEvents> {
        if self.outcome.is_over() {
            return Err(GameError::MatchOver);
        }

        let mut events = TickEvents::default();
        events.events.append(&mut self.queued_events);
        let player_ids = self.player_ids();

        // 1. Players. The neutral player never acts.
        for &player in &player_ids {
            if player.is_neutral() {
                continue;
            }
            self.run_spawn_system(player, dt, &mut events);
            self.run_movement_system(player, dt);
        }

        // 2. Collisions
        self.run_collision_system(&mut events);

        // 3. AI
        for &player in &player_ids {
            self.run_ai_system(player);
        }

        // 4. Cleanup
        self.run_cleanup_system();

        self.tick += 1;

        let counts: Vec<(PlayerId, u32)> = self
            .players
            .values()
            .map(|p| (p.id(), u32::try_from(p.units().len()).unwrap_or(u32::MAX)))
            .collect();
        self.stats.update(dt, counts);

        // 5. Outcome
        self.outcome = MatchOutcome::decide(
            self.players
                .values()
                .map(|p| (p.id(), p.bases().len())),
        );
        if self.outcome.is_over() {
            tracing::info!(tick = self.tick, outcome = ?self.outcome, "Match decided");
        }

        #[cfg(any(debug_assertions, feature = "debug-validation"))]
        self.check_integrity()?;

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.tick, state_hash = hash, "Simulation state hash");
        }

        Ok(events)
    }

    /// Send the human player's units to `destination`.
    ///
    /// Ids of reaped or destroyed units are skipped. Nothing is moved if any
    /// live unit in the set belongs to another player. Returns the number of
    /// units ordered; a non-zero count is reported as
    /// [`GameEvent::OrderAccepted`] in the next tick's events.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NotControllable`] for a foreign unit and
    /// [`GameError::MatchOver`] once the match is decided.
    pub fn order_move(&mut self, units: &[UnitId], destination: Vec2Fixed) -> Result<usize> {
        if self.outcome.is_over() {
            return Err(GameError::MatchOver);
        }

        let mut accepted = Vec::with_capacity(units.len());
        for &id in units {
            let Some(unit) = self.units.get(id) else {
                continue;
            };
            if unit.is_destroyed() {
                continue;
            }
            if !unit.owner().is_human() {
                return Err(GameError::NotControllable { unit: id });
            }
            if !accepted.contains(&id) {
                accepted.push(id);
            }
        }

        for &id in &accepted {
            self.set_unit_destination(id, destination);
        }
        if !accepted.is_empty() {
            self.queued_events.push(GameEvent::OrderAccepted {
                units: accepted.len(),
            });
        }
        Ok(accepted.len())
    }

    /// Live human units strictly inside the rectangle spanned by two
    /// corners, in id order.
    #[must_use]
    pub fn units_in_rect(&self, corner_a: Vec2Fixed, corner_b: Vec2Fixed) -> Vec<UnitId> {
        let (min_x, max_x) = (corner_a.x.min(corner_b.x), corner_a.x.max(corner_b.x));
        let (min_y, max_y) = (corner_a.y.min(corner_b.y), corner_a.y.max(corner_b.y));

        let mut selected: Vec<UnitId> = self
            .live_units(PlayerId::HUMAN)
            .filter(|unit| {
                let p = unit.position();
                p.x > min_x && p.x < max_x && p.y > min_y && p.y < max_y
            })
            .map(Unit::id)
            .collect();
        selected.sort_unstable();
        selected
    }

    /// Place a unit for `owner` outside the tick loop.
    ///
    /// The unit is active immediately and enters the orbit of an owned base
    /// in range, like a freshly spawned unit.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownPlayer`] if `owner` is not in the match.
    pub fn spawn_unit_at(&mut self, owner: PlayerId, position: Vec2Fixed) -> Result<UnitId> {
        if !self.players.contains_key(&owner) {
            return Err(GameError::UnknownPlayer(owner));
        }
        let id = self.units.spawn(owner, position, self.config.unit_radius);
        if let Some(player) = self.players.get_mut(&owner) {
            player.queue_unit(id);
            player.flush_pending();
        }
        if let Some(base) = self.orbit_entry_base(owner, position) {
            self.set_unit_location(id, Some(base));
        }
        Ok(id)
    }

    /// Order any live unit to `destination`, regardless of owner.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownUnit`] for a reaped or destroyed unit.
    pub fn command_move(&mut self, unit: UnitId, destination: Vec2Fixed) -> Result<()> {
        if !self.units.get(unit).is_some_and(Unit::is_alive) {
            return Err(GameError::UnknownUnit(unit));
        }
        self.set_unit_destination(unit, destination);
        Ok(())
    }

    /// Verify the orbit index, ownership records and base ranges.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::IntegrityViolation`] describing the first
    /// inconsistency found.
    pub fn check_integrity(&self) -> Result<()> {
        for base in &self.bases {
            let id = base.id();
            if base.level() == 0 || base.level() > self.config.max_base_level {
                return Err(violation(format!("{id} has level {}", base.level())));
            }
            if base.upgrade_progress() >= self.config.units_to_level {
                return Err(violation(format!(
                    "{id} has upgrade progress {}",
                    base.upgrade_progress()
                )));
            }
            if let Some((attacker, _)) = base.damage().iter().find(|(_, value)| **value == 0) {
                return Err(violation(format!("{id} keeps an empty damage entry for {attacker}")));
            }
            if !self
                .players
                .get(&base.owner())
                .is_some_and(|p| p.bases().contains(&id))
            {
                return Err(violation(format!("{id} is missing from {}'s bases", base.owner())));
            }

            let orbiting = base.orbiting_units();
            for (position, &unit) in orbiting.iter().enumerate() {
                if orbiting[..position].contains(&unit) {
                    return Err(violation(format!("{unit} is listed twice at {id}")));
                }
                let Some(entry) = self.units.get(unit) else {
                    return Err(violation(format!("{id} lists missing {unit}")));
                };
                if entry.location() != Some(id) {
                    return Err(violation(format!("{id} lists {unit} located elsewhere")));
                }
                if !self
                    .players
                    .get(&entry.owner())
                    .is_some_and(|p| p.units_at(id).contains(&unit))
                {
                    return Err(violation(format!("{unit} at {id} is missing from its owner's mirror")));
                }
            }
        }

        for player in self.players.values() {
            for &base in player.bases() {
                if self.base(base).map(Base::owner) != Some(player.id()) {
                    return Err(violation(format!("{} lists {base} it does not own", player.id())));
                }
            }
            for (base, units) in player.orbit_mirror() {
                for &unit in units {
                    let located = self
                        .units
                        .get(unit)
                        .is_some_and(|u| u.owner() == player.id() && u.location() == Some(base));
                    if !located {
                        return Err(violation(format!(
                            "{}'s mirror lists {unit} at {base} but the unit disagrees",
                            player.id()
                        )));
                    }
                }
            }
            for &unit in player.units().iter().chain(player.pending_units()) {
                if self.units.get(unit).map(Unit::owner) != Some(player.id()) {
                    return Err(violation(format!("{} lists foreign or missing {unit}", player.id())));
                }
            }
        }

        for id in self.units.sorted_ids() {
            let Some(unit) = self.units.get(id) else {
                continue;
            };
            let listed = self.players.get(&unit.owner()).is_some_and(|p| {
                p.units().contains(&id) || p.pending_units().contains(&id)
            });
            if !listed {
                return Err(violation(format!("{id} is not listed by {}", unit.owner())));
            }
            if let Some(location) = unit.location() {
                let Some(base) = self.base(location) else {
                    return Err(violation(format!("{id} is located at missing {location}")));
                };
                if !base.orbiting_units().contains(&id) {
                    return Err(violation(format!("{id} points at {location} which does not list it")));
                }
                if base.owner() != unit.owner() {
                    return Err(violation(format!("{id} orbits {location} owned by {}", base.owner())));
                }
            }
        }

        Ok(())
    }

    /// Calculate a hash of the current simulation state.
    ///
    /// Two worlds with identical state produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);

        self.bases.len().hash(&mut hasher);
        for base in &self.bases {
            base.id().hash(&mut hasher);
            base.owner().hash(&mut hasher);
            base.position().hash(&mut hasher);
            base.level().hash(&mut hasher);
            base.upgrade_progress().hash(&mut hasher);
            base.spawn_timer().to_bits().hash(&mut hasher);
            for (attacker, value) in base.damage() {
                attacker.hash(&mut hasher);
                value.hash(&mut hasher);
            }
            base.orbiting_units().hash(&mut hasher);
        }

        let ids = self.units.sorted_ids();
        ids.len().hash(&mut hasher);
        for id in ids {
            if let Some(unit) = self.units.get(id) {
                id.hash(&mut hasher);
                unit.owner().hash(&mut hasher);
                unit.position().hash(&mut hasher);
                unit.destination().hash(&mut hasher);
                unit.behavior().hash(&mut hasher);
                unit.location().hash(&mut hasher);
                unit.is_destroyed().hash(&mut hasher);
            }
        }

        hasher.finish()
    }

    /// Write a unit's location, keeping the base's orbit list and the
    /// owner's mirror in step.
    pub(crate) fn set_unit_location(&mut self, unit: UnitId, location: Option<BaseId>) {
        let Some(entry) = self.units.get_mut(unit) else {
            return;
        };
        let previous = entry.location();
        if previous == location {
            return;
        }
        let owner = entry.owner();
        entry.set_location_field(location);

        if let Some(old) = previous {
            if let Some(base) = self.bases.get_mut(old.index()) {
                base.detach_unit(unit);
            }
            if let Some(player) = self.players.get_mut(&owner) {
                player.remove_from_location(unit, old);
            }
        }
        if let Some(new) = location {
            if let Some(base) = self.bases.get_mut(new.index()) {
                base.attach_unit(unit);
            }
            if let Some(player) = self.players.get_mut(&owner) {
                player.add_to_location(unit, new);
            }
        }
    }

    /// Send a unit toward `destination`: marks it moving and clears its
    /// location.
    pub(crate) fn set_unit_destination(&mut self, unit: UnitId, destination: Vec2Fixed) {
        if let Some(entry) = self.units.get_mut(unit) {
            entry.begin_move(destination);
        }
        self.set_unit_location(unit, None);
    }

    pub(crate) fn set_unit_behavior(&mut self, unit: UnitId, behavior: UnitBehavior) {
        if let Some(entry) = self.units.get_mut(unit) {
            entry.set_behavior(behavior);
        }
    }

    /// A uniformly random point on a base's orbit ring.
    pub(crate) fn random_orbit_point(&mut self, base: BaseId) -> Vec2Fixed {
        let fraction = Fixed::from_bits(i64::from(self.rng.gen::<u32>()));
        let angle = fraction * TAU;
        self.bases
            .get(base.index())
            .map_or(Vec2Fixed::ZERO, |b| b.point_on_orbit(angle))
    }

    /// Flag a live unit destroyed; it is reaped during cleanup.
    pub(crate) fn destroy_unit(
        &mut self,
        unit: UnitId,
        cause: DestructionCause,
        events: &mut TickEvents,
    ) {
        let Some(entry) = self.units.get_mut(unit) else {
            return;
        };
        if entry.is_destroyed() {
            return;
        }
        entry.mark_destroyed();
        events.push(GameEvent::UnitDestroyed {
            unit,
            owner: entry.owner(),
            cause,
        });
    }

    /// Hand a base to `new_owner`. The base is reset and its orbiting units
    /// are evicted with no location.
    pub(crate) fn transfer_base(
        &mut self,
        base: BaseId,
        new_owner: PlayerId,
        events: &mut TickEvents,
    ) {
        let Some(target) = self.bases.get_mut(base.index()) else {
            return;
        };
        let previous = target.owner();
        let evicted = target.reset(new_owner);

        for unit in evicted {
            if let Some(entry) = self.units.get_mut(unit) {
                let owner = entry.owner();
                entry.set_location_field(None);
                if let Some(player) = self.players.get_mut(&owner) {
                    player.remove_from_location(unit, base);
                }
            }
        }

        if let Some(player) = self.players.get_mut(&new_owner) {
            player.add_base(base);
        }
        if let Some(player) = self.players.get_mut(&previous) {
            player.remove_base(base);
        }

        tracing::info!(%base, from = %previous, to = %new_owner, "Base captured");
        events.push(GameEvent::BaseCaptured {
            base,
            from: previous,
            to: new_owner,
        });
    }

    /// First base of `owner`, in acquisition order, whose orbit entry range
    /// contains `position`.
    fn orbit_entry_base(&self, owner: PlayerId, position: Vec2Fixed) -> Option<BaseId> {
        let player = self.players.get(&owner)?;
        player.bases().iter().copied().find(|&id| {
            self.base(id).is_some_and(|base| {
                let reach = self.config.orbit_entry_factor * base.size();
                base.position().distance_squared(position) < reach * reach
            })
        })
    }

    fn run_spawn_system(&mut self, player: PlayerId, dt: Fixed, events: &mut TickEvents) {
        let Some(owned) = self.players.get(&player).map(|p| p.bases().to_vec()) else {
            return;
        };
        for base in owned {
            let due = match self.bases.get_mut(base.index()) {
                Some(target) => target.advance_spawn_timer(dt, &self.config),
                None => false,
            };
            if due {
                self.spawn_from_base(base, events);
            }
        }
    }

    fn spawn_from_base(&mut self, base: BaseId, events: &mut TickEvents) {
        let Some(owner) = self.base(base).map(Base::owner) else {
            return;
        };
        let position = self.random_orbit_point(base);
        let unit = self.units.spawn(owner, position, self.config.unit_radius);
        if let Some(player) = self.players.get_mut(&owner) {
            player.queue_unit(unit);
        }
        if let Some(entry) = self.orbit_entry_base(owner, position) {
            self.set_unit_location(unit, Some(entry));
        }

        tracing::debug!(%unit, %owner, %base, "Unit spawned");
        events.push(GameEvent::UnitSpawned { unit, owner, base });
    }

    fn run_movement_system(&mut self, player: PlayerId, dt: Fixed) {
        let Some(active) = self.players.get(&player).map(|p| p.units().to_vec()) else {
            return;
        };
        for id in active {
            let Some(unit) = self.units.get(id) else {
                continue;
            };
            if unit.is_destroyed() {
                continue;
            }
            let anchor = unit
                .location()
                .and_then(|location| self.bases.get(location.index()))
                .map(|base| OrbitAnchor {
                    center: base.position(),
                    radius: base.orbit_distance(),
                });

            let arrived_at = match self.units.get_mut(id) {
                Some(unit) => match unit.advance(dt, &self.config, anchor) {
                    MoveOutcome::Arrived => Some(unit.position()),
                    _ => None,
                },
                None => None,
            };
            if let Some(position) = arrived_at {
                if let Some(base) = self.orbit_entry_base(player, position) {
                    self.set_unit_location(id, Some(base));
                }
            }
        }
    }

    fn run_ai_system(&mut self, player: PlayerId) {
        let interval = self.config.ai_update_interval;
        let due = self
            .players
            .get_mut(&player)
            .and_then(|p| p.controller_mut())
            .is_some_and(|controller| controller.tick(interval));
        if !due || self.live_units(player).next().is_none() {
            return;
        }
        let action = ai::run_cycle(self, player);
        tracing::debug!(tick = self.tick, %player, ?action, "AI cycle");
    }

    fn run_cleanup_system(&mut self) {
        for player in self.players.values_mut() {
            player.flush_pending();
        }

        let destroyed: Vec<UnitId> = self
            .units
            .sorted_ids()
            .into_iter()
            .filter(|id| self.units.get(*id).is_some_and(Unit::is_destroyed))
            .collect();
        for id in destroyed {
            self.set_unit_location(id, None);
            if let Some(unit) = self.units.remove(id) {
                if let Some(player) = self.players.get_mut(&unit.owner()) {
                    player.remove_unit(id);
                }
            }
        }
    }
}

fn violation(message: String) -> GameError {
    GameError::IntegrityViolation(message)
}
