//! Match metrics collection.
//!
//! A [`MetricsCollector`] watches every tick's events and turns a finished
//! world into a [`MatchReport`]; [`BatchSummary`] aggregates many reports.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use siege_core::components::{BaseId, PlayerId, UnitId};
use siege_core::events::{DestructionCause, GameEvent, PresentationHooks, TickEvents};
use siege_core::victory::MatchOutcome;
use siege_core::world::World;

/// Per-player totals for one match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerMetrics {
    /// Units spawned by the player's bases.
    pub units_spawned: u32,
    /// Units the player lost, for any reason.
    pub units_lost: u32,
    /// Units spent striking enemy bases.
    pub strikes: u32,
    /// Units absorbed into the player's own bases.
    pub units_absorbed: u32,
    /// Bases the player took.
    pub bases_captured: u32,
    /// Bases taken from the player.
    pub bases_lost: u32,
    /// Levels gained across all the player's bases.
    pub levels_gained: u32,
    /// Bases owned when the match stopped.
    pub final_bases: u32,
    /// Tick of the player's first capture.
    pub first_capture_tick: Option<u64>,
}

/// Counts presentation cues, so reports show what a client would have
/// played.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CueCounts {
    /// Unit death cues.
    pub unit_destroyed: u32,
    /// Base destroyed cues.
    pub base_destroyed: u32,
    /// Base repaired cues.
    pub base_repaired: u32,
    /// Upgrade progress cues.
    pub base_progress: u32,
    /// Level-up cues.
    pub base_leveled: u32,
    /// UI click cues.
    pub ui_click: u32,
}

impl PresentationHooks for CueCounts {
    fn on_unit_destroyed(&mut self, _unit: UnitId) {
        self.unit_destroyed += 1;
    }

    fn on_base_destroyed(&mut self, _base: BaseId) {
        self.base_destroyed += 1;
    }

    fn on_base_repaired(&mut self, _base: BaseId) {
        self.base_repaired += 1;
    }

    fn on_base_upgraded(&mut self, _base: BaseId, leveled_up: bool) {
        if leveled_up {
            self.base_leveled += 1;
        } else {
            self.base_progress += 1;
        }
    }

    fn on_ui_click(&mut self) {
        self.ui_click += 1;
    }
}

/// Complete metrics for a single match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchReport {
    /// Unique match identifier.
    pub game_id: String,
    /// Level the match was played on.
    pub level: String,
    /// Random seed used.
    pub seed: u64,
    /// Ticks simulated.
    pub duration_ticks: u64,
    /// How the match ended; `Ongoing` if it hit the tick limit.
    pub outcome: MatchOutcome,
    /// Winning player id, if any.
    pub winner: Option<u32>,
    /// Per-player totals keyed by player id.
    pub players: BTreeMap<u32, PlayerMetrics>,
    /// Presentation cues fired during the match.
    pub cues: CueCounts,
    /// Sampled unit count history keyed by player id.
    pub unit_history: BTreeMap<u32, Vec<u32>>,
    /// Largest unit count sampled for any player.
    pub max_units: u32,
    /// Final simulation state hash (for determinism validation).
    pub final_state_hash: u64,
}

impl MatchReport {
    /// Whether the match reached an outcome before the tick limit.
    #[must_use]
    pub const fn finished(&self) -> bool {
        self.outcome.is_over()
    }

    /// Serialize as pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Save to a JSON file, creating parent directories.
    pub fn save(&self, path: &std::path::Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = self.to_json().map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

/// Accumulates per-player totals from tick events.
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    players: BTreeMap<PlayerId, PlayerMetrics>,
    base_owners: BTreeMap<BaseId, PlayerId>,
    cues: CueCounts,
}

impl MetricsCollector {
    /// Start collecting for `world`, recording its starting base owners.
    #[must_use]
    pub fn new(world: &World) -> Self {
        Self {
            players: world
                .player_ids()
                .into_iter()
                .map(|id| (id, PlayerMetrics::default()))
                .collect(),
            base_owners: world.bases().iter().map(|b| (b.id(), b.owner())).collect(),
            cues: CueCounts::default(),
        }
    }

    /// Record one tick's events.
    pub fn observe(&mut self, tick: u64, events: &TickEvents) {
        events.dispatch(&mut self.cues);

        for event in &events.events {
            match *event {
                GameEvent::UnitSpawned { owner, .. } => self.player(owner).units_spawned += 1,
                GameEvent::UnitDestroyed { owner, cause, .. } => {
                    let metrics = self.player(owner);
                    metrics.units_lost += 1;
                    match cause {
                        DestructionCause::StruckBase => metrics.strikes += 1,
                        DestructionCause::Absorbed => metrics.units_absorbed += 1,
                        DestructionCause::Sacrificed | DestructionCause::UnitCollision => {}
                    }
                }
                GameEvent::BaseUpgraded { base, .. } => {
                    if let Some(owner) = self.base_owners.get(&base).copied() {
                        self.player(owner).levels_gained += 1;
                    }
                }
                GameEvent::BaseCaptured { base, from, to } => {
                    self.base_owners.insert(base, to);
                    self.player(from).bases_lost += 1;
                    let taker = self.player(to);
                    taker.bases_captured += 1;
                    taker.first_capture_tick.get_or_insert(tick);
                }
                GameEvent::BaseRepaired { .. }
                | GameEvent::BaseUpgradeProgress { .. }
                | GameEvent::OrderAccepted { .. } => {}
            }
        }
    }

    /// Build the report for a stopped match.
    #[must_use]
    pub fn finish(mut self, world: &World, game_id: String, level: String) -> MatchReport {
        for player in world.players() {
            let bases = u32::try_from(player.bases().len()).unwrap_or(u32::MAX);
            self.player(player.id()).final_bases = bases;
        }

        let outcome = world.outcome();
        let winner = match outcome {
            MatchOutcome::Victory { winner } => Some(winner.0),
            _ => None,
        };

        MatchReport {
            game_id,
            level,
            seed: world.seed(),
            duration_ticks: world.get_tick(),
            outcome,
            winner,
            players: self.players.into_iter().map(|(id, m)| (id.0, m)).collect(),
            cues: self.cues,
            unit_history: world
                .stats()
                .histories()
                .iter()
                .map(|(id, samples)| (id.0, samples.clone()))
                .collect(),
            max_units: world.stats().max_units(),
            final_state_hash: world.state_hash(),
        }
    }

    fn player(&mut self, id: PlayerId) -> &mut PlayerMetrics {
        self.players.entry(id).or_default()
    }
}

/// Aggregate statistics across a batch of matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Total matches played.
    pub total_games: u32,
    /// Matches won by each player id.
    pub wins_by_player: BTreeMap<u32, u32>,
    /// Win rates by player id.
    pub win_rates: BTreeMap<u32, f64>,
    /// Matches ending with no base held.
    pub draws: u32,
    /// Matches stopped at the tick limit.
    pub unfinished: u32,
    /// Average match duration in ticks.
    pub avg_duration_ticks: f64,
    /// Shortest match.
    pub min_duration_ticks: u64,
    /// Longest match.
    pub max_duration_ticks: u64,
    /// Average bases captured per match by player id.
    pub avg_bases_captured: BTreeMap<u32, f64>,
}

impl BatchSummary {
    /// Calculate summary from a list of reports.
    #[must_use]
    pub fn from_reports(reports: &[MatchReport]) -> Self {
        if reports.is_empty() {
            return Self::default();
        }

        let mut summary = Self {
            total_games: u32::try_from(reports.len()).unwrap_or(u32::MAX),
            min_duration_ticks: u64::MAX,
            ..Default::default()
        };
        let mut duration_sum = 0u64;
        let mut captures: BTreeMap<u32, u32> = BTreeMap::new();

        for report in reports {
            duration_sum += report.duration_ticks;
            summary.min_duration_ticks = summary.min_duration_ticks.min(report.duration_ticks);
            summary.max_duration_ticks = summary.max_duration_ticks.max(report.duration_ticks);

            match report.outcome {
                MatchOutcome::Victory { winner } => {
                    *summary.wins_by_player.entry(winner.0).or_default() += 1;
                }
                MatchOutcome::Draw => summary.draws += 1,
                MatchOutcome::Ongoing => summary.unfinished += 1,
                MatchOutcome::Defeat { .. } => {}
            }
            for (&player, metrics) in &report.players {
                *captures.entry(player).or_default() += metrics.bases_captured;
            }
        }

        let games = f64::from(summary.total_games);
        summary.avg_duration_ticks = duration_sum as f64 / games;
        summary.win_rates = summary
            .wins_by_player
            .iter()
            .map(|(&player, &wins)| (player, f64::from(wins) / games))
            .collect();
        summary.avg_bases_captured = captures
            .into_iter()
            .map(|(player, total)| (player, f64::from(total) / games))
            .collect();
        summary
    }
}
