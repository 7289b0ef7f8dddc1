//! Unit-count history for post-match graphs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::components::PlayerId;
use crate::math::Fixed;

/// Samples every player's active unit count at a fixed simulated-time
/// interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsRecorder {
    #[serde(with = "crate::math::fixed_serde")]
    interval: Fixed,
    #[serde(with = "crate::math::fixed_serde")]
    since_last_sample: Fixed,
    samples: BTreeMap<PlayerId, Vec<u32>>,
    max_units: u32,
}

impl StatisticsRecorder {
    /// Create a recorder tracking `players`.
    #[must_use]
    pub fn new(interval: Fixed, players: impl IntoIterator<Item = PlayerId>) -> Self {
        Self {
            interval,
            since_last_sample: Fixed::ZERO,
            samples: players.into_iter().map(|id| (id, Vec::new())).collect(),
            max_units: 0,
        }
    }

    /// Advance the sampling clock and record one sample per player when the
    /// interval elapses. Returns whether a sample was taken.
    pub fn update(
        &mut self,
        dt: Fixed,
        unit_counts: impl IntoIterator<Item = (PlayerId, u32)>,
    ) -> bool {
        self.since_last_sample += dt;
        if self.since_last_sample < self.interval {
            return false;
        }
        self.since_last_sample -= self.interval;

        for (player, count) in unit_counts {
            self.samples.entry(player).or_default().push(count);
            self.max_units = self.max_units.max(count);
        }
        true
    }

    /// Samples for one player, oldest first.
    #[must_use]
    pub fn history(&self, player: PlayerId) -> &[u32] {
        self.samples.get(&player).map_or(&[], Vec::as_slice)
    }

    /// Largest count sampled for any player.
    #[must_use]
    pub const fn max_units(&self) -> u32 {
        self.max_units
    }

    /// Number of samples taken so far.
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.samples.values().map(Vec::len).max().unwrap_or(0)
    }

    /// All histories keyed by player.
    #[must_use]
    pub const fn histories(&self) -> &BTreeMap<PlayerId, Vec<u32>> {
        &self.samples
    }
}
