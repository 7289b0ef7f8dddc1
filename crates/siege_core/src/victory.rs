//! Match outcome rules.

use serde::{Deserialize, Serialize};

use crate::components::PlayerId;

/// State of the match after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MatchOutcome {
    /// Still being played.
    #[default]
    Ongoing,
    /// One player holds every non-neutral base.
    Victory {
        /// The last player holding bases.
        winner: PlayerId,
    },
    /// The human player lost their last base.
    Defeat {
        /// The defeated player.
        player: PlayerId,
    },
    /// No non-neutral player holds a base.
    Draw,
}

impl MatchOutcome {
    /// Whether the match has been decided.
    #[must_use]
    pub const fn is_over(self) -> bool {
        !matches!(self, Self::Ongoing)
    }

    /// Decide the outcome from base ownership.
    ///
    /// `holdings` yields every player in the match with the number of bases
    /// it owns. A present human with no base loses outright; otherwise the
    /// match ends once at most one non-neutral player holds bases.
    #[must_use]
    pub fn decide(holdings: impl IntoIterator<Item = (PlayerId, usize)>) -> Self {
        let mut human_present = false;
        let mut human_bases = 0;
        let mut holders = Vec::new();

        for (player, bases) in holdings {
            if player.is_human() {
                human_present = true;
                human_bases = bases;
            }
            if !player.is_neutral() && bases > 0 {
                holders.push(player);
            }
        }

        if human_present && human_bases == 0 {
            return Self::Defeat {
                player: PlayerId::HUMAN,
            };
        }
        match holders.as_slice() {
            [] => Self::Draw,
            [winner] => Self::Victory { winner: *winner },
            _ => Self::Ongoing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_without_bases_is_defeated() {
        let outcome = MatchOutcome::decide([
            (PlayerId::NEUTRAL, 3),
            (PlayerId::HUMAN, 0),
            (PlayerId(2), 2),
        ]);
        assert_eq!(
            outcome,
            MatchOutcome::Defeat {
                player: PlayerId::HUMAN
            }
        );
    }

    #[test]
    fn test_last_holder_wins() {
        let outcome = MatchOutcome::decide([
            (PlayerId::NEUTRAL, 3),
            (PlayerId(2), 0),
            (PlayerId(3), 1),
        ]);
        assert_eq!(
            outcome,
            MatchOutcome::Victory {
                winner: PlayerId(3)
            }
        );
    }

    #[test]
    fn test_contested_match_continues() {
        let outcome = MatchOutcome::decide([(PlayerId::HUMAN, 1), (PlayerId(2), 1)]);
        assert_eq!(outcome, MatchOutcome::Ongoing);
        assert!(!outcome.is_over());
    }

    #[test]
    fn test_only_neutral_bases_is_draw() {
        let outcome = MatchOutcome::decide([(PlayerId::NEUTRAL, 2), (PlayerId(2), 0)]);
        assert_eq!(outcome, MatchOutcome::Draw);
    }
}
