//! Tick events and presentation hooks.
//!
//! The simulation never calls into rendering or audio. Each tick returns a
//! [`TickEvents`] log, and a presentation layer replays it through
//! [`PresentationHooks`] to play sounds or flash bases.

use serde::{Deserialize, Serialize};

use crate::components::{BaseId, PlayerId, UnitId};

/// Why a unit was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DestructionCause {
    /// Consumed by a friendly base to heal or upgrade it.
    Absorbed,
    /// Spent striking an enemy base.
    StruckBase,
    /// An orbiting defender consumed in place of base damage.
    Sacrificed,
    /// Destroyed together with an enemy unit.
    UnitCollision,
}

/// Something that happened during a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A base spawned a unit.
    UnitSpawned {
        /// New unit.
        unit: UnitId,
        /// Its owner.
        owner: PlayerId,
        /// Base that spawned it.
        base: BaseId,
    },
    /// A unit was flagged destroyed.
    UnitDestroyed {
        /// The unit.
        unit: UnitId,
        /// Its owner.
        owner: PlayerId,
        /// What destroyed it.
        cause: DestructionCause,
    },
    /// A friendly unit healed a base.
    BaseRepaired {
        /// The base.
        base: BaseId,
    },
    /// A friendly unit added upgrade progress without a level-up.
    BaseUpgradeProgress {
        /// The base.
        base: BaseId,
        /// Progress after the absorption.
        progress: u32,
    },
    /// A base gained a level.
    BaseUpgraded {
        /// The base.
        base: BaseId,
        /// New level.
        level: u32,
    },
    /// A base changed owner.
    BaseCaptured {
        /// The base.
        base: BaseId,
        /// Previous owner.
        from: PlayerId,
        /// New owner.
        to: PlayerId,
    },
    /// A human move order was applied.
    OrderAccepted {
        /// Number of units that received the order.
        units: usize,
    },
}

/// Events generated during a simulation tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickEvents {
    /// Events in the order they happened.
    pub events: Vec<GameEvent>,
}

impl TickEvents {
    pub(crate) fn push(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Whether nothing happened.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Captures that happened this tick.
    pub fn captures(&self) -> impl Iterator<Item = (BaseId, PlayerId, PlayerId)> + '_ {
        self.events.iter().filter_map(|event| match event {
            GameEvent::BaseCaptured { base, from, to } => Some((*base, *from, *to)),
            _ => None,
        })
    }

    /// Number of units destroyed for `cause`.
    #[must_use]
    pub fn destroyed_by(&self, cause: DestructionCause) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, GameEvent::UnitDestroyed { cause: c, .. } if *c == cause))
            .count()
    }

    /// Replay the log through presentation hooks.
    ///
    /// A unit death cue plays for every strike on an enemy base; spawns,
    /// sacrifices and unit collisions have no cue.
    pub fn dispatch<H: PresentationHooks + ?Sized>(&self, hooks: &mut H) {
        for event in &self.events {
            match event {
                GameEvent::UnitDestroyed {
                    unit,
                    cause: DestructionCause::StruckBase,
                    ..
                } => hooks.on_unit_destroyed(*unit),
                GameEvent::BaseCaptured { base, .. } => hooks.on_base_destroyed(*base),
                GameEvent::BaseRepaired { base } => hooks.on_base_repaired(*base),
                GameEvent::BaseUpgradeProgress { base, .. } => hooks.on_base_upgraded(*base, false),
                GameEvent::BaseUpgraded { base, .. } => hooks.on_base_upgraded(*base, true),
                GameEvent::OrderAccepted { .. } => hooks.on_ui_click(),
                GameEvent::UnitSpawned { .. } | GameEvent::UnitDestroyed { .. } => {}
            }
        }
    }
}

/// Fire-and-forget callbacks for audio and visual feedback.
///
/// Every method defaults to a no-op.
pub trait PresentationHooks {
    /// An attacking unit died on an enemy base.
    fn on_unit_destroyed(&mut self, _unit: UnitId) {}
    /// A base was captured.
    fn on_base_destroyed(&mut self, _base: BaseId) {}
    /// A base was healed.
    fn on_base_repaired(&mut self, _base: BaseId) {}
    /// A base absorbed an upgrade unit; `leveled_up` when its level rose.
    fn on_base_upgraded(&mut self, _base: BaseId, _leveled_up: bool) {}
    /// A move order was accepted.
    fn on_ui_click(&mut self) {}
}

/// Hooks that ignore everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl PresentationHooks for NoopHooks {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl PresentationHooks for Recorder {
        fn on_unit_destroyed(&mut self, unit: UnitId) {
            self.calls.push(format!("death {unit}"));
        }
        fn on_base_destroyed(&mut self, base: BaseId) {
            self.calls.push(format!("destroyed {base}"));
        }
        fn on_base_repaired(&mut self, base: BaseId) {
            self.calls.push(format!("repaired {base}"));
        }
        fn on_base_upgraded(&mut self, base: BaseId, leveled_up: bool) {
            self.calls.push(format!("upgraded {base} {leveled_up}"));
        }
        fn on_ui_click(&mut self) {
            self.calls.push("click".to_string());
        }
    }

    #[test]
    fn test_dispatch_maps_events_to_hooks() {
        let events = TickEvents {
            events: vec![
                GameEvent::UnitSpawned {
                    unit: UnitId(1),
                    owner: PlayerId(2),
                    base: BaseId(0),
                },
                GameEvent::UnitDestroyed {
                    unit: UnitId(1),
                    owner: PlayerId(2),
                    cause: DestructionCause::StruckBase,
                },
                GameEvent::UnitDestroyed {
                    unit: UnitId(2),
                    owner: PlayerId(3),
                    cause: DestructionCause::Sacrificed,
                },
                GameEvent::BaseUpgradeProgress {
                    base: BaseId(1),
                    progress: 2,
                },
                GameEvent::BaseUpgraded {
                    base: BaseId(1),
                    level: 2,
                },
                GameEvent::BaseRepaired { base: BaseId(1) },
                GameEvent::BaseCaptured {
                    base: BaseId(0),
                    from: PlayerId(3),
                    to: PlayerId::NEUTRAL,
                },
                GameEvent::OrderAccepted { units: 4 },
            ],
        };
        let mut recorder = Recorder::default();

        events.dispatch(&mut recorder);

        assert_eq!(
            recorder.calls,
            vec![
                "death unit#1",
                "upgraded base#1 false",
                "upgraded base#1 true",
                "repaired base#1",
                "destroyed base#0",
                "click",
            ]
        );
    }

    #[test]
    fn test_noop_hooks_accept_everything() {
        let events = TickEvents {
            events: vec![GameEvent::OrderAccepted { units: 1 }],
        };
        events.dispatch(&mut NoopHooks);
        assert_eq!(events.destroyed_by(DestructionCause::Absorbed), 0);
    }
}
