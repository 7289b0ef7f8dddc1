//! Level and world fixtures for tests.

use siege_core::prelude::*;

/// Shorthand for a whole-number fixed-point value.
#[must_use]
pub fn fixed(n: i32) -> Fixed {
    Fixed::from_num(n)
}

/// Shorthand for a fractional fixed-point value.
#[must_use]
pub fn fixed_f(n: f64) -> Fixed {
    Fixed::from_num(n)
}

/// Shorthand for a vector from decimal coordinates.
#[must_use]
pub fn vec2(x: f64, y: f64) -> Vec2Fixed {
    Vec2Fixed::new(fixed_f(x), fixed_f(y))
}

/// One simulated frame at 30 ticks per second.
#[must_use]
pub fn tick_dt() -> Fixed {
    Fixed::from_num(1) / Fixed::from_num(30)
}

/// Builder for small hand-placed levels.
#[derive(Debug, Clone, Default)]
pub struct LevelBuilder {
    title: String,
    bases: Vec<BaseSpawn>,
}

impl LevelBuilder {
    /// Start an empty level.
    #[must_use]
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            bases: Vec::new(),
        }
    }

    /// Add a base owned by `player` at `(x, y)`.
    #[must_use]
    pub fn base(mut self, player: u32, x: f64, y: f64) -> Self {
        self.bases.push(BaseSpawn {
            player,
            position: vec2(x, y),
        });
        self
    }

    /// Finish the level.
    #[must_use]
    pub fn build(self) -> LevelData {
        LevelData {
            title: self.title,
            bases: self.bases,
        }
    }

    /// Finish the level and start a world on it with default rules.
    ///
    /// # Panics
    ///
    /// Panics if the level has no bases.
    #[must_use]
    pub fn world(self, seed: u64) -> World {
        self.world_with(SimConfig::default(), seed)
    }

    /// Finish the level and start a world on it with custom rules.
    ///
    /// # Panics
    ///
    /// Panics if the level or the rules are rejected.
    #[must_use]
    pub fn world_with(self, config: SimConfig, seed: u64) -> World {
        World::from_level(&self.build(), config, seed).expect("fixture world should build")
    }
}

/// Two AI players facing each other across one neutral base.
#[must_use]
pub fn duel_level() -> LevelData {
    LevelBuilder::new("Duel")
        .base(2, -3.0, 0.0)
        .base(0, 0.0, 0.0)
        .base(3, 3.0, 0.0)
        .build()
}

/// The human against one AI with neutral bases between them.
#[must_use]
pub fn human_vs_ai_level() -> LevelData {
    LevelBuilder::new("Skirmish")
        .base(1, -3.0, 0.0)
        .base(0, 0.0, 1.5)
        .base(0, 0.0, -1.5)
        .base(2, 3.0, 0.0)
        .build()
}

/// Four AI corners around a ring of neutral bases.
#[must_use]
pub fn four_corners_level() -> LevelData {
    LevelBuilder::new("Four Corners")
        .base(2, -3.0, -3.0)
        .base(3, 3.0, -3.0)
        .base(4, 3.0, 3.0)
        .base(5, -3.0, 3.0)
        .base(0, 0.0, 0.0)
        .base(0, 0.0, -3.0)
        .base(0, 0.0, 3.0)
        .base(0, -3.0, 0.0)
        .base(0, 3.0, 0.0)
        .build()
}

/// Tick `world` up to `ticks` times, stopping early once the match ends.
///
/// Returns every tick's events in order.
///
/// # Panics
///
/// Panics if a tick reports an error other than the match being over.
pub fn run_ticks(world: &mut World, ticks: u32) -> Vec<TickEvents> {
    let mut all = Vec::new();
    for _ in 0..ticks {
        if world.outcome().is_over() {
            break;
        }
        all.push(world.tick(tick_dt()).expect("tick should succeed"));
    }
    all
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_keeps_base_order() {
        let level = LevelBuilder::new("t").base(2, 1.0, 0.0).base(0, 2.0, 0.0).build();
        assert_eq!(level.bases.len(), 2);
        assert_eq!(level.bases[0].owner(), PlayerId(2));
        assert_eq!(level.bases[1].position, vec2(2.0, 0.0));
    }

    #[test]
    fn test_builtin_fixtures_validate() {
        for level in [duel_level(), human_vs_ai_level(), four_corners_level()] {
            assert!(level.validate().is_ok(), "{} should validate", level.title);
        }
    }

    #[test]
    fn test_run_ticks_advances_clock() {
        let mut world = LevelBuilder::new("t").base(2, 0.0, 0.0).base(3, 4.0, 0.0).world(1);
        let events = run_ticks(&mut world, 15);
        assert_eq!(events.len(), 15);
        assert_eq!(world.get_tick(), 15);
    }
}
