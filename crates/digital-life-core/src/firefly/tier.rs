//! Evolution tiers. Each tier lives longer, decays slower and resists the
//! predator's pull better than the one before it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    Basic,
    Charged,
    Radiant,
    Prismatic,
    Ascended,
}

impl Tier {
    pub const ALL: [Tier; 5] = [
        Tier::Basic,
        Tier::Charged,
        Tier::Radiant,
        Tier::Prismatic,
        Tier::Ascended,
    ];

    /// Ordinal 0-4
    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn from_level(level: u8) -> Option<Tier> {
        Self::ALL.get(level as usize).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Tier::Basic => "Basic",
            Tier::Charged => "Charged",
            Tier::Radiant => "Radiant",
            Tier::Prismatic => "Prismatic",
            Tier::Ascended => "Ascended",
        }
    }

    /// Lifespan multiplier applied to the base max age
    pub fn life_multiplier(self) -> f32 {
        match self {
            Tier::Basic => 1.0,
            Tier::Charged => 1.5,
            Tier::Radiant => 2.0,
            Tier::Prismatic => 3.0,
            Tier::Ascended => 5.0,
        }
    }

    /// Fraction of predator gravity ignored (0 = none, 1 = immune)
    pub fn gravity_resist(self) -> f32 {
        match self {
            Tier::Basic => 0.0,
            Tier::Charged => 0.15,
            Tier::Radiant => 0.30,
            Tier::Prismatic => 0.50,
            Tier::Ascended => 0.75,
        }
    }

    /// Evolution progress needed to reach the next tier; `None` at the top
    pub fn evolve_threshold(self) -> Option<f32> {
        match self {
            Tier::Basic => Some(3.0),
            Tier::Charged => Some(5.0),
            Tier::Radiant => Some(8.0),
            Tier::Prismatic => Some(12.0),
            Tier::Ascended => None,
        }
    }

    pub fn next(self) -> Option<Tier> {
        Self::from_level(self.level() + 1)
    }

    pub fn is_max(self) -> bool {
        self.next().is_none()
    }

    /// Display color as a CSS hex string
    pub fn color(self) -> &'static str {
        match self {
            Tier::Basic => "#ffffff",
            Tier::Charged => "#9f7aea",
            Tier::Radiant => "#38bdf8",
            Tier::Prismatic => "#fbbf24",
            Tier::Ascended => "#22c55e",
        }
    }
}

impl Default for Tier {
    fn default() -> Self {
        Tier::Basic
    }
}
