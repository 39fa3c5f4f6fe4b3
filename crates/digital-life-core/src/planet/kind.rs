//! Planet types. The sacrificed firefly's digit decides which one is born.

use serde::{Deserialize, Serialize};

use crate::common::Digit;
use crate::firefly::Element;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanetKind {
    /// Born from a 0. Slows aging in its zone.
    NullWorld,
    /// Born from a 1. Speeds up and brightens fireflies in its zone.
    UnitySphere,
}

impl PlanetKind {
    pub fn from_digit(digit: Digit) -> Self {
        match digit {
            Digit::Zero => PlanetKind::NullWorld,
            Digit::One => PlanetKind::UnitySphere,
        }
    }

    pub fn digit(self) -> Digit {
        match self {
            PlanetKind::NullWorld => Digit::Zero,
            PlanetKind::UnitySphere => Digit::One,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PlanetKind::NullWorld => "Null World",
            PlanetKind::UnitySphere => "Unity Sphere",
        }
    }

    pub fn symbol(self) -> char {
        match self {
            PlanetKind::NullWorld => '◯',
            PlanetKind::UnitySphere => '◉',
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            PlanetKind::NullWorld => "#4ecdc4",
            PlanetKind::UnitySphere => "#fbbf24",
        }
    }

    pub fn protection_radius(self) -> f32 {
        match self {
            PlanetKind::NullWorld => 120.0,
            PlanetKind::UnitySphere => 100.0,
        }
    }

    /// Energy restored per second inside the protection zone
    pub fn healing_rate(self) -> f32 {
        match self {
            PlanetKind::NullWorld => 0.5,
            PlanetKind::UnitySphere => 0.8,
        }
    }

    pub fn element(self) -> Element {
        match self {
            PlanetKind::NullWorld => Element::TimeDilation,
            PlanetKind::UnitySphere => Element::Energize,
        }
    }
}

/// Aging factor granted by a Null World
pub const TIME_DILATION_FACTOR: f32 = 0.4;
/// Speed factor granted by a Unity Sphere; stacks across overlapping spheres
pub const ENERGIZE_SPEED_BOOST: f32 = 1.5;
pub const ENERGIZE_BRIGHTNESS: f32 = 1.4;
