//! Common types shared by every entity: 2D vectors, ids and the binary digit.

use serde::{Deserialize, Serialize};

/// 2D position / velocity vector in screen pixels
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector at `angle` radians
    pub fn from_angle(angle: f32) -> Self {
        Self {
            x: angle.cos(),
            y: angle.sin(),
        }
    }

    pub fn distance_squared(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn distance(&self, other: &Self) -> f32 {
        self.distance_squared(other).sqrt()
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0 {
            Self {
                x: self.x / len,
                y: self.y / len,
            }
        } else {
            Self::ZERO
        }
    }

    pub fn midpoint(&self, other: &Self) -> Self {
        Self {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }
}

/// An impulse added directly to a velocity
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Force {
    pub fx: f32,
    pub fy: f32,
}

impl Force {
    pub fn new(fx: f32, fy: f32) -> Self {
        Self { fx, fy }
    }

    pub fn scaled(self, factor: f32) -> Self {
        Self {
            fx: self.fx * factor,
            fy: self.fy * factor,
        }
    }
}

/// The binary value a firefly carries. Only two values exist, so the
/// `{0, 1}` invariant holds by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Digit {
    Zero,
    One,
}

impl Digit {
    pub fn from_bit(bit: bool) -> Self {
        if bit {
            Digit::One
        } else {
            Digit::Zero
        }
    }

    pub fn random(rng: &mut impl rand::Rng) -> Self {
        Self::from_bit(rng.gen_bool(0.5))
    }

    pub fn flipped(self) -> Self {
        match self {
            Digit::Zero => Digit::One,
            Digit::One => Digit::Zero,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Digit::Zero => 0,
            Digit::One => 1,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Digit::Zero => '0',
            Digit::One => '1',
        }
    }
}

/// Identifier of a firefly, unique within one ecosystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FireflyId(pub u64);

/// Identifier of a planet, unique within one ecosystem. Ids grow with
/// creation order, so a smaller id means an older planet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlanetId(pub u64);

impl std::fmt::Display for FireflyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "firefly_{}", self.0)
    }
}

impl std::fmt::Display for PlanetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "planet_{}", self.0)
    }
}

/// Cubic ease-out over `t` in [0, 1]
pub fn ease_out_cubic(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(3)
}

/// Quadratic ease-in-out over `t` in [0, 1]
pub fn ease_in_out_quad(t: f32) -> f32 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}
