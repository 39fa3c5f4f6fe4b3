//! The sacrifice echo: a ghost of the ascended firefly that created the
//! planet, circling it for about a minute before fading away.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use crate::common::{Digit, Vec2};

const ORBIT_SPEED: f32 = 0.002;
const MAX_OPACITY: f32 = 0.6;
const FADE_IN_MS: f32 = 2_000.0;
const LIFETIME_MS: f32 = 60_000.0;
const FADE_OUT_MS: f32 = 10_000.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Echo {
    pub active: bool,
    pub digit: Digit,
    orbit_angle: f32,
    orbit_radius: f32,
    pub opacity: f32,
    age: f32,
}

impl Echo {
    /// An inactive echo. [`Echo::spawn`] starts its timeline.
    pub fn new(digit: Digit) -> Self {
        Self {
            active: false,
            digit,
            orbit_angle: 0.0,
            orbit_radius: 0.0,
            opacity: 0.0,
            age: 0.0,
        }
    }

    pub fn spawn(&mut self, planet_max_size: f32, rng: &mut impl Rng) {
        self.active = true;
        self.age = 0.0;
        self.opacity = 0.0;
        self.orbit_angle = rng.gen::<f32>() * TAU;
        self.orbit_radius = planet_max_size * 1.5;
    }

    pub fn update(&mut self, delta_ms: f32) {
        if !self.active {
            return;
        }
        self.age += delta_ms;

        if self.age < FADE_IN_MS {
            self.opacity = self.age / FADE_IN_MS * MAX_OPACITY;
        } else if self.age < LIFETIME_MS {
            self.opacity = MAX_OPACITY + (self.age * 0.003).sin() * 0.1;
        } else if self.age < LIFETIME_MS + FADE_OUT_MS {
            let fade = (self.age - LIFETIME_MS) / FADE_OUT_MS;
            self.opacity = MAX_OPACITY * (1.0 - fade);
        } else {
            self.active = false;
            self.opacity = 0.0;
            return;
        }

        self.orbit_angle += ORBIT_SPEED * delta_ms;
    }

    pub fn position(&self, planet: Vec2) -> Vec2 {
        planet + Vec2::from_angle(self.orbit_angle) * self.orbit_radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_echo_timeline() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut echo = Echo::new(Digit::One);
        echo.update(1_000.0);
        assert!(!echo.active);

        echo.spawn(40.0, &mut rng);
        echo.update(1_000.0);
        assert!((echo.opacity - 0.3).abs() < 1e-4);

        echo.update(30_000.0);
        assert!(echo.opacity >= 0.5);

        echo.update(35_000.0);
        assert!(echo.active);
        assert!(echo.opacity < MAX_OPACITY);

        echo.update(10_000.0);
        assert!(!echo.active);
        assert_eq!(echo.opacity, 0.0);
    }

    #[test]
    fn test_echo_orbits_at_radius() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut echo = Echo::new(Digit::Zero);
        echo.spawn(40.0, &mut rng);
        let center = Vec2::new(200.0, 200.0);
        assert!((echo.position(center).distance(&center) - 60.0).abs() < 1e-3);
    }
}
