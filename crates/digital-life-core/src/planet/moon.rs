//! Moons: small satellites a mature planet may gain, each with one effect.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use crate::common::{ease_out_cubic, Force, Vec2};

pub const MAX_MOONS: usize = 2;
pub const MOON_SPAWN_INTERVAL_MS: f32 = 45_000.0;
pub const MOON_SPAWN_CHANCE: f64 = 0.15;
const MOON_BIRTH_MS: f32 = 1_500.0;
const TARGET_OPACITY: f32 = 0.9;

const SHIELD_BONUS: f32 = 30.0;
const BEACON_RADIUS: f32 = 200.0;
const BEACON_MIN_DISTANCE: f32 = 30.0;
const BEACON_STRENGTH: f32 = 0.008;
const ANCIENT_RADIUS: f32 = 80.0;
pub const ANCIENT_EVOLUTION_MULTIPLIER: f32 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoonKind {
    /// Sheds extra low-value energy particles
    Resource,
    /// Extends the planet's protection radius
    Shield,
    /// Draws distant fireflies toward the planet
    Beacon,
    /// Multiplies collision evolution nearby
    Ancient,
}

impl MoonKind {
    pub const ALL: [MoonKind; 4] = [
        MoonKind::Resource,
        MoonKind::Shield,
        MoonKind::Beacon,
        MoonKind::Ancient,
    ];

    pub fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    pub fn name(self) -> &'static str {
        match self {
            MoonKind::Resource => "Resource Moon",
            MoonKind::Shield => "Shield Moon",
            MoonKind::Beacon => "Beacon Moon",
            MoonKind::Ancient => "Ancient Moon",
        }
    }

    pub fn symbol(self) -> char {
        match self {
            MoonKind::Resource => '●',
            MoonKind::Shield => '◐',
            MoonKind::Beacon => '✧',
            MoonKind::Ancient => '◈',
        }
    }

    pub fn size(self) -> f32 {
        match self {
            MoonKind::Resource => 8.0,
            MoonKind::Shield => 10.0,
            MoonKind::Beacon => 7.0,
            MoonKind::Ancient => 12.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Moon {
    pub kind: MoonKind,
    pub position: Vec2,
    pub opacity: f32,
    orbit_radius: f32,
    orbit_speed: f32,
    orbit_angle: f32,
    orbit_direction: f32,
    age: f32,
    mature: bool,
    particle_timer: f32,
    particle_interval: f32,
    /// Shield/beacon strength oscillation around 1.0
    pulse: f32,
}

impl Moon {
    pub fn new(kind: MoonKind, planet: Vec2, orbit_radius: f32, rng: &mut impl Rng) -> Self {
        let orbit_angle = rng.gen::<f32>() * TAU;
        Self {
            kind,
            position: planet + Vec2::from_angle(orbit_angle) * orbit_radius,
            opacity: 0.0,
            orbit_radius,
            orbit_speed: rng.gen_range(0.002..0.003),
            orbit_angle,
            orbit_direction: if rng.gen_bool(0.5) { 1.0 } else { -1.0 },
            age: 0.0,
            mature: false,
            particle_timer: 0.0,
            particle_interval: rng.gen_range(4_000.0..6_000.0),
            pulse: 1.0,
        }
    }

    pub fn is_mature(&self) -> bool {
        self.mature
    }

    /// Advance the orbit and the kind-specific effect. `planet_age` drives
    /// the pulse. Returns true when a resource moon wants to shed a particle.
    pub fn update(&mut self, delta_ms: f32, planet: Vec2, planet_age: f32) -> bool {
        self.age += delta_ms;
        if !self.mature {
            let progress = (self.age / MOON_BIRTH_MS).min(1.0);
            self.opacity = TARGET_OPACITY * ease_out_cubic(progress);
            if progress >= 1.0 {
                self.mature = true;
            }
        }

        self.orbit_angle += self.orbit_speed * self.orbit_direction * delta_ms;
        self.position = planet + Vec2::from_angle(self.orbit_angle) * self.orbit_radius;

        if !self.mature {
            return false;
        }

        match self.kind {
            MoonKind::Resource => {
                self.particle_timer += delta_ms;
                if self.particle_timer >= self.particle_interval {
                    self.particle_timer = 0.0;
                    return true;
                }
            }
            MoonKind::Shield => self.pulse = (planet_age * 0.003).sin() * 0.2 + 1.0,
            MoonKind::Beacon => self.pulse = (planet_age * 0.004).sin() * 0.3 + 1.0,
            MoonKind::Ancient => {}
        }
        false
    }

    /// Extra protection radius granted to the host planet
    pub fn shield_bonus(&self) -> f32 {
        if self.kind != MoonKind::Shield || !self.mature {
            return 0.0;
        }
        SHIELD_BONUS * self.pulse
    }

    /// Pull toward the host planet (not the moon) for fireflies within the
    /// beacon radius but not already close.
    pub fn beacon_force(&self, planet: Vec2, firefly: Vec2) -> Option<Force> {
        if self.kind != MoonKind::Beacon || !self.mature {
            return None;
        }
        let dx = planet.x - firefly.x;
        let dy = planet.y - firefly.y;
        let dist = (dx * dx + dy * dy).sqrt();
        if dist > BEACON_RADIUS || dist < BEACON_MIN_DISTANCE {
            return None;
        }
        let strength = BEACON_STRENGTH * (1.0 - dist / BEACON_RADIUS) * self.pulse;
        Some(Force::new(dx / dist * strength, dy / dist * strength))
    }

    pub fn in_evolution_zone(&self, firefly: Vec2) -> bool {
        self.kind == MoonKind::Ancient
            && self.mature
            && self.position.distance(&firefly) <= ANCIENT_RADIUS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn grown(kind: MoonKind) -> Moon {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut moon = Moon::new(kind, Vec2::ZERO, 50.0, &mut rng);
        moon.update(MOON_BIRTH_MS, Vec2::ZERO, 0.0);
        moon
    }

    #[test]
    fn test_young_moon_has_no_effect() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let moon = Moon::new(MoonKind::Shield, Vec2::ZERO, 50.0, &mut rng);
        assert_eq!(moon.shield_bonus(), 0.0);
    }

    #[test]
    fn test_shield_bonus_pulses_around_thirty() {
        let mut moon = grown(MoonKind::Shield);
        moon.update(16.0, Vec2::ZERO, 500.0);
        let bonus = moon.shield_bonus();
        assert!((24.0..=36.0).contains(&bonus));
    }

    #[test]
    fn test_beacon_range() {
        let moon = grown(MoonKind::Beacon);
        let planet = Vec2::ZERO;
        assert!(moon.beacon_force(planet, Vec2::new(10.0, 0.0)).is_none());
        assert!(moon.beacon_force(planet, Vec2::new(250.0, 0.0)).is_none());
        let force = moon.beacon_force(planet, Vec2::new(100.0, 0.0)).unwrap();
        assert!(force.fx < 0.0);
        assert_eq!(force.fy, 0.0);
    }

    #[test]
    fn test_resource_moon_sheds_on_interval() {
        let mut moon = grown(MoonKind::Resource);
        let mut shed = 0;
        for _ in 0..700 {
            if moon.update(16.0, Vec2::ZERO, 0.0) {
                shed += 1;
            }
        }
        // 12.7 s of maturity at a 4-6 s interval
        assert!((2..=3).contains(&shed));
    }

    #[test]
    fn test_ancient_zone() {
        let moon = grown(MoonKind::Ancient);
        assert!(moon.in_evolution_zone(moon.position));
        assert!(!moon.in_evolution_zone(moon.position + Vec2::new(200.0, 0.0)));
    }
}
