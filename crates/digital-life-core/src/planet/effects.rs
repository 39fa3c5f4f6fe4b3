//! Planet -> firefly effects. Every effect is gated on the planet being
//! mature; a young planet affects nothing.

use super::{
    Planet, ANCIENT_EVOLUTION_MULTIPLIER, ENERGIZE_BRIGHTNESS, ENERGIZE_SPEED_BOOST,
    EVOLUTION_BOOST_PER_SEC, EVOLUTION_MULTIPLIER, GRAVITY_STRENGTH, ORBIT_DISTANCE,
    TIME_DILATION_FACTOR,
};
use crate::common::Vec2;
use crate::firefly::{Element, Firefly, LifeState};

/// Share of the gravity pull aimed at the planet; the rest is tangential
const RADIAL_RATIO: f32 = 0.6;
const ANTI_CLUMP_PUSH: f32 = 0.01;

impl Planet {
    /// Protection radius including any shield-moon bonus
    pub fn effective_protection_radius(&self) -> f32 {
        self.protection_radius + self.moons.iter().map(|m| m.shield_bonus()).sum::<f32>()
    }

    pub fn is_in_protection_zone(&self, point: Vec2) -> bool {
        self.position.distance(&point) < self.effective_protection_radius()
    }

    fn affects(&self, firefly: &Firefly) -> bool {
        self.is_mature() && !self.is_dead() && firefly.state() == LifeState::Mature
    }

    /// Restore energy at the planet's healing rate
    pub fn heal_firefly(&self, firefly: &mut Firefly, delta_ms: f32) {
        if !self.is_mature() || self.is_dead() {
            return;
        }
        if self.is_in_protection_zone(firefly.position) {
            firefly.add_energy(self.kind.healing_rate() * (delta_ms / 1000.0));
        }
    }

    /// Orbit-inducing pull within the gravity radius, or a gentle push out
    /// when the firefly is hugging the surface.
    pub fn apply_gravity(&self, firefly: &mut Firefly) {
        if !self.affects(firefly) {
            return;
        }
        let dx = self.position.x - firefly.position.x;
        let dy = self.position.y - firefly.position.y;
        let distance = (dx * dx + dy * dy).sqrt();

        if distance > self.gravity_radius || distance == 0.0 {
            return;
        }

        if distance < ORBIT_DISTANCE {
            firefly.apply_force(
                -(dx / distance) * ANTI_CLUMP_PUSH,
                -(dy / distance) * ANTI_CLUMP_PUSH,
            );
            return;
        }

        let falloff = 1.0 - distance / self.gravity_radius;
        let strength = GRAVITY_STRENGTH * falloff * falloff;

        let (ux, uy) = (dx / distance, dy / distance);
        let (tx, ty) = (-uy, ux);
        let radial = strength * RADIAL_RATIO;
        let tangential = strength * (1.0 - RADIAL_RATIO);
        firefly.apply_force(ux * radial + tx * tangential, uy * radial + ty * tangential);

        firefly.modifiers.near_planet = Some(self.id);
    }

    /// Passive progress plus a one-shot collision multiplier, renewed every
    /// tick the firefly stays in the zone. Evolves directly if the passive
    /// gain alone crosses the threshold.
    pub fn apply_evolution_boost(&self, firefly: &mut Firefly, delta_ms: f32) {
        if !self.affects(firefly) || !self.is_in_protection_zone(firefly.position) {
            return;
        }
        firefly.evolution_progress += EVOLUTION_BOOST_PER_SEC * (delta_ms / 1000.0);
        firefly.modifiers.evolution_multiplier = Some(EVOLUTION_MULTIPLIER);
        firefly.evolve();
    }

    /// Null World slows aging; Unity Sphere speeds and brightens. Overlapping
    /// spheres multiply their speed boost.
    pub fn apply_elemental_power(&self, firefly: &mut Firefly) {
        if !self.affects(firefly) || !self.is_in_protection_zone(firefly.position) {
            return;
        }
        let modifiers = &mut firefly.modifiers;
        match self.kind.element() {
            Element::TimeDilation => {
                modifiers.time_dilation = TIME_DILATION_FACTOR;
            }
            Element::Energize => {
                modifiers.speed_multiplier *= ENERGIZE_SPEED_BOOST;
                modifiers.brightness_boost = ENERGIZE_BRIGHTNESS;
            }
        }
        modifiers.element = Some(self.kind.element());
    }

    /// Beacon-moon pull and ancient-moon evolution multiplier
    pub fn apply_moon_effects(&self, firefly: &mut Firefly) {
        if self.is_dead() || !firefly.state().is_alive() {
            return;
        }
        for moon in &self.moons {
            if let Some(force) = moon.beacon_force(self.position, firefly.position) {
                firefly.apply_force(force.fx, force.fy);
            }
            if moon.in_evolution_zone(firefly.position) {
                firefly
                    .modifiers
                    .stack_evolution_multiplier(ANCIENT_EVOLUTION_MULTIPLIER);
            }
        }
    }

    /// Absorb nearby resource particles; returns the energy they carried.
    /// The caller applies it to the firefly.
    pub fn check_particle_absorption(&mut self, firefly: &Firefly) -> f32 {
        if !self.is_mature() || self.is_dead() || firefly.state() != LifeState::Mature {
            return 0.0;
        }
        self.resources.absorb_near(firefly.position)
    }
}

#[cfg(test)]
mod tests {
    use crate::common::{Digit, FireflyId, PlanetId, Vec2};
    use crate::config::PlanetFeatures;
    use crate::firefly::{Element, Firefly, SpawnOptions};
    use crate::planet::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const WORLD: Vec2 = Vec2 { x: 800.0, y: 600.0 };

    fn mature_planet(digit: Digit, rng: &mut ChaCha8Rng) -> Planet {
        let mut p = Planet::new(
            PlanetId(1),
            digit,
            Vec2::new(400.0, 300.0),
            150.0,
            PlanetFeatures::none(),
            rng,
        );
        p.mature_now();
        p
    }

    fn firefly_at(pos: Vec2, rng: &mut ChaCha8Rng) -> Firefly {
        let mut f = Firefly::new(FireflyId(1), SpawnOptions::at(pos.x, pos.y), WORLD, rng);
        f.skip_to_mature();
        f.velocity = Vec2::ZERO;
        f
    }

    #[test]
    fn test_young_planet_has_no_effect() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let p = Planet::new(
            PlanetId(1),
            Digit::Zero,
            Vec2::new(400.0, 300.0),
            150.0,
            PlanetFeatures::none(),
            &mut rng,
        );
        let mut f = firefly_at(p.position + Vec2::new(10.0, 0.0), &mut rng);
        p.apply_elemental_power(&mut f);
        p.apply_gravity(&mut f);
        assert!(f.modifiers.is_default());
        assert_eq!(f.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_null_world_time_dilation() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let p = mature_planet(Digit::Zero, &mut rng);
        let mut f = firefly_at(p.position + Vec2::new(50.0, 0.0), &mut rng);
        p.apply_elemental_power(&mut f);
        assert_eq!(f.modifiers.time_dilation, TIME_DILATION_FACTOR);
        assert_eq!(f.modifiers.element, Some(Element::TimeDilation));
    }

    #[test]
    fn test_unity_speed_boost_stacks() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let p = mature_planet(Digit::One, &mut rng);
        let mut f = firefly_at(p.position + Vec2::new(20.0, 0.0), &mut rng);
        p.apply_elemental_power(&mut f);
        p.apply_elemental_power(&mut f);
        assert!((f.modifiers.speed_multiplier - 2.25).abs() < 1e-6);
        assert_eq!(f.modifiers.brightness_boost, ENERGIZE_BRIGHTNESS);
    }

    #[test]
    fn test_gravity_blend_and_push() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let p = mature_planet(Digit::Zero, &mut rng);

        let mut far = firefly_at(p.position + Vec2::new(100.0, 0.0), &mut rng);
        p.apply_gravity(&mut far);
        // Pulled toward the planet (negative x) with a tangential component
        assert!(far.velocity.x < 0.0);
        assert!(far.velocity.y != 0.0);
        assert_eq!(far.modifiers.near_planet, Some(p.id));

        let mut close = firefly_at(p.position + Vec2::new(5.0, 0.0), &mut rng);
        p.apply_gravity(&mut close);
        assert!((close.velocity.x - 0.01).abs() < 1e-6);

        let mut outside = firefly_at(p.position + Vec2::new(400.0, 0.0), &mut rng);
        p.apply_gravity(&mut outside);
        assert_eq!(outside.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_heal_and_evolution_boost() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let p = mature_planet(Digit::One, &mut rng);
        let mut f = firefly_at(p.position + Vec2::new(30.0, 0.0), &mut rng);
        f.set_energy(50.0);

        p.heal_firefly(&mut f, 1000.0);
        assert!((f.energy() - 50.8).abs() < 1e-4);

        p.apply_evolution_boost(&mut f, 1000.0);
        assert!((f.evolution_progress - 0.002).abs() < 1e-6);
        assert_eq!(f.modifiers.evolution_multiplier, Some(EVOLUTION_MULTIPLIER));
    }

    #[test]
    fn test_passive_gain_can_evolve() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let p = mature_planet(Digit::Zero, &mut rng);
        let mut f = firefly_at(p.position + Vec2::new(30.0, 0.0), &mut rng);
        f.evolution_progress = 2.9999;
        p.apply_evolution_boost(&mut f, 1000.0);
        assert_eq!(f.tier(), crate::firefly::Tier::Charged);
    }

    #[test]
    fn test_particle_absorption() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut p = mature_planet(Digit::Zero, &mut rng);
        let center = p.position;
        p.resources.spawn(ResourceSource::Surface, center, 0.0, &mut rng);
        let f = firefly_at(center, &mut rng);
        assert_eq!(p.check_particle_absorption(&f), RESOURCE_ENERGY_VALUE);
        assert_eq!(p.check_particle_absorption(&f), 0.0);
    }
}
