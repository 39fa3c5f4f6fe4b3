//! Energy particles a planet sheds for fireflies to absorb.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use crate::common::Vec2;

pub const MAX_RESOURCE_PARTICLES: usize = 8;
pub const RESOURCE_LIFESPAN_MS: f32 = 8_000.0;
/// Outward drift in px per ms
pub const RESOURCE_DRIFT_SPEED: f32 = 0.02;
pub const ABSORB_RADIUS: f32 = 25.0;
pub const RESOURCE_ENERGY_VALUE: f32 = 15.0;

/// Where a resource particle came from; decides its value and lifespan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceSource {
    Surface,
    Moon,
    Volcanic,
}

impl ResourceSource {
    pub fn energy_value(self) -> f32 {
        match self {
            ResourceSource::Surface => RESOURCE_ENERGY_VALUE,
            ResourceSource::Moon => 8.0,
            ResourceSource::Volcanic => 25.0,
        }
    }

    pub fn lifespan_ms(self) -> f32 {
        match self {
            ResourceSource::Volcanic => 4_000.0,
            _ => RESOURCE_LIFESPAN_MS,
        }
    }

    /// Starting distance from the planet center, as a fraction of its size
    fn start_fraction(self) -> f32 {
        match self {
            ResourceSource::Volcanic => 0.5,
            _ => 0.6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceParticle {
    pub position: Vec2,
    pub source: ResourceSource,
    angle: f32,
    distance: f32,
    pub age: f32,
    pub max_age: f32,
    pub absorbed: bool,
}

impl ResourceParticle {
    /// Fraction of life remaining, squared fade
    pub fn opacity(&self) -> f32 {
        let progress = (self.age / self.max_age).min(1.0);
        1.0 - progress * progress
    }

    pub fn energy_value(&self) -> f32 {
        self.source.energy_value()
    }
}

/// The bounded set of live particles around one planet plus the emission timer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceField {
    particles: Vec<ResourceParticle>,
    spawn_rate_ms: f32,
    timer_ms: f32,
}

impl ResourceField {
    pub fn new(rng: &mut impl Rng) -> Self {
        let spawn_rate_ms = rng.gen_range(2_000.0..3_000.0);
        Self {
            particles: Vec::new(),
            spawn_rate_ms,
            // Stagger the first emission across planets
            timer_ms: spawn_rate_ms * rng.gen::<f32>(),
        }
    }

    pub fn particles(&self) -> &[ResourceParticle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Count down the surface emission timer. Returns true when a surface
    /// particle was emitted.
    pub fn tick_emission(
        &mut self,
        delta_ms: f32,
        center: Vec2,
        planet_size: f32,
        rng: &mut impl Rng,
    ) -> bool {
        self.timer_ms -= delta_ms;
        if self.timer_ms <= 0.0 && self.particles.len() < MAX_RESOURCE_PARTICLES {
            self.spawn(ResourceSource::Surface, center, planet_size, rng);
            self.timer_ms = self.spawn_rate_ms;
            return true;
        }
        false
    }

    /// Emit one particle unconditionally. Callers enforce their own caps.
    pub fn spawn(
        &mut self,
        source: ResourceSource,
        center: Vec2,
        planet_size: f32,
        rng: &mut impl Rng,
    ) {
        let angle = rng.gen::<f32>() * TAU;
        let distance = planet_size * source.start_fraction();
        self.particles.push(ResourceParticle {
            position: center + Vec2::from_angle(angle) * distance,
            source,
            angle,
            distance,
            age: 0.0,
            max_age: source.lifespan_ms(),
            absorbed: false,
        });
    }

    /// Age, drift and expire particles. Absorbed ones are dropped here too.
    pub fn update(&mut self, delta_ms: f32, center: Vec2) {
        self.particles.retain_mut(|p| {
            p.age += delta_ms;
            if p.age >= p.max_age || p.absorbed {
                return false;
            }
            p.distance += RESOURCE_DRIFT_SPEED * delta_ms;
            let wobble = (p.age * 0.003).sin() * 0.3;
            p.angle += wobble * 0.01;
            p.position = center + Vec2::from_angle(p.angle) * p.distance;
            true
        });
    }

    /// Mark every unabsorbed particle within reach of `position` as absorbed
    /// and return the total energy they carry.
    pub fn absorb_near(&mut self, position: Vec2) -> f32 {
        let mut gained = 0.0;
        for p in self.particles.iter_mut().filter(|p| !p.absorbed) {
            if p.position.distance(&position) < ABSORB_RADIUS {
                p.absorbed = true;
                gained += p.energy_value();
            }
        }
        gained
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }
}
