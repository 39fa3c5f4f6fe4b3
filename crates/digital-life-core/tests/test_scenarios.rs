//! End-to-end scenarios and invariants over whole ecosystem runs.
//!
//! Everything is seeded; a small mock predator stands in for the black hole.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use digital_life_core::firefly::MAX_ENERGY;
use digital_life_core::prelude::*;

// ── Helpers ────────────────────────────────────────────────────────────

fn quiet_config() -> EcosystemConfig {
    EcosystemConfig {
        initial_population: 0,
        min_population: 0,
        spawn_rate: 0.0,
        stats_sample_chance: 0.0,
        planet_features: PlanetFeatures::none(),
        ..Default::default()
    }
    .with_seed(42)
}

fn mature_at(eco: &mut Ecosystem, x: f32, y: f32, digit: Digit) -> FireflyId {
    let id = eco
        .spawn_firefly(SpawnOptions::at(x, y).with_digit(digit).with_velocity(0.0, 0.0))
        .expect("under the ceiling");
    eco.firefly_mut(id).unwrap().skip_to_mature();
    id
}

/// Consumes anything inside its horizon and pulls gently toward itself
struct MockHole {
    at: Vec2,
    horizon: f32,
    multiplier: f32,
    handlers: PredatorHandlers,
}

impl MockHole {
    fn new(x: f32, y: f32, horizon: f32) -> Self {
        Self {
            at: Vec2::new(x, y),
            horizon,
            multiplier: 1.0,
            handlers: PredatorHandlers::new(),
        }
    }
}

impl Predator for MockHole {
    fn position(&self) -> Vec2 {
        self.at
    }

    fn calculate_gravity(&self, firefly: &Firefly) -> Option<Force> {
        let offset = self.at - firefly.position;
        let distance = offset.length();
        if distance > 250.0 || distance == 0.0 {
            return None;
        }
        let dir = offset.normalize();
        let strength = 0.02 * self.multiplier;
        Some(Force::new(dir.x * strength, dir.y * strength))
    }

    fn check_consumption(&mut self, firefly: &Firefly) -> bool {
        if firefly.position.distance(&self.at) >= self.horizon {
            return false;
        }
        self.handlers.notify(&Consumption::new(firefly, self.at));
        true
    }

    fn on_consume(&mut self, handler: ConsumeHandler) {
        self.handlers.add_consume(handler);
    }

    fn on_ascended_sacrifice(&mut self, handler: ConsumeHandler) {
        self.handlers.add_ascended(handler);
    }

    fn set_gravity_multiplier(&mut self, multiplier: f32) {
        self.multiplier = multiplier;
    }
}

// ── Scenarios ──────────────────────────────────────────────────────────

#[test]
fn test_scenario_overflow_collision() {
    let mut eco = Ecosystem::new(quiet_config()).unwrap();
    let a = mature_at(&mut eco, 200.0, 200.0, Digit::One);
    let b = mature_at(&mut eco, 210.0, 200.0, Digit::One);

    eco.tick(16.0);

    for id in [a, b] {
        let f = eco.firefly(id).unwrap();
        assert_eq!(f.digit, Digit::Zero);
        assert_eq!(f.collision_cooldown(), 2_000.0);
        assert_eq!(f.state(), LifeState::Mature);
    }
    assert_eq!(eco.stats().total_collisions, 1);
    assert_eq!(eco.stats().overflow_collisions, 1);
}

#[test]
fn test_scenario_population_floor_respawn() {
    let config = EcosystemConfig {
        initial_population: 10,
        min_population: 10,
        ..quiet_config()
    };
    let mut eco = Ecosystem::new(config).unwrap();
    eco.init();
    assert_eq!(eco.firefly_count(), 10);

    let victim = eco.fireflies()[4].id;
    assert!(eco.kill_firefly(victim));
    eco.tick(16.0);
    assert_eq!(eco.firefly_count(), 9);
    assert_eq!(eco.pending_respawns(), 1);

    for _ in 0..16 {
        eco.tick(100.0);
    }
    assert_eq!(eco.firefly_count(), 10);
    assert_eq!(eco.pending_respawns(), 0);
    assert_eq!(eco.stats().total_births, 11);
}

#[test]
fn test_scenario_planet_cap_recycles_first() {
    let mut eco = Ecosystem::new(quiet_config()).unwrap();
    let max = eco.config().max_planets;

    let mut ids = Vec::new();
    for i in 0..=max {
        let id = eco
            .create_planet(Digit::Zero, 100.0 + i as f32 * 50.0, 300.0)
            .expect("cap recycles instead of refusing");
        eco.planet_mut(id).unwrap().mature_now();
        ids.push(id);
        assert!(eco.planet_count() <= max);
    }

    assert_eq!(eco.planet_count(), max);
    assert!(eco.planet(ids[0]).is_none());
    assert!(ids[1..].iter().all(|id| eco.planet(*id).is_some()));
    assert_eq!(eco.stats().planets_recycled, 1);
}

#[test]
fn test_scenario_null_world_time_dilation_is_per_tick() {
    let config = EcosystemConfig {
        world_width: 2_000.0,
        world_height: 2_000.0,
        ..quiet_config()
    };
    let mut eco = Ecosystem::new(config).unwrap();
    let planet = eco.create_planet(Digit::Zero, 1_000.0, 1_000.0).unwrap();
    eco.planet_mut(planet).unwrap().mature_now();

    let at = eco.planet(planet).unwrap().position;
    let id = mature_at(&mut eco, at.x + 20.0, at.y, Digit::One);

    eco.tick(16.0);
    assert_eq!(eco.firefly(id).unwrap().modifiers.time_dilation, 0.4);
    assert!(eco.is_firefly_protected(eco.firefly(id).unwrap()));

    let firefly = eco.firefly_mut(id).unwrap();
    firefly.position = Vec2::new(60.0, 60.0);
    firefly.velocity = Vec2::ZERO;
    eco.tick(16.0);

    let firefly = eco.firefly(id).unwrap();
    assert!(firefly.modifiers.is_default());
    assert!(!eco.is_firefly_protected(firefly));
}

// ── Invariants over long runs ──────────────────────────────────────────

#[test]
fn test_long_run_respects_bounds() {
    let config = EcosystemConfig {
        initial_population: 30,
        min_population: 10,
        max_population: 40,
        spawn_rate: 0.2,
        max_planets: 3,
        ..Default::default()
    }
    .with_seed(7);
    let mut eco = Ecosystem::new(config).unwrap();
    eco.attach_predator(Box::new(MockHole::new(400.0, 300.0, 30.0)));
    eco.init();

    let deaths = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&deaths);
    eco.subscribe(Box::new(move |event| {
        if let EcosystemEvent::FireflyDied { id, .. } = event {
            sink.borrow_mut().push(*id);
        }
    }));

    for step in 0..6_000u32 {
        if step % 900 == 0 {
            let digit = if step % 1800 == 0 { Digit::Zero } else { Digit::One };
            eco.create_planet(digit, 200.0 + (step % 400) as f32, 300.0);
        }
        eco.tick(16.0);

        assert!(eco.firefly_count() <= 40);
        assert!(eco.planet_count() <= 3);
        for firefly in eco.fireflies() {
            assert!((0.0..=MAX_ENERGY).contains(&firefly.energy()));
            assert!(firefly.state() != LifeState::Dead);
        }
    }

    let deaths = deaths.borrow();
    let unique: HashSet<_> = deaths.iter().collect();
    assert_eq!(unique.len(), deaths.len(), "a firefly died twice");
    assert_eq!(deaths.len() as u64, eco.stats().total_deaths);
    assert!(eco.stats().total_consumed > 0);
}

#[test]
fn test_same_seed_same_history() {
    let run = || {
        let mut eco = Ecosystem::new(EcosystemConfig::default().with_seed(99)).unwrap();
        eco.init();
        for _ in 0..2_000 {
            eco.tick(16.0);
        }
        (
            eco.stats().clone(),
            eco.fireflies().iter().map(|f| (f.id, f.position)).collect::<Vec<_>>(),
        )
    };
    assert_eq!(run(), run());
}

#[test]
fn test_particles_follow_events() {
    let mut eco = Ecosystem::new(quiet_config()).unwrap();
    mature_at(&mut eco, 200.0, 200.0, Digit::Zero);
    mature_at(&mut eco, 205.0, 200.0, Digit::One);
    eco.tick(16.0);

    let mut particles = ParticleSystem::new(1);
    for event in eco.drain_events() {
        particles.consume(&event);
    }
    // Two spawn flashes and one merge burst
    assert_eq!(particles.particle_count(), 4 + 4 + 4);
}
