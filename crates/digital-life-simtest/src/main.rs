//! Digital Life Headless Simulation Harness
//!
//! Runs seeded ecosystems with a toy predator for several simulated minutes
//! and checks the population, planet and energy invariants on every tick.
//! No rendering; particle effects are driven from the event stream only to
//! prove they never feed back into the simulation.
//!
//! Usage:
//!   cargo run -p digital-life-simtest
//!   cargo run -p digital-life-simtest -- --verbose --seed 7 --minutes 5
//!   cargo run -p digital-life-simtest -- --json

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use digital_life_core::firefly::MAX_ENERGY;
use digital_life_core::prelude::*;
use serde::Serialize;

const FRAME_MS: f32 = 16.0;

// ── Command line ────────────────────────────────────────────────────────

struct Options {
    verbose: bool,
    json: bool,
    seed: u64,
    minutes: u32,
}

impl Options {
    fn from_args() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let value_of = |flag: &str| {
            args.iter()
                .position(|a| a == flag)
                .and_then(|i| args.get(i + 1))
                .and_then(|v| v.parse::<u64>().ok())
        };
        Self {
            verbose: args.iter().any(|a| a == "--verbose"),
            json: args.iter().any(|a| a == "--json"),
            seed: value_of("--seed").unwrap_or(42),
            minutes: value_of("--minutes").map(|m| m as u32).unwrap_or(3),
        }
    }
}

// ── Toy predator ────────────────────────────────────────────────────────

/// A fixed black hole: pulls within its reach, consumes inside its horizon
struct Singularity {
    at: Vec2,
    reach: f32,
    horizon: f32,
    strength: f32,
    multiplier: f32,
    mass: f32,
    handlers: PredatorHandlers,
}

impl Singularity {
    fn new(at: Vec2) -> Self {
        Self {
            at,
            reach: 220.0,
            horizon: 18.0,
            strength: 0.015,
            multiplier: 1.0,
            mass: 1.0,
            handlers: PredatorHandlers::new(),
        }
    }
}

impl Predator for Singularity {
    fn position(&self) -> Vec2 {
        self.at
    }

    fn calculate_gravity(&self, firefly: &Firefly) -> Option<Force> {
        let offset = self.at - firefly.position;
        let distance = offset.length();
        if distance > self.reach || distance < 1.0 {
            return None;
        }
        let falloff = 1.0 - distance / self.reach;
        let pull = self.strength * self.multiplier * self.mass * falloff;
        let dir = offset.normalize();
        Some(Force::new(dir.x * pull, dir.y * pull))
    }

    fn check_consumption(&mut self, firefly: &Firefly) -> bool {
        if firefly.position.distance(&self.at) >= self.horizon * self.mass {
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

    fn add_mass(&mut self, amount: f32) {
        self.mass += amount;
    }
}

// ── Test harness ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn check(name: &str, passed: bool, detail: String) -> Self {
        Self {
            name: name.into(),
            passed,
            detail,
        }
    }
}

#[derive(Serialize)]
struct Report<'a> {
    seed: u64,
    minutes: u32,
    passed: usize,
    failed: usize,
    results: &'a [TestResult],
    final_stats: Option<Stats>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let options = Options::from_args();
    if !options.json {
        println!("=== Digital Life Simulation Harness ===");
        println!("seed {}, {} simulated minutes\n", options.seed, options.minutes);
    }

    let mut results = Vec::new();

    // 1. Configuration contract
    results.extend(validate_config());

    // 2. Scripted scenarios
    results.extend(validate_scenarios(options.seed));

    // 3. Long run invariants
    let (run_results, final_stats) = validate_long_run(&options);
    results.extend(run_results);

    // 4. Snapshot determinism
    results.extend(validate_snapshot(options.seed));

    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.len() - passed;

    if options.json {
        let report = Report {
            seed: options.seed,
            minutes: options.minutes,
            passed,
            failed,
            results: &results,
            final_stats,
        };
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => log::error!("Failed to encode report: {}", e),
        }
    } else {
        for r in &results {
            let icon = if r.passed { "✓" } else { "✗" };
            if !r.passed || options.verbose {
                println!("  {} {}: {}", icon, r.name, r.detail);
            }
        }
        println!(
            "\n=== RESULT: {}/{} passed, {} failed ===",
            passed,
            results.len(),
            failed
        );
    }

    if failed > 0 {
        std::process::exit(1);
    }
}

fn quiet_config(seed: u64) -> EcosystemConfig {
    EcosystemConfig {
        initial_population: 0,
        min_population: 0,
        spawn_rate: 0.0,
        stats_sample_chance: 0.0,
        planet_features: PlanetFeatures::none(),
        ..Default::default()
    }
    .with_seed(seed)
}

fn mature_at(eco: &mut Ecosystem, x: f32, y: f32, digit: Digit) -> Option<FireflyId> {
    let id = eco.spawn_firefly(SpawnOptions::at(x, y).with_digit(digit).with_velocity(0.0, 0.0))?;
    eco.firefly_mut(id)?.skip_to_mature();
    Some(id)
}

// ── 1. Config ───────────────────────────────────────────────────────────

fn validate_config() -> Vec<TestResult> {
    let mut results = Vec::new();

    results.push(TestResult::check(
        "config_defaults_valid",
        EcosystemConfig::default().validate().is_ok(),
        "default configuration passes validation".into(),
    ));

    let negative = EcosystemConfig {
        collision_radius: -1.0,
        ..Default::default()
    };
    let err = Ecosystem::new(negative).err();
    results.push(TestResult::check(
        "config_negative_radius_rejected",
        err.is_some(),
        format!("{:?}", err.map(|e| e.to_string())),
    ));

    let parsed = EcosystemConfig::from_json(r#"{"max_planets": 2, "min_population": 4}"#);
    results.push(TestResult::check(
        "config_json_defaults",
        matches!(&parsed, Ok(c) if c.max_planets == 2 && c.max_population == 50),
        format!("{:?}", parsed.as_ref().map(|c| (c.max_planets, c.max_population))),
    ));

    results
}

// ── 2. Scenarios ────────────────────────────────────────────────────────

fn validate_scenarios(seed: u64) -> Vec<TestResult> {
    let mut results = Vec::new();

    // Overflow collision
    match Ecosystem::new(quiet_config(seed)) {
        Ok(mut eco) => {
            let a = mature_at(&mut eco, 200.0, 200.0, Digit::One);
            let b = mature_at(&mut eco, 210.0, 200.0, Digit::One);
            eco.tick(FRAME_MS);
            let digits: Vec<_> = [a, b]
                .iter()
                .flatten()
                .filter_map(|id| eco.firefly(*id))
                .map(|f| (f.digit, f.collision_cooldown()))
                .collect();
            let ok = digits.len() == 2
                && digits.iter().all(|(d, c)| *d == Digit::Zero && *c == 2_000.0)
                && eco.stats().overflow_collisions == 1;
            results.push(TestResult::check(
                "scenario_overflow",
                ok,
                format!("{:?}, overflow={}", digits, eco.stats().overflow_collisions),
            ));
        }
        Err(e) => results.push(TestResult::check("scenario_overflow", false, e.to_string())),
    }

    // Population floor respawn
    let config = EcosystemConfig {
        initial_population: 10,
        min_population: 10,
        ..quiet_config(seed)
    };
    match Ecosystem::new(config) {
        Ok(mut eco) => {
            eco.init();
            let victim = eco.fireflies().first().map(|f| f.id);
            if let Some(id) = victim {
                eco.kill_firefly(id);
            }
            eco.tick(FRAME_MS);
            let after_flush = eco.firefly_count();
            for _ in 0..16 {
                eco.tick(100.0);
            }
            results.push(TestResult::check(
                "scenario_respawn",
                after_flush == 9 && eco.firefly_count() == 10,
                format!("after flush {}, after delay {}", after_flush, eco.firefly_count()),
            ));
        }
        Err(e) => results.push(TestResult::check("scenario_respawn", false, e.to_string())),
    }

    // Planet cap
    match Ecosystem::new(quiet_config(seed)) {
        Ok(mut eco) => {
            let max = eco.config().max_planets;
            let mut ids = Vec::new();
            for i in 0..=max {
                if let Some(id) = eco.create_planet(Digit::Zero, 100.0 + i as f32 * 60.0, 300.0) {
                    if let Some(p) = eco.planet_mut(id) {
                        p.mature_now();
                    }
                    ids.push(id);
                }
            }
            let first_gone = ids.first().map(|id| eco.planet(*id).is_none()).unwrap_or(false);
            results.push(TestResult::check(
                "scenario_planet_cap",
                eco.planet_count() == max && first_gone,
                format!("{} planets (cap {}), first recycled: {}", eco.planet_count(), max, first_gone),
            ));
        }
        Err(e) => results.push(TestResult::check("scenario_planet_cap", false, e.to_string())),
    }

    // Null World time dilation is granted per tick
    let config = EcosystemConfig {
        world_width: 2_000.0,
        world_height: 2_000.0,
        ..quiet_config(seed)
    };
    match Ecosystem::new(config) {
        Ok(mut eco) => {
            let planet = eco.create_planet(Digit::Zero, 1_000.0, 1_000.0);
            let at = planet
                .and_then(|id| eco.planet_mut(id))
                .map(|p| {
                    p.mature_now();
                    p.position
                })
                .unwrap_or(Vec2::ZERO);
            let id = mature_at(&mut eco, at.x + 20.0, at.y, Digit::One);
            eco.tick(FRAME_MS);
            let inside = id
                .and_then(|id| eco.firefly(id))
                .map(|f| f.modifiers.time_dilation);
            if let Some(f) = id.and_then(|id| eco.firefly_mut(id)) {
                f.position = Vec2::new(60.0, 60.0);
                f.velocity = Vec2::ZERO;
            }
            eco.tick(FRAME_MS);
            let cleared = id
                .and_then(|id| eco.firefly(id))
                .map(|f| f.modifiers.is_default())
                .unwrap_or(false);
            results.push(TestResult::check(
                "scenario_time_dilation",
                inside == Some(0.4) && cleared,
                format!("inside {:?}, cleared after leaving: {}", inside, cleared),
            ));
        }
        Err(e) => results.push(TestResult::check("scenario_time_dilation", false, e.to_string())),
    }

    results
}

// ── 3. Long run ─────────────────────────────────────────────────────────

#[derive(Default)]
struct Violations {
    population: u32,
    planets: u32,
    energy: u32,
    dead_survived: u32,
}

fn validate_long_run(options: &Options) -> (Vec<TestResult>, Option<Stats>) {
    let mut results = Vec::new();
    let config = EcosystemConfig {
        max_planets: 4,
        ..Default::default()
    }
    .with_seed(options.seed);
    let max_population = config.max_population;
    let max_planets = config.max_planets;

    let mut eco = match Ecosystem::new(config) {
        Ok(eco) => eco,
        Err(e) => {
            results.push(TestResult::check("long_run_setup", false, e.to_string()));
            return (results, None);
        }
    };
    eco.attach_predator(Box::new(Singularity::new(Vec2::new(400.0, 300.0))));
    eco.init();

    let deaths = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&deaths);
    eco.subscribe(Box::new(move |event| {
        if let EcosystemEvent::FireflyDied { id, .. } = event {
            sink.borrow_mut().push(*id);
        }
    }));

    let mut particles = ParticleSystem::new(options.seed);
    particles.start();

    let frames = (options.minutes as f32 * 60_000.0 / FRAME_MS) as u64;
    let mut violations = Violations::default();
    let mut peak_particles = 0;

    for frame in 0..frames {
        // Stand-in for a player tool seeding planets now and then
        if frame % 1_500 == 0 {
            let digit = Digit::from_bit(frame % 3_000 == 0);
            eco.create_planet(digit, 150.0 + (frame % 500) as f32, 150.0 + (frame % 300) as f32);
        }

        eco.frame(frame as f64 * FRAME_MS as f64);
        for event in eco.drain_events() {
            particles.consume(&event);
        }
        particles.frame(frame as f64 * FRAME_MS as f64);
        peak_particles = peak_particles.max(particles.particle_count());

        if eco.firefly_count() > max_population {
            violations.population += 1;
        }
        if eco.planet_count() > max_planets {
            violations.planets += 1;
        }
        for firefly in eco.fireflies() {
            if !(0.0..=MAX_ENERGY).contains(&firefly.energy()) {
                violations.energy += 1;
            }
            if firefly.is_dead() {
                violations.dead_survived += 1;
            }
        }

        if options.verbose && frame % 3_750 == 0 {
            let (zeros, ones) = eco.population_by_digit();
            log::info!(
                "t={:>4.0}s pop={} (0:{} 1:{}) planets={} particles={}",
                eco.now_ms() / 1000.0,
                eco.firefly_count(),
                zeros,
                ones,
                eco.planet_count(),
                particles.particle_count()
            );
        }
    }

    results.push(TestResult::check(
        "population_bound",
        violations.population == 0,
        format!("{} frames over the ceiling of {}", violations.population, max_population),
    ));
    results.push(TestResult::check(
        "planet_cap",
        violations.planets == 0,
        format!("{} frames over the cap of {}", violations.planets, max_planets),
    ));
    results.push(TestResult::check(
        "energy_clamp",
        violations.energy == 0,
        format!("{} out-of-range energy readings", violations.energy),
    ));
    results.push(TestResult::check(
        "deferred_removal",
        violations.dead_survived == 0,
        format!("{} dead fireflies survived a flush", violations.dead_survived),
    ));

    let deaths = deaths.borrow();
    let unique: HashSet<_> = deaths.iter().collect();
    results.push(TestResult::check(
        "deaths_counted_once",
        unique.len() == deaths.len() && deaths.len() as u64 == eco.stats().total_deaths,
        format!(
            "{} death events, {} unique, {} in stats",
            deaths.len(),
            unique.len(),
            eco.stats().total_deaths
        ),
    ));
    results.push(TestResult::check(
        "particles_bounded",
        peak_particles < 5_000,
        format!("peak {} live particles", peak_particles),
    ));

    let mut stats = eco.stats().clone();
    stats.refresh(eco.fireflies());
    if options.verbose {
        if let Ok(json) = stats.to_json() {
            log::info!("Final stats:\n{}", json);
        }
    }
    (results, Some(stats))
}

// ── 4. Snapshot ─────────────────────────────────────────────────────────

fn validate_snapshot(seed: u64) -> Vec<TestResult> {
    let mut results = Vec::new();
    let mut eco = match Ecosystem::new(EcosystemConfig::default().with_seed(seed)) {
        Ok(eco) => eco,
        Err(e) => {
            results.push(TestResult::check("snapshot_setup", false, e.to_string()));
            return results;
        }
    };
    eco.init();
    for _ in 0..500 {
        eco.tick(FRAME_MS);
    }

    let mut buffer = Vec::new();
    let copy = eco
        .save(&mut buffer)
        .and_then(|_| Ecosystem::load(buffer.as_slice()));
    let mut copy = match copy {
        Ok(copy) => copy,
        Err(e) => {
            results.push(TestResult::check("snapshot_roundtrip", false, e.to_string()));
            return results;
        }
    };

    for _ in 0..500 {
        eco.tick(FRAME_MS);
        copy.tick(FRAME_MS);
    }
    let same = eco.stats() == copy.stats()
        && eco
            .fireflies()
            .iter()
            .zip(copy.fireflies())
            .all(|(a, b)| a.id == b.id && a.position == b.position);
    results.push(TestResult::check(
        "snapshot_deterministic",
        same,
        format!("{} bytes, {} fireflies after resume", buffer.len(), copy.firefly_count()),
    ));
    results
}
