//! Ecosystem - the aggregate root and tick driver.
//!
//! Owns every live firefly and planet, runs the seven-phase tick, enforces
//! the population and planet caps, keeps statistics and derives terraform.
//!
//! Entities report deaths, evolutions and spawn requests through their own
//! signal outboxes; the ecosystem drains them after each phase. Removals are
//! two-phase: dead entities are queued during the pass and compacted in
//! phase 5, so several collaborators may flag the same entity in one tick.

mod events;
mod planets;
mod population;
mod stats;
mod terraform;
mod tick;

pub use events::*;
pub use stats::*;
pub use terraform::*;

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

use crate::clock::{FrameClock, TimerQueue};
use crate::common::{FireflyId, PlanetId, Vec2};
use crate::config::EcosystemConfig;
use crate::error::ConfigError;
use crate::firefly::{Firefly, SpawnOptions};
use crate::persistence::{Snapshot, SNAPSHOT_VERSION};
use crate::planet::Planet;
use crate::predator::{Consumption, Predator};

pub const DEFAULT_SCATTER_RADIUS: f32 = 150.0;
pub const DEFAULT_SCATTER_FORCE: f32 = 3.0;
pub const DEFAULT_PICK_RADIUS: f32 = 30.0;
/// Stagger between initial fireflies appearing on screen
const INITIAL_ATTACH_STAGGER_MS: f32 = 100.0;

/// One-shot work deferred to a later tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScheduledAction {
    /// Replace a dead firefly near where it died
    Respawn { x: f32, y: f32 },
    /// Undo one collapse boost of the predator's gravity
    RestorePredatorGravity,
}

/// What the predator's registered handlers report back
#[derive(Debug, Clone, Copy)]
enum PredatorSignal {
    Consumed(Consumption),
    Sacrifice(Consumption),
}

pub struct Ecosystem {
    config: EcosystemConfig,
    fireflies: Vec<Firefly>,
    planets: Vec<Planet>,
    pending_removals: Vec<FireflyId>,
    pending_planet_removals: Vec<PlanetId>,

    stats: Stats,
    terraform: Terraform,

    clock: FrameClock,
    /// Simulation time in ms, advanced by every tick
    now_ms: f64,
    timers: TimerQueue<ScheduledAction>,

    next_firefly_id: u64,
    next_planet_id: u64,
    rng: ChaCha8Rng,

    predator: Option<Box<dyn Predator>>,
    predator_inbox: Rc<RefCell<Vec<PredatorSignal>>>,
    /// Product of active collapse boosts
    predator_gravity_boost: f32,

    events: EventLog,
}

impl Ecosystem {
    /// Validate `config` and create an empty, stopped ecosystem.
    pub fn new(config: EcosystemConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(rand::random);
        Ok(Self {
            config,
            fireflies: Vec::new(),
            planets: Vec::new(),
            pending_removals: Vec::new(),
            pending_planet_removals: Vec::new(),
            stats: Stats::default(),
            terraform: Terraform::default(),
            clock: FrameClock::new(),
            now_ms: 0.0,
            timers: TimerQueue::new(),
            next_firefly_id: 1,
            next_planet_id: 1,
            rng: ChaCha8Rng::seed_from_u64(seed),
            predator: None,
            predator_inbox: Rc::new(RefCell::new(Vec::new())),
            predator_gravity_boost: 1.0,
            events: EventLog::new(),
        })
    }

    /// Spawn the initial population (staggered on screen) and start the clock.
    pub fn init(&mut self) -> &mut Self {
        for i in 0..self.config.initial_population {
            let options = SpawnOptions {
                attach_delay_ms: i as f32 * INITIAL_ATTACH_STAGGER_MS,
                ..Default::default()
            };
            self.spawn_firefly(options);
        }
        self.start();
        self
    }

    // ── Clock ──

    /// Returns false if already running.
    pub fn start(&mut self) -> bool {
        self.clock.start()
    }

    /// Cancel the scheduled tick. Idempotent.
    pub fn stop(&mut self) {
        self.clock.stop();
    }

    pub fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    /// Host animation-frame entry point. Ticks only while running; the first
    /// frame after `start()` uses a 16 ms delta. Returns whether a tick ran.
    pub fn frame(&mut self, timestamp_ms: f64) -> bool {
        match self.clock.advance(timestamp_ms) {
            Some(delta) => {
                self.tick(delta);
                true
            }
            None => false,
        }
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    // ── Collaborators ──

    /// Attach the predator and register this ecosystem's handlers with it.
    /// Any previously attached predator is returned.
    pub fn attach_predator(&mut self, mut predator: Box<dyn Predator>) -> Option<Box<dyn Predator>> {
        let inbox = Rc::clone(&self.predator_inbox);
        predator.on_consume(Box::new(move |c| {
            inbox.borrow_mut().push(PredatorSignal::Consumed(*c));
        }));
        let inbox = Rc::clone(&self.predator_inbox);
        predator.on_ascended_sacrifice(Box::new(move |c| {
            inbox.borrow_mut().push(PredatorSignal::Sacrifice(*c));
        }));
        predator.set_gravity_multiplier(self.predator_gravity_boost);
        self.predator.replace(predator)
    }

    pub fn detach_predator(&mut self) -> Option<Box<dyn Predator>> {
        self.predator.take()
    }

    pub fn predator(&self) -> Option<&dyn Predator> {
        self.predator.as_deref()
    }

    pub fn predator_gravity_boost(&self) -> f32 {
        self.predator_gravity_boost
    }

    pub fn subscribe(&mut self, listener: Listener) -> ListenerId {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Take every buffered event since the last drain
    pub fn drain_events(&mut self) -> Vec<EcosystemEvent> {
        self.events.drain()
    }

    // ── Queries ──

    pub fn config(&self) -> &EcosystemConfig {
        &self.config
    }

    pub fn world_size(&self) -> Vec2 {
        Vec2::new(self.config.world_width, self.config.world_height)
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn terraform(&self) -> &Terraform {
        &self.terraform
    }

    pub fn fireflies(&self) -> &[Firefly] {
        &self.fireflies
    }

    pub fn planets(&self) -> &[Planet] {
        &self.planets
    }

    pub fn firefly(&self, id: FireflyId) -> Option<&Firefly> {
        self.fireflies.iter().find(|f| f.id == id)
    }

    pub fn firefly_mut(&mut self, id: FireflyId) -> Option<&mut Firefly> {
        self.fireflies.iter_mut().find(|f| f.id == id)
    }

    pub fn planet(&self, id: PlanetId) -> Option<&Planet> {
        self.planets.iter().find(|p| p.id == id)
    }

    pub fn planet_mut(&mut self, id: PlanetId) -> Option<&mut Planet> {
        self.planets.iter_mut().find(|p| p.id == id)
    }

    /// Fireflies in the collection, including any queued for removal
    pub fn firefly_count(&self) -> usize {
        self.fireflies.len()
    }

    /// Fireflies not yet queued for removal
    pub fn live_population(&self) -> usize {
        self.fireflies.len().saturating_sub(self.pending_removals.len())
    }

    pub fn planet_count(&self) -> usize {
        self.planets.len()
    }

    pub fn pending_respawns(&self) -> usize {
        self.timers
            .iter()
            .filter(|a| matches!(a, ScheduledAction::Respawn { .. }))
            .count()
    }

    /// (zeros, ones)
    pub fn population_by_digit(&self) -> (usize, usize) {
        count_digits(&self.fireflies)
    }

    /// First living firefly within `radius` of (x, y)
    pub fn firefly_at(&self, x: f32, y: f32, radius: f32) -> Option<&Firefly> {
        let point = Vec2::new(x, y);
        self.fireflies
            .iter()
            .find(|f| !f.is_dead() && f.position.distance(&point) < radius)
    }

    /// Inside the protection zone of any mature planet
    pub fn is_firefly_protected(&self, firefly: &Firefly) -> bool {
        tick::is_protected(&self.planets, firefly.position)
    }

    // ── Interaction ops ──

    /// Unclamped velocity change. False for an unknown or dead firefly.
    pub fn apply_force(&mut self, id: FireflyId, fx: f32, fy: f32) -> bool {
        match self.firefly_mut(id) {
            Some(f) if !f.is_dead() => {
                f.apply_force(fx, fy);
                true
            }
            _ => false,
        }
    }

    /// Add (or drain) energy, clamped to [0, 100]. Returns the new level.
    pub fn adjust_energy(&mut self, id: FireflyId, delta: f32) -> Option<f32> {
        match self.firefly_mut(id) {
            Some(f) if !f.is_dead() => Some(f.add_energy(delta)),
            _ => None,
        }
    }

    /// Radially decaying push away from (x, y) for every firefly in range.
    pub fn scatter_from(&mut self, x: f32, y: f32, radius: f32, force: f32) {
        let origin = Vec2::new(x, y);
        for firefly in &mut self.fireflies {
            let offset = firefly.position - origin;
            let distance = offset.length();
            if distance < radius && distance > 0.0 {
                let strength = (radius - distance) / radius * force;
                firefly.apply_force(offset.x / distance * strength, offset.y / distance * strength);
            }
        }
    }

    /// [`Ecosystem::scatter_from`] with the default radius and force
    pub fn scatter(&mut self, x: f32, y: f32) {
        self.scatter_from(x, y, DEFAULT_SCATTER_RADIUS, DEFAULT_SCATTER_FORCE);
    }

    /// Kill a firefly now. Its removal is queued and flushed on the next
    /// tick. False if unknown or already dead.
    pub fn kill_firefly(&mut self, id: FireflyId) -> bool {
        let killed = self.firefly_mut(id).map(|f| f.die()).unwrap_or(false);
        if killed {
            self.drain_firefly_signals();
        }
        killed
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot {
            version: SNAPSHOT_VERSION,
            config: self.config.clone(),
            running: self.clock.is_running(),
            now_ms: self.now_ms,
            stats: self.stats.clone(),
            next_firefly_id: self.next_firefly_id,
            next_planet_id: self.next_planet_id,
            rng: self.rng.clone(),
            fireflies: self.fireflies.clone(),
            planets: self.planets.clone(),
            pending_removals: self.pending_removals.clone(),
            pending_planet_removals: self.pending_planet_removals.clone(),
            timers: self.timers.clone(),
            predator_gravity_boost: self.predator_gravity_boost,
        }
    }

    /// Rebuild from a validated snapshot. Terraform is re-derived on the
    /// next tick.
    pub(crate) fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut clock = FrameClock::new();
        if snapshot.running {
            clock.start();
        }
        let terraform = Terraform::from_census(
            &snapshot.planets,
            snapshot.config.min_planets_for_terraform,
        );
        Self {
            config: snapshot.config,
            fireflies: snapshot.fireflies,
            planets: snapshot.planets,
            pending_removals: snapshot.pending_removals,
            pending_planet_removals: snapshot.pending_planet_removals,
            stats: snapshot.stats,
            terraform,
            clock,
            now_ms: snapshot.now_ms,
            timers: snapshot.timers,
            next_firefly_id: snapshot.next_firefly_id,
            next_planet_id: snapshot.next_planet_id,
            rng: snapshot.rng,
            predator: None,
            predator_inbox: Rc::new(RefCell::new(Vec::new())),
            predator_gravity_boost: snapshot.predator_gravity_boost,
            events: EventLog::new(),
        }
    }

    fn emit(&mut self, event: EcosystemEvent) {
        self.events.emit(event);
    }

    fn random_jitter(&mut self, spread: f32) -> f32 {
        (self.rng.gen::<f32>() - 0.5) * spread
    }
}

impl std::fmt::Debug for Ecosystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ecosystem")
            .field("fireflies", &self.fireflies.len())
            .field("planets", &self.planets.len())
            .field("now_ms", &self.now_ms)
            .field("running", &self.clock.is_running())
            .field("predator", &self.predator.is_some())
            .finish()
    }
}

/// (zeros, ones) among `fireflies`
pub(crate) fn count_digits(fireflies: &[Firefly]) -> (usize, usize) {
    let ones = fireflies
        .iter()
        .filter(|f| f.digit == crate::common::Digit::One)
        .count();
    (fireflies.len() - ones, ones)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Digit;

    fn eco() -> Ecosystem {
        let config = EcosystemConfig {
            initial_population: 0,
            min_population: 0,
            ..Default::default()
        }
        .with_seed(42);
        Ecosystem::new(config).unwrap()
    }

    #[test]
    fn test_new_validates_config() {
        let config = EcosystemConfig {
            collision_radius: -5.0,
            ..Default::default()
        };
        assert!(Ecosystem::new(config).is_err());
    }

    #[test]
    fn test_init_spawns_and_starts() {
        let mut eco = Ecosystem::new(EcosystemConfig::default().with_seed(1)).unwrap();
        eco.init();
        assert_eq!(eco.firefly_count(), 20);
        assert_eq!(eco.stats().total_births, 20);
        assert!(eco.is_running());
        assert_eq!(eco.fireflies()[3].attach_delay_ms, 300.0);
    }

    #[test]
    fn test_frame_only_while_running() {
        let mut eco = eco();
        assert!(!eco.frame(0.0));
        eco.start();
        assert!(eco.frame(1000.0));
        assert_eq!(eco.now_ms(), 16.0);
        assert!(eco.frame(1020.0));
        assert_eq!(eco.now_ms(), 36.0);
        eco.stop();
        eco.stop();
        assert!(!eco.frame(2000.0));
        assert_eq!(eco.now_ms(), 36.0);
    }

    #[test]
    fn test_interaction_ops_ignore_dead() {
        let mut eco = eco();
        let id = eco.spawn_firefly(SpawnOptions::at(100.0, 100.0)).unwrap();
        assert!(eco.apply_force(id, 1.0, 0.0));
        assert_eq!(eco.adjust_energy(id, -30.0), Some(70.0));
        assert_eq!(eco.adjust_energy(id, 500.0), Some(100.0));

        assert!(eco.kill_firefly(id));
        assert!(!eco.kill_firefly(id));
        assert!(!eco.apply_force(id, 1.0, 0.0));
        assert_eq!(eco.adjust_energy(id, 10.0), None);
        assert_eq!(eco.adjust_energy(FireflyId(999), 10.0), None);
    }

    #[test]
    fn test_scatter_pushes_outward() {
        let mut eco = eco();
        let near = eco.spawn_firefly(SpawnOptions::at(110.0, 100.0).with_velocity(0.0, 0.0)).unwrap();
        let far = eco.spawn_firefly(SpawnOptions::at(400.0, 100.0).with_velocity(0.0, 0.0)).unwrap();
        eco.scatter(100.0, 100.0);

        let v = eco.firefly(near).unwrap().velocity;
        assert!((v.x - (140.0 / 150.0 * 3.0)).abs() < 1e-4);
        assert_eq!(v.y, 0.0);
        assert_eq!(eco.firefly(far).unwrap().velocity, Vec2::ZERO);
    }

    #[test]
    fn test_queries() {
        let mut eco = eco();
        let a = eco
            .spawn_firefly(SpawnOptions::at(50.0, 50.0).with_digit(Digit::One))
            .unwrap();
        eco.spawn_firefly(SpawnOptions::at(300.0, 300.0).with_digit(Digit::Zero));
        eco.spawn_firefly(SpawnOptions::at(500.0, 300.0).with_digit(Digit::Zero));

        assert_eq!(eco.population_by_digit(), (2, 1));
        assert_eq!(eco.firefly_at(55.0, 50.0, DEFAULT_PICK_RADIUS).map(|f| f.id), Some(a));
        assert!(eco.firefly_at(700.0, 50.0, DEFAULT_PICK_RADIUS).is_none());
    }
}
