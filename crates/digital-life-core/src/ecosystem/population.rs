//! Firefly population: spawning, death handling, deferred removal and the
//! population floor.

use rand::Rng;

use super::{EcosystemEvent, Ecosystem, ScheduledAction};
use crate::common::{Digit, FireflyId, Vec2};
use crate::firefly::{Firefly, FireflySignal, SpawnOptions, Tier};

/// Respawn delay after a death that left the population under its floor
const RESPAWN_DELAY_MS: std::ops::Range<f64> = 500.0..1_500.0;
/// Respawns land within ±half of this around the death site
const RESPAWN_SPREAD: f32 = 200.0;

impl Ecosystem {
    /// Create a firefly and add it to the live set. Returns `None` at the
    /// population ceiling.
    pub fn spawn_firefly(&mut self, options: SpawnOptions) -> Option<FireflyId> {
        if self.fireflies.len() >= self.config.max_population {
            return None;
        }
        let id = FireflyId(self.next_firefly_id);
        self.next_firefly_id += 1;

        let from_planet = options.born_from_planet;
        let world = self.world_size();
        let firefly = Firefly::new(id, options, world, &mut self.rng);
        let (digit, at) = (firefly.digit, firefly.position);

        self.fireflies.push(firefly);
        self.stats.total_births += 1;
        self.stats.current_population = self.fireflies.len();

        self.emit(EcosystemEvent::FireflyBorn {
            id,
            digit,
            at,
            from_planet,
        });
        Some(id)
    }

    /// Handle every signal sitting in the fireflies' outboxes.
    pub(super) fn drain_firefly_signals(&mut self) {
        let mut deaths = Vec::new();
        let mut evolutions = Vec::new();
        for firefly in &mut self.fireflies {
            if !firefly.has_signals() {
                continue;
            }
            for signal in firefly.take_signals() {
                match signal {
                    FireflySignal::Died => deaths.push(DeathRecord::of(firefly)),
                    FireflySignal::Evolved { from, to } => {
                        evolutions.push((firefly.id, from, to, firefly.position))
                    }
                }
            }
        }

        for (id, from, to, at) in evolutions {
            self.stats.total_evolutions += 1;
            self.emit(EcosystemEvent::Evolved { id, from, to, at });
        }
        for death in deaths {
            self.handle_firefly_death(death);
        }
    }

    fn handle_firefly_death(&mut self, death: DeathRecord) {
        if self.pending_removals.contains(&death.id) {
            return;
        }
        self.pending_removals.push(death.id);
        self.stats.total_deaths += 1;

        self.emit(EcosystemEvent::FireflyDied {
            id: death.id,
            digit: death.digit,
            tier: death.tier,
            generation: death.generation,
            desperation: death.desperation,
            at: death.position,
        });

        if self.live_population() < self.config.min_population {
            let delay = self.rng.gen_range(RESPAWN_DELAY_MS);
            let x = death.position.x + self.random_jitter(RESPAWN_SPREAD);
            let y = death.position.y + self.random_jitter(RESPAWN_SPREAD);
            log::debug!("Respawn scheduled in {:.0} ms near ({:.0}, {:.0})", delay, x, y);
            self.timers
                .schedule(self.now_ms + delay, ScheduledAction::Respawn { x, y });
        }
    }

    /// Compact the live set: drop everything queued for removal, then sweep
    /// any dead firefly that slipped through.
    pub(super) fn flush_removals(&mut self) {
        self.drain_firefly_signals();

        if !self.pending_removals.is_empty() {
            let pending = std::mem::take(&mut self.pending_removals);
            self.fireflies.retain(|f| !pending.contains(&f.id));
        }
        self.fireflies.retain(|f| !f.is_dead());

        if !self.pending_planet_removals.is_empty() {
            let pending = std::mem::take(&mut self.pending_planet_removals);
            self.planets.retain(|p| !pending.contains(&p.id));
        }
        self.planets.retain(|p| !p.is_dead());

        self.stats.current_population = self.fireflies.len();
    }

    /// Below the floor, spawn with a chance that grows with the deficit.
    pub(super) fn maintain_population(&mut self) {
        let current = self.live_population();
        let min = self.config.min_population;
        if current >= min {
            return;
        }
        let deficit = (min - current) as f64;
        let chance = (self.config.spawn_rate * (1.0 + deficit * 0.5)).clamp(0.0, 1.0);
        if self.rng.gen_bool(chance) {
            self.spawn_firefly(SpawnOptions::default());
        }
    }

    pub(super) fn respawn_at(&mut self, x: f32, y: f32) {
        let options = SpawnOptions {
            position: Some(Vec2::new(x, y)),
            generation: 0,
            ..Default::default()
        };
        self.spawn_firefly(options);
    }
}

/// What a death event needs, captured before the firefly is removed
struct DeathRecord {
    id: FireflyId,
    digit: Digit,
    tier: Tier,
    generation: u32,
    desperation: f32,
    position: Vec2,
}

impl DeathRecord {
    fn of(firefly: &Firefly) -> Self {
        Self {
            id: firefly.id,
            digit: firefly.digit,
            tier: firefly.tier(),
            generation: firefly.generation,
            desperation: firefly.final_desperation(),
            position: firefly.position,
        }
    }
}
