//! The tick: seven ordered phases over the live collections.
//!
//! 1. firefly update
//! 2. planets (modifier reset, planet update, effects, terraform)
//! 3. predator
//! 4. collisions
//! 5. removal flush
//! 6. population maintenance
//! 7. sampled statistics
//!
//! The order matters. Modifiers are cleared at the start of phase 2 so a
//! bonus never outlives the tick its zone granted it in.

use rand::Rng;

use super::{EcosystemEvent, Ecosystem, PredatorSignal, ScheduledAction, Terraform};
use crate::common::{FireflyId, Vec2};
use crate::firefly::{CollisionOutcome, LifeState};
use crate::planet::Planet;

/// Predator pull inside a mature planet's protection zone is scaled by this
const PROTECTED_GRAVITY_SCALE: f32 = 0.2;

impl Ecosystem {
    /// Advance the simulation by `delta_ms`.
    pub fn tick(&mut self, delta_ms: f32) {
        self.now_ms += delta_ms as f64;
        self.run_due_timers();

        self.update_fireflies(delta_ms);
        self.drain_firefly_signals();

        self.update_planets(delta_ms);
        self.drain_firefly_signals();

        self.update_predator(delta_ms);
        self.drain_firefly_signals();

        self.check_collisions();
        self.drain_firefly_signals();

        self.flush_removals();
        self.maintain_population();

        if self.rng.gen_bool(self.config.stats_sample_chance) {
            self.refresh_stats();
        }
    }

    fn run_due_timers(&mut self) {
        for action in self.timers.take_due(self.now_ms) {
            match action {
                ScheduledAction::Respawn { x, y } => self.respawn_at(x, y),
                ScheduledAction::RestorePredatorGravity => self.restore_predator_gravity(),
            }
        }
    }

    // ── Phase 1 ──

    fn update_fireflies(&mut self, delta_ms: f32) {
        let world = self.world_size();
        let now = self.now_ms;
        for firefly in &mut self.fireflies {
            if self.pending_removals.contains(&firefly.id) {
                continue;
            }
            firefly.update(delta_ms, now, world, &mut self.rng);
        }
    }

    // ── Phase 2 ──

    fn update_planets(&mut self, delta_ms: f32) {
        self.enforce_planet_cap();

        for firefly in &mut self.fireflies {
            firefly.modifiers.reset();
        }

        for planet in &mut self.planets {
            if planet.is_dead() {
                continue;
            }
            planet.update(delta_ms, &mut self.rng);

            for firefly in &mut self.fireflies {
                if firefly.is_dead() {
                    continue;
                }
                planet.heal_firefly(firefly, delta_ms);
                planet.apply_gravity(firefly);
                planet.apply_evolution_boost(firefly, delta_ms);
                planet.apply_elemental_power(firefly);
                planet.apply_moon_effects(firefly);

                let gained = planet.check_particle_absorption(firefly);
                if gained > 0.0 {
                    firefly.add_energy(gained);
                }
            }
        }
        self.drain_planet_signals();

        self.terraform = Terraform::from_census(&self.planets, self.config.min_planets_for_terraform);
        if self.terraform.active {
            let regen = self.terraform.regen_for(delta_ms);
            for firefly in self.fireflies.iter_mut().filter(|f| f.is_mature()) {
                firefly.add_energy(regen);
            }
        }
    }

    // ── Phase 3 ──

    fn update_predator(&mut self, delta_ms: f32) {
        let Some(predator) = self.predator.as_mut() else {
            return;
        };
        if !predator.is_active() {
            return;
        }
        predator.update(delta_ms, &self.planets);

        for firefly in &mut self.fireflies {
            if matches!(
                firefly.state(),
                LifeState::Birth | LifeState::Dying | LifeState::Dead
            ) {
                continue;
            }
            if predator.check_consumption(firefly) {
                firefly.die();
                continue;
            }
            if let Some(force) = predator.calculate_gravity(firefly) {
                let mut scale = 1.0 - firefly.gravity_resist();
                if is_protected(&self.planets, firefly.position) {
                    scale *= PROTECTED_GRAVITY_SCALE;
                }
                let force = force.scaled(scale);
                firefly.apply_force(force.fx, force.fy);
            }
        }

        let signals: Vec<PredatorSignal> = self.predator_inbox.borrow_mut().drain(..).collect();
        for signal in signals {
            match signal {
                PredatorSignal::Consumed(consumption) => {
                    self.stats.total_consumed += 1;
                    self.emit(EcosystemEvent::Consumed(consumption));
                }
                PredatorSignal::Sacrifice(consumption) => {
                    log::info!(
                        "Ascended {} sacrificed, forming a planet",
                        consumption.firefly
                    );
                    let at = consumption.predator_at;
                    self.create_planet(consumption.digit, at.x, at.y);
                }
            }
        }
    }

    // ── Phase 4 ──

    fn check_collisions(&mut self) {
        let radius = self.config.collision_radius;
        let mut hits: Vec<(FireflyId, FireflyId, CollisionOutcome, Vec2)> = Vec::new();

        let n = self.fireflies.len();
        for i in 0..n {
            for j in (i + 1)..n {
                let (left, right) = self.fireflies.split_at_mut(j);
                let a = &mut left[i];
                let b = &mut right[0];
                if !a.can_collide() || !b.can_collide() {
                    continue;
                }
                if a.distance_to(b) >= radius {
                    continue;
                }
                let outcome = a.handle_collision(b);
                if outcome.is_reaction() {
                    hits.push((a.id, b.id, outcome, a.position.midpoint(&b.position)));
                }
            }
        }

        for (a, b, outcome, at) in hits {
            self.stats.record_collision(outcome);
            self.emit(EcosystemEvent::Collision { a, b, outcome, at });
        }
    }

    // ── Phase 7 ──

    fn refresh_stats(&mut self) {
        self.stats.refresh(&self.fireflies);
        log::debug!(
            "Stats: {} fireflies ({} zeros, {} ones), {} planets",
            self.stats.current_population,
            self.stats.zeros,
            self.stats.ones,
            self.planets.len()
        );
        self.emit(EcosystemEvent::StatsRefreshed(self.stats.clone()));
    }
}

/// Inside the protection zone of any mature planet
pub(super) fn is_protected(planets: &[Planet], point: Vec2) -> bool {
    planets
        .iter()
        .any(|p| p.is_mature() && !p.is_dead() && p.is_in_protection_zone(point))
}
