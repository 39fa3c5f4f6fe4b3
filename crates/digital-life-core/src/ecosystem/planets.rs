//! Planet lifecycle at the ecosystem level: creation under the cap,
//! recycling, signal handling and collapse into the predator.

use rand::Rng;

use super::{EcosystemEvent, Ecosystem, ScheduledAction};
use crate::common::{Digit, PlanetId, Vec2};
use crate::firefly::SpawnOptions;
use crate::planet::{Planet, PlanetSignal};

const ORBIT_RADIUS: std::ops::Range<f32> = 150.0..230.0;
/// Each collapse multiplies predator gravity by this for a while
const COLLAPSE_GRAVITY_BOOST: f32 = 1.5;
const COLLAPSE_BOOST_MS: f64 = 5_000.0;
const COLLAPSE_MASS: f32 = 0.1;

impl Ecosystem {
    /// Create a planet orbiting (x, y). At the cap the oldest planet is
    /// recycled first, so the count never exceeds `max_planets`.
    pub fn create_planet(&mut self, digit: Digit, x: f32, y: f32) -> Option<PlanetId> {
        while self.planets.len() >= self.config.max_planets {
            if !self.recycle_oldest_planet() {
                return None;
            }
        }

        let id = PlanetId(self.next_planet_id);
        self.next_planet_id += 1;
        let center = Vec2::new(x, y);
        let orbit_radius = self.rng.gen_range(ORBIT_RADIUS);
        let mut planet = Planet::new(
            id,
            digit,
            center,
            orbit_radius,
            self.config.planet_features,
            &mut self.rng,
        );
        planet.spawn_echo(&mut self.rng);
        let kind = planet.kind;
        self.planets.push(planet);
        self.stats.planets_created += 1;

        log::info!(
            "{} {} born at ({:.0}, {:.0}), {} planets",
            kind.name(),
            id,
            x,
            y,
            self.planets.len()
        );
        self.emit(EcosystemEvent::PlanetBorn { id, kind, at: center });
        Some(id)
    }

    /// Remove the oldest planet (highest age, lowest id on ties).
    /// Returns false when there is nothing to remove.
    fn recycle_oldest_planet(&mut self) -> bool {
        let oldest = self
            .planets
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| {
                a.age()
                    .partial_cmp(&b.age())
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(b.id.cmp(&a.id))
            })
            .map(|(i, _)| i);
        let Some(index) = oldest else {
            return false;
        };

        let planet = self.planets.remove(index);
        self.pending_planet_removals.retain(|id| *id != planet.id);
        self.stats.planets_recycled += 1;
        if planet.age() >= self.config.planet_cleanup_age_ms {
            log::info!("Recycled stale {} {}", planet.kind.name(), planet.id);
        } else {
            log::warn!(
                "Recycled {} {} at {:.0}s to stay under the planet cap",
                planet.kind.name(),
                planet.id,
                planet.age() / 1000.0
            );
        }
        self.emit(EcosystemEvent::PlanetDied {
            id: planet.id,
            kind: planet.kind,
            at: planet.position,
            recycled: true,
        });
        true
    }

    /// Safety net for a collection that somehow grew past the cap.
    pub(super) fn enforce_planet_cap(&mut self) {
        if self.planets.len() <= self.config.max_planets {
            return;
        }
        log::warn!(
            "{} planets over a cap of {}, recycling",
            self.planets.len(),
            self.config.max_planets
        );
        while self.planets.len() > self.config.max_planets {
            if !self.recycle_oldest_planet() {
                break;
            }
        }
    }

    /// One hit of damage to a planet. Returns true if it died.
    pub fn damage_planet(&mut self, id: PlanetId) -> bool {
        let killed = self.planet_mut(id).map(|p| p.take_damage()).unwrap_or(false);
        self.drain_planet_signals();
        killed
    }

    pub(super) fn drain_planet_signals(&mut self) {
        let mut pending = Vec::new();
        for planet in &mut self.planets {
            for signal in planet.take_signals() {
                pending.push((planet.id, planet.kind, planet.position, signal));
            }
        }

        for (id, kind, at, signal) in pending {
            match signal {
                PlanetSignal::SpawnRequest {
                    position,
                    digit,
                    velocity,
                } => {
                    let options = SpawnOptions {
                        position: Some(position),
                        velocity: Some(velocity),
                        digit: Some(digit),
                        born_from_planet: Some(id),
                        ..Default::default()
                    };
                    if self.spawn_firefly(options).is_some() {
                        log::debug!("{} {} spawned a firefly", kind.name(), id);
                    }
                }
                PlanetSignal::Erupted => self.emit(EcosystemEvent::PlanetErupted { id, kind, at }),
                PlanetSignal::MoonBorn(moon) => {
                    self.emit(EcosystemEvent::MoonBorn { planet: id, kind: moon })
                }
                PlanetSignal::Collapsed => {
                    self.emit(EcosystemEvent::PlanetCollapsed { id, kind, at });
                    self.boost_predator_gravity();
                }
                PlanetSignal::Died => {
                    if !self.pending_planet_removals.contains(&id) {
                        self.pending_planet_removals.push(id);
                        log::info!("{} {} died", kind.name(), id);
                        self.emit(EcosystemEvent::PlanetDied {
                            id,
                            kind,
                            at,
                            recycled: false,
                        });
                    }
                }
            }
        }
    }

    pub(super) fn boost_predator_gravity(&mut self) {
        let Some(predator) = self.predator.as_mut() else {
            log::warn!("Planet collapsed with no predator attached");
            return;
        };
        self.predator_gravity_boost *= COLLAPSE_GRAVITY_BOOST;
        predator.set_gravity_multiplier(self.predator_gravity_boost);
        predator.add_mass(COLLAPSE_MASS);
        self.timers.schedule(
            self.now_ms + COLLAPSE_BOOST_MS,
            ScheduledAction::RestorePredatorGravity,
        );
        log::info!(
            "Planet collapse fed the predator, gravity x{:.2}",
            self.predator_gravity_boost
        );
    }

    pub(super) fn restore_predator_gravity(&mut self) {
        self.predator_gravity_boost = (self.predator_gravity_boost / COLLAPSE_GRAVITY_BOOST).max(1.0);
        if let Some(predator) = self.predator.as_mut() {
            predator.set_gravity_multiplier(self.predator_gravity_boost);
        }
    }
}
