//! Presentation boundary.
//!
//! The core never draws. A host implements [`Surface`] (DOM nodes, sprites,
//! terminal cells) and a [`Stage`] keeps one handle per visible entity in
//! step with the ecosystem: created the first frame an entity should be
//! shown, updated every frame with a pure [`Style`] projection, and removed
//! exactly once when the entity is gone.

use std::collections::{HashMap, HashSet};

use crate::common::{FireflyId, PlanetId, Vec2};
use crate::ecosystem::Ecosystem;
use crate::firefly::{Firefly, LifeState, MAX_ENERGY};
use crate::planet::Planet;

/// What a handle will show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualKind {
    Firefly,
    Planet,
}

/// Attributes a surface applies to a handle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Style {
    pub position: Vec2,
    pub size: f32,
    pub opacity: f32,
    pub color: &'static str,
    /// Glow strength, 1.0 is normal
    pub glow: f32,
    pub glyph: char,
}

/// A rendering backend. Handles are opaque to the core.
pub trait Surface {
    type Handle;

    fn create(&mut self, kind: VisualKind) -> Self::Handle;
    fn update(&mut self, handle: &Self::Handle, style: &Style);
    fn remove(&mut self, handle: Self::Handle);
}

// ============================================================================
// PROJECTION
// ============================================================================

/// Style for a firefly: digit glyph in the tier color, glowing with energy.
pub fn project_firefly(firefly: &Firefly) -> Style {
    let energy = firefly.energy() / MAX_ENERGY;
    let mut glow = (0.4 + 0.6 * energy) * firefly.modifiers.brightness_boost;
    if firefly.is_critical() {
        glow *= 0.6;
    }
    Style {
        position: firefly.position,
        size: firefly.size,
        opacity: firefly.opacity,
        color: firefly.tier().color(),
        glow,
        glyph: firefly.digit.as_char(),
    }
}

/// Style for a planet: kind symbol and color, pulsing, flaring while hurt.
pub fn project_planet(planet: &Planet) -> Style {
    let glow = if planet.is_hurt() {
        2.0
    } else {
        1.0 + 0.2 * planet.pulse_phase.sin()
    };
    Style {
        position: planet.position,
        size: planet.size,
        opacity: planet.opacity,
        color: planet.kind.color(),
        glow,
        glyph: planet.kind.symbol(),
    }
}

// ============================================================================
// STAGE
// ============================================================================

/// Handle bookkeeping between an ecosystem and a surface
pub struct Stage<S: Surface> {
    surface: S,
    fireflies: HashMap<FireflyId, S::Handle>,
    planets: HashMap<PlanetId, S::Handle>,
    /// Ecosystem time each firefly was first seen, for attach delays
    first_seen: HashMap<FireflyId, f64>,
}

impl<S: Surface> Stage<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            fireflies: HashMap::new(),
            planets: HashMap::new(),
            first_seen: HashMap::new(),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Number of live handles
    pub fn len(&self) -> usize {
        self.fireflies.len() + self.planets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_attached(&self, id: FireflyId) -> bool {
        self.fireflies.contains_key(&id)
    }

    /// Create, update and remove handles to match `ecosystem`.
    pub fn sync(&mut self, ecosystem: &Ecosystem) {
        let now = ecosystem.now_ms();

        let mut wanted: HashSet<FireflyId> = HashSet::new();
        for firefly in ecosystem.fireflies() {
            if firefly.state() == LifeState::Dead {
                continue;
            }
            wanted.insert(firefly.id);
            let seen = *self.first_seen.entry(firefly.id).or_insert(now);
            if !self.fireflies.contains_key(&firefly.id) {
                if now - seen < firefly.attach_delay_ms as f64 {
                    continue;
                }
                let handle = self.surface.create(VisualKind::Firefly);
                self.fireflies.insert(firefly.id, handle);
            }
            if let Some(handle) = self.fireflies.get(&firefly.id) {
                self.surface.update(handle, &project_firefly(firefly));
            }
        }
        self.first_seen.retain(|id, _| wanted.contains(id));
        let gone: Vec<FireflyId> = self
            .fireflies
            .keys()
            .filter(|id| !wanted.contains(id))
            .copied()
            .collect();
        for id in gone {
            if let Some(handle) = self.fireflies.remove(&id) {
                self.surface.remove(handle);
            }
        }

        let mut wanted: HashSet<PlanetId> = HashSet::new();
        for planet in ecosystem.planets() {
            if planet.is_dead() {
                continue;
            }
            wanted.insert(planet.id);
            let handle = self
                .planets
                .entry(planet.id)
                .or_insert_with(|| self.surface.create(VisualKind::Planet));
            self.surface.update(handle, &project_planet(planet));
        }
        let gone: Vec<PlanetId> = self
            .planets
            .keys()
            .filter(|id| !wanted.contains(id))
            .copied()
            .collect();
        for id in gone {
            if let Some(handle) = self.planets.remove(&id) {
                self.surface.remove(handle);
            }
        }
    }

    /// Release every handle.
    pub fn clear(&mut self) {
        for (_, handle) in self.fireflies.drain() {
            self.surface.remove(handle);
        }
        for (_, handle) in self.planets.drain() {
            self.surface.remove(handle);
        }
        self.first_seen.clear();
    }

    pub fn into_surface(mut self) -> S {
        self.clear();
        self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Digit;
    use crate::config::{EcosystemConfig, PlanetFeatures};
    use crate::firefly::SpawnOptions;

    /// Records every call; handles are sequence numbers
    #[derive(Default)]
    struct Recorder {
        next: u32,
        created: Vec<(u32, VisualKind)>,
        updates: usize,
        removed: Vec<u32>,
    }

    impl Surface for Recorder {
        type Handle = u32;

        fn create(&mut self, kind: VisualKind) -> u32 {
            self.next += 1;
            self.created.push((self.next, kind));
            self.next
        }

        fn update(&mut self, _handle: &u32, _style: &Style) {
            self.updates += 1;
        }

        fn remove(&mut self, handle: u32) {
            self.removed.push(handle);
        }
    }

    fn eco() -> Ecosystem {
        let config = EcosystemConfig {
            initial_population: 0,
            min_population: 0,
            stats_sample_chance: 0.0,
            planet_features: PlanetFeatures::none(),
            ..Default::default()
        }
        .with_seed(5);
        Ecosystem::new(config).unwrap()
    }

    #[test]
    fn test_handles_follow_entities() {
        let mut eco = eco();
        let a = eco.spawn_firefly(SpawnOptions::at(10.0, 10.0)).unwrap();
        eco.spawn_firefly(SpawnOptions::at(50.0, 10.0));
        eco.create_planet(Digit::Zero, 400.0, 300.0);

        let mut stage = Stage::new(Recorder::default());
        stage.sync(&eco);
        assert_eq!(stage.len(), 3);
        assert_eq!(stage.surface().updates, 3);

        eco.kill_firefly(a);
        stage.sync(&eco);
        assert_eq!(stage.surface().removed.len(), 1);
        assert!(!stage.is_attached(a));

        // Already removed; flushing it from the ecosystem must not remove twice
        eco.tick(16.0);
        stage.sync(&eco);
        assert_eq!(stage.surface().removed.len(), 1);
        assert_eq!(stage.surface().created.len(), 3);
    }

    #[test]
    fn test_attach_delay_respected() {
        let mut eco = eco();
        let options = SpawnOptions {
            attach_delay_ms: 100.0,
            ..SpawnOptions::at(10.0, 10.0)
        };
        let id = eco.spawn_firefly(options).unwrap();

        let mut stage = Stage::new(Recorder::default());
        stage.sync(&eco);
        assert!(!stage.is_attached(id));

        eco.tick(60.0);
        stage.sync(&eco);
        assert!(!stage.is_attached(id));

        eco.tick(60.0);
        stage.sync(&eco);
        assert!(stage.is_attached(id));
    }

    #[test]
    fn test_projection() {
        let mut eco = eco();
        let id = eco
            .spawn_firefly(SpawnOptions::at(10.0, 20.0).with_digit(Digit::One))
            .unwrap();
        let style = project_firefly(eco.firefly(id).unwrap());
        assert_eq!(style.glyph, '1');
        assert_eq!(style.position, Vec2::new(10.0, 20.0));
        assert!((style.glow - 1.0).abs() < 1e-6);

        let pid = eco.create_planet(Digit::One, 0.0, 0.0).unwrap();
        eco.damage_planet(pid);
        let style = project_planet(eco.planet(pid).unwrap());
        assert_eq!(style.glow, 2.0);
        assert_eq!(style.color, "#fbbf24");
    }

    #[test]
    fn test_into_surface_releases_all() {
        let mut eco = eco();
        eco.spawn_firefly(SpawnOptions::default());
        let mut stage = Stage::new(Recorder::default());
        stage.sync(&eco);
        let surface = stage.into_surface();
        assert_eq!(surface.removed.len(), 1);
    }
}
