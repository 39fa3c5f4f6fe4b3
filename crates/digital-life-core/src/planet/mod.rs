//! Planet - a satellite born when an ascended firefly is consumed.
//!
//! A planet orbits the point where it was created, and once mature projects
//! healing, gravity, evolution and elemental effects on fireflies in range
//! (see [`effects`]). It spawns new fireflies, sheds energy particles and
//! eventually grows old, dies, or collapses.
//!
//! Like fireflies, a planet never reaches into the ecosystem. Spawn requests,
//! collapse and death are recorded as [`PlanetSignal`]s.

mod echo;
mod effects;
mod kind;
mod moon;
mod resources;
mod volcano;

pub use echo::*;
pub use kind::*;
pub use moon::*;
pub use resources::*;
pub use volcano::*;

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use crate::common::{ease_out_cubic, Digit, PlanetId, Vec2};
use crate::config::PlanetFeatures;

const BASE_SIZE: f32 = 30.0;
const INITIAL_SIZE: f32 = 5.0;
pub const BIRTH_DURATION_MS: f32 = 3_000.0;
pub const MAX_HEALTH: u8 = 3;
const HURT_DURATION_MS: f32 = 500.0;

pub const GRAVITY_STRENGTH: f32 = 0.015;
/// Inside this distance gravity pushes outward instead of pulling
pub const ORBIT_DISTANCE: f32 = INITIAL_SIZE * 1.5;
pub const EVOLUTION_BOOST_PER_SEC: f32 = 0.002;
pub const EVOLUTION_MULTIPLIER: f32 = 2.0;

const SPAWN_CHANCE: f64 = 0.7;
const DIGIT_BIAS: f64 = 0.75;

const MATURE_STAGE_MS: f32 = 60_000.0;
const ANCIENT_FRACTION: f32 = 0.7;
const DYING_DURATION_MS: f32 = 15_000.0;

/// Cosmetic age bracket. Gameplay is gated on `is_mature()` alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgeStage {
    Young,
    Mature,
    Ancient,
    Dying,
}

impl AgeStage {
    pub fn name(self) -> &'static str {
        match self {
            AgeStage::Young => "young",
            AgeStage::Mature => "mature",
            AgeStage::Ancient => "ancient",
            AgeStage::Dying => "dying",
        }
    }
}

/// Things a planet asks of its owner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PlanetSignal {
    /// Spawn a firefly at the planet's edge
    SpawnRequest {
        position: Vec2,
        digit: Digit,
        velocity: Vec2,
    },
    /// A volcanic eruption began
    Erupted,
    /// A moon formed
    MoonBorn(MoonKind),
    /// The dying phase ended in collapse; strengthen the predator
    Collapsed,
    Died,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Orbit {
    pub center: Vec2,
    pub radius: f32,
    pub angle: f32,
    /// Radians per ms
    pub speed: f32,
    /// +1 or -1
    pub direction: f32,
}

impl Orbit {
    pub fn position(&self) -> Vec2 {
        self.center + Vec2::from_angle(self.angle) * self.radius
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Lifecycle {
    max_age: f32,
    /// Planet age when the dying phase began
    dying_since: Option<f32>,
}

/// Debug/display summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanetInfo {
    pub id: PlanetId,
    pub kind: PlanetKind,
    pub digit: u8,
    pub health: u8,
    pub position: Vec2,
    /// Age in whole seconds
    pub age_secs: u32,
    pub is_mature: bool,
    pub stage: AgeStage,
    pub moons: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Planet {
    pub id: PlanetId,
    pub kind: PlanetKind,
    pub orbit: Orbit,
    pub position: Vec2,

    pub size: f32,
    max_size: f32,
    pub opacity: f32,
    pub rotation: f32,
    pub pulse_phase: f32,

    age: f32,
    mature: bool,
    stage: AgeStage,
    lifecycle: Lifecycle,
    dead: bool,

    health: u8,
    hurt_timer: f32,

    pub protection_radius: f32,
    pub gravity_radius: f32,

    spawn_interval: f32,
    spawn_timer: f32,
    spawn_chance: f64,

    pub resources: ResourceField,
    pub echo: Echo,
    pub moons: Vec<Moon>,
    moon_timer: f32,
    pub volcano: Volcano,
    features: PlanetFeatures,

    #[serde(skip)]
    signals: Vec<PlanetSignal>,
}

impl Planet {
    /// A newly forming planet orbiting `center` at `orbit_radius`.
    pub fn new(
        id: PlanetId,
        digit: Digit,
        center: Vec2,
        orbit_radius: f32,
        features: PlanetFeatures,
        rng: &mut impl Rng,
    ) -> Self {
        let kind = PlanetKind::from_digit(digit);
        let orbit = Orbit {
            center,
            radius: orbit_radius,
            angle: rng.gen::<f32>() * TAU,
            speed: rng.gen_range(0.0003..0.0005),
            direction: if rng.gen_bool(0.5) { 1.0 } else { -1.0 },
        };
        let spawn_interval = rng.gen_range(15_000.0..25_000.0);
        let protection_radius = kind.protection_radius();

        Self {
            id,
            kind,
            position: orbit.position(),
            orbit,
            size: INITIAL_SIZE,
            max_size: BASE_SIZE + rng.gen::<f32>() * 10.0,
            opacity: 0.0,
            rotation: 0.0,
            pulse_phase: rng.gen::<f32>() * TAU,
            age: 0.0,
            mature: false,
            stage: AgeStage::Young,
            lifecycle: Lifecycle {
                max_age: rng.gen_range(300_000.0..480_000.0),
                dying_since: None,
            },
            dead: false,
            health: MAX_HEALTH,
            hurt_timer: 0.0,
            protection_radius,
            gravity_radius: protection_radius * 2.5,
            spawn_interval,
            spawn_timer: spawn_interval * 0.5,
            spawn_chance: SPAWN_CHANCE,
            resources: ResourceField::new(rng),
            echo: Echo::new(digit),
            moons: Vec::new(),
            moon_timer: MOON_SPAWN_INTERVAL_MS * 0.3,
            volcano: Volcano::new(),
            features,
            signals: Vec::new(),
        }
    }

    pub fn digit(&self) -> Digit {
        self.kind.digit()
    }

    /// Gates every gameplay effect. True once the birth animation ends.
    pub fn is_mature(&self) -> bool {
        self.mature
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn is_dying(&self) -> bool {
        self.lifecycle.dying_since.is_some()
    }

    pub fn is_hurt(&self) -> bool {
        self.hurt_timer > 0.0
    }

    pub fn age(&self) -> f32 {
        self.age
    }

    pub fn max_age(&self) -> f32 {
        self.lifecycle.max_age
    }

    pub fn max_size(&self) -> f32 {
        self.max_size
    }

    pub fn stage(&self) -> AgeStage {
        self.stage
    }

    pub fn health(&self) -> u8 {
        self.health
    }

    pub fn features(&self) -> PlanetFeatures {
        self.features
    }

    /// Start the echo companion's timeline. Called once at creation.
    pub fn spawn_echo(&mut self, rng: &mut impl Rng) {
        self.echo.spawn(self.max_size, rng);
    }

    pub fn take_signals(&mut self) -> Vec<PlanetSignal> {
        std::mem::take(&mut self.signals)
    }

    pub fn update(&mut self, delta_ms: f32, rng: &mut impl Rng) {
        if self.dead {
            return;
        }
        self.age += delta_ms;

        if !self.mature {
            let progress = (self.age / BIRTH_DURATION_MS).min(1.0);
            let eased = ease_out_cubic(progress);
            self.opacity = eased;
            self.size = self.max_size * eased;
            if progress >= 1.0 {
                self.mature = true;
            }
        }

        self.orbit.angle += self.orbit.speed * delta_ms * self.orbit.direction;
        self.position = self.orbit.position();
        self.rotation += 0.001 * delta_ms;
        self.pulse_phase += 0.002 * delta_ms;

        if self.hurt_timer > 0.0 {
            self.hurt_timer = (self.hurt_timer - delta_ms).max(0.0);
        }

        if self.mature {
            self.spawn_timer -= delta_ms;
            if self.spawn_timer <= 0.0 {
                self.try_spawn_firefly(rng);
                self.spawn_timer = self.spawn_interval;
            }
            self.resources
                .tick_emission(delta_ms, self.position, self.size, rng);
        }
        self.resources.update(delta_ms, self.position);
        self.echo.update(delta_ms);

        if self.features.moons {
            self.update_moons(delta_ms, rng);
        }
        if self.features.volcanic {
            self.update_volcano(delta_ms, rng);
        }

        self.update_lifecycle();
    }

    fn try_spawn_firefly(&mut self, rng: &mut impl Rng) {
        if !rng.gen_bool(self.spawn_chance) {
            return;
        }
        let digit = if rng.gen_bool(DIGIT_BIAS) {
            self.digit()
        } else {
            self.digit().flipped()
        };
        let angle = rng.gen::<f32>() * TAU;
        let direction = Vec2::from_angle(angle);
        self.signals.push(PlanetSignal::SpawnRequest {
            position: self.position + direction * (self.size * 0.8),
            digit,
            velocity: direction * 0.5,
        });
    }

    fn update_moons(&mut self, delta_ms: f32, rng: &mut impl Rng) {
        let mut shed = 0;
        for moon in &mut self.moons {
            if moon.update(delta_ms, self.position, self.age) {
                shed += 1;
            }
        }
        for _ in 0..shed {
            if self.resources.len() < MAX_RESOURCE_PARTICLES + 2 {
                self.resources
                    .spawn(ResourceSource::Moon, self.position, self.size, rng);
            }
        }

        if self.mature && self.moons.len() < MAX_MOONS {
            self.moon_timer -= delta_ms;
            if self.moon_timer <= 0.0 {
                self.moon_timer = MOON_SPAWN_INTERVAL_MS;
                if rng.gen_bool(MOON_SPAWN_CHANCE) {
                    let radius = self.size * 1.5 + rng.gen::<f32>() * 20.0;
                    let moon = Moon::new(MoonKind::random(rng), self.position, radius, rng);
                    log::info!("{} formed around {} {}", moon.kind.name(), self.kind.name(), self.id);
                    self.signals.push(PlanetSignal::MoonBorn(moon.kind));
                    self.moons.push(moon);
                }
            }
        }
    }

    fn update_volcano(&mut self, delta_ms: f32, rng: &mut impl Rng) {
        let out = self.volcano.update(delta_ms, self.mature);
        if out.erupted {
            log::info!("{} {} erupted", self.kind.name(), self.id);
            self.signals.push(PlanetSignal::Erupted);
        }
        for _ in 0..out.particles {
            self.resources
                .spawn(ResourceSource::Volcanic, self.position, self.size, rng);
        }
    }

    fn update_lifecycle(&mut self) {
        if self.lifecycle.dying_since.is_none() && self.age >= self.lifecycle.max_age {
            self.start_dying();
        }

        if let Some(since) = self.lifecycle.dying_since {
            let progress = (self.age - since) / DYING_DURATION_MS;
            self.opacity = (1.0 - progress * 0.8).max(0.2);
            self.size = self.max_size * (1.0 - progress.min(1.0) * 0.3);
            if progress >= 1.0 {
                self.collapse();
            }
        }

        self.stage = if self.is_dying() {
            AgeStage::Dying
        } else if self.age >= self.lifecycle.max_age * ANCIENT_FRACTION {
            AgeStage::Ancient
        } else if self.age >= MATURE_STAGE_MS {
            AgeStage::Mature
        } else {
            AgeStage::Young
        };
    }

    /// Enter the irreversible dying phase. Spawning stops.
    pub fn start_dying(&mut self) {
        if self.is_dying() || self.dead {
            return;
        }
        self.lifecycle.dying_since = Some(self.age);
        self.spawn_chance = 0.0;
        log::debug!("{} {} entering death phase", self.kind.name(), self.id);
    }

    fn collapse(&mut self) {
        if self.dead {
            return;
        }
        if self.features.collapse_to_predator {
            self.signals.push(PlanetSignal::Collapsed);
        }
        self.die();
    }

    /// One hit of damage. Returns true if it killed the planet.
    pub fn take_damage(&mut self) -> bool {
        if self.dead {
            return false;
        }
        self.health = self.health.saturating_sub(1);
        self.hurt_timer = HURT_DURATION_MS;
        if self.health == 0 {
            return self.die();
        }
        false
    }

    /// Records [`PlanetSignal::Died`] exactly once.
    pub fn die(&mut self) -> bool {
        if self.dead {
            return false;
        }
        self.dead = true;
        self.signals.push(PlanetSignal::Died);
        true
    }

    /// Finish the birth animation immediately. Returns false if already mature.
    pub fn mature_now(&mut self) -> bool {
        if self.mature {
            return false;
        }
        self.mature = true;
        self.age = self.age.max(BIRTH_DURATION_MS);
        self.size = self.max_size;
        self.opacity = 1.0;
        true
    }

    pub fn info(&self) -> PlanetInfo {
        PlanetInfo {
            id: self.id,
            kind: self.kind,
            digit: self.digit().as_u8(),
            health: self.health,
            position: self.position,
            age_secs: (self.age / 1000.0).round() as u32,
            is_mature: self.mature,
            stage: self.stage,
            moons: self.moons.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn planet(digit: Digit, features: PlanetFeatures, rng: &mut ChaCha8Rng) -> Planet {
        Planet::new(PlanetId(1), digit, Vec2::new(400.0, 300.0), 180.0, features, rng)
    }

    #[test]
    fn test_birth_then_mature() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut p = planet(Digit::Zero, PlanetFeatures::none(), &mut rng);
        assert!(!p.is_mature());
        assert_eq!(p.kind, PlanetKind::NullWorld);

        for _ in 0..200 {
            p.update(16.0, &mut rng);
        }
        assert!(p.is_mature());
        assert!((p.size - p.max_size()).abs() < 1e-3);
        assert_eq!(p.stage(), AgeStage::Young);
    }

    #[test]
    fn test_orbit_stays_on_radius() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut p = planet(Digit::One, PlanetFeatures::none(), &mut rng);
        for _ in 0..100 {
            p.update(16.0, &mut rng);
            let r = p.position.distance(&p.orbit.center);
            assert!((r - 180.0).abs() < 1e-2);
        }
    }

    #[test]
    fn test_damage_kills_at_zero() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut p = planet(Digit::One, PlanetFeatures::none(), &mut rng);
        assert!(!p.take_damage());
        assert!(p.is_hurt());
        assert_eq!(p.health(), 2);
        assert!(!p.take_damage());
        assert!(p.take_damage());
        assert!(p.is_dead());
        assert!(!p.take_damage());
        assert_eq!(p.health(), 0);
        assert_eq!(p.take_signals(), vec![PlanetSignal::Died]);
    }

    #[test]
    fn test_spawn_requests_once_mature() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut p = planet(Digit::Zero, PlanetFeatures::none(), &mut rng);
        p.mature_now();
        let mut requests = 0;
        // Two minutes: at least a few 15-25 s cycles at 70 %
        for _ in 0..7_500 {
            p.update(16.0, &mut rng);
            for signal in p.take_signals() {
                if let PlanetSignal::SpawnRequest { position, velocity, .. } = signal {
                    requests += 1;
                    assert!(position.distance(&p.position) <= p.size);
                    assert!((velocity.length() - 0.5).abs() < 1e-3);
                }
            }
        }
        assert!(requests >= 1);
    }

    #[test]
    fn test_old_age_collapses() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut p = planet(Digit::One, PlanetFeatures::default(), &mut rng);
        p.mature_now();
        let max_age = p.max_age();
        p.update(max_age, &mut rng);
        assert!(p.is_dying());
        assert_eq!(p.stage(), AgeStage::Dying);
        p.take_signals();

        p.update(DYING_DURATION_MS, &mut rng);
        assert!(p.is_dead());
        assert_eq!(
            p.take_signals(),
            vec![PlanetSignal::Collapsed, PlanetSignal::Died]
        );
    }

    #[test]
    fn test_plain_death_without_collapse_feature() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let mut p = planet(Digit::Zero, PlanetFeatures::none(), &mut rng);
        p.mature_now();
        let max_age = p.max_age();
        p.update(max_age, &mut rng);
        p.take_signals();
        p.update(DYING_DURATION_MS, &mut rng);
        assert_eq!(p.take_signals(), vec![PlanetSignal::Died]);
    }

    #[test]
    fn test_mature_now_is_forward_only() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut p = planet(Digit::Zero, PlanetFeatures::none(), &mut rng);
        assert!(p.mature_now());
        assert!(!p.mature_now());
        assert!(p.is_mature());
    }
}
