//! Particle effects - short-lived glyphs thrown out by simulation events.
//!
//! A one-way sink: the system turns [`EcosystemEvent`]s into bursts of
//! glyph particles and ticks them on its own clock. It never holds or reads
//! simulation state.
//!
//! Particles are `hecs` entities with [`ParticleBody`], [`Motion`],
//! [`Glyph`] and [`Lifetime`] components. Parts of an effect that appear
//! later (staggered spirals, delayed rings) wait in a queue and are released
//! by [`ParticleSystem::update`].

use hecs::World;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::f32::consts::TAU;

use crate::clock::FrameClock;
use crate::common::{Digit, Vec2};
use crate::ecosystem::EcosystemEvent;
use crate::firefly::{CollisionOutcome, Tier};
use crate::planet::PlanetKind;

// ============================================================================
// COMPONENTS
// ============================================================================

/// Screen position of a particle
#[derive(Debug, Clone, Copy)]
pub struct ParticleBody {
    pub position: Vec2,
}

/// Velocity plus per-frame damping and downward pull
#[derive(Debug, Clone, Copy)]
pub struct Motion {
    pub velocity: Vec2,
    pub friction: f32,
    pub gravity: f32,
}

/// What the particle looks like
#[derive(Debug, Clone, Copy)]
pub struct Glyph {
    pub text: char,
    pub size: f32,
    pub color: &'static str,
    pub opacity: f32,
    pub effect: Effect,
}

/// Remaining and total life in ms
#[derive(Debug, Clone, Copy)]
pub struct Lifetime {
    pub remaining: f32,
    pub max: f32,
}

/// Which recipe produced a particle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    Death,
    Collision,
    Evolution,
    EvolutionRing,
    PlanetBirth,
    PlanetBirthRing,
    PlanetDeath,
    Collapse,
    Consumption,
    Spawn,
}

/// Read-only copy of one live particle, for renderers
#[derive(Debug, Clone, Copy)]
pub struct ParticleView {
    pub position: Vec2,
    pub text: char,
    pub size: f32,
    pub color: &'static str,
    pub opacity: f32,
    pub effect: Effect,
}

// ============================================================================
// SYSTEM
// ============================================================================

const ZERO_COLOR: &str = "#4ecdc4";
const ONE_COLOR: &str = "#ff6b6b";
const MERGE_COLOR: &str = "#ffd93d";
const DEFAULT_FRICTION: f32 = 0.98;

const BIRTH_SYMBOLS: [char; 5] = ['*', '✦', '◇', '○', '+'];
const EVOLUTION_SYMBOLS: [char; 4] = ['*', '+', '^', '!'];
const DEBRIS_SYMBOLS: [char; 4] = ['◇', '△', '○', '□'];

fn digit_color(digit: Digit) -> &'static str {
    match digit {
        Digit::Zero => ZERO_COLOR,
        Digit::One => ONE_COLOR,
    }
}

/// Everything needed to spawn one particle
#[derive(Debug, Clone, Copy)]
struct ParticleSpec {
    position: Vec2,
    velocity: Vec2,
    text: char,
    size: f32,
    color: &'static str,
    life: f32,
    friction: f32,
    gravity: f32,
    effect: Effect,
}

impl ParticleSpec {
    fn new(position: Vec2, velocity: Vec2, text: char, effect: Effect) -> Self {
        Self {
            position,
            velocity,
            text,
            size: 10.0,
            color: "#ffffff",
            life: 500.0,
            friction: DEFAULT_FRICTION,
            gravity: 0.0,
            effect,
        }
    }

    fn size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    fn color(mut self, color: &'static str) -> Self {
        self.color = color;
        self
    }

    fn life(mut self, life: f32) -> Self {
        self.life = life;
        self
    }

    fn physics(mut self, friction: f32, gravity: f32) -> Self {
        self.friction = friction;
        self.gravity = gravity;
        self
    }
}

/// A particle waiting to appear
#[derive(Debug, Clone, Copy)]
struct Queued {
    delay_ms: f32,
    spec: ParticleSpec,
}

pub struct ParticleSystem {
    world: World,
    queued: Vec<Queued>,
    clock: FrameClock,
    rng: ChaCha8Rng,
}

impl Default for ParticleSystem {
    fn default() -> Self {
        Self::new(rand::random())
    }
}

impl ParticleSystem {
    pub fn new(seed: u64) -> Self {
        Self {
            world: World::new(),
            queued: Vec::new(),
            clock: FrameClock::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    // ── Clock ──

    pub fn start(&mut self) -> bool {
        self.clock.start()
    }

    /// Idempotent.
    pub fn stop(&mut self) {
        self.clock.stop();
    }

    pub fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    /// Host animation-frame entry point. Returns whether an update ran.
    pub fn frame(&mut self, timestamp_ms: f64) -> bool {
        match self.clock.advance(timestamp_ms) {
            Some(delta) => {
                self.update(delta);
                true
            }
            None => false,
        }
    }

    // ── State ──

    /// Live particles (queued ones not included)
    pub fn particle_count(&self) -> usize {
        self.world.len() as usize
    }

    pub fn queued_count(&self) -> usize {
        self.queued.len()
    }

    pub fn clear(&mut self) {
        self.world.clear();
        self.queued.clear();
    }

    pub fn particles(&self) -> Vec<ParticleView> {
        self.world
            .query::<(&ParticleBody, &Glyph)>()
            .iter()
            .map(|(_, (body, glyph))| ParticleView {
                position: body.position,
                text: glyph.text,
                size: glyph.size,
                color: glyph.color,
                opacity: glyph.opacity,
                effect: glyph.effect,
            })
            .collect()
    }

    /// Age, move and fade every particle, then release due queued parts.
    pub fn update(&mut self, delta_ms: f32) {
        let mut expired: Vec<hecs::Entity> = Vec::new();

        for (entity, (body, motion, glyph, life)) in self
            .world
            .query_mut::<(&mut ParticleBody, &mut Motion, &mut Glyph, &mut Lifetime)>()
        {
            life.remaining -= delta_ms;
            if life.remaining <= 0.0 {
                expired.push(entity);
                continue;
            }
            motion.velocity = motion.velocity * motion.friction;
            motion.velocity.y += motion.gravity;
            body.position = body.position + motion.velocity;
            glyph.opacity = (life.remaining / life.max).max(0.0);
        }

        for entity in expired {
            let _ = self.world.despawn(entity);
        }

        let mut released = Vec::new();
        self.queued.retain_mut(|q| {
            q.delay_ms -= delta_ms;
            if q.delay_ms <= 0.0 {
                released.push(q.spec);
                false
            } else {
                true
            }
        });
        for spec in released {
            self.spawn(spec);
        }
    }

    fn spawn(&mut self, spec: ParticleSpec) -> hecs::Entity {
        self.world.spawn((
            ParticleBody {
                position: spec.position,
            },
            Motion {
                velocity: spec.velocity,
                friction: spec.friction,
                gravity: spec.gravity,
            },
            Glyph {
                text: spec.text,
                size: spec.size,
                color: spec.color,
                opacity: 1.0,
                effect: spec.effect,
            },
            Lifetime {
                remaining: spec.life,
                max: spec.life,
            },
        ))
    }

    fn spawn_later(&mut self, delay_ms: f32, spec: ParticleSpec) {
        if delay_ms <= 0.0 {
            self.spawn(spec);
        } else {
            self.queued.push(Queued { delay_ms, spec });
        }
    }

    fn pick(&mut self, symbols: &[char]) -> char {
        symbols[self.rng.gen_range(0..symbols.len())]
    }

    // ── Event mapping ──

    /// Spawn whatever effect `event` calls for.
    pub fn consume(&mut self, event: &EcosystemEvent) {
        match event {
            EcosystemEvent::FireflyBorn { at, digit, .. } => self.spawn_flash(*at, *digit),
            EcosystemEvent::FireflyDied {
                at,
                digit,
                tier,
                generation,
                desperation,
                ..
            } => self.death_burst(*at, *digit, *tier, *generation, *desperation),
            EcosystemEvent::Collision { at, outcome, .. } => self.collision(*at, *outcome),
            EcosystemEvent::Evolved { at, to, .. } => self.evolution(*at, *to),
            EcosystemEvent::PlanetBorn { at, kind, .. } => self.planet_birth(*at, *kind),
            EcosystemEvent::PlanetDied { at, kind, .. } => self.planet_death(*at, *kind),
            EcosystemEvent::PlanetCollapsed { at, kind, .. } => self.collapse(*at, *kind),
            EcosystemEvent::Consumed(c) => self.consumption(c.at, c.predator_at, c.digit),
            EcosystemEvent::PlanetErupted { .. }
            | EcosystemEvent::MoonBorn { .. }
            | EcosystemEvent::StatsRefreshed(_) => {}
        }
    }

    // ── Recipes ──

    /// Radial burst of the firefly's digit and its opposite. Higher tiers,
    /// later generations and desperate deaths throw more, faster glyphs.
    pub fn death_burst(&mut self, at: Vec2, digit: Digit, tier: Tier, generation: u32, desperation: f32) {
        let level = tier.level() as usize;
        let mut count = self.rng.gen_range(8..=12) + level * 2 + generation.min(3) as usize;
        if desperation > 0.5 {
            count += (desperation * 6.0).floor() as usize;
        }

        let color = digit_color(digit);
        let (gravity, friction) = if tier >= Tier::Radiant {
            (-0.01, 0.99)
        } else {
            (0.02, 0.97)
        };

        for i in 0..count {
            let angle = TAU / count as f32 * i as f32 + (self.rng.gen::<f32>() - 0.5) * 0.5;
            let mut speed = (2.0 + self.rng.gen::<f32>() * 3.0) * (1.0 + level as f32 * 0.2);
            if desperation > 0.5 {
                speed *= 1.0 + desperation * 0.5;
            }
            let size = (8.0 + self.rng.gen::<f32>() * 6.0) * (1.0 + level as f32 * 0.15);
            let text = if i < count / 2 { digit } else { digit.flipped() }.as_char();
            let life = 800.0 + self.rng.gen::<f32>() * 400.0;
            self.spawn(
                ParticleSpec::new(at, Vec2::from_angle(angle) * speed, text, Effect::Death)
                    .size(size)
                    .color(color)
                    .life(life)
                    .physics(friction, gravity),
            );
        }
    }

    /// The arithmetic of the reaction, thrown out in a ring.
    pub fn collision(&mut self, at: Vec2, outcome: CollisionOutcome) {
        let (text, color): (&[char], &'static str) = match outcome {
            CollisionOutcome::Overflow => (&['1', '0', '+', '1', '=', '0'], ONE_COLOR),
            CollisionOutcome::Quantum => (&['0', '0', '+', '0', '=', '1'], ZERO_COLOR),
            CollisionOutcome::Merge => (&['+', '+', '+', '+'], MERGE_COLOR),
            CollisionOutcome::None => return,
        };
        let count = text.len();
        for (i, glyph) in text.iter().enumerate() {
            let angle = TAU / count as f32 * i as f32;
            let speed = 1.5 + self.rng.gen::<f32>() * 2.0;
            let size = 10.0 + self.rng.gen::<f32>() * 4.0;
            let life = 600.0 + self.rng.gen::<f32>() * 300.0;
            self.spawn(
                ParticleSpec::new(at, Vec2::from_angle(angle) * speed, *glyph, Effect::Collision)
                    .size(size)
                    .color(color)
                    .life(life),
            );
        }
    }

    /// Spiral of sparks in the new tier's color plus an expanding ring.
    pub fn evolution(&mut self, at: Vec2, tier: Tier) {
        let color = tier.color();
        let count = 10 + tier.level() as usize * 4;
        for i in 0..count {
            let angle = TAU / count as f32 * i as f32;
            let speed = 2.0 + self.rng.gen::<f32>() * 3.0;
            let text = self.pick(&EVOLUTION_SYMBOLS);
            let size = 10.0 + self.rng.gen::<f32>() * 8.0;
            let life = 600.0 + self.rng.gen::<f32>() * 400.0;
            self.spawn(
                ParticleSpec::new(at, Vec2::from_angle(angle) * speed, text, Effect::Evolution)
                    .size(size)
                    .color(color)
                    .life(life)
                    .physics(0.97, -0.01),
            );
        }
        for i in 0..8 {
            let angle = TAU / 8.0 * i as f32;
            self.spawn(
                ParticleSpec::new(at, Vec2::from_angle(angle) * 1.5, '◇', Effect::EvolutionRing)
                    .size(14.0)
                    .color(color)
                    .life(800.0)
                    .physics(0.99, 0.0),
            );
        }
    }

    /// Staggered 30-glyph spiral and three delayed rings.
    pub fn planet_birth(&mut self, at: Vec2, kind: PlanetKind) {
        let color = kind.color();
        let count = 30;
        for i in 0..count {
            let angle = TAU / count as f32 * i as f32;
            let speed = 4.0 + self.rng.gen::<f32>() * 5.0;
            let text = self.pick(&BIRTH_SYMBOLS);
            let size = 12.0 + self.rng.gen::<f32>() * 10.0;
            let life = 1200.0 + self.rng.gen::<f32>() * 600.0;
            self.spawn_later(
                i as f32 * 30.0,
                ParticleSpec::new(at, Vec2::from_angle(angle) * speed, text, Effect::PlanetBirth)
                    .size(size)
                    .color(color)
                    .life(life)
                    .physics(0.97, -0.02),
            );
        }
        for ring in 0..3 {
            for i in 0..12 {
                let angle = TAU / 12.0 * i as f32;
                let speed = 2.0 + ring as f32 * 1.5;
                self.spawn_later(
                    ring as f32 * 200.0,
                    ParticleSpec::new(at, Vec2::from_angle(angle) * speed, '◯', Effect::PlanetBirthRing)
                        .size(16.0 - ring as f32 * 2.0)
                        .color(color)
                        .life(1000.0),
                );
            }
        }
    }

    /// Twenty pieces of debris in random directions.
    pub fn planet_death(&mut self, at: Vec2, kind: PlanetKind) {
        for _ in 0..20 {
            let angle = self.rng.gen::<f32>() * TAU;
            let speed = 2.0 + self.rng.gen::<f32>() * 4.0;
            let offset = Vec2::new(
                (self.rng.gen::<f32>() - 0.5) * 20.0,
                (self.rng.gen::<f32>() - 0.5) * 20.0,
            );
            let text = self.pick(&DEBRIS_SYMBOLS);
            let size = 8.0 + self.rng.gen::<f32>() * 8.0;
            let life = 800.0 + self.rng.gen::<f32>() * 400.0;
            self.spawn(
                ParticleSpec::new(at + offset, Vec2::from_angle(angle) * speed, text, Effect::PlanetDeath)
                    .size(size)
                    .color(kind.color())
                    .life(life)
                    .physics(0.96, 0.03),
            );
        }
    }

    /// Ring of the planet's symbol falling inward.
    pub fn collapse(&mut self, at: Vec2, kind: PlanetKind) {
        for i in 0..8 {
            let angle = TAU / 8.0 * i as f32;
            let start = at + Vec2::from_angle(angle) * 40.0;
            self.spawn(
                ParticleSpec::new(start, Vec2::from_angle(angle) * -1.5, kind.symbol(), Effect::Collapse)
                    .size(14.0)
                    .color(kind.color())
                    .life(700.0)
                    .physics(0.97, 0.0),
            );
        }
    }

    /// Streak of the consumed digit toward the predator.
    pub fn consumption(&mut self, from: Vec2, predator_at: Vec2, digit: Digit) {
        let toward = (predator_at - from).normalize();
        let count = self.rng.gen_range(6..10);
        for i in 0..count {
            let angle = TAU / count as f32 * i as f32;
            let spread = 0.5 + self.rng.gen::<f32>() * 0.5;
            let pull = 1.0 + self.rng.gen::<f32>() * 2.0;
            let velocity = Vec2::from_angle(angle) * spread + toward * pull;
            let jitter = Vec2::new(
                (self.rng.gen::<f32>() - 0.5) * 10.0,
                (self.rng.gen::<f32>() - 0.5) * 10.0,
            );
            let size = 10.0 + self.rng.gen::<f32>() * 6.0;
            let life = 300.0 + self.rng.gen::<f32>() * 200.0;
            self.spawn(
                ParticleSpec::new(from + jitter, velocity, digit.as_char(), Effect::Consumption)
                    .size(size)
                    .color(digit_color(digit))
                    .life(life)
                    .physics(0.95, 0.0),
            );
        }
    }

    /// Small puff where a firefly appears.
    pub fn spawn_flash(&mut self, at: Vec2, digit: Digit) {
        for i in 0..4 {
            let angle = TAU / 4.0 * i as f32;
            self.spawn(
                ParticleSpec::new(at, Vec2::from_angle(angle) * 0.8, '·', Effect::Spawn)
                    .size(8.0)
                    .color(digit_color(digit))
                    .life(400.0)
                    .physics(0.95, 0.0),
            );
        }
    }
}

impl std::fmt::Debug for ParticleSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParticleSystem")
            .field("particles", &self.world.len())
            .field("queued", &self.queued.len())
            .field("running", &self.clock.is_running())
            .finish()
    }
}
