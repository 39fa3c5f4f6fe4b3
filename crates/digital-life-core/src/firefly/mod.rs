//! Firefly - a binary-valued organism with a life cycle and evolution tiers.
//!
//! Life cycle: `Birth -> Growing -> Mature -> Dying -> Dead`. Transitions only
//! move forward. The age counter restarts at every phase boundary, and
//! `evolve()` restarts it again as a deliberate lifespan refresh.
//!
//! A firefly never touches the ecosystem. Death and evolution are recorded
//! as [`FireflySignal`]s in a per-instance outbox that the owning ecosystem
//! drains after each phase.

mod collision;
mod modifiers;
mod tier;

pub use collision::*;
pub use modifiers::*;
pub use tier::*;

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use crate::common::{ease_in_out_quad, ease_out_cubic, Digit, FireflyId, PlanetId, Vec2};

/// Time to fully appear
pub const BIRTH_DURATION_MS: f32 = 3_500.0;
/// Time from appearing to maturity
pub const GROWTH_DURATION_MS: f32 = 12_000.0;
/// Fade-out animation before death
pub const DYING_DURATION_MS: f32 = 1_000.0;
/// Energy granted to both parties of a merge collision
pub const COLLISION_ENERGY_BOOST: f32 = 35.0;
/// Cooldown after any reacting collision
pub const COLLISION_COOLDOWN_MS: f32 = 2_000.0;
pub const MAX_ENERGY: f32 = 100.0;
/// Off-screen margin before wrapping to the opposite edge
const WRAP_PADDING: f32 = 50.0;

/// Life-cycle state. Ordered so that `a < b` means `a` comes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LifeState {
    Birth,
    Growing,
    Mature,
    Dying,
    Dead,
}

impl LifeState {
    pub fn is_alive(self) -> bool {
        self != LifeState::Dead
    }
}

/// Things a firefly reports to its owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FireflySignal {
    Died,
    Evolved { from: Tier, to: Tier },
}

/// Optional overrides when spawning a firefly
#[derive(Debug, Clone, Default)]
pub struct SpawnOptions {
    pub position: Option<Vec2>,
    pub velocity: Option<Vec2>,
    pub digit: Option<Digit>,
    pub generation: u32,
    pub size: Option<f32>,
    pub tier: Option<Tier>,
    /// Delay before the presentation layer should attach a handle
    pub attach_delay_ms: f32,
    pub born_from_planet: Option<PlanetId>,
}

impl SpawnOptions {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            position: Some(Vec2::new(x, y)),
            ..Default::default()
        }
    }

    pub fn with_digit(mut self, digit: Digit) -> Self {
        self.digit = Some(digit);
        self
    }

    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = Some(tier);
        self
    }

    pub fn with_velocity(mut self, vx: f32, vy: f32) -> Self {
        self.velocity = Some(Vec2::new(vx, vy));
        self
    }
}

/// Debug/display summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FireflyInfo {
    pub id: FireflyId,
    pub digit: u8,
    pub state: LifeState,
    pub tier: Tier,
    pub generation: u32,
    pub age: f32,
    pub energy: f32,
    pub collisions: u32,
    pub position: Vec2,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Firefly {
    pub id: FireflyId,
    pub digit: Digit,
    pub generation: u32,
    tier: Tier,
    /// Collisions (and planet time) accumulated toward the next tier
    pub evolution_progress: f32,

    pub position: Vec2,
    pub velocity: Vec2,
    base_speed: f32,
    wobble_offset: f32,
    wobble_speed: f32,
    pulse_offset: f32,

    base_size: f32,
    pub size: f32,
    max_size: f32,
    pub opacity: f32,
    target_opacity: f32,

    state: LifeState,
    age: f32,
    base_max_age: f32,
    max_age: f32,

    energy: f32,
    energy_decay_rate: f32,

    collision_cooldown: f32,
    collision_count: u32,
    gravity_resist: f32,
    /// Desperation at the moment the firefly left maturity
    final_desperation: f32,

    /// Planet-granted modifiers, valid for the current tick only
    pub modifiers: TickModifiers,
    pub born_from_planet: Option<PlanetId>,
    pub attach_delay_ms: f32,

    #[serde(skip)]
    signals: Vec<FireflySignal>,
}

impl Firefly {
    /// Create a firefly in the `Birth` state. `world` is the wrap-around
    /// area used for a random position when none is given.
    pub fn new(id: FireflyId, options: SpawnOptions, world: Vec2, rng: &mut impl Rng) -> Self {
        let tier = options.tier.unwrap_or_default();
        let generation = options.generation;
        let digit = options.digit.unwrap_or_else(|| Digit::random(rng));

        let position = options.position.unwrap_or_else(|| {
            Vec2::new(
                rng.gen::<f32>() * world.x,
                rng.gen::<f32>() * world.y,
            )
        });
        let velocity = options.velocity.unwrap_or_else(|| {
            Vec2::new(
                (rng.gen::<f32>() - 0.5) * 0.5,
                (rng.gen::<f32>() - 0.5) * 0.5,
            )
        });

        let base_size = 12.0 + tier.level() as f32 * 2.0;
        let base_max_age = rng.gen_range(120_000.0..240_000.0);

        Self {
            id,
            digit,
            generation,
            tier,
            evolution_progress: 0.0,
            position,
            velocity,
            base_speed: rng.gen_range(0.3..0.6),
            wobble_offset: rng.gen::<f32>() * TAU,
            wobble_speed: rng.gen_range(0.015..0.03),
            pulse_offset: rng.gen::<f32>() * TAU,
            base_size,
            size: options.size.unwrap_or(base_size * 0.3),
            max_size: Self::max_size_for(base_size, generation, tier),
            opacity: 0.0,
            target_opacity: Self::target_opacity_for(tier),
            state: LifeState::Birth,
            age: 0.0,
            base_max_age,
            max_age: base_max_age * tier.life_multiplier(),
            energy: MAX_ENERGY,
            energy_decay_rate: Self::decay_rate_for(tier),
            collision_cooldown: 0.0,
            collision_count: 0,
            gravity_resist: tier.gravity_resist(),
            final_desperation: 0.0,
            modifiers: TickModifiers::default(),
            born_from_planet: options.born_from_planet,
            attach_delay_ms: options.attach_delay_ms,
            signals: Vec::new(),
        }
    }

    fn max_size_for(base_size: f32, generation: u32, tier: Tier) -> f32 {
        base_size + generation as f32 * 2.0 + tier.level() as f32 * 3.0
    }

    fn target_opacity_for(tier: Tier) -> f32 {
        0.7 + tier.level() as f32 * 0.05
    }

    fn decay_rate_for(tier: Tier) -> f32 {
        0.006 / (1.0 + tier.level() as f32 * 0.3)
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn state(&self) -> LifeState {
        self.state
    }

    pub fn is_mature(&self) -> bool {
        self.state == LifeState::Mature
    }

    pub fn is_dead(&self) -> bool {
        self.state == LifeState::Dead
    }

    /// Time spent in the current phase (ms)
    pub fn age(&self) -> f32 {
        self.age
    }

    pub fn max_age(&self) -> f32 {
        self.max_age
    }

    pub fn energy(&self) -> f32 {
        self.energy
    }

    pub fn collision_cooldown(&self) -> f32 {
        self.collision_cooldown
    }

    pub fn collision_count(&self) -> u32 {
        self.collision_count
    }

    pub fn gravity_resist(&self) -> f32 {
        self.gravity_resist
    }

    pub fn target_opacity(&self) -> f32 {
        self.target_opacity
    }

    /// Desperation when the firefly started dying (0 if it never matured)
    pub fn final_desperation(&self) -> f32 {
        self.final_desperation
    }

    /// Set energy, clamped to [0, 100]. No-op on a dead firefly.
    pub fn set_energy(&mut self, energy: f32) {
        if self.is_dead() {
            return;
        }
        self.energy = energy.clamp(0.0, MAX_ENERGY);
    }

    /// Add (or with a negative delta, drain) energy; returns the new level.
    pub fn add_energy(&mut self, delta: f32) -> f32 {
        self.set_energy(self.energy + delta);
        self.energy
    }

    /// Drain signals recorded since the last call
    pub fn take_signals(&mut self) -> Vec<FireflySignal> {
        std::mem::take(&mut self.signals)
    }

    pub fn has_signals(&self) -> bool {
        !self.signals.is_empty()
    }

    /// Advance one tick. `time_ms` is the ecosystem clock, `world` the
    /// wrap-around area.
    pub fn update(&mut self, delta_ms: f32, time_ms: f64, world: Vec2, rng: &mut impl Rng) {
        if self.is_dead() {
            return;
        }

        self.age += delta_ms * self.modifiers.time_dilation;

        if self.collision_cooldown > 0.0 {
            self.collision_cooldown = (self.collision_cooldown - delta_ms).max(0.0);
        }

        match self.state {
            LifeState::Birth => self.update_birth(),
            LifeState::Growing => self.update_growing(rng),
            LifeState::Mature => self.update_mature(time_ms, rng),
            LifeState::Dying => self.update_dying(),
            LifeState::Dead => {}
        }

        if self.is_dead() {
            return;
        }

        self.update_movement(time_ms, world, rng);
        self.update_energy(delta_ms);
    }

    fn update_birth(&mut self) {
        let progress = (self.age / BIRTH_DURATION_MS).min(1.0);
        let eased = ease_out_cubic(progress);

        // Start dim
        self.opacity = eased * self.target_opacity * 0.5;
        self.size = self.base_size * 0.3 + self.base_size * 0.3 * eased;

        if progress >= 1.0 {
            self.state = LifeState::Growing;
            self.age = 0.0;
        }
    }

    fn update_growing(&mut self, rng: &mut impl Rng) {
        let progress = (self.age / GROWTH_DURATION_MS).min(1.0);
        let eased = ease_in_out_quad(progress);

        self.opacity = (0.5 + 0.5 * eased) * self.target_opacity;
        self.size = self.base_size * 0.6 + (self.max_size - self.base_size * 0.6) * eased;

        if rng.gen_bool(0.0005) {
            self.digit = self.digit.flipped();
        }

        if progress >= 1.0 {
            self.state = LifeState::Mature;
            self.age = 0.0;
        }
    }

    fn update_mature(&mut self, time_ms: f64, rng: &mut impl Rng) {
        let desperation = self.desperation();

        // Heartbeat pulse, up to 5x faster when desperate
        let pulse_speed = 0.002 * (1.0 + desperation as f64 * 4.0);
        let pulse = (time_ms * pulse_speed + self.pulse_offset as f64).sin() as f32;
        let flicker = if desperation > 0.5 {
            rng.gen::<f32>() * 0.2 * desperation
        } else {
            0.0
        };
        self.opacity = self.target_opacity * (0.7 + 0.3 * pulse) + flicker;

        let flip_chance = 0.0003 + desperation as f64 * 0.003;
        if rng.gen_bool(flip_chance.min(1.0)) {
            self.digit = self.digit.flipped();
        }

        if desperation > 0.6 {
            let breathe = (time_ms * 0.008).sin() as f32 * desperation * 3.0;
            self.size = self.max_size + breathe;
        }

        if self.age > self.max_age || self.energy <= 0.0 {
            self.start_dying();
        }
    }

    fn update_dying(&mut self) {
        let progress = (self.age / DYING_DURATION_MS).min(1.0);

        self.opacity = self.target_opacity * (1.0 - progress);
        self.size *= 1.0 - progress * 0.3;

        if progress >= 1.0 {
            self.die();
        }
    }

    fn update_movement(&mut self, time_ms: f64, world: Vec2, rng: &mut impl Rng) {
        let t = time_ms * 0.001;
        let desperation = self.desperation();

        let speed_multiplier = (1.0 + desperation * 1.5) * self.modifiers.speed_multiplier;

        let wobble_intensity = 1.0 + desperation * 2.0;
        let phase = t * self.wobble_speed as f64 + self.wobble_offset as f64;
        let wobble_x = phase.sin() as f32 * 25.0 * wobble_intensity;
        let wobble_y = (t * self.wobble_speed as f64 * 0.8 + self.wobble_offset as f64).cos()
            as f32
            * 18.0
            * wobble_intensity;

        // Searching behavior: more frequent, stronger impulses when desperate
        let impulse_chance = 0.008 + desperation as f64 * 0.04;
        if rng.gen_bool(impulse_chance.min(1.0)) {
            let strength = 0.15 * (1.0 + desperation * 2.0);
            self.velocity.x += (rng.gen::<f32>() - 0.5) * strength;
            self.velocity.y += (rng.gen::<f32>() - 0.5) * strength;

            let max_speed = self.base_speed * speed_multiplier;
            let speed = self.velocity.length();
            if speed > max_speed {
                self.velocity = self.velocity * (max_speed / speed);
            }
        }

        self.position.x += (self.velocity.x + wobble_x * 0.02) * speed_multiplier;
        self.position.y += (self.velocity.y + wobble_y * 0.02) * speed_multiplier;

        if self.position.x < -WRAP_PADDING {
            self.position.x = world.x + WRAP_PADDING;
        }
        if self.position.x > world.x + WRAP_PADDING {
            self.position.x = -WRAP_PADDING;
        }
        if self.position.y < -WRAP_PADDING {
            self.position.y = world.y + WRAP_PADDING;
        }
        if self.position.y > world.y + WRAP_PADDING {
            self.position.y = -WRAP_PADDING;
        }
    }

    fn update_energy(&mut self, delta_ms: f32) {
        if self.state == LifeState::Mature {
            // Rate is tuned per 16 ms frame
            self.energy = (self.energy - self.energy_decay_rate * (delta_ms / 16.0)).max(0.0);
        }
    }

    /// End-of-life urgency in [0, 1]. Stays near 0 until roughly 30% of
    /// life or energy remains, then ramps sharply. Always 0 outside `Mature`.
    pub fn desperation(&self) -> f32 {
        if self.state != LifeState::Mature {
            return 0.0;
        }
        let age_remaining = (1.0 - self.age / self.max_age).max(0.0);
        let energy_remaining = self.energy / MAX_ENERGY;
        let life_force = age_remaining.min(energy_remaining);
        (1.0 - life_force).powf(2.5).min(1.0)
    }

    pub fn is_desperate(&self) -> bool {
        self.desperation() > 0.4
    }

    pub fn is_critical(&self) -> bool {
        self.desperation() > 0.75
    }

    /// Enter the fade-out phase. No-op once dying or dead.
    pub fn start_dying(&mut self) {
        if matches!(self.state, LifeState::Dying | LifeState::Dead) {
            return;
        }
        self.final_desperation = self.desperation();
        self.state = LifeState::Dying;
        self.age = 0.0;
    }

    /// Terminal transition. Records [`FireflySignal::Died`] exactly once;
    /// returns false if the firefly was already dead.
    pub fn die(&mut self) -> bool {
        if self.is_dead() {
            return false;
        }
        if self.state == LifeState::Mature {
            self.final_desperation = self.desperation();
        }
        self.state = LifeState::Dead;
        self.signals.push(FireflySignal::Died);
        true
    }

    /// Promote to the next tier if enough progress has accumulated.
    ///
    /// Resets progress and age, restores full energy and recomputes the
    /// tier-derived stats. The life-cycle state is left untouched. Returns
    /// false (and changes nothing) at the max tier, below threshold, or
    /// when dead.
    pub fn evolve(&mut self) -> bool {
        if self.is_dead() {
            return false;
        }
        let (Some(threshold), Some(next)) = (self.tier.evolve_threshold(), self.tier.next())
        else {
            return false;
        };
        if self.evolution_progress < threshold {
            return false;
        }

        let from = self.tier;
        self.tier = next;
        self.evolution_progress = 0.0;

        self.max_age = self.base_max_age * next.life_multiplier();
        self.gravity_resist = next.gravity_resist();
        self.energy_decay_rate = Self::decay_rate_for(next);
        self.target_opacity = Self::target_opacity_for(next);
        self.max_size = Self::max_size_for(self.base_size, self.generation, next);

        self.age = 0.0;
        self.energy = MAX_ENERGY;

        self.signals.push(FireflySignal::Evolved { from, to: next });
        true
    }

    /// Unclamped velocity addition. Several simultaneous sources can push a
    /// firefly well past its cruising speed; the next random impulse pulls
    /// it back under `base_speed`.
    pub fn apply_force(&mut self, fx: f32, fy: f32) {
        if self.is_dead() {
            return;
        }
        self.velocity.x += fx;
        self.velocity.y += fy;
    }

    pub fn distance_to(&self, other: &Firefly) -> f32 {
        self.position.distance(&other.position)
    }

    /// Run the remaining birth/growth transitions immediately. Only moves
    /// forward; returns false if the firefly is already past `Growing`.
    pub fn skip_to_mature(&mut self) -> bool {
        if self.state > LifeState::Growing {
            return false;
        }
        self.state = LifeState::Mature;
        self.age = 0.0;
        self.size = self.max_size;
        self.opacity = self.target_opacity;
        true
    }

    pub fn info(&self) -> FireflyInfo {
        FireflyInfo {
            id: self.id,
            digit: self.digit.as_u8(),
            state: self.state,
            tier: self.tier,
            generation: self.generation,
            age: self.age.round(),
            energy: self.energy.round(),
            collisions: self.collision_count,
            position: self.position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const WORLD: Vec2 = Vec2 { x: 800.0, y: 600.0 };

    fn spawn(rng: &mut ChaCha8Rng) -> Firefly {
        Firefly::new(FireflyId(1), SpawnOptions::at(400.0, 300.0), WORLD, rng)
    }

    #[test]
    fn test_new_firefly_defaults() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let f = spawn(&mut rng);
        assert_eq!(f.state(), LifeState::Birth);
        assert_eq!(f.energy(), 100.0);
        assert_eq!(f.tier(), Tier::Basic);
        assert!(f.max_age() >= 120_000.0 && f.max_age() < 240_000.0);
        assert!(f.modifiers.is_default());
    }

    #[test]
    fn test_life_cycle_moves_forward() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut f = spawn(&mut rng);
        let mut seen = vec![f.state()];

        // Tick 16 ms frames until mature
        for _ in 0..2_000 {
            f.update(16.0, 0.0, WORLD, &mut rng);
            if *seen.last().unwrap() != f.state() {
                seen.push(f.state());
            }
            if f.is_mature() {
                break;
            }
        }
        assert_eq!(seen, vec![LifeState::Birth, LifeState::Growing, LifeState::Mature]);

        f.set_energy(0.0);
        f.update(16.0, 0.0, WORLD, &mut rng);
        assert_eq!(f.state(), LifeState::Dying);

        for _ in 0..100 {
            f.update(16.0, 0.0, WORLD, &mut rng);
        }
        assert_eq!(f.state(), LifeState::Dead);
        assert_eq!(f.take_signals(), vec![FireflySignal::Died]);
    }

    #[test]
    fn test_die_signals_once() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut f = spawn(&mut rng);
        assert!(f.die());
        assert!(!f.die());
        assert_eq!(f.take_signals(), vec![FireflySignal::Died]);
        assert!(!f.has_signals());
    }

    #[test]
    fn test_dead_firefly_ignores_mutation() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut f = spawn(&mut rng);
        f.die();
        let before = f.position;
        f.update(16.0, 0.0, WORLD, &mut rng);
        f.apply_force(10.0, 10.0);
        f.set_energy(5.0);
        assert_eq!(f.position, before);
        assert_eq!(f.energy(), 100.0);
        assert!(!f.evolve());
    }

    #[test]
    fn test_energy_clamped() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut f = spawn(&mut rng);
        assert_eq!(f.add_energy(50.0), 100.0);
        assert_eq!(f.add_energy(-250.0), 0.0);
        f.set_energy(f32::MAX);
        assert_eq!(f.energy(), 100.0);
    }

    #[test]
    fn test_evolve_resets_age_keeps_state() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let mut f = spawn(&mut rng);
        f.skip_to_mature();
        f.age = 50_000.0;
        f.energy = 20.0;
        let old_max_age = f.max_age();

        f.evolution_progress = 2.9;
        assert!(!f.evolve());

        f.evolution_progress = 3.0;
        assert!(f.evolve());
        assert_eq!(f.tier(), Tier::Charged);
        assert_eq!(f.state(), LifeState::Mature);
        assert_eq!(f.age(), 0.0);
        assert_eq!(f.energy(), 100.0);
        assert_eq!(f.evolution_progress, 0.0);
        assert!((f.max_age() - old_max_age * 1.5).abs() < 0.01);
        assert_eq!(
            f.take_signals(),
            vec![FireflySignal::Evolved {
                from: Tier::Basic,
                to: Tier::Charged
            }]
        );
    }

    #[test]
    fn test_evolve_noop_at_max_tier() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut f = Firefly::new(
            FireflyId(9),
            SpawnOptions::default().with_tier(Tier::Ascended),
            WORLD,
            &mut rng,
        );
        f.skip_to_mature();
        f.evolution_progress = 1_000.0;
        f.age = 10.0;
        assert!(!f.evolve());
        assert_eq!(f.tier(), Tier::Ascended);
        assert_eq!(f.age(), 10.0);
        assert!(!f.has_signals());
    }

    #[test]
    fn test_desperation_curve() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut f = spawn(&mut rng);
        assert_eq!(f.desperation(), 0.0);

        f.skip_to_mature();
        assert!(f.desperation() < 0.001);

        f.energy = 70.0;
        assert!(f.desperation() < 0.06);

        f.energy = 10.0;
        assert!(f.desperation() > 0.75);
        assert!(f.is_critical());

        f.energy = 0.0;
        assert_eq!(f.desperation(), 1.0);
    }

    #[test]
    fn test_time_dilation_slows_aging() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut f = spawn(&mut rng);
        f.skip_to_mature();
        f.modifiers.time_dilation = 0.4;
        f.update(100.0, 0.0, WORLD, &mut rng);
        assert!((f.age() - 40.0).abs() < 0.001);
    }

    #[test]
    fn test_apply_force_unclamped() {
        let mut rng = ChaCha8Rng::seed_from_u64(10);
        let mut f = spawn(&mut rng);
        f.velocity = Vec2::ZERO;
        f.apply_force(30.0, 0.0);
        f.apply_force(30.0, 0.0);
        assert_eq!(f.velocity.x, 60.0);
    }

    #[test]
    fn test_position_wraps() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut f = spawn(&mut rng);
        f.position = Vec2::new(-60.0, 300.0);
        f.velocity = Vec2::ZERO;
        f.update(16.0, 0.0, WORLD, &mut rng);
        assert!(f.position.x > WORLD.x);
    }
}
