//! Binary collision rules between two mature fireflies.

use serde::{Deserialize, Serialize};

use super::{Firefly, LifeState, COLLISION_COOLDOWN_MS, COLLISION_ENERGY_BOOST};
use crate::common::Digit;

/// Result of a collision check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollisionOutcome {
    /// Not both mature, or one is cooling down. Nothing changed.
    None,
    /// 1 + 1 = 0: both digits become 0
    Overflow,
    /// 0 + 0 = 1: both digits become 1
    Quantum,
    /// 0 + 1 in either order: no digit change, both gain energy
    Merge,
}

impl CollisionOutcome {
    pub fn is_reaction(self) -> bool {
        self != CollisionOutcome::None
    }

    pub fn name(self) -> &'static str {
        match self {
            CollisionOutcome::None => "none",
            CollisionOutcome::Overflow => "overflow",
            CollisionOutcome::Quantum => "quantum",
            CollisionOutcome::Merge => "merge",
        }
    }

    /// Pure rule table: the digits both parties end up with, if any change.
    pub fn for_digits(a: Digit, b: Digit) -> CollisionOutcome {
        match (a, b) {
            (Digit::One, Digit::One) => CollisionOutcome::Overflow,
            (Digit::Zero, Digit::Zero) => CollisionOutcome::Quantum,
            (Digit::Zero, Digit::One) | (Digit::One, Digit::Zero) => CollisionOutcome::Merge,
        }
    }
}

impl Firefly {
    pub fn can_collide(&self) -> bool {
        self.state == LifeState::Mature && self.collision_cooldown <= 0.0
    }

    /// React with `other`. Both must be mature and off cooldown, otherwise
    /// this returns [`CollisionOutcome::None`] and touches nothing.
    ///
    /// A reaction resets both cooldowns, counts the collision, adds one unit
    /// of evolution progress (times each party's pending one-shot multiplier,
    /// which is consumed) and checks both for evolution.
    pub fn handle_collision(&mut self, other: &mut Firefly) -> CollisionOutcome {
        if !self.can_collide() || !other.can_collide() {
            return CollisionOutcome::None;
        }

        let outcome = CollisionOutcome::for_digits(self.digit, other.digit);
        match outcome {
            CollisionOutcome::Overflow => {
                self.digit = Digit::Zero;
                other.digit = Digit::Zero;
            }
            CollisionOutcome::Quantum => {
                self.digit = Digit::One;
                other.digit = Digit::One;
            }
            CollisionOutcome::Merge => {
                self.add_energy(COLLISION_ENERGY_BOOST);
                other.add_energy(COLLISION_ENERGY_BOOST);
            }
            CollisionOutcome::None => {}
        }

        for firefly in [&mut *self, &mut *other] {
            firefly.collision_cooldown = COLLISION_COOLDOWN_MS;
            firefly.collision_count += 1;
            firefly.evolution_progress += firefly.modifiers.take_evolution_multiplier();
            firefly.evolve();
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{FireflyId, Vec2};
    use crate::firefly::{FireflySignal, SpawnOptions, Tier};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn mature(id: u64, digit: Digit, rng: &mut ChaCha8Rng) -> Firefly {
        let mut f = Firefly::new(
            FireflyId(id),
            SpawnOptions::at(100.0, 100.0).with_digit(digit),
            Vec2::new(800.0, 600.0),
            rng,
        );
        f.skip_to_mature();
        f
    }

    #[test]
    fn test_rule_table() {
        use CollisionOutcome::*;
        assert_eq!(CollisionOutcome::for_digits(Digit::One, Digit::One), Overflow);
        assert_eq!(CollisionOutcome::for_digits(Digit::Zero, Digit::Zero), Quantum);
        assert_eq!(CollisionOutcome::for_digits(Digit::Zero, Digit::One), Merge);
        assert_eq!(CollisionOutcome::for_digits(Digit::One, Digit::Zero), Merge);
    }

    #[test]
    fn test_overflow_collision() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut a = mature(1, Digit::One, &mut rng);
        let mut b = mature(2, Digit::One, &mut rng);

        assert_eq!(a.handle_collision(&mut b), CollisionOutcome::Overflow);
        assert_eq!(a.digit, Digit::Zero);
        assert_eq!(b.digit, Digit::Zero);
        assert_eq!(a.collision_cooldown(), COLLISION_COOLDOWN_MS);
        assert_eq!(b.collision_cooldown(), COLLISION_COOLDOWN_MS);
        assert_eq!(a.collision_count(), 1);
        assert_eq!(a.evolution_progress, 1.0);
    }

    #[test]
    fn test_merge_is_symmetric() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        for (da, db) in [(Digit::Zero, Digit::One), (Digit::One, Digit::Zero)] {
            let mut a = mature(1, da, &mut rng);
            let mut b = mature(2, db, &mut rng);
            a.set_energy(40.0);
            b.set_energy(80.0);

            assert_eq!(a.handle_collision(&mut b), CollisionOutcome::Merge);
            assert_eq!(a.digit, da);
            assert_eq!(b.digit, db);
            assert_eq!(a.energy(), 75.0);
            assert_eq!(b.energy(), 100.0);
        }
    }

    #[test]
    fn test_cooldown_blocks_collision() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut a = mature(1, Digit::Zero, &mut rng);
        let mut b = mature(2, Digit::Zero, &mut rng);

        assert_eq!(a.handle_collision(&mut b), CollisionOutcome::Quantum);
        assert_eq!(a.handle_collision(&mut b), CollisionOutcome::None);
        assert_eq!(a.digit, Digit::One);
        assert_eq!(a.collision_count(), 1);
    }

    #[test]
    fn test_immature_does_not_collide() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut a = Firefly::new(
            FireflyId(1),
            SpawnOptions::default().with_digit(Digit::One),
            Vec2::new(800.0, 600.0),
            &mut rng,
        );
        let mut b = mature(2, Digit::One, &mut rng);
        assert_eq!(a.handle_collision(&mut b), CollisionOutcome::None);
        assert_eq!(b.digit, Digit::One);
        assert_eq!(b.collision_count(), 0);
    }

    #[test]
    fn test_multiplier_consumed_and_triggers_evolution() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut a = mature(1, Digit::One, &mut rng);
        let mut b = mature(2, Digit::Zero, &mut rng);
        a.evolution_progress = 1.5;
        a.modifiers.evolution_multiplier = Some(2.0);

        a.handle_collision(&mut b);
        assert_eq!(a.tier(), Tier::Charged);
        assert_eq!(a.modifiers.evolution_multiplier, None);
        assert_eq!(b.evolution_progress, 1.0);
        assert!(a
            .take_signals()
            .contains(&FireflySignal::Evolved { from: Tier::Basic, to: Tier::Charged }));
    }
}
