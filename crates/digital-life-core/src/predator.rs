//! The predator collaborator ("black hole").
//!
//! The ecosystem only knows this interface. An implementation pulls
//! fireflies toward itself, decides when one is consumed and notifies the
//! handlers registered through [`Predator::on_consume`] and
//! [`Predator::on_ascended_sacrifice`]. Consuming an ascended firefly is how
//! a new planet is born.

use serde::{Deserialize, Serialize};

use crate::common::{Digit, FireflyId, Force, Vec2};
use crate::firefly::{Firefly, Tier};
use crate::planet::Planet;

/// What a predator reports when it consumes a firefly
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Consumption {
    pub firefly: FireflyId,
    pub digit: Digit,
    pub tier: Tier,
    /// Where the firefly was consumed
    pub at: Vec2,
    /// Predator position at the time
    pub predator_at: Vec2,
}

impl Consumption {
    pub fn new(firefly: &Firefly, predator_at: Vec2) -> Self {
        Self {
            firefly: firefly.id,
            digit: firefly.digit,
            tier: firefly.tier(),
            at: firefly.position,
            predator_at,
        }
    }

    pub fn is_ascended_sacrifice(&self) -> bool {
        self.tier == Tier::Ascended
    }
}

pub type ConsumeHandler = Box<dyn FnMut(&Consumption)>;

pub trait Predator {
    fn position(&self) -> Vec2;

    fn is_active(&self) -> bool {
        true
    }

    /// Advance internal state once per tick, before gravity is applied.
    fn update(&mut self, _delta_ms: f32, _planets: &[Planet]) {}

    /// Pull on `firefly`, or `None` when out of range.
    fn calculate_gravity(&self, firefly: &Firefly) -> Option<Force>;

    /// True if `firefly` crossed the event horizon. Implementations notify
    /// their registered handlers before returning true.
    fn check_consumption(&mut self, firefly: &Firefly) -> bool;

    /// Called for every consumption, ascended or not
    fn on_consume(&mut self, handler: ConsumeHandler);

    /// Called when an ascended firefly is consumed
    fn on_ascended_sacrifice(&mut self, handler: ConsumeHandler);

    /// Scale applied on top of the predator's own gravity strength
    fn set_gravity_multiplier(&mut self, multiplier: f32);

    fn add_mass(&mut self, _amount: f32) {}
}

/// Handler bookkeeping for predator implementations
#[derive(Default)]
pub struct PredatorHandlers {
    consume: Vec<ConsumeHandler>,
    ascended: Vec<ConsumeHandler>,
}

impl PredatorHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_consume(&mut self, handler: ConsumeHandler) {
        self.consume.push(handler);
    }

    pub fn add_ascended(&mut self, handler: ConsumeHandler) {
        self.ascended.push(handler);
    }

    /// Notify ascended-sacrifice handlers first (when applicable), then the
    /// general consume handlers.
    pub fn notify(&mut self, consumption: &Consumption) {
        if consumption.is_ascended_sacrifice() {
            for handler in &mut self.ascended {
                handler(consumption);
            }
        }
        for handler in &mut self.consume {
            handler(consumption);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.consume.is_empty() && self.ascended.is_empty()
    }
}

impl std::fmt::Debug for PredatorHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredatorHandlers")
            .field("consume", &self.consume.len())
            .field("ascended", &self.ascended.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn consumption(tier: Tier) -> Consumption {
        Consumption {
            firefly: FireflyId(1),
            digit: Digit::One,
            tier,
            at: Vec2::ZERO,
            predator_at: Vec2::ZERO,
        }
    }

    #[test]
    fn test_handlers_dispatch_by_tier() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut handlers = PredatorHandlers::new();
        assert!(handlers.is_empty());

        let consume_log = Rc::clone(&log);
        handlers.add_consume(Box::new(move |c| consume_log.borrow_mut().push(("consume", c.tier))));
        let ascended_log = Rc::clone(&log);
        handlers.add_ascended(Box::new(move |c| ascended_log.borrow_mut().push(("ascended", c.tier))));

        handlers.notify(&consumption(Tier::Radiant));
        handlers.notify(&consumption(Tier::Ascended));

        assert_eq!(
            *log.borrow(),
            vec![
                ("consume", Tier::Radiant),
                ("ascended", Tier::Ascended),
                ("consume", Tier::Ascended),
            ]
        );
    }
}
