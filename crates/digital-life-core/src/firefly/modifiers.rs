//! Per-tick modifiers granted by planets.
//!
//! Every field decays to its default unless a planet renews it during the
//! current tick. The ecosystem calls [`TickModifiers::reset`] on every
//! firefly at the start of the planet phase, before any planet re-grants.

use serde::{Deserialize, Serialize};

use crate::common::PlanetId;

/// Which planet power is currently acting on a firefly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Element {
    /// Null World: ages slower
    TimeDilation,
    /// Unity Sphere: moves faster and glows brighter
    Energize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickModifiers {
    /// Scale applied to aging (< 1 slows it)
    pub time_dilation: f32,
    /// Scale applied to movement speed
    pub speed_multiplier: f32,
    /// Scale applied to glow intensity
    pub brightness_boost: f32,
    /// One-shot multiplier for the next collision's evolution progress
    pub evolution_multiplier: Option<f32>,
    /// Elemental power in effect, for presentation
    pub element: Option<Element>,
    /// Planet whose gravity well the firefly is in
    pub near_planet: Option<PlanetId>,
}

impl Default for TickModifiers {
    fn default() -> Self {
        Self {
            time_dilation: 1.0,
            speed_multiplier: 1.0,
            brightness_boost: 1.0,
            evolution_multiplier: None,
            element: None,
            near_planet: None,
        }
    }
}

impl TickModifiers {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Consume the pending evolution multiplier (1.0 when none).
    pub fn take_evolution_multiplier(&mut self) -> f32 {
        self.evolution_multiplier.take().unwrap_or(1.0)
    }

    /// Multiply into the pending evolution multiplier, starting from 1.0.
    pub fn stack_evolution_multiplier(&mut self, factor: f32) {
        let current = self.evolution_multiplier.unwrap_or(1.0);
        self.evolution_multiplier = Some(current * factor);
    }
}
