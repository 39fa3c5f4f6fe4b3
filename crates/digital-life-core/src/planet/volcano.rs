//! Volcanic pressure: builds while the planet is mature, erupts a burst of
//! high-value energy particles, then cools down.

use serde::{Deserialize, Serialize};

const BUILD_UP_PER_MS: f32 = 0.000_05;
const ERUPTION_THRESHOLD: f32 = 0.8;
const ERUPTION_MS: f32 = 3_000.0;
const COOLDOWN_MS: f32 = 30_000.0;
pub const PARTICLES_PER_ERUPTION: u32 = 12;
/// Spacing between particles of one eruption
const EMIT_INTERVAL_MS: f32 = 100.0;

/// What one volcano update produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VolcanoOutput {
    pub erupted: bool,
    pub particles: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Volcano {
    pub active: bool,
    /// Pressure in [0, threshold]
    pub intensity: f32,
    eruption_timer: f32,
    cooldown_timer: f32,
    queued: u32,
    emit_timer: f32,
}

impl Volcano {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cooling(&self) -> bool {
        self.cooldown_timer > 0.0
    }

    pub fn update(&mut self, delta_ms: f32, planet_mature: bool) -> VolcanoOutput {
        let mut out = VolcanoOutput {
            particles: self.release_queued(delta_ms),
            ..Default::default()
        };

        if !planet_mature {
            return out;
        }

        if self.cooldown_timer > 0.0 {
            self.cooldown_timer -= delta_ms;
            self.intensity = 0.0;
            return out;
        }

        if self.active {
            self.eruption_timer -= delta_ms;
            if self.eruption_timer <= 0.0 {
                self.active = false;
                self.intensity = 0.0;
                self.cooldown_timer = COOLDOWN_MS;
            }
            return out;
        }

        self.intensity += BUILD_UP_PER_MS * delta_ms;
        if self.intensity >= ERUPTION_THRESHOLD {
            self.active = true;
            self.eruption_timer = ERUPTION_MS;
            self.queued = PARTICLES_PER_ERUPTION;
            self.emit_timer = 0.0;
            out.erupted = true;
            // First particle leaves immediately
            out.particles += self.release_queued(0.0);
        }
        out
    }

    fn release_queued(&mut self, delta_ms: f32) -> u32 {
        if self.queued == 0 {
            return 0;
        }
        self.emit_timer -= delta_ms;
        let mut released = 0;
        while self.queued > 0 && self.emit_timer <= 0.0 {
            self.queued -= 1;
            self.emit_timer += EMIT_INTERVAL_MS;
            released += 1;
        }
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_pressure_while_young() {
        let mut v = Volcano::new();
        v.update(100_000.0, false);
        assert_eq!(v.intensity, 0.0);
    }

    #[test]
    fn test_eruption_cycle() {
        let mut v = Volcano::new();
        let mut erupted = 0;
        let mut particles = 0;
        // 0.8 / 0.00005 = 16 s to build
        for _ in 0..1_100 {
            let out = v.update(16.0, true);
            if out.erupted {
                erupted += 1;
            }
            particles += out.particles;
        }
        assert_eq!(erupted, 1);
        assert_eq!(particles, PARTICLES_PER_ERUPTION);

        // Eruption ends within 3 s and the cooldown starts
        for _ in 0..200 {
            v.update(16.0, true);
        }
        assert!(!v.active);
        assert!(v.is_cooling());
        assert_eq!(v.intensity, 0.0);
    }
}
