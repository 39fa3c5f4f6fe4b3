//! Terraform: an environment-wide effect derived each tick from the census
//! of mature planets. Never stored independently of that census.

use serde::{Deserialize, Serialize};

use crate::common::Digit;
use crate::planet::Planet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DominantType {
    Null,
    Unity,
    Balanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Terraform {
    pub active: bool,
    /// 0 with fewer than the minimum planets, reaching 1 at four
    pub intensity: f32,
    pub dominant: Option<DominantType>,
    /// 0 = all Null Worlds, 1 = all Unity Spheres
    pub dominance_ratio: f32,
    /// Passive energy per second granted to mature fireflies
    pub energy_regen_boost: f32,
}

impl Default for Terraform {
    fn default() -> Self {
        Self {
            active: false,
            intensity: 0.0,
            dominant: None,
            dominance_ratio: 0.5,
            energy_regen_boost: 0.0,
        }
    }
}

impl Terraform {
    pub fn from_census(planets: &[Planet], min_planets: usize) -> Self {
        let mut nulls = 0usize;
        let mut unities = 0usize;
        for planet in planets.iter().filter(|p| p.is_mature() && !p.is_dead()) {
            match planet.digit() {
                Digit::Zero => nulls += 1,
                Digit::One => unities += 1,
            }
        }
        let count = nulls + unities;
        if count == 0 || count < min_planets {
            return Self::default();
        }

        let intensity = ((count as f32 - 1.0) / 3.0).min(1.0);
        let dominant = match nulls.cmp(&unities) {
            std::cmp::Ordering::Greater => DominantType::Null,
            std::cmp::Ordering::Less => DominantType::Unity,
            std::cmp::Ordering::Equal => DominantType::Balanced,
        };
        Self {
            active: true,
            intensity,
            dominant: Some(dominant),
            dominance_ratio: unities as f32 / count as f32,
            energy_regen_boost: 0.05 + intensity * 0.1,
        }
    }

    /// Energy to grant a mature firefly for this tick
    pub fn regen_for(&self, delta_ms: f32) -> f32 {
        self.energy_regen_boost * (delta_ms / 1000.0)
    }
}
