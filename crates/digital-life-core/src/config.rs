//! Construction-time configuration for an [`Ecosystem`](crate::ecosystem::Ecosystem).
//!
//! Plain numeric/boolean options with documented defaults. There is no
//! runtime-reconfiguration contract beyond the public fields.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Optional planet behaviors. Each shares the planet lifecycle but none of
/// the gravity/healing/evolution contract, so any can be switched off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanetFeatures {
    /// Planets occasionally gain orbiting moons
    pub moons: bool,
    /// Planets build volcanic pressure and erupt energy particles
    pub volcanic: bool,
    /// Planets reaching the end of their dying phase strengthen the predator
    pub collapse_to_predator: bool,
}

impl Default for PlanetFeatures {
    fn default() -> Self {
        Self {
            moons: true,
            volcanic: true,
            collapse_to_predator: true,
        }
    }
}

impl PlanetFeatures {
    /// Only the core planet contract: no moons, no eruptions, plain death
    pub fn none() -> Self {
        Self {
            moons: false,
            volcanic: false,
            collapse_to_predator: false,
        }
    }
}

/// Population and capacity settings for an ecosystem
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EcosystemConfig {
    /// Fireflies spawned by `init()`
    pub initial_population: usize,
    /// Population floor; below it the ecosystem respawns
    pub min_population: usize,
    /// Population ceiling; `spawn_firefly` refuses beyond it
    pub max_population: usize,
    /// Base chance per tick to spawn when under the floor
    pub spawn_rate: f64,
    /// Distance under which two fireflies collide
    pub collision_radius: f32,
    /// Hard cap on live planets (oldest recycled on overflow)
    pub max_planets: usize,
    /// Age after which an over-cap planet is considered stale
    pub planet_cleanup_age_ms: f32,
    /// Mature planets needed before terraforming kicks in
    pub min_planets_for_terraform: usize,
    /// Chance per tick to refresh the statistics snapshot
    pub stats_sample_chance: f64,
    /// Width of the wrap-around world in pixels
    pub world_width: f32,
    /// Height of the wrap-around world in pixels
    pub world_height: f32,
    /// Seed for the ecosystem's random source; `None` draws one
    pub seed: Option<u64>,
    /// Optional planet behaviors
    pub planet_features: PlanetFeatures,
}

impl Default for EcosystemConfig {
    fn default() -> Self {
        Self {
            initial_population: 20,
            min_population: 10,
            max_population: 50,
            spawn_rate: 0.02,
            collision_radius: 25.0,
            max_planets: 5,
            planet_cleanup_age_ms: 180_000.0,
            min_planets_for_terraform: 2,
            stats_sample_chance: 0.033,
            world_width: 800.0,
            world_height: 600.0,
            seed: None,
            planet_features: PlanetFeatures::default(),
        }
    }
}

impl EcosystemConfig {
    /// Parse a JSON config; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EcosystemConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check the contract every other component relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.collision_radius.is_finite() || self.collision_radius < 0.0 {
            return Err(ConfigError::InvalidRadius {
                field: "collision_radius",
                value: self.collision_radius,
            });
        }
        if !self.planet_cleanup_age_ms.is_finite() || self.planet_cleanup_age_ms < 0.0 {
            return Err(ConfigError::InvalidRadius {
                field: "planet_cleanup_age_ms",
                value: self.planet_cleanup_age_ms,
            });
        }
        if self.min_population > self.max_population {
            return Err(ConfigError::PopulationBounds {
                min: self.min_population,
                max: self.max_population,
            });
        }
        if self.max_planets == 0 {
            return Err(ConfigError::ZeroPlanetCap);
        }
        for (field, value) in [
            ("spawn_rate", self.spawn_rate),
            ("stats_sample_chance", self.stats_sample_chance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidProbability { field, value });
            }
        }
        if !(self.world_width > 0.0 && self.world_height > 0.0) {
            return Err(ConfigError::InvalidWorldSize {
                width: self.world_width,
                height: self.world_height,
            });
        }
        Ok(())
    }
}
