//! Digital Life Core - an ambient simulation of binary fireflies.
//!
//! Fireflies carrying a single bit are born, drift, collide under binary
//! arithmetic (1 + 1 = 0, 0 + 0 = 1), evolve through tiers and die. A
//! population controller keeps them between a floor and a ceiling. Ascended
//! fireflies sacrificed to an external predator become planets, which orbit,
//! heal, pull and spawn new fireflies until they grow old and collapse.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`common`] | 2D vectors, forces, entity ids, the binary digit |
//! | [`config`] | Ecosystem configuration, defaults and validation |
//! | [`error`] | Config and snapshot errors |
//! | [`clock`] | Host-driven frame clock and one-shot timers |
//! | [`firefly`] | Firefly lifecycle, tiers, collisions, per-tick modifiers |
//! | [`planet`] | Planets, resource particles, echo, moons, volcano |
//! | [`predator`] | The predator collaborator interface |
//! | [`ecosystem`] | The aggregate root and its seven-phase tick |
//! | [`particles`] | Event-driven glyph particle effects |
//! | [`presentation`] | Rendering surface boundary and style projection |
//! | [`persistence`] | Versioned snapshot save/load |
//!
//! # Example
//!
//! ```rust,no_run
//! use digital_life_core::prelude::*;
//!
//! let mut eco = Ecosystem::new(EcosystemConfig::default()).unwrap();
//! eco.init();
//!
//! let mut particles = ParticleSystem::default();
//! loop {
//!     eco.tick(16.0);
//!     for event in eco.drain_events() {
//!         particles.consume(&event);
//!     }
//!     particles.update(16.0);
//! }
//! ```

pub mod clock;
pub mod common;
pub mod config;
pub mod ecosystem;
pub mod error;
pub mod firefly;
pub mod particles;
pub mod persistence;
pub mod planet;
pub mod predator;
pub mod presentation;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::common::{Digit, FireflyId, Force, PlanetId, Vec2};
    pub use crate::config::{EcosystemConfig, PlanetFeatures};
    pub use crate::ecosystem::{Ecosystem, EcosystemEvent, ListenerId, Stats, Terraform};
    pub use crate::error::{ConfigError, SaveError};
    pub use crate::firefly::{CollisionOutcome, Firefly, LifeState, SpawnOptions, Tier};
    pub use crate::particles::ParticleSystem;
    pub use crate::planet::{Planet, PlanetKind};
    pub use crate::predator::{ConsumeHandler, Consumption, Predator, PredatorHandlers};
    pub use crate::presentation::{Stage, Style, Surface};
}
