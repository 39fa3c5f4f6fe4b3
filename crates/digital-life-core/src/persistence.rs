//! Save/load of a whole ecosystem.
//!
//! A versioned bincode snapshot of the simulation state: config, clock,
//! counters, random source, entities and pending one-shot actions.
//! Listeners and the predator are runtime wiring and are re-attached by the
//! host after loading.

use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use crate::clock::TimerQueue;
use crate::common::{FireflyId, PlanetId};
use crate::config::EcosystemConfig;
use crate::ecosystem::{Ecosystem, ScheduledAction, Stats};
use crate::error::SaveError;
use crate::firefly::Firefly;
use crate::planet::Planet;

/// Bump when the snapshot layout changes
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Snapshot {
    pub version: u32,
    pub config: EcosystemConfig,
    /// Whether the frame clock was running
    pub running: bool,
    pub now_ms: f64,
    pub stats: Stats,
    pub next_firefly_id: u64,
    pub next_planet_id: u64,
    pub rng: ChaCha8Rng,
    pub fireflies: Vec<Firefly>,
    pub planets: Vec<Planet>,
    pub pending_removals: Vec<FireflyId>,
    pub pending_planet_removals: Vec<PlanetId>,
    pub timers: TimerQueue<ScheduledAction>,
    pub predator_gravity_boost: f32,
}

impl Ecosystem {
    /// Write a snapshot of the current state.
    pub fn save<W: Write>(&self, writer: W) -> Result<(), SaveError> {
        let snapshot = self.snapshot();
        bincode::serialize_into(writer, &snapshot)?;
        Ok(())
    }

    /// Restore an ecosystem from a snapshot written by [`Ecosystem::save`].
    /// The result has no listeners and no predator attached.
    pub fn load<R: Read>(reader: R) -> Result<Self, SaveError> {
        let snapshot: Snapshot = bincode::deserialize_from(reader)?;
        if snapshot.version != SNAPSHOT_VERSION {
            log::warn!(
                "Refusing snapshot version {} (expected {})",
                snapshot.version,
                SNAPSHOT_VERSION
            );
            return Err(SaveError::VersionMismatch {
                expected: SNAPSHOT_VERSION,
                found: snapshot.version,
            });
        }
        snapshot.config.validate()?;
        let ecosystem = Ecosystem::from_snapshot(snapshot);
        log::info!(
            "Loaded ecosystem: {} fireflies, {} planets at {:.0} ms",
            ecosystem.firefly_count(),
            ecosystem.planet_count(),
            ecosystem.now_ms()
        );
        Ok(ecosystem)
    }
}
