//! Observable ecosystem events.
//!
//! Listeners registered with [`Ecosystem::subscribe`](super::Ecosystem::subscribe)
//! are called synchronously as events happen. Every event is also kept in a
//! bounded buffer for hosts that prefer polling with `drain_events`.
//! Neither path can affect simulation state.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::Stats;
use crate::common::{Digit, FireflyId, PlanetId, Vec2};
use crate::firefly::{CollisionOutcome, Tier};
use crate::planet::{MoonKind, PlanetKind};
use crate::predator::Consumption;

/// Oldest events are dropped beyond this many undrained events
pub const EVENT_BUFFER_CAPACITY: usize = 4096;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EcosystemEvent {
    FireflyBorn {
        id: FireflyId,
        digit: Digit,
        at: Vec2,
        from_planet: Option<PlanetId>,
    },
    FireflyDied {
        id: FireflyId,
        digit: Digit,
        tier: Tier,
        generation: u32,
        desperation: f32,
        at: Vec2,
    },
    Collision {
        a: FireflyId,
        b: FireflyId,
        outcome: CollisionOutcome,
        at: Vec2,
    },
    Evolved {
        id: FireflyId,
        from: Tier,
        to: Tier,
        at: Vec2,
    },
    PlanetBorn {
        id: PlanetId,
        kind: PlanetKind,
        /// Orbit center (the predator's position for a sacrifice)
        at: Vec2,
    },
    PlanetDied {
        id: PlanetId,
        kind: PlanetKind,
        at: Vec2,
        /// Removed to make room under the planet cap
        recycled: bool,
    },
    PlanetCollapsed {
        id: PlanetId,
        kind: PlanetKind,
        at: Vec2,
    },
    PlanetErupted {
        id: PlanetId,
        kind: PlanetKind,
        at: Vec2,
    },
    MoonBorn {
        planet: PlanetId,
        kind: MoonKind,
    },
    Consumed(Consumption),
    StatsRefreshed(Stats),
}

impl EcosystemEvent {
    pub fn name(&self) -> &'static str {
        match self {
            EcosystemEvent::FireflyBorn { .. } => "firefly_born",
            EcosystemEvent::FireflyDied { .. } => "firefly_died",
            EcosystemEvent::Collision { .. } => "collision",
            EcosystemEvent::Evolved { .. } => "evolved",
            EcosystemEvent::PlanetBorn { .. } => "planet_born",
            EcosystemEvent::PlanetDied { .. } => "planet_died",
            EcosystemEvent::PlanetCollapsed { .. } => "planet_collapsed",
            EcosystemEvent::PlanetErupted { .. } => "planet_erupted",
            EcosystemEvent::MoonBorn { .. } => "moon_born",
            EcosystemEvent::Consumed(_) => "consumed",
            EcosystemEvent::StatsRefreshed(_) => "stats_refreshed",
        }
    }
}

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub type Listener = Box<dyn FnMut(&EcosystemEvent)>;

/// Registered listeners plus the polling buffer
#[derive(Default)]
pub struct EventLog {
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
    buffer: VecDeque<EcosystemEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Returns false if the listener was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn emit(&mut self, event: EcosystemEvent) {
        for (_, listener) in &mut self.listeners {
            listener(&event);
        }
        if self.buffer.len() >= EVENT_BUFFER_CAPACITY {
            if let Some(dropped) = self.buffer.pop_front() {
                log::debug!("Event buffer full, dropping oldest {} event", dropped.name());
            }
        }
        self.buffer.push_back(event);
    }

    pub fn drain(&mut self) -> Vec<EcosystemEvent> {
        self.buffer.drain(..).collect()
    }

    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog")
            .field("listeners", &self.listeners.len())
            .field("buffered", &self.buffer.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn born(id: u64) -> EcosystemEvent {
        EcosystemEvent::FireflyBorn {
            id: FireflyId(id),
            digit: Digit::One,
            at: Vec2::ZERO,
            from_planet: None,
        }
    }

    #[test]
    fn test_listeners_and_unsubscribe() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut log = EventLog::new();
        let sink = Rc::clone(&seen);
        let id = log.subscribe(Box::new(move |e| sink.borrow_mut().push(e.name())));

        log.emit(born(1));
        assert!(log.unsubscribe(id));
        assert!(!log.unsubscribe(id));
        log.emit(born(2));

        assert_eq!(*seen.borrow(), vec!["firefly_born"]);
        assert_eq!(log.drain().len(), 2);
        assert_eq!(log.pending(), 0);
    }

    #[test]
    fn test_buffer_bounded() {
        let mut log = EventLog::new();
        for i in 0..(EVENT_BUFFER_CAPACITY as u64 + 10) {
            log.emit(born(i));
        }
        let events = log.drain();
        assert_eq!(events.len(), EVENT_BUFFER_CAPACITY);
        assert_eq!(events[0], born(10));
    }
}
