//! Cooperative scheduling primitives.
//!
//! The host owns the real tick source (an animation frame callback, a game
//! loop, a test). Each subsystem keeps a [`FrameClock`] that turns host
//! timestamps into deltas and can be stopped, and a [`TimerQueue`] of
//! one-shot actions that fire on a later tick.

use serde::{Deserialize, Serialize};

/// Delta assumed for the first frame after `start()`, in milliseconds
pub const FIRST_FRAME_DELTA_MS: f32 = 16.0;

/// Start/stop state plus the last host timestamp seen
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameClock {
    running: bool,
    last_time: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when already running.
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        self.last_time = None;
        true
    }

    /// Cancels the scheduled tick. Safe to call any number of times.
    pub fn stop(&mut self) {
        self.running = false;
        self.last_time = None;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Delta in ms since the previous frame, or `None` while stopped.
    pub fn advance(&mut self, timestamp_ms: f64) -> Option<f32> {
        if !self.running {
            return None;
        }
        let delta = match self.last_time {
            Some(last) => (timestamp_ms - last).max(0.0) as f32,
            None => FIRST_FRAME_DELTA_MS,
        };
        self.last_time = Some(timestamp_ms);
        Some(delta)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Scheduled<T> {
    due_ms: f64,
    seq: u64,
    action: T,
}

/// One-shot actions due at a simulation time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerQueue<T> {
    entries: Vec<Scheduled<T>>,
    next_seq: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_seq: 0,
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due_ms: f64, action: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Scheduled { due_ms, seq, action });
    }

    /// Remove and return every action due at or before `now_ms`, in the
    /// order they fall due (ties in scheduling order).
    pub fn take_due(&mut self, now_ms: f64) -> Vec<T> {
        let mut due = Vec::new();
        let mut i = 0;
        while i < self.entries.len() {
            if self.entries[i].due_ms <= now_ms {
                due.push(self.entries.swap_remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by(|a, b| {
            a.due_ms
                .partial_cmp(&b.due_ms)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.seq.cmp(&b.seq))
        });
        due.into_iter().map(|s| s.action).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Pending actions in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|s| &s.action)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
