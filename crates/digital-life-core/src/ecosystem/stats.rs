//! Running counters and the sampled population snapshot.

use serde::{Deserialize, Serialize};

use crate::firefly::{CollisionOutcome, Firefly};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub total_births: u64,
    pub total_deaths: u64,
    pub total_collisions: u64,
    /// 1 + 1 = 0
    pub overflow_collisions: u64,
    /// 0 + 0 = 1
    pub quantum_collisions: u64,
    /// 0 + 1
    pub merge_collisions: u64,
    pub total_evolutions: u64,
    pub planets_created: u64,
    pub planets_recycled: u64,
    pub total_consumed: u64,
    pub current_population: usize,
    // Sampled fields, refreshed periodically
    pub average_age: f32,
    pub average_energy: f32,
    pub zeros: usize,
    pub ones: usize,
}

impl Stats {
    pub fn record_collision(&mut self, outcome: CollisionOutcome) {
        match outcome {
            CollisionOutcome::None => return,
            CollisionOutcome::Overflow => self.overflow_collisions += 1,
            CollisionOutcome::Quantum => self.quantum_collisions += 1,
            CollisionOutcome::Merge => self.merge_collisions += 1,
        }
        self.total_collisions += 1;
    }

    /// Recompute the sampled averages and the digit census.
    pub fn refresh(&mut self, fireflies: &[Firefly]) {
        self.current_population = fireflies.len();
        let (zeros, ones) = super::count_digits(fireflies);
        self.zeros = zeros;
        self.ones = ones;
        if fireflies.is_empty() {
            return;
        }
        let n = fireflies.len() as f32;
        let total_age: f32 = fireflies.iter().map(|f| f.age()).sum();
        let total_energy: f32 = fireflies.iter().map(|f| f.energy()).sum();
        self.average_age = (total_age / n).round();
        self.average_energy = (total_energy / n).round();
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_collision() {
        let mut stats = Stats::default();
        stats.record_collision(CollisionOutcome::Overflow);
        stats.record_collision(CollisionOutcome::Merge);
        stats.record_collision(CollisionOutcome::None);
        assert_eq!(stats.total_collisions, 2);
        assert_eq!(stats.overflow_collisions, 1);
        assert_eq!(stats.merge_collisions, 1);
        assert_eq!(stats.quantum_collisions, 0);
    }

    #[test]
    fn test_to_json() {
        let stats = Stats {
            total_births: 3,
            ..Default::default()
        };
        let json = stats.to_json().unwrap();
        assert!(json.contains("\"total_births\": 3"));
    }
}
