//! Controller configuration and the difficulty table
//!
//! `ControllerConfig` holds runtime settings (journal recording, seed
//! derivation, batch worker count). `DifficultyTable` maps each difficulty
//! tier to its starting conditions and goals; it is balance content and is
//! normally loaded from RON by `guildedin-script`.

use guildedin_core::{Difficulty, DifficultyProfile};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Configuration for the run controller
///
/// # Example
///
/// ```
/// use guildedin_hub::ControllerConfig;
///
/// let config = ControllerConfig::default();
/// assert!(config.record_journal);
/// assert_eq!(config.worker_count(), 1);
///
/// let config = ControllerConfig::default().with_worker_count(4);
/// assert_eq!(config.worker_count(), 4.min(guildedin_hub::max_workers()));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Keep a decision journal for every run
    pub record_journal: bool,
    /// Mixed into run ids to derive seeds for `start_run`
    pub seed_base: u64,
    /// Threads used by `submit_batch`, clamped to `[1, max_workers()]`
    worker_count: usize,
}

impl ControllerConfig {
    /// Set the number of batch workers
    pub fn with_worker_count(mut self, n: usize) -> Self {
        self.set_worker_count(n);
        self
    }

    /// Set a fixed seed base
    pub fn with_seed_base(mut self, seed_base: u64) -> Self {
        self.seed_base = seed_base;
        self
    }

    /// Number of batch workers
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Set the number of batch workers, clamped to `[1, max_workers()]`
    pub fn set_worker_count(&mut self, n: usize) {
        self.worker_count = n.clamp(1, max_workers());
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            record_journal: true,
            seed_base: 0x6775_696C_6465_6469,
            worker_count: 1,
        }
    }
}

/// Maximum useful batch workers on this system
pub fn max_workers() -> usize {
    num_cpus::get()
}

/// Starting conditions and goals per difficulty tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyTable {
    pub profiles: IndexMap<Difficulty, DifficultyProfile>,
}

impl DifficultyTable {
    /// Profile for a tier, falling back to the built-in default
    pub fn profile(&self, difficulty: Difficulty) -> DifficultyProfile {
        self.profiles
            .get(&difficulty)
            .cloned()
            .unwrap_or_else(|| default_profile(difficulty))
    }

    /// Replace one tier's profile
    pub fn set(&mut self, difficulty: Difficulty, profile: DifficultyProfile) {
        self.profiles.insert(difficulty, profile);
    }
}

impl Default for DifficultyTable {
    fn default() -> Self {
        Self {
            profiles: Difficulty::ALL
                .iter()
                .map(|&d| (d, default_profile(d)))
                .collect(),
        }
    }
}

/// Built-in balance for a tier
pub fn default_profile(difficulty: Difficulty) -> DifficultyProfile {
    match difficulty {
        Difficulty::Intern => DifficultyProfile {
            starting_treasury: 15_000,
            starting_roster_size: 4,
            day_limit: 365,
            target_treasury: 75_000,
            target_reputation: 300,
            cost_scaling_pct: 80,
            reward_scaling_pct: 120,
        },
        Difficulty::Associate => DifficultyProfile {
            starting_treasury: 10_000,
            starting_roster_size: 3,
            day_limit: 300,
            target_treasury: 100_000,
            target_reputation: 500,
            cost_scaling_pct: 100,
            reward_scaling_pct: 100,
        },
        Difficulty::Senior => DifficultyProfile {
            starting_treasury: 8_000,
            starting_roster_size: 3,
            day_limit: 240,
            target_treasury: 150_000,
            target_reputation: 750,
            cost_scaling_pct: 120,
            reward_scaling_pct: 90,
        },
        Difficulty::Executive => DifficultyProfile {
            starting_treasury: 5_000,
            starting_roster_size: 2,
            day_limit: 180,
            target_treasury: 250_000,
            target_reputation: 1_000,
            cost_scaling_pct: 150,
            reward_scaling_pct: 80,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ControllerConfig::default();
        assert!(config.record_journal);
        assert_eq!(config.worker_count(), 1);
    }

    #[test]
    fn test_worker_count_clamped() {
        let config = ControllerConfig::default().with_worker_count(0);
        assert_eq!(config.worker_count(), 1);
        let config = ControllerConfig::default().with_worker_count(10_000);
        assert_eq!(config.worker_count(), max_workers());
    }

    #[test]
    fn test_table_covers_every_tier() {
        let table = DifficultyTable::default();
        for d in Difficulty::ALL {
            assert!(table.profiles.contains_key(&d));
        }
        let easy = table.profile(Difficulty::Intern);
        let hard = table.profile(Difficulty::Executive);
        assert!(easy.starting_treasury > hard.starting_treasury);
        assert!(easy.cost_scaling_pct < hard.cost_scaling_pct);
    }

    #[test]
    fn test_missing_tier_falls_back() {
        let table = DifficultyTable {
            profiles: IndexMap::new(),
        };
        assert_eq!(
            table.profile(Difficulty::Senior),
            default_profile(Difficulty::Senior)
        );
    }

    #[test]
    fn test_table_ron_round_trip() {
        let table = DifficultyTable::default();
        let text = ron::to_string(&table).unwrap();
        let back: DifficultyTable = ron::from_str(&text).unwrap();
        assert_eq!(table, back);
    }
}
