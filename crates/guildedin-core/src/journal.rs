//! Decision journal: the accepted plans of a run, in order
//!
//! A run is fully determined by its seed, difficulty and the sequence of
//! plans that settled. Rejected and rolled-back plans are never recorded, so
//! replaying the journal on a fresh run reproduces the same history.
//!
//! # Example
//!
//! ```rust,ignore
//! use guildedin_core::{Journal, DailyPlan};
//!
//! let mut journal = Journal::new(run.id, run.seed, run.difficulty);
//! journal.record(run.day(), plan.clone());
//!
//! for entry in journal.entries_since(10) {
//!     println!("day {}: {} actions", entry.day, entry.plan.actions.len());
//! }
//! ```

use crate::plan::DailyPlan;
use crate::run::Difficulty;
use crate::RunId;
use serde::{Deserialize, Serialize};

/// One accepted plan and the day it settled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub day: u32,
    pub plan: DailyPlan,
}

/// Everything needed to replay a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journal {
    pub run_id: RunId,
    pub seed: u64,
    pub difficulty: Difficulty,
    entries: Vec<JournalEntry>,
}

impl Journal {
    /// Create an empty journal for a run
    pub fn new(run_id: RunId, seed: u64, difficulty: Difficulty) -> Self {
        Self {
            run_id,
            seed,
            difficulty,
            entries: Vec::new(),
        }
    }

    /// Record a settled plan
    pub fn record(&mut self, day: u32, plan: DailyPlan) {
        self.entries.push(JournalEntry { day, plan });
    }

    /// All entries in settlement order
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// Entries from `day` onward
    pub fn entries_since(&self, day: u32) -> impl Iterator<Item = &JournalEntry> {
        self.entries.iter().filter(move |e| e.day >= day)
    }

    /// Number of recorded days
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Day of the most recent entry
    pub fn last_day(&self) -> Option<u32> {
        self.entries.last().map(|e| e.day)
    }

    /// Drop entries from `day` onward
    pub fn truncate_from(&mut self, day: u32) {
        self.entries.retain(|e| e.day < day);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_query() {
        let mut journal = Journal::new(RunId(1), 42, Difficulty::Associate);
        assert!(journal.is_empty());
        for day in 0..5 {
            journal.record(day, DailyPlan::idle());
        }
        assert_eq!(journal.len(), 5);
        assert_eq!(journal.last_day(), Some(4));
        assert_eq!(journal.entries_since(3).count(), 2);

        journal.truncate_from(2);
        assert_eq!(journal.len(), 2);
        assert_eq!(journal.last_day(), Some(1));
    }

    #[test]
    fn test_ron_round_trip() {
        let mut journal = Journal::new(RunId(9), 7, Difficulty::Executive);
        journal.record(0, DailyPlan::expedition("standup", vec![crate::AdventurerId(1)]));
        let text = ron::to_string(&journal).unwrap();
        let back: Journal = ron::from_str(&text).unwrap();
        assert_eq!(journal, back);
    }
}
